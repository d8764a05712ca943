//! Page range selection over form-feed delimited text

use crate::PdfError;
use gleaner_domain::{join_pages, split_pages};
use std::fmt;
use std::str::FromStr;

/// Inclusive, 1-based range of pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    start: u32,
    end: u32,
}

impl PageRange {
    /// Create a range, rejecting page 0 and reversed bounds
    pub fn new(start: u32, end: u32) -> Result<Self, PdfError> {
        if start == 0 {
            return Err(PdfError::InvalidPageRange(
                "pages are numbered from 1".to_string(),
            ));
        }
        if start > end {
            return Err(PdfError::InvalidPageRange(format!(
                "start page {} is after end page {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// First page in the range
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Last page in the range
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Keep only the pages in range, still joined by form feeds
    ///
    /// Pages past the end of the document are ignored.
    pub fn select(&self, text: &str) -> String {
        let skip = (self.start - 1) as usize;
        let take = (self.end - self.start + 1) as usize;
        join_pages(split_pages(text).into_iter().skip(skip).take(take))
    }
}

impl FromStr for PageRange {
    type Err = PdfError;

    /// Parse `"7"` or `"3-5"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| PdfError::InvalidPageRange(format!("'{}' is not a page number", part)))
        };

        match s.split_once('-') {
            Some((start, end)) => Self::new(parse(start)?, parse(end)?),
            None => {
                let page = parse(s)?;
                Self::new(page, page)
            }
        }
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "one\u{c}two\u{c}three\u{c}four";

    #[test]
    fn test_parse_single_page() {
        let range: PageRange = "3".parse().unwrap();
        assert_eq!(range, PageRange::new(3, 3).unwrap());
        assert_eq!(range.to_string(), "3");
    }

    #[test]
    fn test_parse_span() {
        let range: PageRange = " 2 - 4 ".parse().unwrap();
        assert_eq!((range.start(), range.end()), (2, 4));
        assert_eq!(range.to_string(), "2-4");
    }

    #[test]
    fn test_rejects_bad_ranges() {
        assert!("0".parse::<PageRange>().is_err());
        assert!("5-2".parse::<PageRange>().is_err());
        assert!("abc".parse::<PageRange>().is_err());
        assert!("1-".parse::<PageRange>().is_err());
    }

    #[test]
    fn test_select_middle_pages() {
        let range = PageRange::new(2, 3).unwrap();
        assert_eq!(range.select(DOC), "two\u{c}three");
    }

    #[test]
    fn test_select_past_end() {
        let range = PageRange::new(4, 9).unwrap();
        assert_eq!(range.select(DOC), "four");

        let range = PageRange::new(7, 9).unwrap();
        assert_eq!(range.select(DOC), "");
    }
}
