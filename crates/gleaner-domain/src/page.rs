//! Page module - the form-feed convention for multi-page documents
//!
//! Text sources return a whole document as one string, with page texts
//! separated by a form feed (U+000C). Downstream consumers split on it.

/// Page delimiter in extracted document text
pub const PAGE_DELIMITER: char = '\u{c}';

/// Join page texts into a single document string
///
/// # Examples
///
/// ```
/// use gleaner_domain::join_pages;
///
/// let text = join_pages(["first", "second"]);
/// assert_eq!(text, "first\u{c}second");
/// ```
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut text = String::new();
    for (idx, page) in pages.into_iter().enumerate() {
        if idx > 0 {
            text.push(PAGE_DELIMITER);
        }
        text.push_str(page.as_ref());
    }
    text
}

/// Split a document string back into its pages
///
/// An empty document is a single empty page.
pub fn split_pages(text: &str) -> Vec<&str> {
    text.split(PAGE_DELIMITER).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_delimiter_is_form_feed() {
        assert_eq!(PAGE_DELIMITER as u32, 12);
    }

    #[test]
    fn test_join_single_page() {
        assert_eq!(join_pages(["only"]), "only");
    }

    #[test]
    fn test_join_keeps_empty_pages() {
        assert_eq!(join_pages(["a", "", "b"]), "a\u{c}\u{c}b");
    }

    #[test]
    fn test_join_no_pages() {
        let pages: Vec<String> = Vec::new();
        assert_eq!(join_pages(pages), "");
    }

    #[test]
    fn test_split_pages() {
        let pages = split_pages("one\u{c}two\u{c}three");
        assert_eq!(pages, vec!["one", "two", "three"]);
    }

    proptest! {
        #[test]
        fn split_inverts_join(pages in prop::collection::vec("[^\u{c}]{0,40}", 1..8)) {
            let joined = join_pages(&pages);
            let split: Vec<String> = split_pages(&joined)
                .into_iter()
                .map(str::to_string)
                .collect();
            prop_assert_eq!(split, pages);
        }
    }
}
