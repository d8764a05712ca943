//! Gleaner PDF Text Source
//!
//! Reads the text layer of a PDF and returns it as a single string, one
//! page after another, separated by a form feed (`\f`). This is the input
//! side of the extraction workflow: rulebook pages go in, plain text comes
//! out, and the extractor turns the text into schema-shaped records.
//!
//! # Examples
//!
//! ```no_run
//! use gleaner_pdf::{extract_text, PageRange};
//!
//! # fn example() -> Result<(), gleaner_pdf::PdfError> {
//! let text = extract_text("werewolf-core.pdf")?;
//! let range: PageRange = "120-122".parse()?;
//! let excerpt = range.select(&text);
//! println!("{}", excerpt);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod range;

use gleaner_domain::{join_pages, TextSource};
use lopdf::Document;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

pub use range::PageRange;

/// Errors that can occur while reading a PDF
#[derive(Error, Debug)]
pub enum PdfError {
    /// File could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not a readable PDF
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// A page's text layer could not be decoded
    #[error("Failed to extract text from page {page}: {source}")]
    PageText {
        /// 1-based page number
        page: u32,
        /// Underlying decoder error
        #[source]
        source: lopdf::Error,
    },

    /// Page range argument could not be parsed
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),
}

/// Extract the text of every page, keyed by 1-based page number
///
/// # Errors
///
/// Fails with [`PdfError::PageText`] naming the first page whose text layer
/// cannot be decoded.
pub fn extract_pages(path: impl AsRef<Path>) -> Result<BTreeMap<u32, String>, PdfError> {
    let path = path.as_ref();
    // Surface a plain I/O error for missing or unreadable files
    std::fs::metadata(path)?;

    let document = Document::load(path)?;
    let pages = collect_pages(
        document
            .get_pages()
            .keys()
            .map(|&page| (page, document.extract_text(&[page]))),
    )?;

    debug!("Extracted {} pages from {}", pages.len(), path.display());

    Ok(pages)
}

fn collect_pages<I>(pages: I) -> Result<BTreeMap<u32, String>, PdfError>
where
    I: IntoIterator<Item = (u32, Result<String, lopdf::Error>)>,
{
    pages
        .into_iter()
        .map(|(page, text)| match text {
            Ok(text) => Ok((page, text)),
            Err(source) => {
                warn!("Failed to extract text from page {}: {}", page, source);
                Err(PdfError::PageText { page, source })
            }
        })
        .collect()
}

/// Extract a document's text, pages joined by a form feed
pub fn extract_text(path: impl AsRef<Path>) -> Result<String, PdfError> {
    let pages = extract_pages(path)?;
    Ok(join_pages(pages.values()))
}

/// [`TextSource`] backed by the PDF text layer
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextSource;

impl TextSource for PdfTextSource {
    type Error = PdfError;

    fn extract_text(&self, path: &Path) -> Result<String, Self::Error> {
        extract_text(path)
    }
}
