//! Gleaner Domain Layer
//!
//! This crate defines the boundaries of Gleaner's schema-guided extraction
//! workflow. It has ZERO external dependencies and contains only the value
//! types and trait interfaces that the other layers depend upon.
//!
//! ## Key Concepts
//!
//! - **Completion**: Raw text returned by a text-generation capability
//! - **Generation parameters**: Output length, deadline and sampling settings for one call
//! - **Text generator**: Any backend (local model, remote API, mock) that turns a prompt into text
//! - **Text source**: Any document reader that yields plain text, pages joined by form feed
//!
//! ## Architecture
//!
//! - No external crate dependencies
//! - Infrastructure implementations live in other crates (`gleaner-llm`, `gleaner-pdf`)
//! - The extraction workflow itself lives in `gleaner-extractor`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod generation;
pub mod page;
pub mod traits;

// Re-exports for convenience
pub use generation::{GenerationError, GenerationParams, DEFAULT_MAX_TOKENS};
pub use page::{join_pages, split_pages, PAGE_DELIMITER};
pub use traits::{TextGenerator, TextSource};
