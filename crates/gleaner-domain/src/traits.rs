//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the extraction workflow and
//! infrastructure. Implementations live in other crates.

use crate::{GenerationError, GenerationParams};
use std::path::Path;

/// Trait for text generation backends
///
/// Implemented by the infrastructure layer (gleaner-llm)
///
/// Calls may block for seconds; callers in async code should run them on
/// a blocking thread.
///
/// Implementations should stop work once `params.deadline` has passed. A
/// caller that gives up at the deadline cannot cancel a blocking call, so a
/// generator that ignores it keeps running alongside any retry.
pub trait TextGenerator {
    /// Generate a raw text completion for the prompt
    fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, GenerationError>;

    /// Generate a completion constrained to the given JSON schema (if supported)
    ///
    /// Backends without schema-constrained decoding fall back to [`complete`](Self::complete).
    fn complete_structured(
        &self,
        prompt: &str,
        _schema: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError> {
        self.complete(prompt, params)
    }
}

/// Trait for reading plain text out of documents
///
/// Implemented by the infrastructure layer (gleaner-pdf)
pub trait TextSource {
    /// Error type for extraction operations
    type Error;

    /// Extract the document's text, pages joined by [`PAGE_DELIMITER`](crate::PAGE_DELIMITER)
    fn extract_text(&self, path: &Path) -> Result<String, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl TextGenerator for Echo {
        fn complete(&self, prompt: &str, _params: &GenerationParams) -> Result<String, GenerationError> {
            Ok(prompt.to_uppercase())
        }
    }

    #[test]
    fn test_structured_falls_back_to_complete() {
        let params = GenerationParams::default();
        let result = Echo.complete_structured("hello", "{}", &params).unwrap();
        assert_eq!(result, "HELLO");
    }
}
