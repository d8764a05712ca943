//! Error types for the Extractor

use crate::validator::Violation;
use gleaner_domain::GenerationError;
use thiserror::Error;

/// Errors that can occur during extraction
///
/// The variants fall into three groups:
///
/// - configuration: [`SchemaParse`](Self::SchemaParse), [`SchemaNotFound`](Self::SchemaNotFound),
///   [`Config`](Self::Config). Fatal, never retried.
/// - transient: [`GenerationTimeout`](Self::GenerationTimeout),
///   [`GenerationUnavailable`](Self::GenerationUnavailable). Retried with backoff.
/// - content: [`MalformedOutput`](Self::MalformedOutput),
///   [`SchemaViolation`](Self::SchemaViolation). Corrected by at most one re-prompt.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Schema document is malformed
    #[error("Schema parse error in '{name}': {reason}")]
    SchemaParse {
        /// Name the schema was registered under
        name: String,
        /// Every problem found, joined
        reason: String,
    },

    /// No schema registered under this name
    #[error("Schema not found: {0}")]
    SchemaNotFound(String),

    /// Generator did not answer before the deadline
    #[error("Generation timeout")]
    GenerationTimeout,

    /// Generator could not serve the request
    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// Completion is not JSON, even after recovery
    #[error("Malformed output: {reason}")]
    MalformedOutput {
        /// Why parsing failed
        reason: String,
        /// The completion as returned by the generator
        raw: String,
    },

    /// Completion is JSON but does not satisfy the schema
    #[error("Schema violation: {}", summarize(.violations))]
    SchemaViolation {
        /// Every violated path, in document order
        violations: Vec<Violation>,
        /// The completion as returned by the generator
        raw: String,
    },

    /// Input text is empty or whitespace
    #[error("Input text is empty")]
    EmptyInput,

    /// Text exceeds maximum length
    #[error("Text too long: {0} bytes (max: {1})")]
    TextTooLong(usize, usize),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Schema file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractorError {
    /// Whether retrying the same generation request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ExtractorError::GenerationTimeout | ExtractorError::GenerationUnavailable(_)
        )
    }

    /// Whether the generator answered but the answer was unusable
    pub fn is_content_error(&self) -> bool {
        matches!(
            self,
            ExtractorError::MalformedOutput { .. } | ExtractorError::SchemaViolation { .. }
        )
    }

    /// Violated paths, empty for anything but a schema violation
    pub fn violations(&self) -> &[Violation] {
        match self {
            ExtractorError::SchemaViolation { violations, .. } => violations.as_slice(),
            _ => &[],
        }
    }

    /// Raw completion that caused a content error
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            ExtractorError::MalformedOutput { raw, .. }
            | ExtractorError::SchemaViolation { raw, .. } => Some(raw.as_str()),
            _ => None,
        }
    }
}

impl From<GenerationError> for ExtractorError {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::Timeout => ExtractorError::GenerationTimeout,
            GenerationError::Unavailable(reason) => ExtractorError::GenerationUnavailable(reason),
        }
    }
}

fn summarize(violations: &[Violation]) -> String {
    let paths: Vec<String> = violations.iter().map(ToString::to_string).collect();
    format!("{} problem(s): {}", violations.len(), paths.join("; "))
}
