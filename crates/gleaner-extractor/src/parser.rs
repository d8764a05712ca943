//! Parse raw completions into JSON
//!
//! Models often wrap their answer in prose or markdown fences even when
//! asked not to. A strict parse is tried first; failing that, the span from
//! the first opening bracket to the last matching closer is parsed instead.

use crate::error::ExtractorError;
use serde_json::Value;
use tracing::debug;

/// JSON parsed out of a completion
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCompletion {
    /// Parsed document
    pub value: Value,
    /// Whether the document had to be cut out of surrounding text
    pub recovered: bool,
}

/// Parse a completion, recovering embedded JSON if needed
pub fn parse_completion(raw: &str) -> Result<ParsedCompletion, ExtractorError> {
    let trimmed = raw.trim();

    let strict_error = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => {
            return Ok(ParsedCompletion {
                value,
                recovered: false,
            })
        }
        Err(e) => e,
    };

    let Some(candidate) = embedded_json(trimmed) else {
        return Err(ExtractorError::MalformedOutput {
            reason: format!("no JSON found: {}", strict_error),
            raw: raw.to_string(),
        });
    };

    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => {
            debug!(
                "Recovered {} bytes of JSON from a {} byte completion",
                candidate.len(),
                raw.len()
            );
            Ok(ParsedCompletion {
                value,
                recovered: true,
            })
        }
        Err(e) => Err(ExtractorError::MalformedOutput {
            reason: format!("JSON parse error: {}", e),
            raw: raw.to_string(),
        }),
    }
}

/// Span from the first `{` or `[` to the last closer of the same kind
fn embedded_json(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer)?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}
