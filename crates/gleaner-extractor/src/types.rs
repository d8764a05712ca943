//! Request and response types for extraction

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Request to extract records from text
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Text to extract records from
    pub text: String,

    /// Name of the registered schema to apply
    pub schema: String,

    /// Caller-supplied source identifier (file name, page range, ...)
    pub source_id: Option<String>,
}

impl ExtractionRequest {
    /// Create a request with no source identifier
    pub fn new(text: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            schema: schema.into(),
            source_id: None,
        }
    }

    /// Attach a source identifier
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }
}

/// Result of a successful extraction
///
/// The records always satisfy the schema named in the metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Validated records, as returned by the generator
    pub records: Vec<Value>,

    /// Metadata about the extraction
    pub metadata: ExtractionMetadata,
}

impl ExtractionResult {
    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records were extracted
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Metadata about an extraction
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionMetadata {
    /// Unique, time-ordered id of this run
    pub request_id: String,

    /// Source identifier from the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,

    /// Schema the records were validated against
    pub schema_name: String,

    /// Model used
    pub model_name: String,

    /// Unix timestamp (seconds) when the run finished
    pub timestamp: u64,

    /// Generator calls made, retries and re-prompt included
    pub generator_calls: u32,

    /// Whether a correction re-prompt was needed
    pub reprompted: bool,

    /// Whether JSON had to be recovered from surrounding text
    pub recovered: bool,

    /// Wall-clock time for the run (milliseconds)
    pub processing_time_ms: u64,
}

/// Pipeline stage, fresh per run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Nothing done yet
    Idle,
    /// Prompt assembled
    PromptBuilt,
    /// Completion received
    Generated,
    /// Completion checked against the schema
    Validated,
}

impl PipelineStage {
    /// Lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Idle => "idle",
            PipelineStage::PromptBuilt => "prompt_built",
            PipelineStage::Generated => "generated",
            PipelineStage::Validated => "validated",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builder() {
        let request = ExtractionRequest::new("COLD EMBRACE", "facets").with_source_id("core.pdf:120");
        assert_eq!(request.schema, "facets");
        assert_eq!(request.source_id.as_deref(), Some("core.pdf:120"));
    }

    #[test]
    fn test_result_serializes_records_and_metadata() {
        let result = ExtractionResult {
            records: vec![json!({"name": "Shadow Bind", "renown": "Glory"})],
            metadata: ExtractionMetadata {
                request_id: "0192".into(),
                source_id: None,
                schema_name: "facets".into(),
                model_name: "llama3.2:3b".into(),
                timestamp: 0,
                generator_calls: 1,
                reprompted: false,
                recovered: false,
                processing_time_ms: 12,
            },
        };
        assert_eq!(result.len(), 1);
        assert!(!result.is_empty());

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["records"][0]["renown"], "Glory");
        assert_eq!(value["metadata"]["schema_name"], "facets");
        assert!(value["metadata"].get("source_id").is_none());
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(PipelineStage::PromptBuilt.to_string(), "prompt_built");
        assert_eq!(PipelineStage::Validated.as_str(), "validated");
    }
}
