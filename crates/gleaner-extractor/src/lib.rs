//! Gleaner Extractor
//!
//! Turns unstructured text into records that satisfy a JSON Schema, using a
//! text generator (usually a local LLM) that knows nothing about schemas.
//!
//! # Architecture
//!
//! ```text
//! Text + Schema → PromptBuilder → TextGenerator → ResponseValidator → Records
//!                                      ↑                  │
//!                                      └── re-prompt ─────┘ (once, on invalid output)
//! ```
//!
//! # Key Features
//!
//! - **Schema Registry**: load schemas from files or strings, checked up front
//! - **Deterministic Prompts**: the schema text and input are embedded verbatim
//! - **JSON Recovery**: answers wrapped in prose or markdown fences still parse
//! - **Validation**: types, required fields, enums and cardinality, every
//!   violated path reported
//! - **Retries**: timeouts and unavailable backends retried with backoff
//!
//! # Example Usage
//!
//! ```no_run
//! use gleaner_extractor::{ExtractionPipeline, ExtractionRequest, ExtractorConfig, SchemaRegistry};
//! use gleaner_llm::OllamaProvider;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = OllamaProvider::new("http://localhost:11434", "llama3.2:3b")?;
//! let registry = Arc::new(SchemaRegistry::with_builtin());
//!
//! let pipeline = ExtractionPipeline::new(llm, registry, ExtractorConfig::default())?
//!     .with_model_name("llama3.2:3b");
//!
//! let request = ExtractionRequest::new(
//!     "SHADOW BIND (GLORY)\nCost: 2 Essence\n...",
//!     "facets",
//! );
//! let result = pipeline.run(request).await?;
//!
//! for record in &result.records {
//!     println!("{}", record["name"]);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod parser;
mod pipeline;
mod prompt;
mod schema;
mod types;
mod validator;


pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use parser::{parse_completion, ParsedCompletion};
pub use pipeline::ExtractionPipeline;
pub use prompt::{correction_feedback, PromptBuilder};
pub use schema::{Schema, SchemaRegistry, SchemaSource, FACETS_SCHEMA, FACETS_SCHEMA_NAME};
pub use types::{ExtractionMetadata, ExtractionRequest, ExtractionResult, PipelineStage};
pub use validator::{ResponseValidator, ValidatedRecords, Violation, ViolationKind};
