//! The extraction pipeline: prompt, generate, validate

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::prompt::{correction_feedback, PromptBuilder};
use crate::schema::{Schema, SchemaRegistry};
use crate::types::{ExtractionMetadata, ExtractionRequest, ExtractionResult, PipelineStage};
use crate::validator::{ResponseValidator, ValidatedRecords};
use gleaner_domain::{GenerationParams, TextGenerator};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Turns text into schema-valid records using a [`TextGenerator`]
///
/// The pipeline holds no per-run state, so a single instance can serve
/// concurrent [`run`](Self::run) calls from independent tasks.
pub struct ExtractionPipeline<G>
where
    G: TextGenerator,
{
    generator: Arc<G>,
    registry: Arc<SchemaRegistry>,
    validator: ResponseValidator,
    config: ExtractorConfig,
    model_name: String,
}

/// Per-run bookkeeping
struct RunState {
    request_id: String,
    stage: PipelineStage,
    generator_calls: u32,
}

impl RunState {
    fn new() -> Self {
        Self {
            request_id: Uuid::now_v7().to_string(),
            stage: PipelineStage::Idle,
            generator_calls: 0,
        }
    }

    fn enter(&mut self, next: PipelineStage) {
        debug!("Extraction {}: {} -> {}", self.request_id, self.stage, next);
        self.stage = next;
    }
}

impl<G> ExtractionPipeline<G>
where
    G: TextGenerator + Send + Sync + 'static,
{
    /// Create a new pipeline
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::Config`] when `config` fails validation.
    pub fn new(
        generator: G,
        registry: Arc<SchemaRegistry>,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        Self::with_shared_generator(Arc::new(generator), registry, config)
    }

    /// Create a pipeline around a generator that is shared elsewhere
    pub fn with_shared_generator(
        generator: Arc<G>,
        registry: Arc<SchemaRegistry>,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;

        Ok(Self {
            generator,
            registry,
            validator: ResponseValidator::new(),
            config,
            model_name: "llm".to_string(),
        })
    }

    /// Set the model name reported in result metadata
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Schemas this pipeline can apply
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// The prompt a run would send first, without calling the generator
    pub fn prompt_for(&self, request: &ExtractionRequest) -> Result<String, ExtractorError> {
        let schema = self.registry.get(&request.schema)?;
        self.check_length(request)?;
        PromptBuilder::new(&request.text, &schema).build()
    }

    /// Extract records from the request's text
    ///
    /// Transient generator failures are retried with exponential backoff.
    /// An invalid completion is answered with one correction re-prompt when
    /// `reprompt_on_invalid` is set; if that also fails, its error is returned.
    pub async fn run(&self, request: ExtractionRequest) -> Result<ExtractionResult, ExtractorError> {
        let started = Instant::now();
        let mut state = RunState::new();

        let schema = self.registry.get(&request.schema)?;
        self.check_length(&request)?;

        info!(
            "Starting extraction {} with schema '{}', text length {}",
            state.request_id,
            schema.name(),
            request.text.len()
        );

        let prompt = PromptBuilder::new(&request.text, &schema).build()?;
        state.enter(PipelineStage::PromptBuilt);
        debug!("Prompt length: {} chars", prompt.len());

        let raw = self.generate_with_retry(&prompt, &schema, &mut state).await?;
        state.enter(PipelineStage::Generated);
        debug!("Completion length: {} chars", raw.len());

        let first = self.validator.validate(&raw, &schema);
        state.enter(PipelineStage::Validated);

        let (validated, reprompted) = match first {
            Ok(validated) => (validated, false),
            Err(e) if e.is_content_error() && self.config.reprompt_on_invalid => {
                warn!("Extraction {}: completion rejected, re-prompting: {}", state.request_id, e);
                let validated = self.reprompt(&request, &schema, &e, &mut state).await?;
                (validated, true)
            }
            Err(e) => return Err(e),
        };

        let metadata = ExtractionMetadata {
            request_id: state.request_id,
            source_id: request.source_id,
            schema_name: schema.name().to_string(),
            model_name: self.model_name.clone(),
            timestamp: unix_now(),
            generator_calls: state.generator_calls,
            reprompted,
            recovered: validated.recovered,
            processing_time_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            "Extraction complete: {} records in {} generator call(s)",
            validated.records.len(),
            metadata.generator_calls
        );

        Ok(ExtractionResult {
            records: validated.records,
            metadata,
        })
    }

    async fn reprompt(
        &self,
        request: &ExtractionRequest,
        schema: &Schema,
        rejection: &ExtractorError,
        state: &mut RunState,
    ) -> Result<ValidatedRecords, ExtractorError> {
        let prompt = PromptBuilder::new(&request.text, schema)
            .with_correction(correction_feedback(rejection))
            .build()?;
        state.enter(PipelineStage::PromptBuilt);

        let raw = self.generate_with_retry(&prompt, schema, state).await?;
        state.enter(PipelineStage::Generated);

        let result = self.validator.validate(&raw, schema);
        state.enter(PipelineStage::Validated);
        result
    }

    fn check_length(&self, request: &ExtractionRequest) -> Result<(), ExtractorError> {
        if request.text.len() > self.config.max_text_length {
            return Err(ExtractorError::TextTooLong(
                request.text.len(),
                self.config.max_text_length,
            ));
        }
        Ok(())
    }

    /// Call the generator, retrying transient failures up to `max_retries` times
    async fn generate_with_retry(
        &self,
        prompt: &str,
        schema: &Schema,
        state: &mut RunState,
    ) -> Result<String, ExtractorError> {
        let mut attempt = 0;
        loop {
            state.generator_calls += 1;
            match self.call_generator(prompt, schema).await {
                Ok(raw) => return Ok(raw),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    let delay = self.config.backoff_delay(attempt);
                    warn!(
                        "Generation attempt {} failed: {}; retrying in {}ms",
                        attempt + 1,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Call the generator once, on the blocking pool, bounded by the deadline
    async fn call_generator(&self, prompt: &str, schema: &Schema) -> Result<String, ExtractorError> {
        let generator = Arc::clone(&self.generator);
        let prompt = prompt.to_string();
        let schema_text = self
            .config
            .constrained_generation
            .then(|| schema.source().to_string());

        let deadline = self.config.generation_timeout();
        let mut params = GenerationParams::new(self.config.max_tokens).with_timeout(deadline);
        if let Some(temperature) = self.config.temperature {
            params = params.with_temperature(temperature);
        }

        // TextGenerator is not async
        let task = tokio::task::spawn_blocking(move || match schema_text {
            Some(schema_text) => generator.complete_structured(&prompt, &schema_text, &params),
            None => generator.complete(&prompt, &params),
        });

        let completion = timeout(deadline, task)
            .await
            .map_err(|_| ExtractorError::GenerationTimeout)?
            .map_err(|e| ExtractorError::GenerationUnavailable(format!("Task join error: {}", e)))?;

        Ok(completion?)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FACETS_SCHEMA_NAME;
    use gleaner_llm::MockProvider;

    fn pipeline(provider: MockProvider) -> ExtractionPipeline<MockProvider> {
        let config = ExtractorConfig {
            retry_backoff_ms: 1,
            max_backoff_ms: 5,
            ..ExtractorConfig::default()
        };
        ExtractionPipeline::new(provider, Arc::new(SchemaRegistry::with_builtin()), config).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = ExtractorConfig {
            generation_timeout_secs: 0,
            ..ExtractorConfig::default()
        };
        let result = ExtractionPipeline::new(
            MockProvider::default(),
            Arc::new(SchemaRegistry::with_builtin()),
            config,
        );
        assert!(matches!(
            result,
            Err(ExtractorError::Config(ref reason)) if reason.contains("generation_timeout_secs")
        ));
    }

    #[test]
    fn test_prompt_for_uses_schema() {
        let pipeline = pipeline(MockProvider::default());
        let prompt = pipeline
            .prompt_for(&ExtractionRequest::new("COLD EMBRACE (CUNNING)", FACETS_SCHEMA_NAME))
            .unwrap();
        assert!(prompt.contains("\"Cunning\""));
        assert!(prompt.contains("COLD EMBRACE (CUNNING)"));
    }

    #[tokio::test]
    async fn test_extract_text_too_long() {
        let provider = MockProvider::new("[]");
        let probe = provider.clone();
        let pipeline = pipeline(provider);

        let request = ExtractionRequest::new("a".repeat(100_000), FACETS_SCHEMA_NAME);
        let result = pipeline.run(request).await;

        assert!(matches!(result, Err(ExtractorError::TextTooLong(100_000, 50_000))));
        assert_eq!(probe.call_count(), 0);
    }

    #[tokio::test]
    async fn test_metadata_filled_in() {
        let provider = MockProvider::new(r#"[{"name":"Cold Embrace","renown":"Cunning"}]"#);
        let pipeline = pipeline(provider).with_model_name("llama3.2:3b");

        let request = ExtractionRequest::new("COLD EMBRACE (CUNNING)", FACETS_SCHEMA_NAME)
            .with_source_id("core.pdf:120");
        let result = pipeline.run(request).await.unwrap();

        assert_eq!(result.metadata.model_name, "llama3.2:3b");
        assert_eq!(result.metadata.schema_name, "facets");
        assert_eq!(result.metadata.source_id.as_deref(), Some("core.pdf:120"));
        assert_eq!(result.metadata.generator_calls, 1);
        assert!(!result.metadata.reprompted);
        assert!(Uuid::parse_str(&result.metadata.request_id).is_ok());
    }
}
