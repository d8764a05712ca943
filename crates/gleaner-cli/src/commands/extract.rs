//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::commands::{read_input, resolve_schema};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use gleaner_extractor::{ExtractionPipeline, ExtractionRequest, ExtractorConfig};
use gleaner_llm::OllamaProvider;
use std::sync::Arc;
use tracing::info;

/// Execute the extract command.
pub async fn execute_extract(args: ExtractArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let mut registry = config.registry()?;
    let schema = resolve_schema(&mut registry, &args.schema)?;
    let source = read_input(&args.source)?;

    let extractor_config = apply_overrides(config.extractor.clone(), &args)?;
    let endpoint = args.endpoint.as_deref().unwrap_or(&config.generator.endpoint);
    let model = args.model.as_deref().unwrap_or(&config.generator.model);

    info!("Extracting from {} with {} at {}", source.source_id, model, endpoint);

    let provider = OllamaProvider::new(endpoint, model)?;
    let pipeline = ExtractionPipeline::new(provider, Arc::new(registry), extractor_config)?
        .with_model_name(model);

    let request = ExtractionRequest::new(source.text, schema).with_source_id(source.source_id);

    match pipeline.run(request).await {
        Ok(result) => {
            println!("{}", formatter.format_result(&result)?);
            Ok(())
        }
        Err(e) => {
            if !e.violations().is_empty() {
                eprintln!("{}", formatter.format_violations(e.violations())?);
            }
            Err(e.into())
        }
    }
}

/// Layer command-line overrides on top of the configured settings.
fn apply_overrides(mut config: ExtractorConfig, args: &ExtractArgs) -> Result<ExtractorConfig> {
    if let Some(max_tokens) = args.max_tokens {
        config.max_tokens = max_tokens;
    }
    if let Some(retries) = args.retries {
        config.max_retries = retries;
    }
    if let Some(timeout) = args.timeout {
        config.generation_timeout_secs = timeout;
    }
    if args.no_reprompt {
        config.reprompt_on_invalid = false;
    }
    if args.constrained {
        config.constrained_generation = true;
    }
    config.validate().map_err(CliError::Config)?;
    Ok(config)
}
