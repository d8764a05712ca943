//! Prompt command implementation.

use crate::cli::PromptArgs;
use crate::commands::{read_input, resolve_schema};
use crate::config::{Config, OutputFormat};
use crate::error::Result;
use crate::output::Formatter;
use gleaner_extractor::{ExtractorError, PromptBuilder};
use serde_json::json;

/// Execute the prompt command.
pub async fn execute_prompt(args: PromptArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let mut registry = config.registry()?;
    let name = resolve_schema(&mut registry, &args.schema)?;
    let schema = registry.get(&name)?;
    let source = read_input(&args.source)?;

    let max = config.extractor.max_text_length;
    if source.text.len() > max {
        return Err(ExtractorError::TextTooLong(source.text.len(), max).into());
    }

    let prompt = PromptBuilder::new(&source.text, &schema).build()?;

    match formatter.format() {
        OutputFormat::Json => {
            let output = json!({
                "schema": schema.name(),
                "source_id": source.source_id,
                "prompt": prompt,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Table | OutputFormat::Quiet => println!("{}", prompt),
    }

    Ok(())
}
