//! Validate command implementation.

use crate::cli::ValidateArgs;
use crate::commands::{read_stdin, resolve_schema};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use gleaner_extractor::{ExtractorError, ResponseValidator, ValidatedRecords};
use std::fs;

/// Execute the validate command.
pub async fn execute_validate(args: ValidateArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let raw = if args.stdin {
        read_stdin()?
    } else if let Some(path) = &args.completion {
        fs::read_to_string(path)?
    } else {
        return Err(CliError::InvalidInput(
            "Must specify either --completion or --stdin".to_string(),
        ));
    };

    let mut registry = config.registry()?;
    let name = resolve_schema(&mut registry, &args.schema)?;

    let schema = registry.get(&name)?;

    match validate_completion(&schema, &raw) {
        Ok(validated) => {
            if validated.recovered {
                eprintln!("{}", formatter.warning("JSON was recovered from surrounding text"));
            }
            println!("{}", formatter.format_records(&validated.records)?);
            eprintln!(
                "{}",
                formatter.success(&format!("{} record(s) satisfy '{}'", validated.records.len(), name))
            );
            Ok(())
        }
        Err(e) => {
            if !e.violations().is_empty() {
                println!("{}", formatter.format_violations(e.violations())?);
            }
            Err(e.into())
        }
    }
}

fn validate_completion(
    schema: &gleaner_extractor::Schema,
    raw: &str,
) -> std::result::Result<ValidatedRecords, ExtractorError> {
    ResponseValidator::new().validate(raw, schema)
}
