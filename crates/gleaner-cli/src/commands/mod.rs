//! Command implementations.

pub mod extract;
pub mod pdf_text;
pub mod prompt;
pub mod schemas;
pub mod validate;

pub use self::extract::execute_extract;
pub use self::pdf_text::execute_pdf_text;
pub use self::prompt::execute_prompt;
pub use self::schemas::execute_schemas;
pub use self::validate::execute_validate;

use crate::cli::InputArgs;
use crate::error::{CliError, Result};
use gleaner_extractor::{SchemaRegistry, SchemaSource};
use gleaner_pdf::PageRange;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

/// Input text and a label for where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    /// The text
    pub text: String,
    /// File name, `file:pages`, or `stdin`
    pub source_id: String,
}

/// Read the text selected by `--input`, `--stdin` or `--pdf [--pages]`.
pub fn read_input(args: &InputArgs) -> Result<SourceText> {
    let chosen = [args.input.is_some(), args.stdin, args.pdf.is_some()]
        .iter()
        .filter(|set| **set)
        .count();
    if chosen != 1 {
        return Err(CliError::InvalidInput(
            "Must specify exactly one of --input, --stdin or --pdf".to_string(),
        ));
    }
    if args.pages.is_some() && args.pdf.is_none() {
        return Err(CliError::InvalidInput("--pages requires --pdf".to_string()));
    }

    if let Some(path) = &args.input {
        return Ok(SourceText {
            text: fs::read_to_string(path)?,
            source_id: path.display().to_string(),
        });
    }

    if let Some(path) = &args.pdf {
        return read_pdf(path, args.pages.as_deref());
    }

    Ok(SourceText {
        text: read_stdin()?,
        source_id: "stdin".to_string(),
    })
}

/// Extract a PDF's text, optionally narrowed to a page range.
pub fn read_pdf(path: &Path, pages: Option<&str>) -> Result<SourceText> {
    let text = gleaner_pdf::extract_text(path)?;
    match pages {
        Some(pages) => {
            let range: PageRange = pages.parse()?;
            debug!("Selecting pages {} of {}", range, path.display());
            Ok(SourceText {
                text: range.select(&text),
                source_id: format!("{}:{}", path.display(), range),
            })
        }
        None => Ok(SourceText {
            text,
            source_id: path.display().to_string(),
        }),
    }
}

/// Read all of stdin.
pub fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

/// Resolve `--schema`: a registered name, or a schema file to register.
///
/// Returns the name to look the schema up by.
pub fn resolve_schema(registry: &mut SchemaRegistry, schema: &str) -> Result<String> {
    if registry.contains(schema) {
        return Ok(schema.to_string());
    }

    let path = Path::new(schema);
    if path.is_file() {
        let loaded = registry.load(SchemaSource::file(path))?;
        return Ok(loaded.name().to_string());
    }

    Err(CliError::InvalidInput(format!(
        "Unknown schema '{}'. Known schemas: {}",
        schema,
        registry.names().join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn input_args() -> InputArgs {
        InputArgs {
            input: None,
            stdin: false,
            pdf: None,
            pages: None,
        }
    }

    #[test]
    fn test_read_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facet.txt");
        fs::write(&path, "COLD EMBRACE (CUNNING)").unwrap();

        let args = InputArgs {
            input: Some(path.clone()),
            ..input_args()
        };
        let source = read_input(&args).unwrap();
        assert_eq!(source.text, "COLD EMBRACE (CUNNING)");
        assert_eq!(source.source_id, path.display().to_string());
    }

    #[test]
    fn test_read_input_requires_one_source() {
        assert!(matches!(read_input(&input_args()), Err(CliError::InvalidInput(_))));

        let both = InputArgs {
            input: Some(PathBuf::from("a.txt")),
            stdin: true,
            ..input_args()
        };
        assert!(matches!(read_input(&both), Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_pages_without_pdf() {
        let args = InputArgs {
            input: Some(PathBuf::from("a.txt")),
            pages: Some("1-2".to_string()),
            ..input_args()
        };
        assert!(matches!(read_input(&args), Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_resolve_registered_schema() {
        let mut registry = SchemaRegistry::with_builtin();
        assert_eq!(resolve_schema(&mut registry, "facets").unwrap(), "facets");
    }

    #[test]
    fn test_resolve_schema_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spells.json");
        fs::write(&path, r#"{"type":"array","items":{"type":"object","required":["name"]}}"#).unwrap();

        let mut registry = SchemaRegistry::with_builtin();
        let name = resolve_schema(&mut registry, path.to_str().unwrap()).unwrap();
        assert_eq!(name, "spells");
        assert!(registry.contains("spells"));
    }

    #[test]
    fn test_resolve_unknown_schema() {
        let mut registry = SchemaRegistry::with_builtin();
        let err = resolve_schema(&mut registry, "merits").unwrap_err();
        assert!(err.to_string().contains("Known schemas: facets"));
    }
}
