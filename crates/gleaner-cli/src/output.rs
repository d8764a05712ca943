//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use gleaner_extractor::{ExtractionResult, SchemaRegistry, Violation};
use serde_json::{json, Value};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Longest cell shown in tables before truncation.
const MAX_CELL_CHARS: usize = 60;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

#[derive(Clone, Copy)]
enum Tone {
    Red,
    Green,
    Blue,
    Yellow,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Active output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format an extraction result.
    pub fn format_result(&self, result: &ExtractionResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
            OutputFormat::Table => {
                let meta = &result.metadata;
                let summary = format!(
                    "{} record(s) with schema '{}' from {} in {} call(s), {}ms{}",
                    result.len(),
                    meta.schema_name,
                    meta.model_name,
                    meta.generator_calls,
                    meta.processing_time_ms,
                    if meta.reprompted { ", re-prompted" } else { "" }
                );
                Ok(format!(
                    "{}\n{}",
                    self.format_records(&result.records)?,
                    self.info(&summary)
                ))
            }
            OutputFormat::Quiet => self.format_records(&result.records),
        }
    }

    /// Format bare records.
    pub fn format_records(&self, records: &[Value]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
            OutputFormat::Table => Ok(self.format_records_table(records)),
            OutputFormat::Quiet => {
                let lines: Vec<String> = records.iter().map(Value::to_string).collect();
                Ok(lines.join("\n"))
            }
        }
    }

    /// Records as a table, one column per top-level field in first-seen order.
    fn format_records_table(&self, records: &[Value]) -> String {
        if records.is_empty() {
            return self.paint("No records found.", Tone::Yellow);
        }

        let mut columns: Vec<&str> = Vec::new();
        for record in records {
            if let Some(fields) = record.as_object() {
                for key in fields.keys() {
                    if !columns.contains(&key.as_str()) {
                        columns.push(key);
                    }
                }
            }
        }

        let mut builder = Builder::default();
        let mut header = vec!["#".to_string()];
        header.extend(columns.iter().map(|c| c.to_string()));
        builder.push_record(header);

        for (idx, record) in records.iter().enumerate() {
            let mut row = vec![(idx + 1).to_string()];
            match record.as_object() {
                Some(fields) => {
                    row.extend(columns.iter().map(|c| {
                        fields.get(*c).map(cell_text).unwrap_or_default()
                    }));
                }
                None => {
                    row.push(cell_text(record));
                    row.extend(columns.iter().skip(1).map(|_| String::new()));
                }
            }
            builder.push_record(row);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format schema violations.
    pub fn format_violations(&self, violations: &[Violation]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let entries: Vec<Value> = violations
                    .iter()
                    .map(|v| json!({"path": v.path, "problem": v.kind.to_string()}))
                    .collect();
                Ok(serde_json::to_string_pretty(&entries)?)
            }
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Path", "Problem"]);
                for violation in violations {
                    builder.push_record([violation.path.clone(), violation.kind.to_string()]);
                }
                let mut table = builder.build();
                table.with(Style::rounded());
                Ok(format!(
                    "{}\n{}",
                    self.error(&format!("{} schema violation(s)", violations.len())),
                    table
                ))
            }
            OutputFormat::Quiet => {
                let paths: Vec<&str> = violations.iter().map(|v| v.path.as_str()).collect();
                Ok(paths.join("\n"))
            }
        }
    }

    /// Format the registered schemas.
    pub fn format_schemas(&self, registry: &SchemaRegistry) -> Result<String> {
        let mut rows = Vec::new();
        for name in registry.names() {
            let schema = registry.get(name)?;
            let items = match (schema.min_items(), schema.max_items()) {
                (None, None) => "any".to_string(),
                (min, max) => format!(
                    "{}..{}",
                    min.unwrap_or(0),
                    max.map(|m| m.to_string()).unwrap_or_default()
                ),
            };
            rows.push((
                name.to_string(),
                schema.title().unwrap_or("").to_string(),
                items,
                schema.required_fields().join(", "),
            ));
        }

        match self.format {
            OutputFormat::Json => {
                let entries: Vec<Value> = rows
                    .into_iter()
                    .map(|(name, title, items, required)| {
                        json!({"name": name, "title": title, "items": items, "required": required})
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&entries)?)
            }
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Name", "Title", "Items", "Required"]);
                for (name, title, items, required) in rows {
                    builder.push_record([name, title, items, required]);
                }
                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
            OutputFormat::Quiet => {
                let names: Vec<String> = rows.into_iter().map(|(name, ..)| name).collect();
                Ok(names.join("\n"))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.paint(&format!("✓ {}", message), Tone::Green)
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.paint(&format!("✗ {}", message), Tone::Red)
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.paint(&format!("ℹ {}", message), Tone::Blue)
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.paint(&format!("⚠ {}", message), Tone::Yellow)
    }

    fn paint(&self, text: &str, tone: Tone) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match tone {
            Tone::Red => text.red().to_string(),
            Tone::Green => text.green().to_string(),
            Tone::Blue => text.blue().to_string(),
            Tone::Yellow => text.yellow().to_string(),
        }
    }
}

/// Render a JSON value for a table cell.
fn cell_text(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    let text = text.replace('\n', " ");
    if text.chars().count() > MAX_CELL_CHARS {
        let cut: String = text.chars().take(MAX_CELL_CHARS - 1).collect();
        format!("{}…", cut)
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gleaner_extractor::{ExtractionMetadata, ViolationKind};

    fn create_test_result() -> ExtractionResult {
        ExtractionResult {
            records: vec![
                json!({"name": "Shadow Bind", "renown": "Glory", "cost": "2 Essence"}),
                json!({"name": "Cold Embrace", "renown": "Cunning", "dicePool": "Stamina + Medicine + Cunning"}),
            ],
            metadata: ExtractionMetadata {
                request_id: "01920000-0000-7000-8000-000000000000".to_string(),
                source_id: Some("core.pdf:120".to_string()),
                schema_name: "facets".to_string(),
                model_name: "llama3.2:3b".to_string(),
                timestamp: 12345678,
                generator_calls: 2,
                reprompted: true,
                recovered: false,
                processing_time_ms: 840,
            },
        }
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_result(&create_test_result()).unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["records"][1]["renown"], "Cunning");
        assert_eq!(parsed["metadata"]["generator_calls"], 2);
    }

    #[test]
    fn test_quiet_format() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter.format_result(&create_test_result()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["name"], "Shadow Bind");
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_result(&create_test_result()).unwrap();
        assert!(output.contains("renown"));
        assert!(output.contains("dicePool"));
        assert!(output.contains("Shadow Bind"));
        assert!(output.contains("2 record(s) with schema 'facets'"));
        assert!(output.contains("re-prompted"));
    }

    #[test]
    fn test_empty_records() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_records(&[]).unwrap();
        assert!(output.contains("No records found"));
    }

    #[test]
    fn test_long_cells_truncated() {
        let long = "x".repeat(200);
        let text = cell_text(&json!(long));
        assert_eq!(text.chars().count(), MAX_CELL_CHARS);
        assert!(text.ends_with('…'));
        assert_eq!(cell_text(&json!({"success": "ok"})), r#"{"success":"ok"}"#);
    }

    #[test]
    fn test_violations_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let violations = vec![Violation::new("$[0].renown", ViolationKind::MissingField)];
        let output = formatter.format_violations(&violations).unwrap();
        assert!(output.contains("1 schema violation(s)"));
        assert!(output.contains("$[0].renown"));
        assert!(output.contains("required field is missing"));
    }

    #[test]
    fn test_violations_quiet() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let violations = vec![
            Violation::new("$", ViolationKind::TooManyItems { max: 5, actual: 6 }),
            Violation::new("$[2].name", ViolationKind::MissingField),
        ];
        let output = formatter.format_violations(&violations).unwrap();
        assert_eq!(output, "$\n$[2].name");
    }

    #[test]
    fn test_schemas_listing() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_schemas(&SchemaRegistry::with_builtin()).unwrap();
        assert!(output.contains("facets"));
        assert!(output.contains("Facets"));
        assert!(output.contains("1..5"));
        assert!(output.contains("name, renown"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let msg = formatter.success("test");
        assert_eq!(msg, "✓ test");
    }
}
