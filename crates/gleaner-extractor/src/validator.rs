//! Check generator output against a schema

use crate::error::ExtractorError;
use crate::parser::parse_completion;
use crate::schema::Schema;
use serde_json::Value;
use std::fmt;

/// One violated location in a completion
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Path into the completion, `$` is the root array
    pub path: String,
    /// What went wrong at that path
    pub kind: ViolationKind,
}

impl Violation {
    /// Create a violation at `path`
    pub fn new(path: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

/// Kinds of schema violation
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationKind {
    /// A required field is absent
    MissingField,
    /// Value has the wrong JSON type
    TypeMismatch {
        /// Type (or `a|b` list of types) the schema declares
        expected: String,
        /// Type actually found
        found: &'static str,
    },
    /// Value is not one of the allowed enum members
    NotInEnum {
        /// Offending value
        found: Value,
        /// Allowed members
        allowed: Vec<Value>,
    },
    /// Array is shorter than `minItems`
    TooFewItems {
        /// Declared minimum
        min: u64,
        /// Actual length
        actual: usize,
    },
    /// Array is longer than `maxItems`
    TooManyItems {
        /// Declared maximum
        max: u64,
        /// Actual length
        actual: usize,
    },
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::MissingField => write!(f, "required field is missing"),
            ViolationKind::TypeMismatch { expected, found } => {
                write!(f, "expected {}, found {}", expected, found)
            }
            ViolationKind::NotInEnum { found, allowed } => {
                let allowed: Vec<String> = allowed.iter().map(ToString::to_string).collect();
                write!(f, "{} is not one of [{}]", found, allowed.join(", "))
            }
            ViolationKind::TooFewItems { min, actual } => {
                write!(f, "expected at least {} items, found {}", min, actual)
            }
            ViolationKind::TooManyItems { max, actual } => {
                write!(f, "expected at most {} items, found {}", max, actual)
            }
        }
    }
}

/// Records that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecords {
    /// Parsed top-level array, unmodified
    pub records: Vec<Value>,
    /// Whether the JSON had to be cut out of surrounding text
    pub recovered: bool,
}

/// Parses raw completions and checks them against a schema
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseValidator;

impl ResponseValidator {
    /// Create a validator
    pub fn new() -> Self {
        Self
    }

    /// Parse `raw` and check it against `schema`
    ///
    /// # Errors
    ///
    /// - [`ExtractorError::MalformedOutput`] if no JSON can be recovered
    /// - [`ExtractorError::SchemaViolation`] listing every violated path
    pub fn validate(&self, raw: &str, schema: &Schema) -> Result<ValidatedRecords, ExtractorError> {
        let parsed = parse_completion(raw)?;

        let violations = self.check(&parsed.value, schema);
        if !violations.is_empty() {
            return Err(ExtractorError::SchemaViolation {
                violations,
                raw: raw.to_string(),
            });
        }

        match parsed.value {
            Value::Array(records) => Ok(ValidatedRecords {
                records,
                recovered: parsed.recovered,
            }),
            // Schemas are array-rooted, so a non-array root already failed the type check
            other => Err(ExtractorError::SchemaViolation {
                violations: vec![Violation::new(
                    "$",
                    ViolationKind::TypeMismatch {
                        expected: "array".to_string(),
                        found: type_name(&other),
                    },
                )],
                raw: raw.to_string(),
            }),
        }
    }

    /// Every violation of `schema` in `value`, in document order
    pub fn check(&self, value: &Value, schema: &Schema) -> Vec<Violation> {
        let mut violations = Vec::new();
        check_value(value, schema.document(), "$", &mut violations);
        violations
    }
}

fn check_value(value: &Value, schema: &Value, path: &str, out: &mut Vec<Violation>) {
    let Some(schema) = schema.as_object() else {
        return;
    };

    if let Some(declared) = schema.get("type") {
        if !matches_type(value, declared) {
            out.push(Violation::new(
                path,
                ViolationKind::TypeMismatch {
                    expected: describe_type(declared),
                    found: type_name(value),
                },
            ));
            // Nothing below a mistyped value is meaningful
            return;
        }
    }

    if let Some(allowed) = schema.get("enum").and_then(Value::as_array) {
        if !allowed.contains(value) {
            out.push(Violation::new(
                path,
                ViolationKind::NotInEnum {
                    found: value.clone(),
                    allowed: allowed.clone(),
                },
            ));
        }
    }

    match value {
        Value::Object(fields) => {
            if let Some(required) = schema.get("required").and_then(Value::as_array) {
                for name in required.iter().filter_map(Value::as_str) {
                    if !fields.contains_key(name) {
                        out.push(Violation::new(
                            format!("{}.{}", path, name),
                            ViolationKind::MissingField,
                        ));
                    }
                }
            }

            if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
                for (name, sub_schema) in properties {
                    if let Some(field) = fields.get(name) {
                        check_value(field, sub_schema, &format!("{}.{}", path, name), out);
                    }
                }
            }
        }
        Value::Array(items) => {
            if let Some(min) = schema.get("minItems").and_then(Value::as_u64) {
                if (items.len() as u64) < min {
                    out.push(Violation::new(
                        path,
                        ViolationKind::TooFewItems {
                            min,
                            actual: items.len(),
                        },
                    ));
                }
            }
            if let Some(max) = schema.get("maxItems").and_then(Value::as_u64) {
                if (items.len() as u64) > max {
                    out.push(Violation::new(
                        path,
                        ViolationKind::TooManyItems {
                            max,
                            actual: items.len(),
                        },
                    ));
                }
            }

            if let Some(item_schema) = schema.get("items") {
                for (idx, item) in items.iter().enumerate() {
                    check_value(item, item_schema, &format!("{}[{}]", path, idx), out);
                }
            }
        }
        _ => {}
    }
}

fn matches_type(value: &Value, declared: &Value) -> bool {
    match declared {
        Value::String(name) => is_type(value, name),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .any(|name| is_type(value, name)),
        _ => true,
    }
}

fn is_type(value: &Value, name: &str) -> bool {
    match name {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => is_integer(value),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => false,
    }
}

/// Integers include floats with no fractional part, as JSON Schema requires
fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        _ => false,
    }
}

fn describe_type(declared: &Value) -> String {
    match declared {
        Value::String(name) => name.clone(),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("|"),
        other => other.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FACETS_SCHEMA, FACETS_SCHEMA_NAME};
    use serde_json::json;

    fn facets() -> Schema {
        Schema::parse(FACETS_SCHEMA_NAME, FACETS_SCHEMA).unwrap()
    }

    fn paths(err: &ExtractorError) -> Vec<&str> {
        err.violations().iter().map(|v| v.path.as_str()).collect()
    }

    #[test]
    fn test_valid_facet() {
        let raw = r#"[{"name":"Shadow Bind","renown":"Glory","cost":"2 Essence"}]"#;
        let validated = ResponseValidator::new().validate(raw, &facets()).unwrap();

        assert_eq!(validated.records.len(), 1);
        assert!(!validated.recovered);
        assert_eq!(
            validated.records[0],
            json!({"name": "Shadow Bind", "renown": "Glory", "cost": "2 Essence"})
        );
    }

    #[test]
    fn test_extra_fields_preserved() {
        let raw = r#"[{"name":"Shadow Bind","renown":"Glory","page":212}]"#;
        let validated = ResponseValidator::new().validate(raw, &facets()).unwrap();
        assert_eq!(validated.records[0]["page"], json!(212));
    }

    #[test]
    fn test_enum_violation() {
        let raw = r#"[{"name":"Shadow Bind","renown":"Mystery"}]"#;
        let err = ResponseValidator::new().validate(raw, &facets()).unwrap_err();

        assert_eq!(paths(&err), vec!["$[0].renown"]);
        assert!(matches!(
            err.violations()[0].kind,
            ViolationKind::NotInEnum { ref found, .. } if found == "Mystery"
        ));
        assert_eq!(err.raw_output(), Some(raw));
    }

    #[test]
    fn test_enum_is_case_sensitive() {
        let raw = r#"[{"name":"Shadow Bind","renown":"glory"}]"#;
        let err = ResponseValidator::new().validate(raw, &facets()).unwrap_err();
        assert_eq!(paths(&err), vec!["$[0].renown"]);
    }

    #[test]
    fn test_too_many_items() {
        let item = json!({"name": "Facet", "renown": "Honor"});
        let raw = Value::Array(vec![item; 6]).to_string();
        let err = ResponseValidator::new().validate(&raw, &facets()).unwrap_err();

        assert_eq!(paths(&err), vec!["$"]);
        assert!(matches!(
            err.violations()[0].kind,
            ViolationKind::TooManyItems { max: 5, actual: 6 }
        ));
    }

    #[test]
    fn test_empty_array_is_too_few() {
        let err = ResponseValidator::new().validate("[]", &facets()).unwrap_err();
        assert!(matches!(
            err.violations()[0].kind,
            ViolationKind::TooFewItems { min: 1, actual: 0 }
        ));
    }

    #[test]
    fn test_every_violation_reported() {
        let raw = r#"[
            {"renown": "Glory"},
            {"name": "Warding", "renown": "Wisdom", "rollResults": {"failure": "Nothing happens"}},
            {"name": 7, "renown": "Cunning"}
        ]"#;
        let err = ResponseValidator::new().validate(raw, &facets()).unwrap_err();

        assert_eq!(
            paths(&err),
            vec!["$[0].name", "$[1].rollResults.success", "$[2].name"]
        );
        assert!(matches!(
            err.violations()[2].kind,
            ViolationKind::TypeMismatch { ref expected, found: "number" } if expected == "string"
        ));
    }

    #[test]
    fn test_object_root_is_type_mismatch() {
        let err = ResponseValidator::new()
            .validate(r#"{"name":"Shadow Bind","renown":"Glory"}"#, &facets())
            .unwrap_err();
        assert_eq!(paths(&err), vec!["$"]);
    }

    #[test]
    fn test_malformed_output() {
        let err = ResponseValidator::new()
            .validate("I could not find any facets.", &facets())
            .unwrap_err();
        assert!(matches!(err, ExtractorError::MalformedOutput { .. }));
        assert_eq!(err.raw_output(), Some("I could not find any facets."));
    }

    #[test]
    fn test_recovered_output_flagged() {
        let raw = "Here is the result:\n```json\n[{\"name\":\"Shadow Bind\",\"renown\":\"Glory\"}]\n```";
        let validated = ResponseValidator::new().validate(raw, &facets()).unwrap();
        assert!(validated.recovered);
        assert_eq!(validated.records.len(), 1);
    }

    #[test]
    fn test_integer_and_type_lists() {
        let schema = Schema::parse(
            "scores",
            r#"{"type":"array","items":{"type":"object","required":["dots"],"properties":{
                "dots": {"type":"integer"},
                "note": {"type":["string","null"]}
            }}}"#,
        )
        .unwrap();
        let validator = ResponseValidator::new();

        assert!(validator
            .check(&json!([{"dots": 3, "note": null}, {"dots": 2.0}]), &schema)
            .is_empty());

        let violations = validator.check(&json!([{"dots": 2.5, "note": false}]), &schema);
        assert_eq!(violations.len(), 2);
        assert!(violations[1].to_string().contains("expected string|null, found boolean"));
    }
}
