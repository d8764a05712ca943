//! Schema documents and the registry that owns them
//!
//! Schemas are JSON Schema documents (a draft 2020-12 subset) describing an
//! array of records. They are loaded once at startup and shared read-only
//! through `Arc` afterwards.

use crate::error::ExtractorError;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name of the bundled example schema
pub const FACETS_SCHEMA_NAME: &str = "facets";

/// Bundled example schema: werewolf Gift Facets with renown, cost and roll results
pub const FACETS_SCHEMA: &str = include_str!("../schemas/facets.json");

const KNOWN_TYPES: [&str; 7] = [
    "array", "boolean", "integer", "null", "number", "object", "string",
];

/// An immutable, validated schema document
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    source: String,
    document: Value,
}

impl Schema {
    /// Parse and check a schema document
    ///
    /// The source text is kept verbatim so prompts can embed it unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::SchemaParse`] listing every structural problem.
    pub fn parse(name: impl Into<String>, source: impl Into<String>) -> Result<Self, ExtractorError> {
        let name = name.into();
        let source = source.into();

        let document: Value = serde_json::from_str(&source).map_err(|e| ExtractorError::SchemaParse {
            name: name.clone(),
            reason: format!("not valid JSON: {}", e),
        })?;

        let problems = check_document(&document);
        if !problems.is_empty() {
            return Err(ExtractorError::SchemaParse {
                name,
                reason: problems.join("; "),
            });
        }

        Ok(Self {
            name,
            source,
            document,
        })
    }

    /// Registry name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source text, verbatim
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parsed document
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Top-level `title`, if declared
    pub fn title(&self) -> Option<&str> {
        self.document.get("title").and_then(Value::as_str)
    }

    /// Schema applied to every array item
    pub fn item_schema(&self) -> Option<&Map<String, Value>> {
        self.document.get("items").and_then(Value::as_object)
    }

    /// Declared `minItems`
    pub fn min_items(&self) -> Option<u64> {
        self.document.get("minItems").and_then(Value::as_u64)
    }

    /// Declared `maxItems`
    pub fn max_items(&self) -> Option<u64> {
        self.document.get("maxItems").and_then(Value::as_u64)
    }

    /// Fields every item must carry
    pub fn required_fields(&self) -> Vec<&str> {
        self.item_schema()
            .and_then(|items| items.get("required"))
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Where a schema comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// A file on disk, registered under its file stem
    File(PathBuf),

    /// An in-memory document
    Inline {
        /// Registry name
        name: String,
        /// Document text
        text: String,
    },
}

impl SchemaSource {
    /// Schema read from a file
    pub fn file(path: impl Into<PathBuf>) -> Self {
        SchemaSource::File(path.into())
    }

    /// Schema held in memory
    pub fn inline(name: impl Into<String>, text: impl Into<String>) -> Self {
        SchemaSource::Inline {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Holds the schemas known to the pipeline
///
/// Populate it at startup, then wrap it in an `Arc` and share it; lookups
/// never mutate.
///
/// # Examples
///
/// ```
/// use gleaner_extractor::{SchemaRegistry, SchemaSource};
///
/// let mut registry = SchemaRegistry::with_builtin();
/// registry
///     .load(SchemaSource::inline("tags", r#"{"type": "array", "items": {"type": "object", "required": ["tag"]}}"#))
///     .unwrap();
///
/// assert!(registry.get("facets").is_ok());
/// assert!(registry.get("tags").is_ok());
/// assert!(registry.get("spells").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Arc<Schema>>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the bundled `facets` schema
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        // The bundled document is checked by the test suite
        if let Ok(schema) = Schema::parse(FACETS_SCHEMA_NAME, FACETS_SCHEMA) {
            registry.insert(schema);
        }
        registry
    }

    /// Load a schema and register it
    ///
    /// A schema loaded under an existing name replaces the earlier one.
    pub fn load(&mut self, source: SchemaSource) -> Result<Arc<Schema>, ExtractorError> {
        let schema = match source {
            SchemaSource::File(path) => {
                let name = schema_name_for(&path)?;
                let text = std::fs::read_to_string(&path)?;
                debug!("Read schema '{}' from {}", name, path.display());
                Schema::parse(name, text)?
            }
            SchemaSource::Inline { name, text } => Schema::parse(name, text)?,
        };

        info!("Registered schema '{}'", schema.name());
        Ok(self.insert(schema))
    }

    /// Look up a schema by name
    pub fn get(&self, name: &str) -> Result<Arc<Schema>, ExtractorError> {
        self.schemas
            .get(name)
            .cloned()
            .ok_or_else(|| ExtractorError::SchemaNotFound(name.to_string()))
    }

    /// Whether a schema is registered under this name
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }

    /// Number of registered schemas
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether no schema is registered
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    fn insert(&mut self, schema: Schema) -> Arc<Schema> {
        let schema = Arc::new(schema);
        if let Some(previous) = self
            .schemas
            .insert(schema.name().to_string(), Arc::clone(&schema))
        {
            warn!("Schema '{}' replaced an earlier registration", previous.name());
        }
        schema
    }
}

fn schema_name_for(path: &Path) -> Result<String, ExtractorError> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| ExtractorError::SchemaParse {
            name: path.display().to_string(),
            reason: "file name is not valid UTF-8".to_string(),
        })
}

/// Structural checks on a whole document; empty when well-formed
fn check_document(document: &Value) -> Vec<String> {
    let mut problems = Vec::new();

    let Some(root) = document.as_object() else {
        problems.push("#: schema must be a JSON object".to_string());
        return problems;
    };

    match root.get("type") {
        Some(Value::String(t)) if t == "array" => {}
        Some(other) => problems.push(format!("#/type: top-level type must be \"array\", found {}", other)),
        None => problems.push("#/type: top-level type must be declared as \"array\"".to_string()),
    }

    match root.get("items") {
        None => problems.push("#/items: item schema must be declared".to_string()),
        Some(Value::Object(items)) if !items.contains_key("required") => {
            problems.push("#/items/required: item schema must declare required fields".to_string())
        }
        Some(_) => {}
    }

    check_node(document, "#", &mut problems);
    problems
}

/// Structural checks on one schema node and its children
fn check_node(node: &Value, at: &str, problems: &mut Vec<String>) {
    let Some(obj) = node.as_object() else {
        problems.push(format!("{}: schema must be an object", at));
        return;
    };

    if let Some(t) = obj.get("type") {
        let valid = match t {
            Value::String(name) => KNOWN_TYPES.contains(&name.as_str()),
            Value::Array(names) => {
                !names.is_empty()
                    && names
                        .iter()
                        .all(|n| n.as_str().is_some_and(|n| KNOWN_TYPES.contains(&n)))
            }
            _ => false,
        };
        if !valid {
            problems.push(format!("{}/type: unknown type {}", at, t));
        }
    }

    if let Some(required) = obj.get("required") {
        let valid = required
            .as_array()
            .is_some_and(|fields| fields.iter().all(Value::is_string));
        if !valid {
            problems.push(format!("{}/required: must be an array of strings", at));
        }
    }

    if let Some(values) = obj.get("enum") {
        if !values.as_array().is_some_and(|v| !v.is_empty()) {
            problems.push(format!("{}/enum: must be a non-empty array", at));
        }
    }

    if let Some(properties) = obj.get("properties") {
        match properties.as_object() {
            Some(properties) => {
                for (key, sub) in properties {
                    check_node(sub, &format!("{}/properties/{}", at, key), problems);
                }
            }
            None => problems.push(format!("{}/properties: must be an object", at)),
        }
    }

    if let Some(items) = obj.get("items") {
        check_node(items, &format!("{}/items", at), problems);
    }

    let min = check_count(obj, "minItems", at, problems);
    let max = check_count(obj, "maxItems", at, problems);
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            problems.push(format!("{}: minItems {} exceeds maxItems {}", at, min, max));
        }
    }
}

fn check_count(
    obj: &Map<String, Value>,
    key: &str,
    at: &str,
    problems: &mut Vec<String>,
) -> Option<u64> {
    let value = obj.get(key)?;
    let count = value.as_u64();
    if count.is_none() {
        problems.push(format!("{}/{}: must be a non-negative integer", at, key));
    }
    count
}
