//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use gleaner_extractor::{ExtractorConfig, SchemaRegistry, SchemaSource};
use gleaner_llm::ollama::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Generator backend
    #[serde(default)]
    pub generator: GeneratorSettings,

    /// Extraction pipeline settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Extra schemas, by name
    #[serde(default)]
    pub schemas: BTreeMap<String, PathBuf>,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Generator backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// Ollama endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home =
            dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".gleaner").join("config.toml"))
    }

    /// Load configuration from an explicit path, or the default one.
    ///
    /// A missing default file yields the default configuration; a missing
    /// explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Self::load_from(path)
            }
            None => {
                let path = Self::path()?;
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    debug!("No config at {}, using defaults", path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check the extractor settings.
    pub fn validate(&self) -> Result<()> {
        self.extractor.validate().map_err(CliError::Config)
    }

    /// Registry with the bundled schemas plus every configured one.
    ///
    /// Configured schemas are registered under their config key, not their
    /// file name.
    pub fn registry(&self) -> Result<SchemaRegistry> {
        let mut registry = SchemaRegistry::with_builtin();
        for (name, path) in &self.schemas {
            let text = fs::read_to_string(path).map_err(|e| {
                CliError::Config(format!("Schema '{}' at {}: {}", name, path.display(), e))
            })?;
            registry.load(SchemaSource::inline(name.clone(), text))?;
        }
        Ok(registry)
    }
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.generator.endpoint, "http://localhost:11434");
        assert_eq!(config.generator.model, "llama3.2:3b");
        assert!(config.schemas.is_empty());
        assert!(config.settings.color);
        assert_eq!(config.settings.format, OutputFormat::Table);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.generator.model = "mistral".to_string();
        config.extractor.max_retries = 5;
        config.settings.format = OutputFormat::Json;
        config.save_to(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.generator.model, "mistral");
        assert_eq!(loaded.extractor.max_retries, 5);
        assert_eq!(loaded.settings.format, OutputFormat::Json);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[generator]\nmodel = \"mistral\"\n\n[extractor]\nconstrained_generation = true\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.generator.model, "mistral");
        assert_eq!(config.generator.endpoint, DEFAULT_ENDPOINT);
        assert!(config.extractor.constrained_generation);
        assert_eq!(config.extractor.max_tokens, 512);
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = Config::load(Some(Path::new("/no/such/gleaner.toml")));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_invalid_extractor_settings_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[extractor]\nmax_tokens = 0\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(CliError::Config(_))));
    }

    #[test]
    fn test_registry_includes_configured_schemas() {
        let dir = tempfile::tempdir().unwrap();
        let schema_path = dir.path().join("merits-v2.json");
        fs::write(&schema_path, r#"{"type":"array","items":{"type":"object","required":["name"]}}"#).unwrap();

        let mut config = Config::default();
        config.schemas.insert("merits".to_string(), schema_path);

        let registry = config.registry().unwrap();
        assert_eq!(registry.names(), vec!["facets", "merits"]);
    }

    #[test]
    fn test_registry_reports_missing_schema_file() {
        let mut config = Config::default();
        config
            .schemas
            .insert("gone".to_string(), PathBuf::from("/no/such/schema.json"));

        let err = config.registry().unwrap_err();
        assert!(err.to_string().contains("gone"));
    }
}
