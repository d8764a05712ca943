//! Configuration for the extraction pipeline

use gleaner_domain::DEFAULT_MAX_TOKENS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the extraction pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum input text length (bytes)
    pub max_text_length: usize,

    /// Token budget per completion
    pub max_tokens: u32,

    /// Sampling temperature, generator default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Deadline for a single generator call (seconds)
    pub generation_timeout_secs: u64,

    /// Retries after a timeout or unavailable generator
    pub max_retries: u32,

    /// Backoff before the first retry (milliseconds), doubled per attempt
    pub retry_backoff_ms: u64,

    /// Upper bound on a single backoff (milliseconds)
    pub max_backoff_ms: u64,

    /// Re-prompt once with the rejection reason when output is invalid
    pub reprompt_on_invalid: bool,

    /// Pass the schema to generators that support constrained decoding
    pub constrained_generation: bool,
}

impl ExtractorConfig {
    /// Get the per-call deadline as a Duration
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Backoff before retry number `attempt` (0-based): `base * 2^attempt`, capped
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let millis = self
            .retry_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than 0".to_string());
        }
        if self.generation_timeout_secs == 0 {
            return Err("generation_timeout_secs must be greater than 0".to_string());
        }
        if self.max_backoff_ms < self.retry_backoff_ms {
            return Err("max_backoff_ms cannot be less than retry_backoff_ms".to_string());
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(format!("temperature must be within 0.0..=2.0, got {}", t));
            }
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            max_text_length: 50_000,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            generation_timeout_secs: 120,
            max_retries: 2,
            retry_backoff_ms: 500,
            max_backoff_ms: 8_000,
            reprompt_on_invalid: true,
            constrained_generation: false,
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: short deadlines, one retry, no re-prompt
    pub fn aggressive() -> Self {
        Self {
            max_text_length: 20_000,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: Some(0.0),
            generation_timeout_secs: 30,
            max_retries: 1,
            retry_backoff_ms: 250,
            max_backoff_ms: 1_000,
            reprompt_on_invalid: false,
            constrained_generation: false,
        }
    }

    /// Lenient preset: long deadlines, more retries, larger outputs
    pub fn lenient() -> Self {
        Self {
            max_text_length: 100_000,
            max_tokens: 2_048,
            temperature: Some(0.5),
            generation_timeout_secs: 300,
            max_retries: 4,
            retry_backoff_ms: 1_000,
            max_backoff_ms: 30_000,
            reprompt_on_invalid: true,
            constrained_generation: false,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
