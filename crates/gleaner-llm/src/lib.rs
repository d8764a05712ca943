//! Gleaner LLM Provider Layer
//!
//! Pluggable text generation backends.
//!
//! # Architecture
//!
//! This crate provides implementations of the `TextGenerator` trait from `gleaner-domain`.
//! It supports multiple LLM backends with a common interface.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic, scriptable mock for testing
//! - `OllamaProvider`: Local Ollama chat API integration
//!
//! # Examples
//!
//! ```
//! use gleaner_llm::MockProvider;
//! use gleaner_domain::{GenerationParams, TextGenerator};
//!
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.complete("test prompt", &GenerationParams::default()).unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! ```

#![warn(missing_docs)]

pub mod ollama;

use gleaner_domain::{GenerationError, GenerationParams, TextGenerator};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use thiserror::Error;

pub use ollama::OllamaProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Request did not complete before its deadline
    #[error("Request timed out")]
    Timeout,

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl From<LlmError> for GenerationError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Timeout => GenerationError::Timeout,
            other => GenerationError::Unavailable(other.to_string()),
        }
    }
}

type Outcome = Result<String, GenerationError>;

/// Mock LLM provider for deterministic testing
///
/// This provider returns pre-configured responses without making any network calls.
/// Scripted outcomes are consumed first, in order; after that, per-prompt responses
/// are matched, and finally the default response is returned.
///
/// # Examples
///
/// ```
/// use gleaner_llm::MockProvider;
/// use gleaner_domain::{GenerationError, GenerationParams, TextGenerator};
///
/// let params = GenerationParams::default();
///
/// // Simple fixed response
/// let provider = MockProvider::new("Fixed response");
/// assert_eq!(provider.complete("any prompt", &params).unwrap(), "Fixed response");
///
/// // Multiple responses
/// let mut provider = MockProvider::default();
/// provider.add_response("prompt1", "response1");
/// provider.add_response("prompt2", "response2");
/// assert_eq!(provider.complete("prompt1", &params).unwrap(), "response1");
/// assert_eq!(provider.complete("prompt2", &params).unwrap(), "response2");
///
/// // Scripted failures, then success
/// let provider = MockProvider::new("[]")
///     .then_fail(GenerationError::Timeout)
///     .then_respond("[1]");
/// assert_eq!(provider.complete("p", &params), Err(GenerationError::Timeout));
/// assert_eq!(provider.complete("p", &params).unwrap(), "[1]");
/// assert_eq!(provider.complete("p", &params).unwrap(), "[]");
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, Outcome>>>,
    script: Arc<Mutex<VecDeque<Outcome>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            script: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Queue a successful response to be returned by the next unscripted call
    pub fn then_respond(self, response: impl Into<String>) -> Self {
        lock(&self.script).push_back(Ok(response.into()));
        self
    }

    /// Queue a failure to be returned by the next unscripted call
    pub fn then_fail(self, error: GenerationError) -> Self {
        lock(&self.script).push_back(Err(error));
        self
    }

    /// Sleep for the given duration on every call (simulates slow inference)
    ///
    /// A call whose deadline falls inside the delay sleeps only until the
    /// deadline and then fails with [`GenerationError::Timeout`].
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add a specific response for a given prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        lock(&self.responses).insert(prompt.into(), Ok(response.into()));
    }

    /// Configure to return an error for a specific prompt
    pub fn add_error(&mut self, prompt: impl Into<String>, error: GenerationError) {
        lock(&self.responses).insert(prompt.into(), Err(error));
    }

    /// Get the number of times the provider was called
    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    /// Reset the call history
    pub fn reset_call_count(&self) {
        lock(&self.prompts).clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl TextGenerator for MockProvider {
    fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, GenerationError> {
        lock(&self.prompts).push(prompt.to_string());

        if let Some(delay) = self.delay {
            let remaining = params
                .deadline
                .map(|deadline| deadline.saturating_duration_since(Instant::now()));
            match remaining {
                Some(remaining) if remaining < delay => {
                    std::thread::sleep(remaining);
                    return Err(GenerationError::Timeout);
                }
                _ => std::thread::sleep(delay),
            }
        }

        if let Some(outcome) = lock(&self.script).pop_front() {
            return outcome;
        }

        // Check if we have a specific response for this prompt
        if let Some(outcome) = lock(&self.responses).get(prompt) {
            return outcome.clone();
        }

        Ok(self.default_response.clone())
    }
}

/// Lock a mock's shared state, ignoring poisoning from panicking test threads
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> GenerationParams {
        GenerationParams::default()
    }

    #[test]
    fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.complete("any prompt", &params());
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "Test response");
    }

    #[test]
    fn test_mock_provider_specific_responses() {
        let mut provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(provider.complete("hello", &params()).unwrap(), "world");
        assert_eq!(provider.complete("foo", &params()).unwrap(), "bar");
        assert_eq!(provider.complete("unknown", &params()).unwrap(), "Default mock response");
    }

    #[test]
    fn test_mock_provider_call_count() {
        let provider = MockProvider::new("test");

        assert_eq!(provider.call_count(), 0);

        provider.complete("prompt1", &params()).unwrap();
        assert_eq!(provider.call_count(), 1);

        provider.complete("prompt2", &params()).unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.prompts(), vec!["prompt1", "prompt2"]);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn test_mock_provider_error() {
        let mut provider = MockProvider::default();
        provider.add_error("bad prompt", GenerationError::Unavailable("Mock error".to_string()));

        let result = provider.complete("bad prompt", &params());
        assert!(matches!(result, Err(GenerationError::Unavailable(_))));
    }

    #[test]
    fn test_mock_provider_script_order() {
        let provider = MockProvider::new("fallback")
            .then_fail(GenerationError::Timeout)
            .then_fail(GenerationError::Unavailable("busy".to_string()))
            .then_respond("third");

        assert_eq!(provider.complete("p", &params()), Err(GenerationError::Timeout));
        assert!(matches!(
            provider.complete("p", &params()),
            Err(GenerationError::Unavailable(_))
        ));
        assert_eq!(provider.complete("p", &params()).unwrap(), "third");
        assert_eq!(provider.complete("p", &params()).unwrap(), "fallback");
        assert_eq!(provider.call_count(), 4);
    }

    #[test]
    fn test_mock_provider_honors_deadline() {
        let provider = MockProvider::new("late").with_delay(Duration::from_millis(500));
        let params = GenerationParams::default().with_timeout(Duration::from_millis(20));

        let started = Instant::now();
        assert_eq!(provider.complete("p", &params), Err(GenerationError::Timeout));
        assert!(started.elapsed() < Duration::from_millis(500));

        let relaxed = GenerationParams::default().with_timeout(Duration::from_secs(5));
        let fast = MockProvider::new("on time").with_delay(Duration::from_millis(10));
        assert_eq!(fast.complete("p", &relaxed).unwrap(), "on time");
    }

    #[test]
    fn test_mock_provider_structured() {
        let provider = MockProvider::new("structured response");
        let result = provider.complete_structured("prompt", "{}", &params());
        assert_eq!(result.unwrap(), "structured response");
    }

    #[test]
    fn test_mock_provider_clone() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.complete("test", &params()).unwrap();

        // Both should share the same call history due to Arc
        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }

    #[test]
    fn test_llm_error_conversion() {
        assert_eq!(GenerationError::from(LlmError::Timeout), GenerationError::Timeout);
        assert_eq!(
            GenerationError::from(LlmError::ModelNotAvailable("llama".to_string())),
            GenerationError::Unavailable("Model not available: llama".to_string())
        );
        assert!(matches!(
            GenerationError::from(LlmError::RateLimitExceeded),
            GenerationError::Unavailable(_)
        ));
    }
}
