//! Ollama Provider Implementation
//!
//! Provides integration with Ollama's local chat API, so extraction can run
//! against a locally hosted model.
//!
//! # Features
//!
//! - Async HTTP communication with the Ollama `/api/chat` endpoint
//! - Configurable endpoint and model
//! - Schema-constrained decoding through the request `format` field
//! - Per-call deadline mapped onto the HTTP request timeout
//!
//! Retries are not performed here; the extraction pipeline owns the retry policy.
//!
//! # Examples
//!
//! ```no_run
//! use gleaner_llm::OllamaProvider;
//!
//! // Create an Ollama provider
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3.2:3b").unwrap();
//!
//! // `chat` is async; the `TextGenerator` impl is a blocking wrapper meant
//! // to be called from a blocking thread.
//! ```

use crate::LlmError;
use gleaner_domain::{GenerationError, GenerationParams, TextGenerator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default model, small enough to run on a laptop
pub const DEFAULT_MODEL: &str = "llama3.2:3b";

/// Default timeout for LLM requests without a caller deadline (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Ollama API provider for local LLM inference
///
/// This provider communicates with a local Ollama instance to generate text.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

/// Request body for the Ollama chat API
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    num_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Response from the Ollama chat API
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "llama3.2:3b", "mistral")
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        // Each blocking call drives its own runtime, so pooled connections
        // cannot be shared between calls.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
        })
    }

    /// Create a new Ollama provider on the default endpoint
    ///
    /// Uses `http://localhost:11434` as endpoint and requires a model name.
    pub fn default_endpoint(model: impl Into<String>) -> Result<Self, LlmError> {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Model name sent with every request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// API endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send a single-message chat request
    ///
    /// # Parameters
    ///
    /// - `prompt`: User message content
    /// - `format`: Optional JSON schema constraining the output
    /// - `params`: Token budget, deadline and temperature
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Ollama is not running
    /// - Model is not available
    /// - The deadline passes before a response arrives
    /// - Response format is invalid
    pub async fn chat(
        &self,
        prompt: &str,
        format: Option<Value>,
        params: &GenerationParams,
    ) -> Result<String, LlmError> {
        if params.is_expired() {
            return Err(LlmError::Timeout);
        }

        let url = format!("{}/api/chat", self.endpoint);

        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
            options: ChatOptions {
                num_predict: params.max_tokens,
                temperature: params.temperature,
            },
            format,
        };

        let mut request = self.client.post(&url).json(&request_body);
        if let Some(remaining) = params.remaining() {
            request = request.timeout(remaining);
        }

        debug!("Sending chat request to {} (model {})", url, self.model);

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimitExceeded);
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!("Ollama returned HTTP {}", status);
            return Err(LlmError::Communication(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        Ok(chat.message.content)
    }

    /// Run a chat request to completion on a private runtime
    fn chat_blocking(
        &self,
        prompt: &str,
        format: Option<Value>,
        params: &GenerationParams,
    ) -> Result<String, LlmError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to start runtime: {}", e)))?;

        runtime.block_on(self.chat(prompt, format, params))
    }
}

fn map_transport_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Communication(format!("Request failed: {}", e))
    }
}

impl TextGenerator for OllamaProvider {
    fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, GenerationError> {
        // Blocking wrapper for async function
        Ok(self.chat_blocking(prompt, None, params)?)
    }

    fn complete_structured(
        &self,
        prompt: &str,
        schema: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError> {
        let format: Value = serde_json::from_str(schema).map_err(|e| {
            GenerationError::Unavailable(format!("Schema is not valid JSON: {}", e))
        })?;
        Ok(self.chat_blocking(prompt, Some(format), params)?)
    }
}
