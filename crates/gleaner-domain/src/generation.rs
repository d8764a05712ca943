//! Generation module - parameters and failures of a single completion call

use std::fmt;
use std::time::{Duration, Instant};

/// Default completion length, in tokens
pub const DEFAULT_MAX_TOKENS: u32 = 512;

/// Parameters for a single call to a [`TextGenerator`](crate::TextGenerator)
///
/// The deadline is an absolute point in time chosen by the caller. Backends
/// should stop waiting once it passes and report [`GenerationError::Timeout`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Upper bound on the number of generated tokens
    pub max_tokens: u32,

    /// Caller-specified deadline for this call
    pub deadline: Option<Instant>,

    /// Sampling temperature (backend default when `None`)
    pub temperature: Option<f32>,
}

impl GenerationParams {
    /// Create parameters with the given token budget and no deadline
    ///
    /// # Examples
    ///
    /// ```
    /// use gleaner_domain::GenerationParams;
    ///
    /// let params = GenerationParams::new(256);
    /// assert_eq!(params.max_tokens, 256);
    /// assert!(params.deadline.is_none());
    /// ```
    pub fn new(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            deadline: None,
            temperature: None,
        }
    }

    /// Set a deadline relative to now
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Set an absolute deadline
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Time left before the deadline
    ///
    /// Returns `None` when no deadline is set and `Some(Duration::ZERO)`
    /// once the deadline has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Whether the deadline has already passed
    pub fn is_expired(&self) -> bool {
        matches!(self.remaining(), Some(d) if d.is_zero())
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TOKENS)
    }
}

/// Failure of a text generation call
///
/// Both variants are transient: the same request may succeed if retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The call did not finish before its deadline
    Timeout,

    /// The backend could not serve the request
    Unavailable(String),
}

impl GenerationError {
    /// Whether the failure is worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::Timeout | GenerationError::Unavailable(_) => true,
        }
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Timeout => write!(f, "generation timed out"),
            GenerationError::Unavailable(reason) => {
                write!(f, "generation unavailable: {}", reason)
            }
        }
    }
}

impl std::error::Error for GenerationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = GenerationParams::default();
        assert_eq!(params.max_tokens, DEFAULT_MAX_TOKENS);
        assert!(params.deadline.is_none());
        assert!(params.temperature.is_none());
        assert!(params.remaining().is_none());
        assert!(!params.is_expired());
    }

    #[test]
    fn test_timeout_sets_future_deadline() {
        let params = GenerationParams::new(64).with_timeout(Duration::from_secs(60));
        let remaining = params.remaining().unwrap();
        assert!(remaining > Duration::from_secs(50));
        assert!(!params.is_expired());
    }

    #[test]
    fn test_past_deadline_is_expired() {
        let past = Instant::now()
            .checked_sub(Duration::from_millis(10))
            .unwrap_or_else(Instant::now);
        let params = GenerationParams::new(64).with_deadline(past);
        assert_eq!(params.remaining(), Some(Duration::ZERO));
        assert!(params.is_expired());
    }

    #[test]
    fn test_errors_are_transient() {
        assert!(GenerationError::Timeout.is_transient());
        assert!(GenerationError::Unavailable("down".to_string()).is_transient());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(GenerationError::Timeout.to_string(), "generation timed out");
        assert_eq!(
            GenerationError::Unavailable("connection refused".to_string()).to_string(),
            "generation unavailable: connection refused"
        );
    }
}
