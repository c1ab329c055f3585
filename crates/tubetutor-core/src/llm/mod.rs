//! LLM providers
//!
//! Tutorial text is produced by a single prompt-in, text-out call. The
//! [`LlmProvider`] trait is the seam the pipeline depends on; Gemini is the
//! shipped implementation.

mod http_utils;
/// Implementations of specific LLM providers
pub mod providers;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during LLM operations
#[derive(Debug, Error)]
pub enum LlmError {
    /// Error returned by the provider's API
    #[error("API error: {0}")]
    ApiError(String),
    /// Error during network communication
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Error during JSON serialization or deserialization
    #[error("JSON error: {0}")]
    JsonError(String),
    /// Rate limit exceeded (429), optionally with a wait time
    #[error("Rate limit exceeded: {message} (wait: {wait_secs:?}s)")]
    RateLimit {
        /// Retry-After duration in seconds, if provided by the server
        wait_secs: Option<u64>,
        /// Error message from the server
        message: String,
    },
    /// The model returned no text, e.g. a blocked or empty candidate
    #[error("Empty response: {0}")]
    EmptyResponse(String),
}

/// Text generator used for tutorials
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for a single prompt
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}
