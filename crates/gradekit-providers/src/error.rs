//! Judge error types.

use thiserror::Error;

/// Errors that can occur when calling a semantic judge's API.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// No API key was configured.
    #[error("no API key configured for {0}")]
    MissingApiKey(&'static str),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The judge replied, but not with a usable score.
    #[error("unparseable verdict: {0}")]
    UnparseableVerdict(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Truncate a judge reply for inclusion in an error message.
    pub(crate) fn unparseable(reply: &str) -> Self {
        const MAX: usize = 120;
        let snippet: String = reply.chars().take(MAX).collect();
        if reply.chars().count() > MAX {
            ProviderError::UnparseableVerdict(format!("{snippet}..."))
        } else {
            ProviderError::UnparseableVerdict(snippet)
        }
    }
}
