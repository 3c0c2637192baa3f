//! Grading error types.
//!
//! Only two things can go wrong at the engine level: the caller handed over a
//! malformed answer key, or the enhanced backend could not produce a verdict.
//! Everything else (missing answers, empty model answers, empty keyword sets)
//! is absorbed into score defaults.

use thiserror::Error;

/// Errors produced by the grading engine and its backends.
#[derive(Debug, Error)]
pub enum GradingError {
    /// The answer key is structurally malformed. Not retryable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The enhanced backend cannot be reached, configured, or timed out.
    ///
    /// The backend selector recovers from this by falling back to the
    /// standard backend; callers of the selector never see it.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl GradingError {
    /// Returns `true` if the selector may recover from this error by
    /// falling back to the standard backend.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, GradingError::BackendUnavailable(_))
    }
}
