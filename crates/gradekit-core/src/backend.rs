//! Evaluation backend selection with transparent fallback.
//!
//! Backends are a closed set of variants behind one [`Evaluator`] interface.
//! The caller picks an [`EvaluationMode`]; if the enhanced backend is asked
//! for but cannot deliver, the selector grades with the standard backend and
//! records the fallback in the result metadata instead of failing.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::engine::StandardEvaluator;
use crate::enhanced::EnhancedEvaluator;
use crate::error::GradingError;
use crate::model::{AnswerKey, BackendKind, EvaluationMetadata, EvaluationResult, Submission};
use crate::traits::Evaluator;

/// Requested evaluation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EvaluationMode {
    #[default]
    Standard,
    Enhanced,
}

impl EvaluationMode {
    /// Parse a mode string, treating anything unrecognized as `Standard`.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_else(|e: String| {
            tracing::warn!("{e}, using standard evaluation");
            EvaluationMode::Standard
        })
    }

    /// The backend this mode asks for.
    pub fn backend_kind(self) -> BackendKind {
        match self {
            EvaluationMode::Standard => BackendKind::Standard,
            EvaluationMode::Enhanced => BackendKind::Enhanced,
        }
    }
}

impl fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationMode::Standard => write!(f, "standard"),
            EvaluationMode::Enhanced => write!(f, "enhanced"),
        }
    }
}

impl FromStr for EvaluationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" | "heuristic" => Ok(EvaluationMode::Standard),
            "enhanced" | "llm" | "semantic" => Ok(EvaluationMode::Enhanced),
            other => Err(format!("unknown evaluation mode: {other}")),
        }
    }
}

/// One evaluation backend.
#[derive(Debug, Clone)]
pub enum Backend {
    Standard(StandardEvaluator),
    Enhanced(EnhancedEvaluator),
}

impl Backend {
    /// Whether this backend can currently be used.
    pub fn is_available(&self) -> bool {
        match self {
            Backend::Standard(_) => true,
            Backend::Enhanced(e) => e.is_available(),
        }
    }
}

#[async_trait]
impl Evaluator for Backend {
    fn kind(&self) -> BackendKind {
        match self {
            Backend::Standard(e) => e.kind(),
            Backend::Enhanced(e) => e.kind(),
        }
    }

    async fn evaluate(
        &self,
        key: &AnswerKey,
        submission: &Submission,
    ) -> Result<EvaluationResult, GradingError> {
        match self {
            Backend::Standard(e) => e.evaluate(key, submission).await,
            Backend::Enhanced(e) => e.evaluate(key, submission).await,
        }
    }
}

/// Picks a backend per request and falls back to standard when needed.
#[derive(Debug, Clone)]
pub struct BackendSelector {
    standard: Backend,
    enhanced: Option<Backend>,
}

impl Default for BackendSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendSelector {
    /// A selector with only the standard backend. Enhanced requests fall back.
    pub fn new() -> Self {
        Self {
            standard: Backend::Standard(StandardEvaluator),
            enhanced: None,
        }
    }

    /// A selector that can serve enhanced requests.
    pub fn with_enhanced(enhanced: EnhancedEvaluator) -> Self {
        Self {
            enhanced: Some(Backend::Enhanced(enhanced)),
            ..Self::new()
        }
    }

    /// Whether enhanced requests would currently be served by the enhanced backend.
    pub fn enhanced_available(&self) -> bool {
        self.enhanced.as_ref().is_some_and(Backend::is_available)
    }

    /// Grade a submission in the requested mode.
    ///
    /// Enhanced-mode failures caused by the backend itself never reach the
    /// caller; a malformed answer key still does.
    pub async fn evaluate(
        &self,
        mode: EvaluationMode,
        key: &AnswerKey,
        submission: &Submission,
    ) -> Result<EvaluationResult, GradingError> {
        let enhanced = match mode {
            EvaluationMode::Standard => return self.standard.evaluate(key, submission).await,
            EvaluationMode::Enhanced => self.enhanced.as_ref(),
        };

        let attempt = match enhanced {
            None => Err(GradingError::BackendUnavailable(
                "no semantic judge configured".into(),
            )),
            Some(backend) if !backend.is_available() => Err(GradingError::BackendUnavailable(
                "semantic judge is not available".into(),
            )),
            Some(backend) => backend.evaluate(key, submission).await,
        };

        match attempt {
            Ok(result) => Ok(result),
            Err(GradingError::BackendUnavailable(reason)) => {
                tracing::warn!(%reason, "enhanced backend unavailable, falling back to standard");
                let mut result = self.standard.evaluate(key, submission).await?;
                result.metadata = EvaluationMetadata {
                    requested_backend: BackendKind::Enhanced,
                    fallback: true,
                    fallback_reason: Some(reason),
                    ..EvaluationMetadata::direct(BackendKind::Standard)
                };
                Ok(result)
            }
            Err(e) => Err(e),
        }
    }
}
