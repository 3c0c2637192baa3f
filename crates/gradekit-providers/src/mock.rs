//! Mock judge for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use gradekit_core::traits::{JudgeRequest, JudgeVerdict, SemanticJudge};

/// A scripted semantic judge for exercising the enhanced backend without real
/// API calls.
///
/// Scores are looked up by substring of the student's answer, falling back to
/// a default score.
pub struct MockJudge {
    /// (answer substring, score) pairs, checked in order.
    scores: Vec<(String, f64)>,
    default_score: f64,
    feedback: Option<String>,
    available: bool,
    failure: Option<String>,
    delay: Duration,
    call_count: AtomicU32,
    last_request: Mutex<Option<JudgeRequest>>,
}

impl MockJudge {
    /// A judge that gives every answer the same score.
    pub fn with_fixed_score(score: f64) -> Self {
        Self {
            scores: Vec::new(),
            default_score: score,
            feedback: None,
            available: true,
            failure: None,
            delay: Duration::ZERO,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Score answers containing `needle` with `score`.
    pub fn with_score_for(mut self, needle: &str, score: f64) -> Self {
        self.scores.push((needle.to_lowercase(), score));
        self
    }

    /// Return this feedback with every verdict.
    pub fn with_feedback(mut self, feedback: &str) -> Self {
        self.feedback = Some(feedback.to_string());
        self
    }

    /// Wait this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// A judge that reports itself unavailable.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::with_fixed_score(0.0)
        }
    }

    /// A judge whose every call fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::with_fixed_score(0.0)
        }
    }

    /// Get the number of calls made to this judge.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this judge.
    pub fn last_request(&self) -> Option<JudgeRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }
}

#[async_trait]
impl SemanticJudge for MockJudge {
    fn name(&self) -> &str {
        "mock"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn judge(&self, request: &JudgeRequest) -> anyhow::Result<JudgeVerdict> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(message) = &self.failure {
            anyhow::bail!("{message}");
        }

        let answer = request.student_answer.to_lowercase();
        let score = self
            .scores
            .iter()
            .find(|(needle, _)| answer.contains(needle.as_str()))
            .map(|(_, score)| *score)
            .unwrap_or(self.default_score);

        Ok(JudgeVerdict {
            score,
            feedback: self.feedback.clone(),
            model: request.model.clone(),
            latency_ms: 1,
        })
    }
}
