//! Core trait definitions for evaluation backends and semantic judges.
//!
//! `Evaluator` is the capability every backend implements. `SemanticJudge` is
//! the seam the enhanced backend calls out through; it is implemented by the
//! `gradekit-providers` crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GradingError;
use crate::model::{AnswerKey, BackendKind, EvaluationResult, Submission};

// ---------------------------------------------------------------------------
// Evaluator trait
// ---------------------------------------------------------------------------

/// A backend that grades a submission against an answer key.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> BackendKind;

    /// Grade a submission.
    async fn evaluate(
        &self,
        key: &AnswerKey,
        submission: &Submission,
    ) -> Result<EvaluationResult, GradingError>;
}

// ---------------------------------------------------------------------------
// Semantic judge trait
// ---------------------------------------------------------------------------

/// A model-backed scorer that judges how well a short answer matches the
/// model answer.
#[async_trait]
pub trait SemanticJudge: Send + Sync {
    /// Human-readable judge name (e.g. "anthropic").
    fn name(&self) -> &str;

    /// Whether the judge is usable at all (credentials present, etc.).
    fn is_available(&self) -> bool;

    /// Judge one answer.
    async fn judge(&self, request: &JudgeRequest) -> anyhow::Result<JudgeVerdict>;
}

/// One short answer to be judged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeRequest {
    /// Model identifier (e.g. "claude-haiku-4-5").
    pub model: String,
    /// Question text.
    pub question: String,
    /// The examiner's model answer.
    pub model_answer: String,
    /// The student's answer.
    pub student_answer: String,
    /// Maximum marks, for the judge's context only.
    pub marks: f64,
    /// Maximum tokens in the judge's reply.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// A judge's verdict on one answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeVerdict {
    /// Quality score in `[0, 1]`.
    pub score: f64,
    /// Optional feedback for the student.
    #[serde(default)]
    pub feedback: Option<String>,
    /// Model that actually produced the verdict.
    pub model: String,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

// ---------------------------------------------------------------------------
// Judge prompt
// ---------------------------------------------------------------------------

/// System prompt sent to every semantic judge.
pub const JUDGE_SYSTEM_PROMPT: &str = "You are an exam grader. Compare the student's answer with the model answer and judge how much of the required understanding it shows. Reward correct meaning even when the wording differs. Respond ONLY with a JSON object of the form {\"score\": <number between 0 and 1>, \"feedback\": \"<one or two sentences addressed to the student>\"}.";

/// Build the user prompt for a judge request.
pub fn build_judge_prompt(request: &JudgeRequest) -> String {
    format!(
        "Question ({marks} marks):\n{question}\n\nModel answer:\n{model_answer}\n\nStudent answer:\n{student_answer}",
        marks = request.marks,
        question = request.question.trim(),
        model_answer = request.model_answer.trim(),
        student_answer = request.student_answer.trim(),
    )
}

#[derive(Deserialize)]
struct RawVerdict {
    score: f64,
    #[serde(default)]
    feedback: Option<String>,
}

/// Parse a judge's reply into `(score, feedback)`.
///
/// Accepts a bare JSON object, a JSON object wrapped in a ```json block, or a
/// JSON object embedded in surrounding prose. Returns `None` if no object can
/// be parsed or the score is outside `[0, 1]`.
pub fn parse_verdict(response: &str) -> Option<(f64, Option<String>)> {
    let body = extract_json_block(response);
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end < start {
        return None;
    }

    let raw: RawVerdict = serde_json::from_str(&body[start..=end]).ok()?;
    if !raw.score.is_finite() || !(0.0..=1.0).contains(&raw.score) {
        return None;
    }
    let feedback = raw
        .feedback
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty());
    Some((raw.score, feedback))
}

/// Return the contents of the first ```json (or bare ```) block, or the whole
/// response if there is none. An unclosed block runs to the end.
fn extract_json_block(response: &str) -> &str {
    let Some(open) = response.find("```") else {
        return response;
    };
    let after_fence = &response[open + 3..];
    let content_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let content = &after_fence[content_start..];
    match content.find("```") {
        Some(close) => &content[..close],
        None => content,
    }
}
