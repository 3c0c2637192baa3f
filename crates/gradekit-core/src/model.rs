//! Core data model types for gradekit.
//!
//! Answer keys and submissions come in from the caller; question results,
//! score summaries, and evaluation results go back out. Wire names are
//! camelCase so the JSON matches what exam front-ends already produce.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Marks awarded for an MCQ when the answer key does not say otherwise.
pub const DEFAULT_MCQ_MARKS: f64 = 1.0;
/// Marks awarded for a short-form question when the answer key does not say otherwise.
pub const DEFAULT_SHORT_MARKS: f64 = 5.0;

/// A single question in the examiner's answer key.
///
/// For MCQs `correct_answer` is the option label; for short-form questions it
/// is the model answer the student's text is compared against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerKeyQuestion {
    /// Question number, unique within its list.
    pub question_number: u32,
    /// Question text.
    #[serde(default, alias = "questionText")]
    pub question: String,
    /// Correct option (MCQ) or model answer (short-form).
    pub correct_answer: String,
    /// Maximum marks. `None` means the list's default applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<f64>,
}

impl AnswerKeyQuestion {
    /// Marks for this question, falling back to `default` when unset.
    pub fn marks_or(&self, default: f64) -> f64 {
        self.marks.unwrap_or(default)
    }
}

/// The examiner-provided answer key. Both lists are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerKey {
    pub mcqs: Vec<AnswerKeyQuestion>,
    pub short_questions: Vec<AnswerKeyQuestion>,
}

impl AnswerKey {
    /// Total marks available across both lists.
    pub fn total_marks(&self) -> f64 {
        let mcq: f64 = self.mcqs.iter().map(|q| q.marks_or(DEFAULT_MCQ_MARKS)).sum();
        let short: f64 = self
            .short_questions
            .iter()
            .map(|q| q.marks_or(DEFAULT_SHORT_MARKS))
            .sum();
        round2(mcq + short)
    }

    /// Number of questions across both lists.
    pub fn question_count(&self) -> usize {
        self.mcqs.len() + self.short_questions.len()
    }
}

/// A student's answer to an MCQ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedMcq {
    pub question_number: u32,
    #[serde(default)]
    pub selected_answer: Option<String>,
}

/// A student's answer to a short-form question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedShortAnswer {
    pub question_number: u32,
    /// Question text echoed back from the student's paper.
    #[serde(default, alias = "questionText", skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, alias = "text")]
    pub answer: Option<String>,
}

/// Everything a student handed in for one exam.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default)]
    pub mcqs: Vec<SubmittedMcq>,
    #[serde(default)]
    pub short_questions: Vec<SubmittedShortAnswer>,
}

/// Grading outcome for one answer-key question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    /// The question number.
    pub id: u32,
    pub question: String,
    pub student_answer: String,
    pub correct_answer: String,
    /// Maximum marks for this question.
    pub marks: f64,
    /// Always within `0..=marks`.
    pub obtained_marks: f64,
    /// Short-form only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    /// MCQ only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct: Option<bool>,
}

/// Aggregate marks for a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    pub mcq_obtained: f64,
    pub mcq_total: f64,
    pub short_obtained: f64,
    pub short_total: f64,
    pub total_obtained: f64,
    pub total_marks: f64,
}

impl ScoreSummary {
    /// Build a summary from per-question results.
    ///
    /// Subtotals are rounded first and the totals are summed from the rounded
    /// subtotals, so recorded grades match what earlier versions produced.
    pub fn from_results(mcq: &[QuestionResult], short: &[QuestionResult]) -> Self {
        let mcq_obtained = round2(mcq.iter().map(|r| r.obtained_marks).sum());
        let mcq_total = round2(mcq.iter().map(|r| r.marks).sum());
        let short_obtained = round2(short.iter().map(|r| r.obtained_marks).sum());
        let short_total = round2(short.iter().map(|r| r.marks).sum());

        Self {
            mcq_obtained,
            mcq_total,
            short_obtained,
            short_total,
            total_obtained: round2(mcq_obtained + short_obtained),
            total_marks: round2(mcq_total + short_total),
        }
    }

    /// Obtained marks as a fraction of total marks, or 0.0 for an empty key.
    pub fn ratio(&self) -> f64 {
        if self.total_marks > 0.0 {
            self.total_obtained / self.total_marks
        } else {
            0.0
        }
    }
}

/// Which backend produced (or was asked to produce) a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Standard,
    Enhanced,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Standard => write!(f, "standard"),
            BackendKind::Enhanced => write!(f, "enhanced"),
        }
    }
}

/// Provenance of an evaluation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationMetadata {
    /// Backend that actually produced the result.
    pub backend: BackendKind,
    /// Backend the caller asked for.
    pub requested_backend: BackendKind,
    /// Whether the selector fell back to the standard backend.
    #[serde(default)]
    pub fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    /// Judge identity (e.g. "anthropic/claude-haiku-4-5") for enhanced results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge: Option<String>,
}

impl EvaluationMetadata {
    /// Metadata for a result produced directly by the given backend.
    pub fn direct(backend: BackendKind) -> Self {
        Self {
            backend,
            requested_backend: backend,
            fallback: false,
            fallback_reason: None,
            judge: None,
        }
    }
}

/// Top-level output of an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub mcq_results: Vec<QuestionResult>,
    pub short_question_results: Vec<QuestionResult>,
    pub score_summary: ScoreSummary,
    pub metadata: EvaluationMetadata,
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
