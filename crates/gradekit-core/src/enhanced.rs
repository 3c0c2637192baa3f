//! Enhanced (semantic) evaluation backend.
//!
//! Grades MCQs exactly like the standard backend, but hands each answered
//! short question to a [`SemanticJudge`] instead of the lexical heuristics.
//! Non-answers are still caught by the shared guard rules and never reach the
//! judge. Any judge failure or timeout aborts the evaluation with
//! [`GradingError::BackendUnavailable`] so the selector can fall back.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};

use crate::engine::{
    answer_text, find_short_answer, question_text, scored_short_result, unanswered_short_result,
    validate_key_structure,
};
use crate::error::GradingError;
use crate::feedback::generate_feedback;
use crate::mcq::score_mcqs;
use crate::model::{
    AnswerKey, AnswerKeyQuestion, BackendKind, EvaluationMetadata, EvaluationResult,
    QuestionResult, ScoreSummary, Submission, SubmittedShortAnswer, DEFAULT_SHORT_MARKS,
};
use crate::quality::guard_rule;
use crate::traits::{Evaluator, JudgeRequest, SemanticJudge};

/// Settings for calls to the semantic judge.
#[derive(Debug, Clone)]
pub struct JudgeSettings {
    /// Model identifier passed to the judge.
    pub model: String,
    /// Upper bound on a single judge call.
    pub timeout: Duration,
    /// Maximum judge calls in flight for one submission.
    pub concurrency: usize,
    /// Maximum tokens in the judge's reply.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 keeps verdicts as stable as the judge allows).
    pub temperature: f64,
}

impl Default for JudgeSettings {
    fn default() -> Self {
        Self {
            model: "claude-haiku-4-5-20251001".to_string(),
            timeout: Duration::from_secs(30),
            concurrency: 4,
            max_tokens: 512,
            temperature: 0.0,
        }
    }
}

/// The semantic backend.
#[derive(Clone)]
pub struct EnhancedEvaluator {
    judge: Arc<dyn SemanticJudge>,
    settings: JudgeSettings,
}

impl std::fmt::Debug for EnhancedEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnhancedEvaluator")
            .field("judge", &self.judge.name())
            .field("settings", &self.settings)
            .finish()
    }
}

impl EnhancedEvaluator {
    pub fn new(judge: Arc<dyn SemanticJudge>, settings: JudgeSettings) -> Self {
        Self { judge, settings }
    }

    /// Whether the underlying judge reports itself usable.
    pub fn is_available(&self) -> bool {
        self.judge.is_available()
    }

    /// Judge identity recorded in result metadata, e.g. "anthropic/claude-haiku-4-5".
    pub fn judge_label(&self) -> String {
        format!("{}/{}", self.judge.name(), self.settings.model)
    }

    async fn score_short_answer(
        &self,
        question: &AnswerKeyQuestion,
        submitted: Option<&SubmittedShortAnswer>,
    ) -> Result<QuestionResult, GradingError> {
        let Some(answer) = answer_text(submitted) else {
            return Ok(unanswered_short_result(question, submitted));
        };

        if let Some((_, score)) = guard_rule(answer) {
            let feedback = generate_feedback(score, answer, &question.correct_answer);
            return Ok(scored_short_result(question, submitted, answer, score, feedback));
        }

        let request = JudgeRequest {
            model: self.settings.model.clone(),
            question: question_text(question, submitted).to_string(),
            model_answer: question.correct_answer.clone(),
            student_answer: answer.to_string(),
            marks: question.marks_or(DEFAULT_SHORT_MARKS),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let verdict = tokio::time::timeout(self.settings.timeout, self.judge.judge(&request))
            .await
            .map_err(|_| {
                GradingError::BackendUnavailable(format!(
                    "judge '{}' timed out after {}s on question {}",
                    self.judge.name(),
                    self.settings.timeout.as_secs(),
                    question.question_number
                ))
            })?
            .map_err(|e| {
                GradingError::BackendUnavailable(format!(
                    "judge '{}' failed on question {}: {e:#}",
                    self.judge.name(),
                    question.question_number
                ))
            })?;

        if !verdict.score.is_finite() {
            return Err(GradingError::BackendUnavailable(format!(
                "judge '{}' returned a non-finite score",
                self.judge.name()
            )));
        }
        let score = verdict.score.clamp(0.0, 1.0);
        tracing::debug!(
            question = question.question_number,
            score,
            latency_ms = verdict.latency_ms,
            "judged short answer"
        );

        let feedback = verdict
            .feedback
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| generate_feedback(score, answer, &question.correct_answer));
        Ok(scored_short_result(question, submitted, answer, score, feedback))
    }
}

#[async_trait]
impl Evaluator for EnhancedEvaluator {
    fn kind(&self) -> BackendKind {
        BackendKind::Enhanced
    }

    async fn evaluate(
        &self,
        key: &AnswerKey,
        submission: &Submission,
    ) -> Result<EvaluationResult, GradingError> {
        validate_key_structure(key)?;
        if !self.is_available() {
            return Err(GradingError::BackendUnavailable(format!(
                "judge '{}' is not available",
                self.judge.name()
            )));
        }

        let mcq_results = score_mcqs(&key.mcqs, &submission.mcqs);

        // Futures are lazy, so building them up front does not start any
        // judge calls. `buffered` keeps answer-key order.
        let pending: Vec<_> = key
            .short_questions
            .iter()
            .map(|q| {
                let submitted = find_short_answer(&submission.short_questions, q.question_number);
                self.score_short_answer(q, submitted)
            })
            .collect();
        let short_question_results: Vec<QuestionResult> = stream::iter(pending)
            .buffered(self.settings.concurrency.max(1))
            .try_collect()
            .await?;

        let score_summary = ScoreSummary::from_results(&mcq_results, &short_question_results);
        tracing::info!(
            backend = %BackendKind::Enhanced,
            judge = %self.judge_label(),
            obtained = score_summary.total_obtained,
            total = score_summary.total_marks,
            "evaluation complete"
        );

        Ok(EvaluationResult {
            mcq_results,
            short_question_results,
            score_summary,
            metadata: EvaluationMetadata {
                judge: Some(self.judge_label()),
                ..EvaluationMetadata::direct(BackendKind::Enhanced)
            },
        })
    }
}
