//! Evaluation orchestrator.
//!
//! Runs MCQ and short-answer scoring over a whole submission and aggregates
//! the totals. This is the standard (heuristic-only) backend; the enhanced
//! backend reuses the same building blocks and only swaps the short-answer
//! quality judgement.

use async_trait::async_trait;

use crate::error::GradingError;
use crate::feedback::{generate_feedback, NO_ANSWER_FEEDBACK};
use crate::mcq::score_mcqs;
use crate::model::{
    AnswerKey, AnswerKeyQuestion, BackendKind, EvaluationMetadata, EvaluationResult,
    QuestionResult, ScoreSummary, Submission, SubmittedShortAnswer, DEFAULT_SHORT_MARKS,
};
use crate::quality::{obtained_marks, quality_breakdown};
use crate::traits::Evaluator;

/// Check the parts of the answer key the engine relies on.
///
/// Marks must be finite and positive, otherwise `0 <= obtained <= marks`
/// cannot hold.
pub fn validate_key_structure(key: &AnswerKey) -> Result<(), GradingError> {
    let lists = [("mcqs", &key.mcqs), ("shortQuestions", &key.short_questions)];
    for (list, questions) in lists {
        for q in questions.iter() {
            if let Some(marks) = q.marks {
                if !marks.is_finite() || marks <= 0.0 {
                    return Err(GradingError::InvalidInput(format!(
                        "{list} question {} has invalid marks: {marks}",
                        q.question_number
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Find the submitted short answer for a question, if any.
pub(crate) fn find_short_answer<'a>(
    submitted: &'a [SubmittedShortAnswer],
    question_number: u32,
) -> Option<&'a SubmittedShortAnswer> {
    submitted
        .iter()
        .find(|s| s.question_number == question_number)
}

/// The student's answer text, or `None` if missing or blank.
pub(crate) fn answer_text(submitted: Option<&SubmittedShortAnswer>) -> Option<&str> {
    submitted
        .and_then(|s| s.answer.as_deref())
        .filter(|a| !a.trim().is_empty())
}

/// Question text used for relevance: the key's, else the student's echo.
pub(crate) fn question_text<'a>(
    question: &'a AnswerKeyQuestion,
    submitted: Option<&'a SubmittedShortAnswer>,
) -> &'a str {
    if !question.question.trim().is_empty() {
        return &question.question;
    }
    submitted
        .and_then(|s| s.question.as_deref())
        .unwrap_or_default()
}

/// Zero-mark result for a question the student did not answer.
pub(crate) fn unanswered_short_result(
    question: &AnswerKeyQuestion,
    submitted: Option<&SubmittedShortAnswer>,
) -> QuestionResult {
    tracing::debug!(
        question = question.question_number,
        "no short answer submitted"
    );
    QuestionResult {
        id: question.question_number,
        question: question_text(question, submitted).to_string(),
        student_answer: submitted
            .and_then(|s| s.answer.clone())
            .unwrap_or_default(),
        correct_answer: question.correct_answer.clone(),
        marks: question.marks_or(DEFAULT_SHORT_MARKS),
        obtained_marks: 0.0,
        feedback: Some(NO_ANSWER_FEEDBACK.to_string()),
        correct: None,
    }
}

/// Result for an answered short question given its quality score and feedback.
pub(crate) fn scored_short_result(
    question: &AnswerKeyQuestion,
    submitted: Option<&SubmittedShortAnswer>,
    answer: &str,
    score: f64,
    feedback: String,
) -> QuestionResult {
    let marks = question.marks_or(DEFAULT_SHORT_MARKS);
    QuestionResult {
        id: question.question_number,
        question: question_text(question, submitted).to_string(),
        student_answer: answer.to_string(),
        correct_answer: question.correct_answer.clone(),
        marks,
        obtained_marks: obtained_marks(score, marks),
        feedback: Some(feedback),
        correct: None,
    }
}

/// Grade one short-form question with the heuristic quality scorer.
pub fn score_short_answer(
    question: &AnswerKeyQuestion,
    submitted: Option<&SubmittedShortAnswer>,
) -> QuestionResult {
    let Some(answer) = answer_text(submitted) else {
        return unanswered_short_result(question, submitted);
    };

    let breakdown = quality_breakdown(
        answer,
        &question.correct_answer,
        question_text(question, submitted),
    );
    tracing::debug!(
        question = question.question_number,
        score = breakdown.score,
        guard = ?breakdown.guard,
        "scored short answer"
    );

    let feedback = generate_feedback(breakdown.score, answer, &question.correct_answer);
    scored_short_result(question, submitted, answer, breakdown.score, feedback)
}

/// Grade every short-form question in the answer key, in answer-key order.
pub fn score_short_answers(
    key: &[AnswerKeyQuestion],
    submitted: &[SubmittedShortAnswer],
) -> Vec<QuestionResult> {
    key.iter()
        .map(|q| score_short_answer(q, find_short_answer(submitted, q.question_number)))
        .collect()
}

/// Grade a submission against an answer key with the standard heuristics.
///
/// Missing answers never fail the evaluation; only a malformed key does.
pub fn evaluate(
    key: &AnswerKey,
    submission: &Submission,
) -> Result<EvaluationResult, GradingError> {
    validate_key_structure(key)?;

    let mcq_results = score_mcqs(&key.mcqs, &submission.mcqs);
    let short_question_results =
        score_short_answers(&key.short_questions, &submission.short_questions);
    let score_summary = ScoreSummary::from_results(&mcq_results, &short_question_results);

    tracing::info!(
        backend = %BackendKind::Standard,
        obtained = score_summary.total_obtained,
        total = score_summary.total_marks,
        "evaluation complete"
    );

    Ok(EvaluationResult {
        mcq_results,
        short_question_results,
        score_summary,
        metadata: EvaluationMetadata::direct(BackendKind::Standard),
    })
}

/// The heuristic-only backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardEvaluator;

#[async_trait]
impl Evaluator for StandardEvaluator {
    fn kind(&self) -> BackendKind {
        BackendKind::Standard
    }

    async fn evaluate(
        &self,
        key: &AnswerKey,
        submission: &Submission,
    ) -> Result<EvaluationResult, GradingError> {
        evaluate(key, submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SubmittedMcq;
    use crate::quality::quality_score;

    const MODEL: &str = "Photosynthesis converts light energy into chemical energy";

    fn key() -> AnswerKey {
        AnswerKey {
            mcqs: vec![
                AnswerKeyQuestion {
                    question_number: 1,
                    question: "Which gas do plants absorb?".into(),
                    correct_answer: "B".into(),
                    marks: Some(2.0),
                },
                AnswerKeyQuestion {
                    question_number: 2,
                    question: "Where does photosynthesis happen?".into(),
                    correct_answer: "Chloroplast".into(),
                    marks: None,
                },
            ],
            short_questions: vec![
                AnswerKeyQuestion {
                    question_number: 1,
                    question: "What does photosynthesis do?".into(),
                    correct_answer: MODEL.into(),
                    marks: None,
                },
                AnswerKeyQuestion {
                    question_number: 3,
                    question: "Why are leaves green?".into(),
                    correct_answer: "Chlorophyll reflects green light".into(),
                    marks: Some(4.0),
                },
            ],
        }
    }

    fn short(number: u32, answer: &str) -> SubmittedShortAnswer {
        SubmittedShortAnswer {
            question_number: number,
            question: None,
            answer: Some(answer.into()),
        }
    }

    fn submission() -> Submission {
        Submission {
            mcqs: vec![
                SubmittedMcq {
                    question_number: 1,
                    selected_answer: Some("b".into()),
                },
                SubmittedMcq {
                    question_number: 2,
                    selected_answer: Some("Nucleus".into()),
                },
            ],
            short_questions: vec![short(
                1,
                "Plants turn light energy into chemical energy stored in sugar",
            )],
        }
    }

    #[test]
    fn produces_one_result_per_key_question() {
        let result = evaluate(&key(), &submission()).unwrap();
        assert_eq!(result.mcq_results.len(), 2);
        assert_eq!(result.short_question_results.len(), 2);
        assert_eq!(result.metadata.backend, BackendKind::Standard);
        assert!(!result.metadata.fallback);
    }

    #[test]
    fn missing_short_answer_gets_zero_and_no_answer_feedback() {
        let result = evaluate(&key(), &submission()).unwrap();
        let q3 = &result.short_question_results[1];
        assert_eq!(q3.id, 3);
        assert_eq!(q3.obtained_marks, 0.0);
        assert_eq!(q3.marks, 4.0);
        assert_eq!(q3.feedback.as_deref(), Some(NO_ANSWER_FEEDBACK));
    }

    #[test]
    fn blank_short_answer_counts_as_missing() {
        let mut sub = submission();
        sub.short_questions = vec![short(1, "   ")];
        let result = evaluate(&key(), &sub).unwrap();
        assert_eq!(
            result.short_question_results[0].feedback.as_deref(),
            Some(NO_ANSWER_FEEDBACK)
        );
    }

    #[test]
    fn short_marks_follow_quality_score() {
        let result = evaluate(&key(), &submission()).unwrap();
        let q1 = &result.short_question_results[0];
        let expected = quality_score(
            "Plants turn light energy into chemical energy stored in sugar",
            MODEL,
            "What does photosynthesis do?",
        );
        assert_eq!(q1.obtained_marks, obtained_marks(expected, 5.0));
        assert!(q1.obtained_marks >= 0.0 && q1.obtained_marks <= q1.marks);
    }

    #[test]
    fn totals_add_up() {
        let result = evaluate(&key(), &submission()).unwrap();
        let s = &result.score_summary;
        assert_eq!(s.mcq_obtained, 2.0);
        assert_eq!(s.mcq_total, 3.0);
        assert_eq!(s.short_total, 9.0);
        assert_eq!(s.total_marks, 12.0);
        assert_eq!(
            s.total_obtained,
            crate::model::round2(s.mcq_obtained + s.short_obtained)
        );
    }

    #[test]
    fn echoed_question_text_is_used_when_key_has_none() {
        let mut key = key();
        key.short_questions[0].question.clear();
        let mut sub = submission();
        sub.short_questions[0].question = Some("Explain photosynthesis".into());
        let result = evaluate(&key, &sub).unwrap();
        assert_eq!(result.short_question_results[0].question, "Explain photosynthesis");
    }

    #[test]
    fn empty_submission_scores_zero_without_error() {
        let result = evaluate(&key(), &Submission::default()).unwrap();
        assert_eq!(result.score_summary.total_obtained, 0.0);
        assert_eq!(result.score_summary.total_marks, 12.0);
    }

    #[test]
    fn non_positive_marks_are_rejected() {
        let mut key = key();
        key.mcqs[0].marks = Some(0.0);
        let err = evaluate(&key, &submission()).unwrap_err();
        assert!(matches!(err, GradingError::InvalidInput(_)));

        key.mcqs[0].marks = Some(f64::NAN);
        assert!(evaluate(&key, &submission()).is_err());
    }

    #[test]
    fn evaluation_is_idempotent() {
        let first = serde_json::to_string(&evaluate(&key(), &submission()).unwrap()).unwrap();
        let second = serde_json::to_string(&evaluate(&key(), &submission()).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn standard_evaluator_matches_engine() {
        let via_trait = StandardEvaluator.evaluate(&key(), &submission()).await.unwrap();
        assert_eq!(via_trait, evaluate(&key(), &submission()).unwrap());
        assert_eq!(StandardEvaluator.kind(), BackendKind::Standard);
    }

    #[test]
    fn short_answer_with_negative_marks_scores_zero() {
        let question = AnswerKeyQuestion {
            question_number: 1,
            question: "What does photosynthesis do?".into(),
            correct_answer: MODEL.into(),
            marks: Some(-1.0),
        };
        let answer = short(1, "Plants turn light energy into chemical energy stored in sugar");
        let result = score_short_answer(&question, Some(&answer));
        assert_eq!(result.obtained_marks, 0.0);
    }
}
