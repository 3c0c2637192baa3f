//! Feedback text for short answers.
//!
//! Feedback is a pure function of the score and the two answers, so the same
//! submission always gets the same words back.

use crate::quality::SHORT_ANSWER_MAX_WORDS;
use crate::text::{contains_no_knowledge_phrase, extract_key_concepts, word_count};

/// Feedback for a question the student left blank or did not submit.
pub const NO_ANSWER_FEEDBACK: &str = "No answer provided by student";

/// Scores below this get corrective feedback.
pub const LOW_SCORE_THRESHOLD: f64 = 0.3;
/// Scores at or above this get positive feedback.
pub const GOOD_SCORE_THRESHOLD: f64 = 0.6;

/// How many leading model-answer concepts are checked for omissions.
const MISSING_CONCEPT_CANDIDATES: usize = 3;
/// How many omitted concepts are named in the feedback.
const MAX_MISSING_CONCEPTS_LISTED: usize = 2;

pub const UNSURE_FEEDBACK: &str =
    "You seem unsure about this topic. Review the material and try to explain what you do know.";
pub const TOO_BRIEF_FEEDBACK: &str =
    "Your answer is too brief. Expand on the key points to show your understanding.";
pub const OFF_TARGET_FEEDBACK: &str =
    "Your answer doesn't address the key points of the question. Revisit the core ideas.";
pub const ON_TRACK_FEEDBACK: &str =
    "You're on the right track, but your answer needs more detail.";
pub const GOOD_FEEDBACK: &str = "Good answer! You've covered the main points.";

/// Model-answer concepts (among the first few) that the student left out.
pub fn missing_concepts(student_answer: &str, model_answer: &str) -> Vec<String> {
    let student = extract_key_concepts(student_answer);
    extract_key_concepts(model_answer)
        .into_iter()
        .take(MISSING_CONCEPT_CANDIDATES)
        .filter(|c| !student.contains(c))
        .take(MAX_MISSING_CONCEPTS_LISTED)
        .collect()
}

/// Generate feedback for a scored short answer.
pub fn generate_feedback(score: f64, student_answer: &str, model_answer: &str) -> String {
    if score < LOW_SCORE_THRESHOLD {
        if contains_no_knowledge_phrase(student_answer) {
            UNSURE_FEEDBACK.to_string()
        } else if word_count(student_answer) <= SHORT_ANSWER_MAX_WORDS {
            TOO_BRIEF_FEEDBACK.to_string()
        } else {
            OFF_TARGET_FEEDBACK.to_string()
        }
    } else if score < GOOD_SCORE_THRESHOLD {
        let missing = missing_concepts(student_answer, model_answer);
        if missing.is_empty() {
            ON_TRACK_FEEDBACK.to_string()
        } else {
            format!(
                "Partially correct. Consider discussing: {}.",
                missing.join(", ")
            )
        }
    } else {
        GOOD_FEEDBACK.to_string()
    }
}
