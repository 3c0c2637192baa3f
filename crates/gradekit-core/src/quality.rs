//! Short-answer quality scoring.
//!
//! A quality score is a `[0, 1]` estimate of how correct a free-text answer
//! is. It is a weighted blend of lexical similarity, length adequacy, keyword
//! coverage, and question relevance, guarded by rules that short-circuit
//! non-answers and penalize very short or restated answers.
//!
//! The weights and thresholds below are fixed. Changing any of them changes
//! recorded grades.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::round2;
use crate::similarity::{keyword_score, relevance_score, string_similarity};
use crate::text::{
    contains_no_knowledge_phrase, extract_key_concepts, normalize, tokenize, word_count,
};

/// Weight of the lexical similarity factor.
pub const SIMILARITY_WEIGHT: f64 = 0.4;
/// Weight of the length adequacy factor.
pub const LENGTH_WEIGHT: f64 = 0.1;
/// Weight of the keyword coverage factor.
pub const KEYWORD_WEIGHT: f64 = 0.3;
/// Weight of the question relevance factor.
pub const RELEVANCE_WEIGHT: f64 = 0.2;

/// Score for answers containing a no-knowledge phrase.
pub const NO_KNOWLEDGE_SCORE: f64 = 0.0;
/// Answers with at most this many words get [`TOO_BRIEF_SCORE`].
pub const TOO_BRIEF_MAX_WORDS: usize = 2;
/// Score for answers of [`TOO_BRIEF_MAX_WORDS`] words or fewer.
pub const TOO_BRIEF_SCORE: f64 = 0.1;

/// Answers shorter than this fraction of the model answer get [`SHORT_LENGTH_FACTOR`].
pub const MIN_LENGTH_RATIO: f64 = 0.3;
/// Length factor for answers under [`MIN_LENGTH_RATIO`].
pub const SHORT_LENGTH_FACTOR: f64 = 0.2;

/// Answers with at most this many words are multiplied by [`SHORT_ANSWER_PENALTY`].
pub const SHORT_ANSWER_MAX_WORDS: usize = 4;
/// Multiplier applied to answers of [`SHORT_ANSWER_MAX_WORDS`] words or fewer.
pub const SHORT_ANSWER_PENALTY: f64 = 0.3;

/// Answers adding at most this many words beyond the question's own are
/// multiplied by [`RESTATEMENT_PENALTY`].
pub const RESTATEMENT_MAX_NEW_WORDS: usize = 2;
/// Multiplier applied to answers that mostly restate the question.
pub const RESTATEMENT_PENALTY: f64 = 0.4;

/// A guard rule that fixed the score without weighing the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardRule {
    NoKnowledge,
    TooBrief,
}

/// The weighted factors behind a quality score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityFactors {
    pub similarity: f64,
    pub length_adequacy: f64,
    pub keyword: f64,
    pub relevance: f64,
    /// Weighted sum before penalties.
    pub weighted_sum: f64,
    pub short_answer_penalty: bool,
    pub restatement_penalty: bool,
}

/// A quality score together with how it was reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityBreakdown {
    /// Set when a guard rule decided the score.
    pub guard: Option<GuardRule>,
    /// Set when the answer was weighed.
    pub factors: Option<QualityFactors>,
    /// Final score in `[0, 1]`.
    pub score: f64,
}

/// Apply the guard rules that decide a score without weighing the answer.
///
/// Shared by every backend so a non-answer is never sent anywhere for
/// judgement.
pub fn guard_rule(student_answer: &str) -> Option<(GuardRule, f64)> {
    if contains_no_knowledge_phrase(student_answer) {
        return Some((GuardRule::NoKnowledge, NO_KNOWLEDGE_SCORE));
    }
    if word_count(student_answer) <= TOO_BRIEF_MAX_WORDS {
        return Some((GuardRule::TooBrief, TOO_BRIEF_SCORE));
    }
    None
}

/// Length adequacy of the student answer relative to the model answer.
pub fn length_adequacy(student_answer: &str, model_answer: &str) -> f64 {
    let student_len = normalize(student_answer).chars().count() as f64;
    let model_len = normalize(model_answer).chars().count() as f64;

    if model_len == 0.0 {
        return 1.0;
    }
    if student_len < model_len * MIN_LENGTH_RATIO {
        SHORT_LENGTH_FACTOR
    } else {
        (student_len / model_len).min(1.0)
    }
}

/// Number of distinct answer words that do not appear in the question.
pub fn new_word_count(student_answer: &str, question_text: &str) -> usize {
    let question_words: HashSet<String> = tokenize(question_text).collect();
    tokenize(student_answer)
        .filter(|w| !question_words.contains(w))
        .collect::<HashSet<_>>()
        .len()
}

/// Score an answer and report every factor that went into it.
pub fn quality_breakdown(
    student_answer: &str,
    model_answer: &str,
    question_text: &str,
) -> QualityBreakdown {
    if let Some((guard, score)) = guard_rule(student_answer) {
        return QualityBreakdown {
            guard: Some(guard),
            factors: None,
            score,
        };
    }

    let student = normalize(student_answer);
    let model = normalize(model_answer);

    let similarity = string_similarity(&model, &student);
    let length_adequacy = length_adequacy(&student, &model);
    let keyword = keyword_score(&student, &extract_key_concepts(&model));
    let relevance = relevance_score(&student, question_text);

    let weighted_sum = similarity * SIMILARITY_WEIGHT
        + length_adequacy * LENGTH_WEIGHT
        + keyword * KEYWORD_WEIGHT
        + relevance * RELEVANCE_WEIGHT;

    let mut score = weighted_sum;

    let short_answer_penalty = word_count(&student) <= SHORT_ANSWER_MAX_WORDS;
    if short_answer_penalty {
        score *= SHORT_ANSWER_PENALTY;
    }

    let restatement_penalty =
        new_word_count(&student, question_text) <= RESTATEMENT_MAX_NEW_WORDS;
    if restatement_penalty {
        score *= RESTATEMENT_PENALTY;
    }

    QualityBreakdown {
        guard: None,
        factors: Some(QualityFactors {
            similarity,
            length_adequacy,
            keyword,
            relevance,
            weighted_sum,
            short_answer_penalty,
            restatement_penalty,
        }),
        score: score.clamp(0.0, 1.0),
    }
}

/// Quality score of a short answer in `[0, 1]`.
pub fn quality_score(student_answer: &str, model_answer: &str, question_text: &str) -> f64 {
    quality_breakdown(student_answer, model_answer, question_text).score
}

/// Marks earned for a quality score, rounded to two decimals.
pub fn obtained_marks(score: f64, marks: f64) -> f64 {
    round2(score.clamp(0.0, 1.0) * marks).min(marks).max(0.0)
}
