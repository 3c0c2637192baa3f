//! Similarity and relevance scorers.
//!
//! All scores are in `[0, 1]`.

use std::collections::HashMap;

use crate::text::{extract_key_concepts, normalize, KeyConcepts};

/// Keyword score when the model answer has no extractable concepts.
pub const NEUTRAL_KEYWORD_SCORE: f64 = 0.3;
/// Matches needed before the keyword score can reach 1.0.
pub const MIN_KEYWORD_DENOMINATOR: usize = 3;
/// Relevance score when the question has no extractable concepts.
pub const NEUTRAL_RELEVANCE_SCORE: f64 = 0.5;
/// Scale applied to the raw question-overlap ratio.
pub const RELEVANCE_SCALE: f64 = 1.5;

/// Sørensen–Dice coefficient over character bigrams.
///
/// Both strings are normalized and stripped of whitespace first. Identical
/// strings score 1.0; strings too short to form a bigram score 0.0 unless
/// identical.
pub fn string_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = normalize(a).chars().filter(|c| !c.is_whitespace()).collect();
    let b: Vec<char> = normalize(b).chars().filter(|c| !c.is_whitespace()).collect();

    if a == b {
        return 1.0;
    }
    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }

    let mut bigrams: HashMap<(char, char), usize> = HashMap::new();
    for pair in a.windows(2) {
        *bigrams.entry((pair[0], pair[1])).or_default() += 1;
    }

    let mut intersection = 0usize;
    for pair in b.windows(2) {
        if let Some(count) = bigrams.get_mut(&(pair[0], pair[1])) {
            if *count > 0 {
                *count -= 1;
                intersection += 1;
            }
        }
    }

    (2 * intersection) as f64 / (a.len() + b.len() - 2) as f64
}

/// Fraction of the model answer's key concepts the student mentioned.
///
/// The denominator is at least [`MIN_KEYWORD_DENOMINATOR`], so a single
/// lucky keyword cannot earn full credit.
pub fn keyword_score(student_answer: &str, key_concepts: &KeyConcepts) -> f64 {
    if key_concepts.is_empty() {
        return NEUTRAL_KEYWORD_SCORE;
    }

    let student_concepts = extract_key_concepts(student_answer);
    let matched = key_concepts
        .iter()
        .filter(|c| student_concepts.contains(*c))
        .count();

    let denominator = key_concepts.len().max(MIN_KEYWORD_DENOMINATOR);
    (matched as f64 / denominator as f64).min(1.0)
}

/// How much of the question's vocabulary the answer engages with.
pub fn relevance_score(student_answer: &str, question_text: &str) -> f64 {
    let question_concepts = extract_key_concepts(question_text);
    if question_concepts.is_empty() {
        return NEUTRAL_RELEVANCE_SCORE;
    }

    let answer_concepts = extract_key_concepts(student_answer);
    let matched = question_concepts
        .iter()
        .filter(|c| answer_concepts.contains(*c))
        .count();

    let ratio = matched as f64 / question_concepts.len() as f64;
    (ratio * RELEVANCE_SCALE).min(1.0)
}
