//! Text analysis utilities: tokenization, stop-word filtering, and key
//! concept extraction.
//!
//! Everything here is a pure function of its input. Concept sets keep first
//! occurrence order so anything that picks "the first N concepts" of a model
//! answer is deterministic.

use indexmap::IndexSet;

/// Ordered, de-duplicated set of lowercase concept words.
pub type KeyConcepts = IndexSet<String>;

/// Minimum length (in characters) for a token to count as a concept.
pub const MIN_CONCEPT_LEN: usize = 3;

/// English stop words ignored during concept extraction.
pub const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "itself", "just", "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of",
    "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own",
    "same", "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs",
    "them", "themselves", "then", "there", "these", "they", "this", "those", "through", "to",
    "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Phrases that signal the student does not know the answer.
pub const NO_KNOWLEDGE_PHRASES: &[&str] = &[
    "i don't know",
    "idk",
    "no idea",
    "not sure",
    "cannot answer",
    "i don't understand",
    "i have no idea",
];

/// Trim, lower-case, and fold typographic apostrophes to ASCII.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split text into lowercase word tokens.
///
/// A token is a maximal run of alphanumeric characters or underscores, the
/// same boundary a `\w+` regex would use.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Returns `true` if `word` is on the stop-word list.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Extract the key concepts of a piece of text.
///
/// Drops stop words, tokens shorter than [`MIN_CONCEPT_LEN`], and tokens that
/// contain anything other than letters. Empty input yields an empty set.
pub fn extract_key_concepts(text: &str) -> KeyConcepts {
    tokenize(text)
        .filter(|t| t.chars().count() >= MIN_CONCEPT_LEN)
        .filter(|t| t.chars().all(char::is_alphabetic))
        .filter(|t| !is_stop_word(t))
        .collect()
}

/// Returns `true` if the answer contains any of [`NO_KNOWLEDGE_PHRASES`].
pub fn contains_no_knowledge_phrase(answer: &str) -> bool {
    let normalized = normalize(answer);
    NO_KNOWLEDGE_PHRASES
        .iter()
        .any(|phrase| normalized.contains(phrase))
}
