//! JSON answer-key and submission loading.
//!
//! Answer keys are checked structurally at this boundary: both question lists
//! must be present, because a key without them is a caller bug rather than a
//! blank exam. Submissions are lenient and default missing lists to empty.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::error::GradingError;
use crate::model::{AnswerKey, Submission, DEFAULT_MCQ_MARKS, DEFAULT_SHORT_MARKS};

const REQUIRED_KEY_LISTS: [&str; 2] = ["mcqs", "shortQuestions"];

/// Convert a JSON value into an answer key, rejecting structural problems.
pub fn answer_key_from_value(value: Value) -> Result<AnswerKey, GradingError> {
    let object = value
        .as_object()
        .ok_or_else(|| GradingError::InvalidInput("answer key must be a JSON object".into()))?;

    for field in REQUIRED_KEY_LISTS {
        match object.get(field) {
            Some(Value::Array(_)) => {}
            Some(_) => {
                return Err(GradingError::InvalidInput(format!(
                    "answer key field `{field}` must be a list"
                )))
            }
            None => {
                return Err(GradingError::InvalidInput(format!(
                    "answer key is missing `{field}`"
                )))
            }
        }
    }

    serde_json::from_value(value)
        .map_err(|e| GradingError::InvalidInput(format!("malformed answer key: {e}")))
}

/// Parse an answer key from a JSON string.
pub fn answer_key_from_str(content: &str) -> Result<AnswerKey, GradingError> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| GradingError::InvalidInput(format!("answer key is not valid JSON: {e}")))?;
    answer_key_from_value(value)
}

/// Load an answer key from a JSON file.
pub fn parse_answer_key(path: &Path) -> Result<AnswerKey> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answer key: {}", path.display()))?;
    answer_key_from_str(&content)
        .with_context(|| format!("failed to load answer key: {}", path.display()))
}

/// Load a submission from a JSON file.
pub fn parse_submission(path: &Path) -> Result<Submission> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read submission: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse submission: {}", path.display()))
}

/// Load every `*.json` submission in a directory, keyed by file stem.
///
/// Files that fail to parse are skipped with a warning. The result is sorted
/// by id.
pub fn load_submission_directory(dir: &Path) -> Result<Vec<(String, Submission)>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut submissions = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if !path.is_file() || !path.extension().is_some_and(|ext| ext == "json") {
            continue;
        }
        let Some(id) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        match parse_submission(&path) {
            Ok(submission) => submissions.push((id, submission)),
            Err(e) => tracing::warn!("skipping {}: {e:#}", path.display()),
        }
    }

    submissions.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(submissions)
}

/// A non-fatal issue found in an answer key.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question (e.g. "shortQuestions #3"), if the warning is about one.
    pub question: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Check an answer key for problems that will not stop grading but probably
/// are not what the examiner meant.
pub fn validate_answer_key(key: &AnswerKey) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if key.question_count() == 0 {
        warnings.push(ValidationWarning {
            question: None,
            message: "answer key has no questions".into(),
        });
    }

    let lists = [
        ("mcqs", &key.mcqs, DEFAULT_MCQ_MARKS),
        ("shortQuestions", &key.short_questions, DEFAULT_SHORT_MARKS),
    ];
    for (list, questions, default_marks) in lists {
        let mut seen = HashSet::new();
        for q in questions.iter() {
            let label = format!("{list} #{}", q.question_number);

            if !seen.insert(q.question_number) {
                warnings.push(ValidationWarning {
                    question: Some(label.clone()),
                    message: format!(
                        "duplicate question number {}; both entries are graded against the same answer",
                        q.question_number
                    ),
                });
            }

            if q.correct_answer.trim().is_empty() {
                warnings.push(ValidationWarning {
                    question: Some(label.clone()),
                    message: "correct answer is empty".into(),
                });
            }

            match q.marks {
                Some(marks) if !marks.is_finite() || marks <= 0.0 => {
                    warnings.push(ValidationWarning {
                        question: Some(label.clone()),
                        message: format!("marks must be positive, got {marks}; grading will fail"),
                    });
                }
                Some(_) => {}
                None => warnings.push(ValidationWarning {
                    question: Some(label.clone()),
                    message: format!("marks not set; defaulting to {default_marks}"),
                }),
            }
        }
    }

    for q in &key.short_questions {
        if q.question.trim().is_empty() {
            warnings.push(ValidationWarning {
                question: Some(format!("shortQuestions #{}", q.question_number)),
                message: "question text is empty; relevance falls back to a neutral score".into(),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const VALID_KEY: &str = r#"{
        "mcqs": [
            {"questionNumber": 1, "question": "Capital of France?", "correctAnswer": "B", "marks": 2}
        ],
        "shortQuestions": [
            {"questionNumber": 1, "question": "What does photosynthesis do?",
             "correctAnswer": "Photosynthesis converts light energy into chemical energy"}
        ]
    }"#;

    #[test]
    fn parse_valid_key() {
        let key = answer_key_from_str(VALID_KEY).unwrap();
        assert_eq!(key.mcqs.len(), 1);
        assert_eq!(key.short_questions.len(), 1);
        assert_eq!(key.mcqs[0].marks, Some(2.0));

        let warnings = validate_answer_key(&key);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].question.as_deref(), Some("shortQuestions #1"));
        assert_eq!(warnings[0].message, "marks not set; defaulting to 5");
    }

    #[test]
    fn missing_lists_are_invalid_input() {
        let err = answer_key_from_value(json!({"mcqs": []})).unwrap_err();
        assert!(matches!(err, GradingError::InvalidInput(_)));
        assert!(err.to_string().contains("shortQuestions"));

        let err = answer_key_from_value(json!({"mcqs": null, "shortQuestions": []})).unwrap_err();
        assert!(err.to_string().contains("must be a list"));

        assert!(answer_key_from_value(json!([1, 2, 3])).is_err());
    }

    #[test]
    fn empty_lists_are_fine() {
        let key = answer_key_from_value(json!({"mcqs": [], "shortQuestions": []})).unwrap();
        let warnings = validate_answer_key(&key);
        assert!(warnings.iter().any(|w| w.message.contains("no questions")));
    }

    #[test]
    fn question_without_correct_answer_is_invalid() {
        let err = answer_key_from_value(json!({
            "mcqs": [{"questionNumber": 1}],
            "shortQuestions": []
        }))
        .unwrap_err();
        assert!(matches!(err, GradingError::InvalidInput(_)));
    }

    #[test]
    fn malformed_json_is_invalid_input() {
        let err = answer_key_from_str("{ not json").unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn validate_duplicates_and_blanks() {
        let key = answer_key_from_value(json!({
            "mcqs": [
                {"questionNumber": 1, "correctAnswer": "A"},
                {"questionNumber": 1, "correctAnswer": " "}
            ],
            "shortQuestions": [
                {"questionNumber": 2, "correctAnswer": "Because", "marks": 0}
            ]
        }))
        .unwrap();
        let warnings = validate_answer_key(&key);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate")));
        assert!(warnings.iter().any(|w| w.message.contains("correct answer is empty")));
        assert!(warnings.iter().any(|w| w.message.contains("marks must be positive")));
        assert!(warnings.iter().any(|w| w.message.contains("question text is empty")));
    }

    #[test]
    fn load_files_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("key.json");
        std::fs::write(&key_path, VALID_KEY).unwrap();
        assert_eq!(parse_answer_key(&key_path).unwrap().mcqs.len(), 1);

        let subs = dir.path().join("subs");
        std::fs::create_dir(&subs).unwrap();
        std::fs::write(
            subs.join("zoe.json"),
            r#"{"mcqs": [{"questionNumber": 1, "selectedAnswer": "B"}]}"#,
        )
        .unwrap();
        std::fs::write(subs.join("adam.json"), r#"{"shortQuestions": []}"#).unwrap();
        std::fs::write(subs.join("broken.json"), "not json").unwrap();
        std::fs::write(subs.join("notes.txt"), "ignored").unwrap();

        let loaded = load_submission_directory(&subs).unwrap();
        let ids: Vec<&str> = loaded.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["adam", "zoe"]);
    }

    #[test]
    fn missing_key_file_is_an_error() {
        assert!(parse_answer_key(Path::new("does-not-exist.json")).is_err());
    }
}
