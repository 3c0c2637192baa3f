//! The `gradekit validate` command.

use std::path::PathBuf;

use anyhow::Result;

use gradekit_core::engine::validate_key_structure;
use gradekit_core::parser;

pub fn execute(answer_key_path: PathBuf) -> Result<()> {
    let key = parser::parse_answer_key(&answer_key_path)?;

    println!(
        "Answer key: {} ({} MCQs, {} short questions, {} marks)",
        answer_key_path.display(),
        key.mcqs.len(),
        key.short_questions.len(),
        key.total_marks()
    );

    let warnings = parser::validate_answer_key(&key);
    for w in &warnings {
        let prefix = w
            .question
            .as_ref()
            .map(|q| format!("  [{q}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    validate_key_structure(&key)?;

    if warnings.is_empty() {
        println!("Answer key valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
