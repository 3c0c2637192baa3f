//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use gradekit_core::engine::evaluate;
use gradekit_core::parser::{parse_answer_key, parse_submission};

const KEY: &str = "../../fixtures/biology-key.json";
const SUBMISSIONS: &str = "../../fixtures/submissions";

fn gradekit() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("gradekit").unwrap();
    cmd.env_remove("GRADEKIT_ANTHROPIC_KEY")
        .env_remove("GRADEKIT_OPENAI_KEY")
        .env_remove("RUST_LOG");
    cmd
}

/// An empty config file so tests never pick up a developer's own config.
fn empty_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("gradekit.toml");
    std::fs::write(&path, "").unwrap();
    path
}

#[test]
fn validate_fixture_key() {
    gradekit()
        .arg("validate")
        .arg("--answer-key")
        .arg(KEY)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 MCQs, 3 short questions, 16 marks"))
        .stdout(predicate::str::contains("[mcqs #2] WARNING: marks not set"))
        .stdout(predicate::str::contains("1 warning(s) found"));
}

#[test]
fn validate_reports_duplicates() {
    gradekit()
        .arg("validate")
        .arg("--answer-key")
        .arg("../../fixtures/warnings-key.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("duplicate question number 1"))
        .stdout(predicate::str::contains("question text is empty"));
}

#[test]
fn validate_rejects_key_without_short_questions() {
    gradekit()
        .arg("validate")
        .arg("--answer-key")
        .arg("../../fixtures/invalid-key.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"))
        .stderr(predicate::str::contains("shortQuestions"));
}

#[test]
fn validate_nonexistent_file() {
    gradekit()
        .arg("validate")
        .arg("--answer-key")
        .arg("nonexistent.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn grade_single_submission_as_json() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(&dir);
    let output = dir.path().join("out");

    let assert = gradekit()
        .arg("grade")
        .arg("--answer-key")
        .arg(KEY)
        .arg("--submission")
        .arg(format!("{SUBMISSIONS}/bob.json"))
        .arg("--format")
        .arg("json")
        .arg("--output")
        .arg(&output)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stderr(predicate::str::contains("Results saved to"));

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["scoreSummary"]["totalMarks"], serde_json::json!(16.0));
    assert_eq!(value["metadata"]["backend"], serde_json::json!("standard"));

    // The printed result matches what the library produces.
    let expected = evaluate(
        &parse_answer_key(Path::new(KEY)).unwrap(),
        &parse_submission(&Path::new(SUBMISSIONS).join("bob.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(value, serde_json::to_value(&expected).unwrap());

    let saved: Vec<_> = std::fs::read_dir(&output).unwrap().collect();
    assert_eq!(saved.len(), 1);
}

#[test]
fn grade_directory_prints_summary_table() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(&dir);

    gradekit()
        .arg("grade")
        .arg("--answer-key")
        .arg(KEY)
        .arg("--submission")
        .arg(SUBMISSIONS)
        .arg("--output")
        .arg(dir.path().join("out"))
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("bob"))
        .stdout(predicate::str::contains("carol"))
        .stdout(predicate::str::contains("3 graded"))
        .stderr(predicate::str::contains("Complete: 3/3 graded"))
        .stderr(predicate::str::contains("grading started"));
}

#[test]
fn grade_enhanced_without_judge_falls_back() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(&dir);

    let assert = gradekit()
        .arg("grade")
        .arg("--answer-key")
        .arg(KEY)
        .arg("--submission")
        .arg(format!("{SUBMISSIONS}/alice.json"))
        .arg("--mode")
        .arg("llm")
        .arg("--format")
        .arg("json")
        .arg("--output")
        .arg(dir.path().join("out"))
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stderr(predicate::str::contains("falling back to standard"));

    let value: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(value["metadata"]["backend"], serde_json::json!("standard"));
    assert_eq!(value["metadata"]["requestedBackend"], serde_json::json!("enhanced"));
    assert_eq!(value["metadata"]["fallback"], serde_json::json!(true));
}

#[test]
fn grade_rejects_invalid_key() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(&dir);

    gradekit()
        .arg("grade")
        .arg("--answer-key")
        .arg("../../fixtures/invalid-key.json")
        .arg("--submission")
        .arg(format!("{SUBMISSIONS}/alice.json"))
        .arg("--output")
        .arg(dir.path().join("out"))
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid input"));
}

#[test]
fn grade_rejects_unknown_format() {
    gradekit()
        .arg("grade")
        .arg("--answer-key")
        .arg(KEY)
        .arg("--submission")
        .arg(SUBMISSIONS)
        .arg("--format")
        .arg("xml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    gradekit()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created gradekit.toml"))
        .stdout(predicate::str::contains("Created samples/answer-key.json"));

    assert!(dir.path().join("gradekit.toml").exists());
    assert!(dir.path().join("samples/submissions/student-1.json").exists());

    // The generated sample key is itself valid.
    gradekit()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--answer-key")
        .arg("samples/answer-key.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("Answer key valid."));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    gradekit()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    gradekit()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn help_output() {
    gradekit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exam submission grading engine"));
}

#[test]
fn version_output() {
    gradekit()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gradekit"));
}
