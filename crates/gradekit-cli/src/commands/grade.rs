//! The `gradekit grade` command.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use comfy_table::{Cell, Table};

use gradekit_core::backend::EvaluationMode;
use gradekit_core::batch::{
    grade_batch, BatchConfig, BatchReport, ProgressReporter, SubmissionOutcome,
};
use gradekit_core::model::{EvaluationResult, QuestionResult};
use gradekit_core::parser;
use gradekit_providers::config::{build_selector, load_config_from};

/// Arguments for `gradekit grade`.
pub struct GradeArgs {
    pub answer_key: PathBuf,
    pub submission: PathBuf,
    pub mode: Option<String>,
    pub judge: Option<String>,
    pub model: Option<String>,
    pub parallelism: Option<usize>,
    pub output: Option<PathBuf>,
    pub format: String,
    pub config: Option<PathBuf>,
}

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_submission_start(&self, id: &str) {
        eprintln!("  Grading: {id}");
    }

    fn on_submission_complete(&self, outcome: &SubmissionOutcome) {
        let s = &outcome.result.score_summary;
        let fallback = if outcome.result.metadata.fallback {
            " (fallback)"
        } else {
            ""
        };
        eprintln!(
            "  Done: {} {}/{} [{}]{}",
            outcome.submission_id,
            s.total_obtained,
            s.total_marks,
            outcome.result.metadata.backend,
            fallback,
        );
    }

    fn on_submission_error(&self, id: &str, error: &str) {
        eprintln!("  ERROR: {id}: {error}");
    }

    fn on_batch_complete(&self, total: usize, graded: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {graded}/{total} graded, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(args: GradeArgs) -> Result<()> {
    anyhow::ensure!(
        matches!(args.format.as_str(), "table" | "json"),
        "unknown format '{}', expected table or json",
        args.format
    );

    let config = load_config_from(args.config.as_deref())?;
    let mode = match &args.mode {
        Some(m) => EvaluationMode::parse_lenient(m),
        None => config.mode(),
    };
    let parallelism = args.parallelism.unwrap_or(config.parallelism);
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");

    let key = parser::parse_answer_key(&args.answer_key)?;
    for w in parser::validate_answer_key(&key) {
        let prefix = w.question.map(|q| format!("[{q}] ")).unwrap_or_default();
        eprintln!("Warning: {prefix}{}", w.message);
    }

    let selector = build_selector(&config, args.judge.as_deref(), args.model.as_deref());
    if mode == EvaluationMode::Enhanced && !selector.enhanced_available() {
        eprintln!("Warning: enhanced evaluation unavailable, falling back to standard");
    }

    tracing::info!(
        %mode,
        parallelism,
        enhanced_available = selector.enhanced_available(),
        "grading started"
    );

    let output = args.output.unwrap_or_else(|| config.output_dir.clone());
    std::fs::create_dir_all(&output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    if args.submission.is_dir() {
        let submissions = parser::load_submission_directory(&args.submission)?;
        anyhow::ensure!(
            !submissions.is_empty(),
            "no submissions found in {}",
            args.submission.display()
        );
        eprintln!(
            "gradekit v{}: grading {} submissions ({mode} mode)\n",
            env!("CARGO_PKG_VERSION"),
            submissions.len()
        );

        let report = grade_batch(
            Arc::new(selector),
            Arc::new(key),
            submissions,
            &BatchConfig { mode, parallelism },
            &ConsoleReporter,
        )
        .await?;

        let path = output.join(format!("batch-{timestamp}.json"));
        report.save_json(&path)?;
        tracing::debug!(path = %path.display(), "batch report saved");

        if args.format == "json" {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_batch_summary(&report);
        }
        eprintln!("Results saved to: {}", path.display());
    } else {
        let submission = parser::parse_submission(&args.submission)?;
        let result = selector.evaluate(mode, &key, &submission).await?;

        let path = output.join(format!("result-{}-{timestamp}.json", stem(&args.submission)));
        result.save_json(&path)?;
        tracing::debug!(path = %path.display(), "result saved");

        if args.format == "json" {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_result(&result);
        }
        eprintln!("Results saved to: {}", path.display());
    }

    Ok(())
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "submission".to_string())
}

fn add_question_rows(table: &mut Table, kind: &str, questions: &[QuestionResult]) {
    for q in questions {
        table.add_row(vec![
            Cell::new(format!("{kind} #{}", q.id)),
            Cell::new(&q.student_answer),
            Cell::new(format!("{}/{}", q.obtained_marks, q.marks)),
            Cell::new(q.feedback.as_deref().unwrap_or("")),
        ]);
    }
}

fn print_result(result: &EvaluationResult) {
    let mut table = Table::new();
    table.set_header(vec!["Question", "Answer", "Marks", "Feedback"]);
    add_question_rows(&mut table, "MCQ", &result.mcq_results);
    add_question_rows(&mut table, "Short", &result.short_question_results);
    println!("{table}");

    let s = &result.score_summary;
    println!(
        "\nTotal: {}/{} ({:.1}%)  MCQ {}/{}  Short {}/{}",
        s.total_obtained,
        s.total_marks,
        s.ratio() * 100.0,
        s.mcq_obtained,
        s.mcq_total,
        s.short_obtained,
        s.short_total
    );

    let meta = &result.metadata;
    match &meta.fallback_reason {
        Some(reason) if meta.fallback => println!(
            "Backend: {} (requested {}: {reason})",
            meta.backend, meta.requested_backend
        ),
        _ => println!("Backend: {}", meta.backend),
    }
}

fn print_batch_summary(report: &BatchReport) {
    let mut table = Table::new();
    table.set_header(vec!["Submission", "MCQ", "Short", "Total", "%", "Backend"]);

    for outcome in &report.results {
        let s = &outcome.result.score_summary;
        let backend = if outcome.result.metadata.fallback {
            format!("{} (fallback)", outcome.result.metadata.backend)
        } else {
            outcome.result.metadata.backend.to_string()
        };
        table.add_row(vec![
            Cell::new(&outcome.submission_id),
            Cell::new(format!("{}/{}", s.mcq_obtained, s.mcq_total)),
            Cell::new(format!("{}/{}", s.short_obtained, s.short_total)),
            Cell::new(format!("{}/{}", s.total_obtained, s.total_marks)),
            Cell::new(format!("{:.1}", s.ratio() * 100.0)),
            Cell::new(backend),
        ]);
    }
    println!("{table}");

    let stats = &report.statistics;
    println!(
        "\n{} graded: mean {:.1}%, median {:.1}%, min {:.1}%, max {:.1}%",
        stats.submissions,
        stats.mean_percentage,
        stats.median_percentage,
        stats.min_percentage,
        stats.max_percentage
    );
    if stats.fallbacks > 0 {
        println!("{} submission(s) fell back to standard evaluation", stats.fallbacks);
    }
    for failure in &report.failures {
        println!("FAILED {}: {}", failure.submission_id, failure.error);
    }
}
