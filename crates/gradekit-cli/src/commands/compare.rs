//! The `gradekit compare` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use gradekit_core::batch::BatchReport;
use gradekit_core::model::EvaluationResult;
use gradekit_core::report::RegradeReport;

/// Load two files of the same kind (single result or batch) and compare them.
fn compare_files(baseline: &Path, current: &Path, threshold: f64) -> Result<RegradeReport> {
    let read = |path: &Path| -> Result<serde_json::Value> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read result from {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse result JSON: {}", path.display()))
    };
    let is_batch = |value: &serde_json::Value| value.get("results").is_some();

    let baseline_value = read(baseline)?;
    let current_value = read(current)?;

    match (is_batch(&baseline_value), is_batch(&current_value)) {
        (true, true) => {
            let baseline: BatchReport = serde_json::from_value(baseline_value)
                .context("failed to parse baseline batch report")?;
            let current: BatchReport = serde_json::from_value(current_value)
                .context("failed to parse current batch report")?;
            Ok(current.compare(&baseline, threshold))
        }
        (false, false) => {
            let baseline: EvaluationResult = serde_json::from_value(baseline_value)
                .context("failed to parse baseline result")?;
            let current: EvaluationResult = serde_json::from_value(current_value)
                .context("failed to parse current result")?;
            Ok(current.compare(&baseline, threshold))
        }
        _ => anyhow::bail!("cannot compare a batch report with a single result"),
    }
}

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_change: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(threshold >= 0.0, "threshold must not be negative");

    let report = compare_files(&baseline_path, &current_path, threshold)?;

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Comparison: {} lowered, {} raised, {} unchanged (net {:+.2} marks)",
                report.lowered.len(),
                report.raised.len(),
                report.unchanged,
                report.net_delta()
            );

            for (title, changes) in [("Lowered", &report.lowered), ("Raised", &report.raised)] {
                if changes.is_empty() {
                    continue;
                }
                println!("\n{title}:");
                for c in changes {
                    println!(
                        "  {} {:.2} -> {:.2} ({:+.2})",
                        c.question, c.baseline_marks, c.current_marks, c.delta
                    );
                }
            }

            if !report.added.is_empty() {
                println!("\n{} added question(s)", report.added.len());
            }
            if !report.removed.is_empty() {
                println!("{} removed question(s)", report.removed.len());
            }
        }
    }

    if fail_on_change && report.has_changes() {
        std::process::exit(1);
    }

    Ok(())
}
