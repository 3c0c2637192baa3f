//! Result persistence and regrade comparison.
//!
//! A regrade comparison lines up two results question by question and reports
//! which marks went down, which went up, and which questions appear on only
//! one side. It is how an examiner audits the effect of switching backends or
//! editing an answer key.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::batch::BatchReport;
use crate::model::{round2, EvaluationResult, QuestionResult};

fn save_pretty<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize result")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("failed to write result to {}", path.display()))?;
    Ok(())
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read result from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse result JSON: {}", path.display()))
}

/// Obtained marks keyed by a stable question label.
fn marks_by_question(prefix: &str, result: &EvaluationResult) -> BTreeMap<String, f64> {
    let mut map = BTreeMap::new();
    let mut insert = |list: &str, questions: &[QuestionResult]| {
        for q in questions {
            map.insert(format!("{prefix}{list} #{}", q.id), q.obtained_marks);
        }
    };
    insert("mcq", &result.mcq_results);
    insert("short", &result.short_question_results);
    map
}

impl EvaluationResult {
    /// Save the result as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_pretty(self, path)
    }

    /// Load a result from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        load(path)
    }

    /// Compare this result against a baseline. Mark changes no larger than
    /// `threshold` count as unchanged.
    pub fn compare(&self, baseline: &EvaluationResult, threshold: f64) -> RegradeReport {
        RegradeReport::from_maps(
            &marks_by_question("", baseline),
            &marks_by_question("", self),
            threshold,
        )
    }
}

impl BatchReport {
    /// Save the batch report as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_pretty(self, path)
    }

    /// Load a batch report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        load(path)
    }

    /// Compare every submission in this batch against the same submission in
    /// a baseline batch. Questions are labelled `<submission>/<list> #<n>`.
    pub fn compare(&self, baseline: &BatchReport, threshold: f64) -> RegradeReport {
        let collect = |report: &BatchReport| {
            let mut map = BTreeMap::new();
            for outcome in &report.results {
                let prefix = format!("{}/", outcome.submission_id);
                map.extend(marks_by_question(&prefix, &outcome.result));
            }
            map
        };
        RegradeReport::from_maps(&collect(baseline), &collect(self), threshold)
    }
}

/// Result of comparing two gradings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegradeReport {
    /// Questions whose marks went down.
    pub lowered: Vec<MarkChange>,
    /// Questions whose marks went up.
    pub raised: Vec<MarkChange>,
    /// Questions with no significant change.
    pub unchanged: usize,
    /// Questions present only in the current result.
    pub added: Vec<String>,
    /// Questions present only in the baseline.
    pub removed: Vec<String>,
}

/// One question whose marks changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkChange {
    pub question: String,
    pub baseline_marks: f64,
    pub current_marks: f64,
    pub delta: f64,
}

impl RegradeReport {
    fn from_maps(
        baseline: &BTreeMap<String, f64>,
        current: &BTreeMap<String, f64>,
        threshold: f64,
    ) -> Self {
        let mut report = RegradeReport::default();

        for (question, &now) in current {
            let Some(&before) = baseline.get(question) else {
                report.added.push(question.clone());
                continue;
            };
            let delta = round2(now - before);
            let change = MarkChange {
                question: question.clone(),
                baseline_marks: before,
                current_marks: now,
                delta,
            };
            if delta < -threshold {
                report.lowered.push(change);
            } else if delta > threshold {
                report.raised.push(change);
            } else {
                report.unchanged += 1;
            }
        }

        report.removed = baseline
            .keys()
            .filter(|q| !current.contains_key(*q))
            .cloned()
            .collect();

        report
    }

    /// Returns true if any question's marks changed or the question sets differ.
    pub fn has_changes(&self) -> bool {
        !self.lowered.is_empty()
            || !self.raised.is_empty()
            || !self.added.is_empty()
            || !self.removed.is_empty()
    }

    /// Net change in obtained marks across all compared questions.
    pub fn net_delta(&self) -> f64 {
        round2(
            self.lowered
                .iter()
                .chain(&self.raised)
                .map(|c| c.delta)
                .sum::<f64>(),
        ) + 0.0 // an empty sum is -0.0, which formats as "-0.00"
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} lowered, {} raised, {} unchanged, {} added, {} removed (net {:+.2} marks)\n\n",
            self.lowered.len(),
            self.raised.len(),
            self.unchanged,
            self.added.len(),
            self.removed.len(),
            self.net_delta()
        ));

        for (title, changes) in [("Lowered", &self.lowered), ("Raised", &self.raised)] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Question | Baseline | Current | Delta |\n");
            md.push_str("|----------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {:.2} | {:.2} | {:+.2} |\n",
                    c.question, c.baseline_marks, c.current_marks, c.delta
                ));
            }
            md.push('\n');
        }

        if !self.added.is_empty() {
            md.push_str(&format!("**Added:** {}\n\n", self.added.join(", ")));
        }
        if !self.removed.is_empty() {
            md.push_str(&format!("**Removed:** {}\n", self.removed.join(", ")));
        }

        md
    }
}
