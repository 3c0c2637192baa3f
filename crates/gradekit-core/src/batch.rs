//! Batch grading of many submissions against one answer key.
//!
//! Submissions are graded concurrently, bounded by a semaphore. Results are
//! returned sorted by submission id so a batch report does not depend on
//! completion order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::backend::{BackendSelector, EvaluationMode};
use crate::engine::validate_key_structure;
use crate::error::GradingError;
use crate::model::{AnswerKey, EvaluationResult, Submission};
use crate::statistics::{compute_class_stats, ClassStats};

/// Configuration for a batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Requested evaluation mode for every submission.
    pub mode: EvaluationMode,
    /// Maximum submissions graded at once.
    pub parallelism: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            mode: EvaluationMode::Standard,
            parallelism: 4,
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_submission_start(&self, id: &str);
    fn on_submission_complete(&self, outcome: &SubmissionOutcome);
    fn on_submission_error(&self, id: &str, error: &str);
    fn on_batch_complete(&self, total: usize, graded: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_submission_start(&self, _: &str) {}
    fn on_submission_complete(&self, _: &SubmissionOutcome) {}
    fn on_submission_error(&self, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// One graded submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub submission_id: String,
    pub result: EvaluationResult,
}

/// A submission that could not be graded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub submission_id: String,
    pub error: String,
}

/// Everything produced by one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Mode that was requested (individual results record what actually ran).
    pub mode: String,
    pub results: Vec<SubmissionOutcome>,
    #[serde(default)]
    pub failures: Vec<BatchFailure>,
    pub statistics: ClassStats,
    pub duration_ms: u64,
}

impl BatchReport {
    /// Look up a result by submission id.
    pub fn result_for(&self, id: &str) -> Option<&EvaluationResult> {
        self.results
            .iter()
            .find(|o| o.submission_id == id)
            .map(|o| &o.result)
    }
}

/// Grade every submission in `submissions` against `key`.
///
/// A structurally invalid key fails the whole batch up front. Anything that
/// goes wrong with a single submission is recorded in `failures`.
pub async fn grade_batch(
    selector: Arc<BackendSelector>,
    key: Arc<AnswerKey>,
    submissions: Vec<(String, Submission)>,
    config: &BatchConfig,
    progress: &dyn ProgressReporter,
) -> Result<BatchReport, GradingError> {
    validate_key_structure(&key)?;

    let start = Instant::now();
    let semaphore = Arc::new(Semaphore::new(config.parallelism.max(1)));
    let mode = config.mode;
    let total = submissions.len();

    tracing::info!(submissions = total, %mode, parallelism = config.parallelism, "grading batch");

    let mut futures = FuturesUnordered::new();
    for (id, submission) in submissions {
        let selector = Arc::clone(&selector);
        let key = Arc::clone(&key);
        let semaphore = Arc::clone(&semaphore);

        futures.push(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => {
                    progress.on_submission_start(&id);
                    selector.evaluate(mode, &key, &submission).await
                }
                Err(_) => Err(GradingError::BackendUnavailable("semaphore closed".into())),
            };
            (id, result)
        });
    }

    let mut results = Vec::new();
    let mut failures = Vec::new();

    while let Some((id, result)) = futures.next().await {
        match result {
            Ok(result) => {
                let outcome = SubmissionOutcome {
                    submission_id: id,
                    result,
                };
                progress.on_submission_complete(&outcome);
                results.push(outcome);
            }
            Err(e) => {
                tracing::error!("grading failed for {id}: {e}");
                progress.on_submission_error(&id, &e.to_string());
                failures.push(BatchFailure {
                    submission_id: id,
                    error: e.to_string(),
                });
            }
        }
    }

    results.sort_by(|a, b| a.submission_id.cmp(&b.submission_id));
    failures.sort_by(|a, b| a.submission_id.cmp(&b.submission_id));

    let elapsed = start.elapsed();
    progress.on_batch_complete(total, results.len(), failures.len(), elapsed);

    let graded: Vec<EvaluationResult> = results.iter().map(|o| o.result.clone()).collect();

    Ok(BatchReport {
        mode: mode.to_string(),
        statistics: compute_class_stats(&graded),
        results,
        failures,
        duration_ms: elapsed.as_millis() as u64,
    })
}
