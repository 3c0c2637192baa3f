//! Class-level statistics across graded submissions.

use serde::{Deserialize, Serialize};

use crate::model::{round2, EvaluationResult, QuestionResult};

/// Which list a question came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Mcq,
    Short,
}

/// Aggregate statistics for a set of results graded against one answer key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStats {
    /// Number of graded submissions.
    pub submissions: usize,
    pub mean_percentage: f64,
    pub median_percentage: f64,
    pub min_percentage: f64,
    pub max_percentage: f64,
    /// Submissions that were graded by the standard backend after an
    /// enhanced request fell back.
    pub fallbacks: usize,
    /// Per-question averages in answer-key order.
    pub per_question: Vec<QuestionStats>,
}

/// How the class did on one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStats {
    pub kind: QuestionKind,
    pub question_number: u32,
    pub marks: f64,
    pub average_obtained: f64,
    /// Average obtained marks as a fraction of the question's marks.
    pub average_ratio: f64,
}

/// Median of a slice of finite values. Empty input yields 0.0.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn question_stats(
    kind: QuestionKind,
    results: &[EvaluationResult],
    list: fn(&EvaluationResult) -> &[QuestionResult],
) -> Vec<QuestionStats> {
    let Some(first) = results.first() else {
        return Vec::new();
    };

    list(first)
        .iter()
        .enumerate()
        .map(|(idx, template)| {
            let obtained: Vec<f64> = results
                .iter()
                .filter_map(|r| list(r).get(idx))
                .map(|q| q.obtained_marks)
                .collect();
            let average_obtained = obtained.iter().sum::<f64>() / obtained.len().max(1) as f64;
            let average_ratio = if template.marks > 0.0 {
                average_obtained / template.marks
            } else {
                0.0
            };
            QuestionStats {
                kind,
                question_number: template.id,
                marks: template.marks,
                average_obtained: round2(average_obtained),
                average_ratio: round2(average_ratio),
            }
        })
        .collect()
}

/// Compute class statistics. All results must come from the same answer key.
pub fn compute_class_stats(results: &[EvaluationResult]) -> ClassStats {
    let percentages: Vec<f64> = results
        .iter()
        .map(|r| r.score_summary.ratio() * 100.0)
        .collect();

    let mean = percentages.iter().sum::<f64>() / percentages.len().max(1) as f64;
    let min = percentages.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = percentages.iter().copied().reduce(f64::max).unwrap_or(0.0);

    let mut per_question = question_stats(QuestionKind::Mcq, results, |r| &r.mcq_results);
    per_question.extend(question_stats(QuestionKind::Short, results, |r| {
        &r.short_question_results
    }));

    ClassStats {
        submissions: results.len(),
        mean_percentage: round2(mean),
        median_percentage: round2(median(&percentages)),
        min_percentage: round2(min),
        max_percentage: round2(max),
        fallbacks: results.iter().filter(|r| r.metadata.fallback).count(),
        per_question,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BackendKind, EvaluationMetadata, ScoreSummary};

    fn question(id: u32, marks: f64, obtained: f64) -> QuestionResult {
        QuestionResult {
            id,
            question: String::new(),
            student_answer: String::new(),
            correct_answer: String::new(),
            marks,
            obtained_marks: obtained,
            feedback: None,
            correct: None,
        }
    }

    fn result(mcq_obtained: f64, short_obtained: f64, fallback: bool) -> EvaluationResult {
        let mcq = vec![question(1, 2.0, mcq_obtained)];
        let short = vec![question(1, 8.0, short_obtained)];
        EvaluationResult {
            score_summary: ScoreSummary::from_results(&mcq, &short),
            mcq_results: mcq,
            short_question_results: short,
            metadata: EvaluationMetadata {
                fallback,
                ..EvaluationMetadata::direct(BackendKind::Standard)
            },
        }
    }

    #[test]
    fn median_of_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn class_stats_summarize_percentages() {
        let results = vec![
            result(2.0, 8.0, false), // 100%
            result(0.0, 4.0, true),  // 40%
            result(2.0, 0.0, false), // 20%
        ];
        let stats = compute_class_stats(&results);

        assert_eq!(stats.submissions, 3);
        assert_eq!(stats.mean_percentage, 53.33);
        assert_eq!(stats.median_percentage, 40.0);
        assert_eq!(stats.min_percentage, 20.0);
        assert_eq!(stats.max_percentage, 100.0);
        assert_eq!(stats.fallbacks, 1);
    }

    #[test]
    fn per_question_follows_key_order() {
        let results = vec![result(2.0, 8.0, false), result(0.0, 4.0, false)];
        let stats = compute_class_stats(&results);

        assert_eq!(stats.per_question.len(), 2);
        assert_eq!(stats.per_question[0].kind, QuestionKind::Mcq);
        assert_eq!(stats.per_question[0].average_obtained, 1.0);
        assert_eq!(stats.per_question[0].average_ratio, 0.5);
        assert_eq!(stats.per_question[1].kind, QuestionKind::Short);
        assert_eq!(stats.per_question[1].average_ratio, 0.75);
    }

    #[test]
    fn empty_input() {
        let stats = compute_class_stats(&[]);
        assert_eq!(stats.submissions, 0);
        assert_eq!(stats.mean_percentage, 0.0);
        assert!(stats.per_question.is_empty());
    }
}
