//! Multiple-choice scoring by exact match.

use crate::model::{AnswerKeyQuestion, QuestionResult, SubmittedMcq, DEFAULT_MCQ_MARKS};

/// Trimmed, case-insensitive comparison of two option labels.
pub fn answers_match(correct: &str, selected: &str) -> bool {
    correct.trim().to_lowercase() == selected.trim().to_lowercase()
}

/// Grade one MCQ. `submitted` is `None` when the student skipped it.
pub fn score_mcq(question: &AnswerKeyQuestion, submitted: Option<&SubmittedMcq>) -> QuestionResult {
    let marks = question.marks_or(DEFAULT_MCQ_MARKS);
    let selected = submitted
        .and_then(|s| s.selected_answer.as_deref())
        .unwrap_or_default();

    let correct = !selected.trim().is_empty() && answers_match(&question.correct_answer, selected);
    if submitted.is_none() {
        tracing::debug!(question = question.question_number, "no MCQ answer submitted");
    }

    QuestionResult {
        id: question.question_number,
        question: question.question.clone(),
        student_answer: selected.to_string(),
        correct_answer: question.correct_answer.clone(),
        marks,
        obtained_marks: if correct { marks } else { 0.0 },
        feedback: None,
        correct: Some(correct),
    }
}

/// Grade every MCQ in the answer key, in answer-key order.
pub fn score_mcqs(key: &[AnswerKeyQuestion], submitted: &[SubmittedMcq]) -> Vec<QuestionResult> {
    key.iter()
        .map(|q| {
            let answer = submitted
                .iter()
                .find(|s| s.question_number == q.question_number);
            score_mcq(q, answer)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(number: u32, correct: &str, marks: Option<f64>) -> AnswerKeyQuestion {
        AnswerKeyQuestion {
            question_number: number,
            question: format!("Question {number}"),
            correct_answer: correct.into(),
            marks,
        }
    }

    fn answer(number: u32, selected: &str) -> SubmittedMcq {
        SubmittedMcq {
            question_number: number,
            selected_answer: Some(selected.into()),
        }
    }

    #[test]
    fn case_insensitive_match_earns_full_marks() {
        let results = score_mcqs(&[question(1, "B", Some(2.0))], &[answer(1, "b")]);
        assert_eq!(results[0].obtained_marks, 2.0);
        assert_eq!(results[0].correct, Some(true));
    }

    #[test]
    fn whitespace_is_ignored() {
        assert!(answers_match(" Paris ", "paris"));
        assert!(!answers_match("A", "B"));
    }

    #[test]
    fn wrong_answer_earns_nothing() {
        let results = score_mcqs(&[question(1, "C", None)], &[answer(1, "A")]);
        assert_eq!(results[0].obtained_marks, 0.0);
        assert_eq!(results[0].marks, 1.0);
        assert_eq!(results[0].correct, Some(false));
    }

    #[test]
    fn missing_answer_is_blank_and_wrong() {
        let results = score_mcqs(&[question(4, "A", None)], &[answer(1, "A")]);
        assert_eq!(results[0].student_answer, "");
        assert_eq!(results[0].obtained_marks, 0.0);
        assert_eq!(results[0].correct, Some(false));
    }

    #[test]
    fn blank_key_and_blank_answer_do_not_match() {
        let results = score_mcqs(&[question(1, "", None)], &[answer(1, "  ")]);
        assert_eq!(results[0].correct, Some(false));
    }

    #[test]
    fn results_follow_answer_key_order() {
        let key = [question(2, "A", None), question(1, "B", None)];
        let submitted = [answer(1, "B"), answer(2, "A")];
        let ids: Vec<u32> = score_mcqs(&key, &submitted).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn marks_are_all_or_nothing() {
        let key = [question(1, "A", Some(3.0)), question(2, "B", Some(3.0))];
        let submitted = [answer(1, "a"), answer(2, "c")];
        for r in score_mcqs(&key, &submitted) {
            assert!(r.obtained_marks == 0.0 || r.obtained_marks == r.marks);
        }
    }
}
