use chrono::{DateTime, Utc};

use crate::model::{AnswerSheet, PassThreshold, Quiz, QuizResult, ScoringSource};

//
// ─── SERVER VERDICT ────────────────────────────────────────────────────────────
//

/// Marks reported by the grading service for one submission.
///
/// `percentage` is optional because older backends only report marks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeReport {
    pub marks: u32,
    pub percentage: Option<f64>,
}

impl GradeReport {
    #[must_use]
    pub fn new(marks: u32, percentage: Option<f64>) -> Self {
        Self { marks, percentage }
    }
}

//
// ─── PERCENTAGES ───────────────────────────────────────────────────────────────
//

/// Whole-number percentage of `correct` over `total`; zero when `total` is zero.
///
/// ```
/// # use quiz_core::scoring::percentage_of;
/// assert_eq!(percentage_of(1, 2), 50.0);
/// assert_eq!(percentage_of(2, 3), 67.0);
/// assert_eq!(percentage_of(0, 0), 0.0);
/// ```
#[must_use]
pub fn percentage_of(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (f64::from(correct) / f64::from(total) * 100.0).round()
}

//
// ─── RESULTS ───────────────────────────────────────────────────────────────────
//

/// Counts answers that match a locally known correct option.
///
/// Questions without a known correct option count as incorrect, as do
/// unanswered ones.
#[must_use]
pub fn count_correct_locally(quiz: &Quiz, sheet: &AnswerSheet) -> u32 {
    let matches = quiz
        .questions()
        .iter()
        .enumerate()
        .filter(|(index, question)| match (sheet.get(*index), question.correct()) {
            (Some(chosen), Some(correct)) => chosen == correct,
            _ => false,
        })
        .count();
    u32::try_from(matches).unwrap_or(u32::MAX)
}

/// Builds a result from the grading service's report.
///
/// Marks are clamped to the question count. A missing or non-finite
/// percentage is derived from the marks.
#[must_use]
pub fn result_from_report(
    quiz: &Quiz,
    report: GradeReport,
    threshold: PassThreshold,
    graded_at: DateTime<Utc>,
) -> QuizResult {
    let total = question_total(quiz);
    let correct = report.marks.min(total);
    let percentage = report
        .percentage
        .filter(|p| p.is_finite())
        .map_or_else(|| percentage_of(correct, total), |p| p.clamp(0.0, 100.0));

    QuizResult {
        quiz_id: quiz.id().clone(),
        correct,
        total,
        percentage,
        passed: threshold.is_met_by(percentage),
        scoring_source: ScoringSource::Server,
        graded_at,
    }
}

/// Scores a submission on the client when grading is unreachable.
#[must_use]
pub fn result_from_local(
    quiz: &Quiz,
    sheet: &AnswerSheet,
    threshold: PassThreshold,
    graded_at: DateTime<Utc>,
) -> QuizResult {
    let total = question_total(quiz);
    let correct = count_correct_locally(quiz, sheet);
    let percentage = percentage_of(correct, total);

    QuizResult {
        quiz_id: quiz.id().clone(),
        correct,
        total,
        percentage,
        passed: threshold.is_met_by(percentage),
        scoring_source: ScoringSource::LocalFallback,
        graded_at,
    }
}

fn question_total(quiz: &Quiz) -> u32 {
    u32::try_from(quiz.question_count()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Question, QuizId};
    use crate::time::fixed_now;

    fn options() -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into()]
    }

    fn quiz_without_keys() -> Quiz {
        Quiz::new(
            QuizId::new("q1"),
            "Rust basics",
            vec![Question::new("Q0", options()), Question::new("Q1", options())],
            5,
        )
        .unwrap()
    }

    fn quiz_with_keys() -> Quiz {
        Quiz::new(
            QuizId::new("q2"),
            "Ownership",
            vec![
                Question::new("Q0", options()).with_correct(2),
                Question::new("Q1", options()).with_correct(1),
                Question::new("Q2", options()),
            ],
            5,
        )
        .unwrap()
    }

    #[test]
    fn server_report_drives_percentage_and_pass() {
        let quiz = quiz_without_keys();
        let result = result_from_report(
            &quiz,
            GradeReport::new(1, Some(50.0)),
            PassThreshold::default(),
            fixed_now(),
        );
        assert_eq!(result.correct, 1);
        assert_eq!(result.total, 2);
        assert_eq!(result.display_percentage(), 50);
        assert!(!result.passed);
        assert_eq!(result.scoring_source, ScoringSource::Server);
    }

    #[test]
    fn server_report_without_percentage_is_derived() {
        let quiz = quiz_without_keys();
        let result = result_from_report(
            &quiz,
            GradeReport::new(2, None),
            PassThreshold::default(),
            fixed_now(),
        );
        assert_eq!(result.percentage, 100.0);
        assert!(result.passed);
    }

    #[test]
    fn server_marks_are_clamped() {
        let quiz = quiz_without_keys();
        let result = result_from_report(
            &quiz,
            GradeReport::new(9, Some(f64::NAN)),
            PassThreshold::default(),
            fixed_now(),
        );
        assert_eq!(result.correct, 2);
        assert_eq!(result.percentage, 100.0);
    }

    #[test]
    fn local_scoring_without_keys_is_zero() {
        let quiz = quiz_without_keys();
        let sheet = AnswerSheet::new(vec![Some(2), Some(0)]);
        let result = result_from_local(&quiz, &sheet, PassThreshold::default(), fixed_now());
        assert_eq!(result.correct, 0);
        assert_eq!(result.total, 2);
        assert_eq!(result.percentage, 0.0);
        assert!(!result.passed);
        assert!(result.is_unverified());
    }

    #[test]
    fn local_scoring_counts_known_keys() {
        let quiz = quiz_with_keys();
        let sheet = AnswerSheet::new(vec![Some(2), Some(0), Some(1)]);
        assert_eq!(count_correct_locally(&quiz, &sheet), 1);

        let sheet = AnswerSheet::new(vec![Some(2), Some(1), None]);
        let result = result_from_local(&quiz, &sheet, PassThreshold::default(), fixed_now());
        assert_eq!(result.correct, 2);
        assert_eq!(result.display_percentage(), 67);
        assert!(!result.passed);
    }
}
