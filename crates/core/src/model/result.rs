use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuizId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ThresholdError {
    #[error("pass threshold must be between 0 and 100, got {0}")]
    OutOfRange(u32),
}

/// Minimum percentage needed to pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassThreshold(u8);

impl PassThreshold {
    pub const DEFAULT_PERCENT: u8 = 70;

    /// # Errors
    ///
    /// Returns `ThresholdError::OutOfRange` above 100.
    pub fn new(percent: u32) -> Result<Self, ThresholdError> {
        u8::try_from(percent)
            .ok()
            .filter(|p| *p <= 100)
            .map(Self)
            .ok_or(ThresholdError::OutOfRange(percent))
    }

    #[must_use]
    pub fn percent(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_met_by(self, percentage: f64) -> bool {
        percentage >= f64::from(self.0)
    }
}

impl Default for PassThreshold {
    fn default() -> Self {
        Self(Self::DEFAULT_PERCENT)
    }
}

/// Where a result's score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringSource {
    /// Graded by the grading service.
    Server,
    /// Estimated on the client because grading was unreachable. Unverified.
    LocalFallback,
}

/// Outcome of a submitted attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizResult {
    pub quiz_id: QuizId,
    pub correct: u32,
    pub total: u32,
    pub percentage: f64,
    pub passed: bool,
    pub scoring_source: ScoringSource,
    pub graded_at: DateTime<Utc>,
}

impl QuizResult {
    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.total.saturating_sub(self.correct)
    }

    /// Whole percent for display, rounded down so it never reads as
    /// reaching a pass mark the unrounded score missed.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn display_percentage(&self) -> u32 {
        self.percentage.clamp(0.0, 100.0).floor() as u32
    }

    /// True when the score was not confirmed by the grading service.
    #[must_use]
    pub fn is_unverified(&self) -> bool {
        self.scoring_source == ScoringSource::LocalFallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn threshold_bounds() {
        assert_eq!(PassThreshold::default().percent(), 70);
        assert!(PassThreshold::new(100).is_ok());
        assert_eq!(
            PassThreshold::new(101).unwrap_err(),
            ThresholdError::OutOfRange(101)
        );
        assert!(PassThreshold::new(300).is_err());
    }

    #[test]
    fn threshold_is_inclusive() {
        let threshold = PassThreshold::default();
        assert!(threshold.is_met_by(70.0));
        assert!(!threshold.is_met_by(69.99));
    }

    #[test]
    fn result_views() {
        let result = QuizResult {
            quiz_id: QuizId::new("q1"),
            correct: 2,
            total: 3,
            percentage: 66.67,
            passed: false,
            scoring_source: ScoringSource::LocalFallback,
            graded_at: fixed_now(),
        };
        assert_eq!(result.incorrect(), 1);
        assert_eq!(result.display_percentage(), 66);
        assert!(result.is_unverified());
    }

    #[test]
    fn displayed_percent_agrees_with_pass_mark() {
        let threshold = PassThreshold::default();
        let result = |percentage: f64| QuizResult {
            quiz_id: QuizId::new("q1"),
            correct: 7,
            total: 10,
            percentage,
            passed: threshold.is_met_by(percentage),
            scoring_source: ScoringSource::Server,
            graded_at: fixed_now(),
        };

        let near_miss = result(69.6);
        assert!(!near_miss.passed);
        assert_eq!(near_miss.display_percentage(), 69);

        let exact = result(70.0);
        assert!(exact.passed);
        assert_eq!(exact.display_percentage(), 70);
    }
}
