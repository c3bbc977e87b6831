mod attempt;
mod ids;
mod quiz;
mod result;

pub use ids::{AttemptId, ParseIdError, QuizId};

pub use attempt::{AnswerSheet, Attempt, AttemptError, Step, TickOutcome};
pub use quiz::{DEFAULT_DURATION_MINUTES, Question, Quiz, QuizError};
pub use result::{PassThreshold, QuizResult, ScoringSource, ThresholdError};
