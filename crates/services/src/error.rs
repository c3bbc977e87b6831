//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{AttemptError, ThresholdError};

/// Transport-level failures talking to the quiz backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizApiError {
    #[error("quiz api request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("invalid quiz api url: {0}")]
    Url(#[from] url::ParseError),
    #[error("could not decode quiz api response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unexpected quiz api response: {0}")]
    InvalidResponse(String),
}

/// Errors emitted by `QuizSession`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("quiz catalog unavailable")]
    CatalogUnavailable(#[source] QuizApiError),
    #[error("quiz grading unavailable")]
    GradingUnavailable(#[source] QuizApiError),
    #[error("invalid selection: option {option} for question {question}")]
    InvalidSelection { question: usize, option: usize },
    #[error("quiz has no questions")]
    NoQuestions,
    #[error("no attempt selected")]
    NoAttempt,
    #[error("attempt is not in progress")]
    NotInProgress,
}

impl From<AttemptError> for SessionError {
    fn from(err: AttemptError) -> Self {
        match err {
            AttemptError::NoQuestions => Self::NoQuestions,
            AttemptError::InvalidSelection { question, option } => {
                Self::InvalidSelection { question, option }
            }
        }
    }
}

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{var} is not a valid url: {raw}")]
    InvalidUrl {
        var: &'static str,
        raw: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{var} must use http or https, got {scheme}")]
    UnsupportedScheme { var: &'static str, scheme: String },
    #[error("{var} must be a positive integer, got {raw}")]
    InvalidNumber { var: &'static str, raw: String },
    #[error("{var} must be true or false, got {raw}")]
    InvalidBool { var: &'static str, raw: String },
    #[error(transparent)]
    Threshold(#[from] ThresholdError),
}
