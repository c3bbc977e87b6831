mod http;
mod wire;

use async_trait::async_trait;
use quiz_core::model::{AnswerSheet, Quiz, QuizId};
use quiz_core::scoring::GradeReport;

use crate::error::QuizApiError;

pub use http::HttpQuizApi;
pub use wire::{decode_catalog, decode_grade};

/// Source of quiz definitions.
#[async_trait]
pub trait QuizCatalog: Send + Sync {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, QuizApiError>;
}

/// Remote grader for submitted answer sheets.
#[async_trait]
pub trait QuizGrader: Send + Sync {
    async fn grade(&self, quiz_id: &QuizId, answers: &AnswerSheet)
    -> Result<GradeReport, QuizApiError>;
}
