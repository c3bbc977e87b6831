//! Backend JSON shapes and their conversion into domain types.

use quiz_core::model::{DEFAULT_DURATION_MINUTES, Question, Quiz, QuizError, QuizId};
use quiz_core::scoring::GradeReport;
use serde::Deserialize;
use tracing::warn;

use crate::error::QuizApiError;

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    /// Kept raw so one malformed entry is skipped instead of failing the list.
    #[serde(default)]
    quizzes: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct WireQuiz {
    #[serde(alias = "id")]
    video_id: String,
    course_title: String,
    #[serde(default)]
    duration: Option<serde_json::Value>,
    #[serde(default)]
    passing_criteria: Option<u32>,
    #[serde(default, alias = "questions")]
    quiz: Option<WireQuestions>,
}

/// The backend stores question sets as a JSON string and may return it as-is.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireQuestions {
    List(Vec<WireQuestion>),
    Encoded(String),
}

#[derive(Debug, Deserialize)]
struct WireQuestion {
    question: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default, alias = "answer")]
    correct: Option<WireCorrect>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireCorrect {
    Index(usize),
    Text(String),
    Unrecognized(#[allow(dead_code)] serde::de::IgnoredAny),
}

impl WireQuestion {
    fn into_question(self) -> Question {
        let question = Question::new(self.question, self.options);
        let correct = match self.correct {
            Some(WireCorrect::Index(index)) if index < question.option_count() => Some(index),
            Some(WireCorrect::Text(text)) => question.option_index(&text),
            _ => None,
        };
        match correct {
            Some(index) => question.with_correct(index),
            None => question,
        }
    }
}

impl WireQuestions {
    fn into_questions(self) -> Result<Vec<WireQuestion>, serde_json::Error> {
        match self {
            WireQuestions::List(list) => Ok(list),
            WireQuestions::Encoded(raw) if raw.trim().is_empty() => Ok(Vec::new()),
            WireQuestions::Encoded(raw) => serde_json::from_str(&raw),
        }
    }
}

#[derive(Debug)]
enum SkipReason {
    Shape(serde_json::Error),
    Questions(serde_json::Error),
    Invalid(QuizError),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Shape(err) => write!(f, "malformed entry: {err}"),
            SkipReason::Questions(err) => write!(f, "undecodable questions: {err}"),
            SkipReason::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl WireQuiz {
    fn into_quiz(self) -> Result<Quiz, SkipReason> {
        let questions = match self.quiz {
            Some(raw) => raw.into_questions().map_err(SkipReason::Questions)?,
            None => Vec::new(),
        };
        let questions = questions
            .into_iter()
            .map(WireQuestion::into_question)
            .collect();

        let quiz = Quiz::new(
            QuizId::new(self.video_id),
            self.course_title,
            questions,
            duration_minutes(self.duration),
        )
        .map_err(SkipReason::Invalid)?;

        Ok(match self.passing_criteria {
            Some(percent) => quiz.with_passing_criteria(percent),
            None => quiz,
        })
    }
}

/// Whole minutes, rounded up. Missing, unparsable or non-positive values
/// fall back to the default.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn duration_minutes(raw: Option<serde_json::Value>) -> u32 {
    let minutes = raw.and_then(|value| match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    });
    match minutes {
        Some(minutes) if minutes.is_finite() && minutes > 0.0 => {
            minutes.ceil().min(f64::from(u32::MAX)) as u32
        }
        _ => DEFAULT_DURATION_MINUTES,
    }
}

/// Decodes a `/api/quizzes` body.
///
/// Entries that do not form a valid quiz are skipped with a warning so one
/// bad course does not hide the rest of the catalog.
///
/// # Errors
///
/// Returns `QuizApiError::Decode` when the body is not a catalog document.
pub fn decode_catalog(body: &[u8]) -> Result<Vec<Quiz>, QuizApiError> {
    let response: CatalogResponse = serde_json::from_slice(body)?;
    let mut quizzes = Vec::with_capacity(response.quizzes.len());
    for raw in response.quizzes {
        let id = entry_id(&raw);
        let decoded = serde_json::from_value::<WireQuiz>(raw)
            .map_err(SkipReason::Shape)
            .and_then(WireQuiz::into_quiz);
        match decoded {
            Ok(quiz) => quizzes.push(quiz),
            Err(reason) => warn!(quiz_id = %id, %reason, "skipping catalog entry"),
        }
    }
    Ok(quizzes)
}

fn entry_id(raw: &serde_json::Value) -> String {
    ["video_id", "id"]
        .iter()
        .find_map(|key| raw.get(key))
        .map_or_else(|| "?".to_owned(), |id| match id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
}

//
// ─── GRADING ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Default, Deserialize)]
struct GradeResponse {
    #[serde(default)]
    marks: Option<f64>,
    #[serde(default)]
    percentage: Option<f64>,
    #[serde(default)]
    result: Option<GradeDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct GradeDetail {
    #[serde(default)]
    quiz_evaluation: Option<Evaluation>,
    #[serde(default)]
    marks: Option<f64>,
    #[serde(default)]
    percentage: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Evaluation {
    #[serde(default)]
    marks: Option<f64>,
    #[serde(default)]
    percentage: Option<f64>,
}

/// Decodes a `/api/check-quiz` body.
///
/// Marks come from `result.quiz_evaluation` first, then `result`, then the
/// top level. The percentage is taken from the same place when present.
///
/// # Errors
///
/// Returns `QuizApiError::Decode` for malformed JSON and
/// `QuizApiError::InvalidResponse` when no usable marks value exists.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn decode_grade(body: &[u8]) -> Result<GradeReport, QuizApiError> {
    let response: GradeResponse = serde_json::from_slice(body)?;
    let detail = response.result.unwrap_or_default();
    let evaluation = detail.quiz_evaluation.unwrap_or_default();

    let candidates = [
        (evaluation.marks, evaluation.percentage),
        (detail.marks, detail.percentage),
        (response.marks, response.percentage),
    ];
    let (marks, percentage) = candidates
        .into_iter()
        .find_map(|(marks, percentage)| {
            marks
                .filter(|m| m.is_finite() && *m >= 0.0)
                .map(|m| (m, percentage))
        })
        .ok_or_else(|| QuizApiError::InvalidResponse("grading response has no marks".into()))?;

    Ok(GradeReport::new(
        marks.round().min(f64::from(u32::MAX)) as u32,
        percentage.filter(|p| p.is_finite()),
    ))
}
