use thiserror::Error;

use crate::model::ids::QuizId;

/// Duration applied when the catalog does not state one.
pub const DEFAULT_DURATION_MINUTES: u32 = 10;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz id cannot be empty")]
    EmptyId,

    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("quiz duration must be > 0 minutes")]
    InvalidDuration,

    #[error("question {index} has no options")]
    NoOptions { index: usize },

    #[error("question {index} marks option {correct} correct but has {options} options")]
    CorrectOutOfRange {
        index: usize,
        correct: usize,
        options: usize,
    },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question.
///
/// The correct option is normally kept server-side. When the catalog does
/// expose it, it is only used for fallback scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    prompt: String,
    options: Vec<String>,
    correct: Option<usize>,
}

impl Question {
    #[must_use]
    pub fn new(prompt: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            prompt: prompt.into(),
            options,
            correct: None,
        }
    }

    /// Attaches a locally known correct option index.
    #[must_use]
    pub fn with_correct(mut self, correct: usize) -> Self {
        self.correct = Some(correct);
        self
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn correct(&self) -> Option<usize> {
        self.correct
    }

    /// Finds the index of an option by its text, ignoring case and
    /// surrounding whitespace.
    #[must_use]
    pub fn option_index(&self, text: &str) -> Option<usize> {
        let needle = text.trim();
        self.options
            .iter()
            .position(|option| option.trim().eq_ignore_ascii_case(needle))
    }

    fn validate(&self, index: usize) -> Result<(), QuizError> {
        if self.options.is_empty() {
            return Err(QuizError::NoOptions { index });
        }
        match self.correct {
            Some(correct) if correct >= self.options.len() => Err(QuizError::CorrectOutOfRange {
                index,
                correct,
                options: self.options.len(),
            }),
            _ => Ok(()),
        }
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// A timed quiz attached to a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    id: QuizId,
    course_title: String,
    questions: Vec<Question>,
    duration_minutes: u32,
    passing_criteria: Option<u32>,
}

impl Quiz {
    /// Creates a validated quiz.
    ///
    /// A quiz with no questions is valid here; it simply cannot be started.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` for an empty id or title, a zero duration, or a
    /// malformed question.
    pub fn new(
        id: QuizId,
        course_title: impl Into<String>,
        questions: Vec<Question>,
        duration_minutes: u32,
    ) -> Result<Self, QuizError> {
        if id.is_empty() {
            return Err(QuizError::EmptyId);
        }
        let course_title = course_title.into().trim().to_owned();
        if course_title.is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        if duration_minutes == 0 {
            return Err(QuizError::InvalidDuration);
        }
        for (index, question) in questions.iter().enumerate() {
            question.validate(index)?;
        }

        Ok(Self {
            id,
            course_title,
            questions,
            duration_minutes,
            passing_criteria: None,
        })
    }

    /// Records the course's own passing criteria (percent) as stored by the backend.
    #[must_use]
    pub fn with_passing_criteria(mut self, percent: u32) -> Self {
        self.passing_criteria = Some(percent);
        self
    }

    #[must_use]
    pub fn id(&self) -> &QuizId {
        &self.id
    }

    #[must_use]
    pub fn course_title(&self) -> &str {
        &self.course_title
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    /// Total allotted time in seconds.
    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_minutes.saturating_mul(60)
    }

    #[must_use]
    pub fn passing_criteria(&self) -> Option<u32> {
        self.passing_criteria
    }
}
