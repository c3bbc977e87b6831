use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::AttemptId;
use crate::model::quiz::{Question, Quiz};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttemptError {
    #[error("quiz has no questions")]
    NoQuestions,

    #[error("invalid selection: option {option} for question {question}")]
    InvalidSelection { question: usize, option: usize },
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Result of asking an attempt to move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Moved to the question at this index.
    Moved(usize),
    /// The current question has no answer and the guard is on.
    Blocked,
    /// Already on the last question; the caller should submit.
    Finished,
}

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running { remaining_secs: u32 },
    Expired,
}

//
// ─── ANSWER SHEET ──────────────────────────────────────────────────────────────
//

/// Ordered answers for submission, one slot per question.
///
/// `None` marks an unanswered question and serializes as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AnswerSheet(Vec<Option<usize>>);

impl AnswerSheet {
    #[must_use]
    pub fn new(entries: Vec<Option<usize>>) -> Self {
        Self(entries)
    }

    #[must_use]
    pub fn entries(&self) -> &[Option<usize>] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<usize> {
        self.0.get(index).copied().flatten()
    }

    #[must_use]
    pub fn answered(&self) -> usize {
        self.0.iter().filter(|slot| slot.is_some()).count()
    }
}

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

/// One in-progress run through a quiz.
///
/// Lifecycle state lives in the controller that owns the attempt.
#[derive(Debug, Clone)]
pub struct Attempt {
    id: AttemptId,
    quiz: Arc<Quiz>,
    current: usize,
    answers: BTreeMap<usize, usize>,
    remaining_secs: u32,
    started_at: DateTime<Utc>,
}

impl Attempt {
    /// Starts a fresh attempt with the full allotted time.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NoQuestions` if the quiz is empty.
    pub fn start(
        id: AttemptId,
        quiz: Arc<Quiz>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, AttemptError> {
        if quiz.question_count() == 0 {
            return Err(AttemptError::NoQuestions);
        }
        let remaining_secs = quiz.duration_secs();
        Ok(Self {
            id,
            quiz,
            current: 0,
            answers: BTreeMap::new(),
            remaining_secs,
            started_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn quiz(&self) -> &Arc<Quiz> {
        &self.quiz
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.quiz.question(self.current)
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.quiz.question_count()
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.current + 1 >= self.question_count()
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<usize, usize> {
        &self.answers
    }

    #[must_use]
    pub fn answer(&self, question: usize) -> Option<usize> {
        self.answers.get(&question).copied()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn current_is_answered(&self) -> bool {
        self.answers.contains_key(&self.current)
    }

    /// Records or overwrites the answer for a question.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::InvalidSelection` when the question or option
    /// index is out of range. The attempt is left untouched.
    pub fn select_answer(&mut self, question: usize, option: usize) -> Result<(), AttemptError> {
        let in_range = self
            .quiz
            .question(question)
            .is_some_and(|q| option < q.option_count());
        if !in_range {
            return Err(AttemptError::InvalidSelection { question, option });
        }
        self.answers.insert(question, option);
        Ok(())
    }

    /// Moves to the next question.
    ///
    /// With `require_answer` set, an unanswered current question blocks the
    /// move, including the final "finish" step.
    pub fn advance(&mut self, require_answer: bool) -> Step {
        if require_answer && !self.current_is_answered() {
            return Step::Blocked;
        }
        if self.is_last_question() {
            return Step::Finished;
        }
        self.current += 1;
        Step::Moved(self.current)
    }

    /// Moves to the previous question. Returns `false` on the first question.
    pub fn retreat(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Consumes one second of the countdown.
    pub fn tick(&mut self) -> TickOutcome {
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            TickOutcome::Expired
        } else {
            TickOutcome::Running {
                remaining_secs: self.remaining_secs,
            }
        }
    }

    /// Builds the ordered answer sheet, leaving gaps as unanswered.
    #[must_use]
    pub fn answer_sheet(&self) -> AnswerSheet {
        AnswerSheet::new(
            (0..self.question_count())
                .map(|index| self.answer(index))
                .collect(),
        )
    }
}
