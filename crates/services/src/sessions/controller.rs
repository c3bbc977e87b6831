use std::fmt;
use std::sync::Arc;

use quiz_core::model::{Attempt, AttemptId, Question, Quiz, QuizId, QuizResult, Step, TickOutcome};
use quiz_core::scoring::{result_from_local, result_from_report};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use super::countdown::{Countdown, CountdownTick};
use super::progress::{AttemptProgress, CatalogSummary};
use crate::Clock;
use crate::api::{QuizCatalog, QuizGrader};
use crate::config::SessionConfig;
use crate::error::SessionError;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Lifecycle of the controller's current attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No attempt selected.
    Idle,
    /// Answering questions; the countdown is running.
    InProgress,
    /// Waiting on the grading service. Only observable from inside `submit`.
    Submitting,
    /// Scored; the result is available.
    Completed,
}

/// What a navigation request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Moved(usize),
    /// Already at the boundary.
    Stayed,
    /// The current question needs an answer first.
    Blocked,
    /// `advance()` on the last question submitted the attempt.
    Submitted,
}

/// What a countdown tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// Stale tick or no attempt in progress.
    Ignored,
    Running { remaining_secs: u32 },
    /// Time ran out and the attempt was submitted.
    Expired,
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Drives one quiz attempt from selection through scored results.
///
/// The controller is owned by a single task. The countdown runs as a
/// separate Tokio task and reports through [`QuizSession::recv_tick`];
/// the owner feeds each tick back with [`QuizSession::on_tick`].
pub struct QuizSession {
    clock: Clock,
    config: SessionConfig,
    catalog: Arc<dyn QuizCatalog>,
    grader: Arc<dyn QuizGrader>,
    quizzes: Vec<Arc<Quiz>>,
    state: SessionState,
    attempt: Option<Attempt>,
    result: Option<QuizResult>,
    fallback_reason: Option<SessionError>,
    last_attempt_id: AttemptId,
    countdown: Option<Countdown>,
    ticks_tx: UnboundedSender<CountdownTick>,
    ticks_rx: UnboundedReceiver<CountdownTick>,
}

impl QuizSession {
    #[must_use]
    pub fn new(clock: Clock, catalog: Arc<dyn QuizCatalog>, grader: Arc<dyn QuizGrader>) -> Self {
        let (ticks_tx, ticks_rx) = mpsc::unbounded_channel();
        Self {
            clock,
            config: SessionConfig::default(),
            catalog,
            grader,
            quizzes: Vec::new(),
            state: SessionState::Idle,
            attempt: None,
            result: None,
            fallback_reason: None,
            last_attempt_id: AttemptId::new(0),
            countdown: None,
            ticks_tx,
            ticks_rx,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn attempt(&self) -> Option<&Attempt> {
        self.attempt.as_ref()
    }

    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    /// Why the current result was scored locally, if it was.
    #[must_use]
    pub fn fallback_reason(&self) -> Option<&SessionError> {
        self.fallback_reason.as_ref()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.attempt.as_ref().and_then(Attempt::current_question)
    }

    #[must_use]
    pub fn progress(&self) -> Option<AttemptProgress> {
        let attempt = self.attempt.as_ref()?;
        let total = attempt.question_count();
        let position = attempt.current_index() + 1;
        let percent_through = u32::try_from(position * 100 / total.max(1)).unwrap_or(100);
        Some(AttemptProgress {
            position,
            total,
            answered: attempt.answered_count(),
            remaining_secs: attempt.remaining_secs(),
            percent_through,
        })
    }

    // ─── Catalog ───────────────────────────────────────────────────────────────

    /// Fetches the list of available quizzes.
    ///
    /// On failure the stored catalog is cleared, so callers that ignore the
    /// error still see an empty list.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::CatalogUnavailable` for network, status or decode failures.
    pub async fn load_catalog(&mut self) -> Result<&[Arc<Quiz>], SessionError> {
        match self.catalog.list_quizzes().await {
            Ok(quizzes) => {
                info!(count = quizzes.len(), "quiz catalog loaded");
                self.quizzes = quizzes.into_iter().map(Arc::new).collect();
                Ok(self.quizzes.as_slice())
            }
            Err(err) => {
                warn!(error = %err, "quiz catalog unavailable");
                self.quizzes.clear();
                Err(SessionError::CatalogUnavailable(err))
            }
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &[Arc<Quiz>] {
        &self.quizzes
    }

    #[must_use]
    pub fn find_quiz(&self, id: &QuizId) -> Option<Arc<Quiz>> {
        self.quizzes.iter().find(|quiz| quiz.id() == id).cloned()
    }

    #[must_use]
    pub fn catalog_summary(&self) -> CatalogSummary {
        CatalogSummary {
            quizzes: self.quizzes.len(),
            questions: self.quizzes.iter().map(|quiz| quiz.question_count()).sum(),
        }
    }

    // ─── Attempt lifecycle ─────────────────────────────────────────────────────

    /// Starts a timed attempt on `quiz`, discarding any current attempt.
    ///
    /// Must be called from within a Tokio runtime; the countdown is spawned on it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoQuestions` if the quiz is empty. The current
    /// attempt, if any, is kept in that case.
    pub async fn start_attempt(&mut self, quiz: Arc<Quiz>) -> Result<&Attempt, SessionError> {
        let id = self.last_attempt_id.next();
        let attempt = Attempt::start(id, quiz, self.clock.now())?;
        self.last_attempt_id = id;

        self.stop_countdown();
        info!(
            attempt = %id,
            quiz_id = %attempt.quiz().id(),
            questions = attempt.question_count(),
            seconds = attempt.remaining_secs(),
            "attempt started"
        );
        self.result = None;
        self.fallback_reason = None;
        self.state = SessionState::InProgress;
        self.countdown = Some(Countdown::start(id, self.ticks_tx.clone()));
        let attempt: &Attempt = self.attempt.insert(attempt);
        Ok(attempt)
    }

    /// Records or overwrites the answer for a question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside an active attempt and
    /// `SessionError::InvalidSelection` for out-of-range indices. Neither
    /// changes any state.
    pub fn select_answer(&mut self, question: usize, option: usize) -> Result<(), SessionError> {
        let attempt = self.in_progress_mut()?;
        attempt.select_answer(question, option)?;
        debug!(question, option, "answer recorded");
        Ok(())
    }

    /// Moves to the next question, or submits from the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside an active attempt.
    pub async fn advance(&mut self) -> Result<Navigation, SessionError> {
        let require_answer = self.config.require_answer_to_advance;
        let step = self.in_progress_mut()?.advance(require_answer);
        match step {
            Step::Moved(index) => Ok(Navigation::Moved(index)),
            Step::Blocked => Ok(Navigation::Blocked),
            Step::Finished => {
                self.submit().await?;
                Ok(Navigation::Submitted)
            }
        }
    }

    /// Moves to the previous question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside an active attempt.
    pub fn retreat(&mut self) -> Result<Navigation, SessionError> {
        let attempt = self.in_progress_mut()?;
        if attempt.retreat() {
            Ok(Navigation::Moved(attempt.current_index()))
        } else {
            Ok(Navigation::Stayed)
        }
    }

    /// Submits the attempt for grading.
    ///
    /// Falls back to local scoring when the grading service fails; the
    /// result is then tagged as a local fallback. Calling this again once the
    /// attempt is completed returns the stored result without regrading.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoAttempt` when idle.
    pub async fn submit(&mut self) -> Result<&QuizResult, SessionError> {
        if self.state != SessionState::InProgress {
            return self.result.as_ref().ok_or(SessionError::NoAttempt);
        }
        let (attempt_id, quiz, sheet) = match self.attempt.as_ref() {
            Some(attempt) => (
                attempt.id(),
                Arc::clone(attempt.quiz()),
                attempt.answer_sheet(),
            ),
            None => return Err(SessionError::NoAttempt),
        };

        self.stop_countdown();
        self.state = SessionState::Submitting;
        info!(
            attempt = %attempt_id,
            quiz_id = %quiz.id(),
            answered = sheet.answered(),
            total = sheet.len(),
            "submitting attempt"
        );

        let threshold = self.config.pass_threshold;
        let result = match self.grader.grade(quiz.id(), &sheet).await {
            Ok(report) => result_from_report(&quiz, report, threshold, self.clock.now()),
            Err(err) => {
                warn!(quiz_id = %quiz.id(), error = %err, "grading unavailable; scoring locally");
                self.fallback_reason = Some(SessionError::GradingUnavailable(err));
                result_from_local(&quiz, &sheet, threshold, self.clock.now())
            }
        };

        info!(
            quiz_id = %quiz.id(),
            correct = result.correct,
            total = result.total,
            percentage = result.percentage,
            passed = result.passed,
            source = ?result.scoring_source,
            "attempt completed"
        );
        self.state = SessionState::Completed;
        let result: &QuizResult = self.result.insert(result);
        Ok(result)
    }

    /// Discards the current attempt and starts over on the same quiz.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoAttempt` when idle.
    pub async fn retake(&mut self) -> Result<&Attempt, SessionError> {
        let quiz = self
            .attempt
            .as_ref()
            .map(|attempt| Arc::clone(attempt.quiz()))
            .ok_or(SessionError::NoAttempt)?;
        self.start_attempt(quiz).await
    }

    /// Discards the attempt entirely and returns to idle.
    pub fn reset(&mut self) {
        self.stop_countdown();
        if let Some(attempt) = self.attempt.take() {
            info!(attempt = %attempt.id(), "attempt discarded");
        }
        self.result = None;
        self.fallback_reason = None;
        self.state = SessionState::Idle;
    }

    // ─── Countdown ─────────────────────────────────────────────────────────────

    /// Waits for the next countdown tick.
    ///
    /// Pending forever while no attempt is in progress.
    pub async fn recv_tick(&mut self) -> Option<CountdownTick> {
        self.ticks_rx.recv().await
    }

    /// Applies one countdown tick, submitting when time runs out.
    ///
    /// Ticks for a previous attempt, or arriving outside `InProgress`, are ignored.
    pub async fn on_tick(&mut self, tick: CountdownTick) -> TickStatus {
        if self.state != SessionState::InProgress {
            return TickStatus::Ignored;
        }
        let Some(attempt) = self.attempt.as_mut() else {
            return TickStatus::Ignored;
        };
        if attempt.id() != tick.attempt() {
            debug!(tick = %tick.attempt(), current = %attempt.id(), "stale tick ignored");
            return TickStatus::Ignored;
        }

        match attempt.tick() {
            TickOutcome::Running { remaining_secs } => {
                debug!(remaining_secs, "countdown tick");
                TickStatus::Running { remaining_secs }
            }
            TickOutcome::Expired => {
                info!(attempt = %attempt.id(), "time expired");
                // State is InProgress with an attempt, so submit cannot fail.
                let _ = self.submit().await;
                TickStatus::Expired
            }
        }
    }

    fn in_progress_mut(&mut self) -> Result<&mut Attempt, SessionError> {
        if self.state != SessionState::InProgress {
            return Err(SessionError::NotInProgress);
        }
        self.attempt.as_mut().ok_or(SessionError::NoAttempt)
    }

    fn stop_countdown(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            debug!(attempt = %countdown.attempt(), "countdown stopped");
            countdown.cancel();
        }
        while self.ticks_rx.try_recv().is_ok() {}
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("state", &self.state)
            .field("quizzes_len", &self.quizzes.len())
            .field("attempt", &self.attempt.as_ref().map(Attempt::id))
            .field("result", &self.result)
            .field("countdown", &self.countdown.is_some())
            .finish_non_exhaustive()
    }
}
