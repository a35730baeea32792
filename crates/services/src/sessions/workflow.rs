use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use quiz_core::model::{QuizId, QuizResult};
use storage::repository::QuizRepository;

use super::service::{QuizSession, SessionMode};
use super::shuffle::{QuestionShuffler, RandomShuffler};
use super::sink::ResultSink;
use super::timer::{Countdown, SessionTimer, TimerEvent};
use crate::Clock;
use crate::error::SessionError;

/// What a timer event did to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerOutcome {
    /// The event belonged to another attempt, or the session is already scored.
    Ignored,
    Tick { remaining_secs: u32 },
    Expired(QuizResult),
}

/// Orchestrates session start, completion and timing against storage.
#[derive(Clone)]
pub struct QuizPlayService {
    clock: Clock,
    quizzes: Arc<dyn QuizRepository>,
    shuffler: Arc<dyn QuestionShuffler>,
    sink: Arc<dyn ResultSink>,
    tick: Duration,
}

impl std::fmt::Debug for QuizPlayService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizPlayService")
            .field("clock", &self.clock)
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}

impl QuizPlayService {
    pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

    #[must_use]
    pub fn new(
        clock: Clock,
        quizzes: Arc<dyn QuizRepository>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            clock,
            quizzes,
            shuffler: Arc::new(RandomShuffler),
            sink,
            tick: Self::DEFAULT_TICK,
        }
    }

    #[must_use]
    pub fn with_shuffler(mut self, shuffler: Arc<dyn QuestionShuffler>) -> Self {
        self.shuffler = shuffler;
        self
    }

    #[must_use]
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Load a quiz and start a session for it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::QuizNotFound` for unknown ids, `InvalidQuiz` for
    /// unplayable quizzes and `Storage` for repository failures.
    pub async fn start_session(&self, quiz_id: QuizId) -> Result<QuizSession, SessionError> {
        let quiz = self
            .quizzes
            .get_quiz(quiz_id)
            .await?
            .ok_or(SessionError::QuizNotFound(quiz_id))?;
        QuizSession::start(
            Arc::new(quiz),
            Arc::clone(&self.shuffler),
            Arc::clone(&self.sink),
            self.clock.now(),
        )
    }

    /// Finish the session now.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::finish`].
    pub fn finish(&self, session: &mut QuizSession) -> Result<QuizResult, SessionError> {
        session.finish(self.clock.now()).cloned()
    }

    /// Restart a completed session now.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::restart`].
    pub fn restart(&self, session: &mut QuizSession) -> Result<(), SessionError> {
        session.restart(self.clock.now())
    }

    /// Spawn a timer for the session's current attempt.
    ///
    /// Returns `None` when the quiz has no time limit or the session is not in
    /// progress. Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn_timer(
        &self,
        session: &QuizSession,
        events: mpsc::UnboundedSender<TimerEvent>,
    ) -> Option<SessionTimer> {
        if session.mode() != SessionMode::InProgress {
            return None;
        }
        let limit = session.quiz().time_limit_secs()?;
        Some(SessionTimer::spawn(
            Countdown::new(session.started_at(), limit),
            self.clock,
            session.attempt(),
            self.tick,
            events,
        ))
    }

    /// Apply a timer event to the session it was spawned for.
    #[must_use]
    pub fn on_timer_event(&self, session: &mut QuizSession, event: TimerEvent) -> TimerOutcome {
        if event.attempt() != session.attempt() || session.is_completed() {
            tracing::debug!(
                event_attempt = event.attempt(),
                attempt = session.attempt(),
                mode = ?session.mode(),
                "stale timer event ignored"
            );
            return TimerOutcome::Ignored;
        }
        match event {
            TimerEvent::Tick { remaining_secs, .. } => TimerOutcome::Tick { remaining_secs },
            TimerEvent::Expired { .. } => match session.expire_by_timer(self.clock.now()) {
                Ok(result) => TimerOutcome::Expired(result.clone()),
                Err(err) => {
                    tracing::warn!(error = %err, "timer expiry rejected");
                    TimerOutcome::Ignored
                }
            },
        }
    }
}
