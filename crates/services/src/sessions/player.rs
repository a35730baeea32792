use serde::Serialize;
use tokio::sync::mpsc;

use quiz_core::model::{Answer, QuestionId, QuizId, QuizResult};

use super::service::{QuizSession, SessionMode};
use super::timer::{SessionTimer, TimerEvent};
use super::view::SessionSnapshot;
use super::workflow::{QuizPlayService, TimerOutcome};
use crate::error::SessionError;

/// Where a player currently is, including "no quiz chosen yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Selecting,
    InProgress,
    Completed,
    Reviewing,
}

impl From<SessionMode> for SessionPhase {
    fn from(mode: SessionMode) -> Self {
        match mode {
            SessionMode::InProgress => SessionPhase::InProgress,
            SessionMode::Completed => SessionPhase::Completed,
            SessionMode::Reviewing => SessionPhase::Reviewing,
        }
    }
}

/// Drives one user's play-through: at most one session and one live timer.
///
/// Timer events arrive on the receiver returned by [`QuizPlayer::new`]; the
/// caller feeds them back through [`QuizPlayer::on_timer`]. The timer is
/// cancelled whenever the session leaves `InProgress`.
#[derive(Debug)]
pub struct QuizPlayer {
    service: QuizPlayService,
    session: Option<QuizSession>,
    timer: Option<SessionTimer>,
    events: mpsc::UnboundedSender<TimerEvent>,
}

impl QuizPlayer {
    #[must_use]
    pub fn new(service: QuizPlayService) -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let player = Self {
            service,
            session: None,
            timer: None,
            events,
        };
        (player, rx)
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.session
            .as_ref()
            .map_or(SessionPhase::Selecting, |s| s.mode().into())
    }

    #[must_use]
    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.session.as_ref().map(QuizSession::snapshot)
    }

    #[must_use]
    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }

    /// Choose a quiz and start playing it, abandoning any current session.
    ///
    /// # Errors
    ///
    /// See [`QuizPlayService::start_session`]. On error the previous session is kept.
    pub async fn select_quiz(&mut self, quiz_id: QuizId) -> Result<&QuizSession, SessionError> {
        let session = self.service.start_session(quiz_id).await?;
        self.cancel_timer();
        self.timer = self.service.spawn_timer(&session, self.events.clone());
        Ok(&*self.session.insert(session))
    }

    /// # Errors
    ///
    /// `NoActiveSession` before a quiz is selected, otherwise see [`QuizSession::select_answer`].
    pub fn select_answer(&mut self, id: QuestionId, answer: Answer) -> Result<(), SessionError> {
        self.session_mut()?.select_answer(id, answer)
    }

    /// # Errors
    ///
    /// `NoActiveSession` before a quiz is selected, otherwise see [`QuizSession::toggle_option`].
    pub fn toggle_option(&mut self, id: QuestionId, option: usize) -> Result<(), SessionError> {
        self.session_mut()?.toggle_option(id, option)
    }

    /// # Errors
    ///
    /// `NoActiveSession` before a quiz is selected, otherwise see [`QuizSession::skip`].
    pub fn skip(&mut self, id: QuestionId) -> Result<(), SessionError> {
        self.session_mut()?.skip(id)
    }

    /// # Errors
    ///
    /// `NoActiveSession` before a quiz is selected.
    pub fn advance(&mut self) -> Result<bool, SessionError> {
        Ok(self.session_mut()?.advance())
    }

    /// # Errors
    ///
    /// `NoActiveSession` before a quiz is selected.
    pub fn retreat(&mut self) -> Result<bool, SessionError> {
        Ok(self.session_mut()?.retreat())
    }

    /// # Errors
    ///
    /// `NoActiveSession` before a quiz is selected, otherwise see [`QuizSession::finish`].
    pub fn finish(&mut self) -> Result<QuizResult, SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NoActiveSession)?;
        let result = self.service.finish(session)?;
        self.cancel_timer();
        Ok(result)
    }

    /// Route a timer event to the current session.
    pub fn on_timer(&mut self, event: TimerEvent) -> TimerOutcome {
        let Some(session) = self.session.as_mut() else {
            return TimerOutcome::Ignored;
        };
        let outcome = self.service.on_timer_event(session, event);
        if matches!(outcome, TimerOutcome::Expired(_)) {
            self.cancel_timer();
        }
        outcome
    }

    /// # Errors
    ///
    /// `NoActiveSession` before a quiz is selected, otherwise see [`QuizSession::enter_review`].
    pub fn enter_review(&mut self) -> Result<(), SessionError> {
        self.session_mut()?.enter_review()
    }

    /// Start a new attempt at the current quiz, with a fresh timer.
    ///
    /// # Errors
    ///
    /// `NoActiveSession` before a quiz is selected, otherwise see [`QuizSession::restart`].
    pub fn restart(&mut self) -> Result<(), SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NoActiveSession)?;
        self.service.restart(session)?;
        let timer = self.service.spawn_timer(session, self.events.clone());
        if let Some(old) = std::mem::replace(&mut self.timer, timer) {
            old.cancel();
        }
        Ok(())
    }

    /// Drop the current session without scoring it and return to quiz selection.
    pub fn abandon(&mut self) {
        self.cancel_timer();
        if let Some(session) = self.session.take() {
            tracing::debug!(
                quiz_id = %session.quiz().id(),
                attempt = session.attempt(),
                completed = session.is_completed(),
                "session abandoned"
            );
        }
    }

    fn session_mut(&mut self) -> Result<&mut QuizSession, SessionError> {
        self.session.as_mut().ok_or(SessionError::NoActiveSession)
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}
