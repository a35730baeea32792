mod player;
mod progress;
mod service;
mod shuffle;
mod sink;
mod timer;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use player::{QuizPlayer, SessionPhase};
pub use progress::SessionProgress;
pub use service::{QuizSession, SessionMode};
pub use shuffle::{QuestionShuffler, RandomShuffler, SeededShuffler};
pub use sink::{ChannelResultSink, MemoryResultSink, ResultSink, spawn_result_writer};
pub use timer::{Countdown, SessionTimer, TimerEvent, Urgency, format_clock};
pub use view::{QuestionOutcome, QuestionView, SessionSnapshot};
pub use workflow::{QuizPlayService, TimerOutcome};
