#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod history;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use catalog::QuizCatalogService;
pub use error::{CatalogError, HistoryError, Restriction, SessionError};
pub use history::{HistoryItem, HistoryService, HistoryStats, ScoreBand};

pub use sessions::{
    ChannelResultSink, Countdown, MemoryResultSink, QuestionOutcome, QuestionShuffler,
    QuestionView, QuizPlayService, QuizPlayer, QuizSession, RandomShuffler, ResultSink,
    SeededShuffler, SessionMode, SessionPhase, SessionProgress, SessionSnapshot, SessionTimer,
    TimerEvent, TimerOutcome, Urgency, format_clock, spawn_result_writer,
};
