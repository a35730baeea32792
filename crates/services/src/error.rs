//! Shared error types for the services crate.

use std::fmt;

use thiserror::Error;

use quiz_core::model::{QuestionId, QuizError, QuizId, QuizResultError};
use storage::repository::StorageError;

/// Why a session refused an operation in its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restriction {
    /// The session is still being played.
    InProgress,
    /// The session has been scored.
    Completed,
    /// The session is in read-only review.
    Reviewing,
    /// Option toggling only applies to multiple-choice questions.
    SingleChoice(QuestionId),
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Restriction::InProgress => f.write_str("session is still in progress"),
            Restriction::Completed => f.write_str("session is completed"),
            Restriction::Reviewing => f.write_str("session is in review"),
            Restriction::SingleChoice(id) => write!(f, "question {id} is single-choice"),
        }
    }
}

/// Errors emitted by quiz sessions and the play workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("quiz cannot be played: {0}")]
    InvalidQuiz(#[from] QuizError),
    #[error("`{operation}` is not allowed: {restriction}")]
    InvalidOperationForMode {
        operation: &'static str,
        restriction: Restriction,
    },
    #[error("{unresolved} question(s) still need an answer or a skip")]
    IncompleteQuiz { unresolved: usize },
    #[error("session already completed")]
    AlreadyCompleted,
    #[error("question {0} is not part of this quiz")]
    UnknownQuestion(QuestionId),
    #[error("answer does not fit question {0}")]
    InvalidAnswer(QuestionId),
    #[error("quiz {0} not found")]
    QuizNotFound(QuizId),
    #[error("no quiz selected")]
    NoActiveSession,
    #[error(transparent)]
    Result(#[from] QuizResultError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuizCatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error("quiz {0} not found")]
    NotFound(QuizId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `HistoryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
