use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{QuestionId, QuizId};
use crate::model::question::{Question, QuestionError};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("quiz description cannot be empty")]
    EmptyDescription,

    #[error("a quiz needs at least one question")]
    NoQuestions,

    #[error("time limit must be > 0 seconds")]
    ZeroTimeLimit,

    #[error("question id {0} appears more than once")]
    DuplicateQuestionId(QuestionId),

    #[error("question {id} is invalid: {source}")]
    Question {
        id: QuestionId,
        #[source]
        source: QuestionError,
    },
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Builder input for a new quiz, before validation and id assignment.
///
/// Also the JSON authoring format: `time_limit_secs` and `shuffle_questions`
/// may be omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub time_limit_secs: Option<u32>,
    #[serde(default)]
    pub shuffle_questions: bool,
    pub questions: Vec<Question>,
}

impl From<&Quiz> for QuizDraft {
    fn from(quiz: &Quiz) -> Self {
        Self {
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            time_limit_secs: quiz.time_limit_secs,
            shuffle_questions: quiz.shuffle_questions,
            questions: quiz.questions.clone(),
        }
    }
}

impl QuizDraft {
    /// Validate the draft and stamp creation time.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the title or description are blank, there are no
    /// questions, the time limit is zero, or a question is invalid.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidatedQuiz, QuizError> {
        let title = self.title.trim().to_owned();
        let description = self.description.trim().to_owned();
        if title.is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        if description.is_empty() {
            return Err(QuizError::EmptyDescription);
        }
        check_time_limit(self.time_limit_secs)?;
        check_questions(&self.questions)?;

        Ok(ValidatedQuiz {
            title,
            description,
            time_limit_secs: self.time_limit_secs,
            shuffle_questions: self.shuffle_questions,
            questions: self.questions,
            created_at: now,
        })
    }
}

/// A draft that passed validation and is waiting for a storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuiz {
    pub title: String,
    pub description: String,
    pub time_limit_secs: Option<u32>,
    pub shuffle_questions: bool,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
}

impl ValidatedQuiz {
    #[must_use]
    pub fn assign_id(self, id: QuizId) -> Quiz {
        Quiz {
            id,
            title: self.title,
            description: self.description,
            time_limit_secs: self.time_limit_secs,
            shuffle_questions: self.shuffle_questions,
            questions: self.questions,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// An authored quiz. Read-only input to a play session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    id: QuizId,
    title: String,
    description: String,
    time_limit_secs: Option<u32>,
    shuffle_questions: bool,
    questions: Vec<Question>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Quiz {
    /// Rehydrate a quiz from persisted storage.
    ///
    /// Unlike [`QuizDraft::validate`], an empty question list is accepted here so
    /// that a damaged quiz can still be listed and deleted; [`Quiz::validate`]
    /// rejects it before play.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` for blank title, zero time limit, or invalid questions.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: QuizId,
        title: String,
        description: String,
        time_limit_secs: Option<u32>,
        shuffle_questions: bool,
        questions: Vec<Question>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, QuizError> {
        if title.trim().is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        check_time_limit(time_limit_secs)?;
        if !questions.is_empty() {
            check_questions(&questions)?;
        }
        Ok(Self {
            id,
            title,
            description,
            time_limit_secs,
            shuffle_questions,
            questions,
            created_at,
            updated_at,
        })
    }

    /// Checks that the quiz can be played.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestions`, `QuizError::DuplicateQuestionId`,
    /// `QuizError::ZeroTimeLimit` or `QuizError::Question`.
    pub fn validate(&self) -> Result<(), QuizError> {
        check_time_limit(self.time_limit_secs)?;
        check_questions(&self.questions)
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> Option<u32> {
        self.time_limit_secs
    }

    #[must_use]
    pub fn shuffle_questions(&self) -> bool {
        self.shuffle_questions
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn check_time_limit(limit: Option<u32>) -> Result<(), QuizError> {
    if limit == Some(0) {
        return Err(QuizError::ZeroTimeLimit);
    }
    Ok(())
}

fn check_questions(questions: &[Question]) -> Result<(), QuizError> {
    if questions.is_empty() {
        return Err(QuizError::NoQuestions);
    }
    let mut seen = HashSet::with_capacity(questions.len());
    for question in questions {
        if !seen.insert(question.id()) {
            return Err(QuizError::DuplicateQuestionId(question.id()));
        }
        question.validate().map_err(|source| QuizError::Question {
            id: question.id(),
            source,
        })?;
    }
    Ok(())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
