use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("a question needs at least {min} options, got {got}")]
    TooFewOptions { min: usize, got: usize },

    #[error("option {index} is empty")]
    EmptyOption { index: usize },

    #[error("correct answer index {index} is out of range for {options} options")]
    CorrectIndexOutOfRange { index: usize, options: usize },

    #[error("question kind {kind:?} does not match the shape of its correct answer")]
    KindMismatch { kind: QuestionKind },
}

//
// ─── KIND & CORRECT ANSWER ─────────────────────────────────────────────────────
//

/// Whether a question accepts exactly one option or any subset of options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    SingleChoice,
    MultipleChoice,
}

impl QuestionKind {
    /// Stable string form used by storage adapters.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::SingleChoice => "single-choice",
            QuestionKind::MultipleChoice => "multiple-choice",
        }
    }
}

/// The authored correct answer of a question.
///
/// Serialized as a bare index or an index array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectAnswer {
    Single(usize),
    Multiple(BTreeSet<usize>),
}

impl CorrectAnswer {
    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        match self {
            CorrectAnswer::Single(_) => QuestionKind::SingleChoice,
            CorrectAnswer::Multiple(_) => QuestionKind::MultipleChoice,
        }
    }

    /// Returns true if `index` is one of the correct options.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        match self {
            CorrectAnswer::Single(correct) => *correct == index,
            CorrectAnswer::Multiple(correct) => correct.contains(&index),
        }
    }

    /// First correct index that does not reference one of `options` options.
    fn out_of_range(&self, options: usize) -> Option<usize> {
        match self {
            CorrectAnswer::Single(index) => (*index >= options).then_some(*index),
            CorrectAnswer::Multiple(set) => set.iter().copied().find(|&i| i >= options),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single authored question. Option order is meaningful: an option's index is its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: Vec<String>,
    correct: CorrectAnswer,
    explanation: Option<String>,
}

impl Question {
    pub const MIN_OPTIONS: usize = 2;

    /// Creates a single-choice question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if text or options are blank, fewer than two
    /// options are given, or `correct` does not reference an option.
    pub fn single_choice(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<String>,
        correct: usize,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        Self::build(id, text.into(), options, CorrectAnswer::Single(correct), explanation)
    }

    /// Creates a multiple-choice question.
    ///
    /// An empty `correct` set is allowed: the expected response is then to check nothing.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` under the same rules as [`Question::single_choice`].
    pub fn multiple_choice(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<String>,
        correct: impl IntoIterator<Item = usize>,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        Self::build(
            id,
            text.into(),
            options,
            CorrectAnswer::Multiple(correct.into_iter().collect()),
            explanation,
        )
    }

    /// Rehydrate a question from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::KindMismatch` if the stored kind disagrees with
    /// the stored correct answer, or any other validation error.
    pub fn from_persisted(
        id: QuestionId,
        text: String,
        options: Vec<String>,
        kind: QuestionKind,
        correct: CorrectAnswer,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        if correct.kind() != kind {
            return Err(QuestionError::KindMismatch { kind });
        }
        Self::build(id, text, options, correct, explanation)
    }

    fn build(
        id: QuestionId,
        text: String,
        options: Vec<String>,
        correct: CorrectAnswer,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        let question = Self {
            id,
            text,
            options,
            correct,
            explanation: explanation.filter(|e| !e.trim().is_empty()),
        };
        question.validate()?;
        Ok(question)
    }

    /// Re-check the authoring invariants.
    ///
    /// Useful for values that bypassed the constructors (e.g. deserialized JSON).
    ///
    /// # Errors
    ///
    /// Returns the first `QuestionError` found.
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if self.options.len() < Self::MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions {
                min: Self::MIN_OPTIONS,
                got: self.options.len(),
            });
        }
        if let Some(index) = self.options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuestionError::EmptyOption { index });
        }
        let options = self.options.len();
        if let Some(index) = self.correct.out_of_range(options) {
            return Err(QuestionError::CorrectIndexOutOfRange { index, options });
        }
        Ok(())
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.correct.kind()
    }

    #[must_use]
    pub fn correct(&self) -> &CorrectAnswer {
        &self.correct
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
