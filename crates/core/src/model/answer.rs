use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::question::{Question, QuestionKind};

/// A user's selection for one question.
///
/// `Multiple` may be empty: "answered with nothing checked" is a real answer,
/// distinct from a skip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Single(usize),
    Multiple(BTreeSet<usize>),
}

impl Answer {
    /// Builds a multiple-choice answer from any collection of option indices.
    #[must_use]
    pub fn multiple(indices: impl IntoIterator<Item = usize>) -> Self {
        Self::Multiple(indices.into_iter().collect())
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        match self {
            Answer::Single(_) => QuestionKind::SingleChoice,
            Answer::Multiple(_) => QuestionKind::MultipleChoice,
        }
    }

    /// Returns true if the answer has the question's shape and only references its options.
    #[must_use]
    pub fn fits(&self, question: &Question) -> bool {
        if self.kind() != question.kind() {
            return false;
        }
        let options = question.option_count();
        match self {
            Answer::Single(index) => *index < options,
            Answer::Multiple(set) => set.iter().all(|&i| i < options),
        }
    }

    /// Returns true if the given option is part of this answer.
    #[must_use]
    pub fn includes(&self, index: usize) -> bool {
        match self {
            Answer::Single(selected) => *selected == index,
            Answer::Multiple(set) => set.contains(&index),
        }
    }
}

/// A question's entry in an in-progress session.
///
/// There is no entry at all while a question is still unanswered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Answered(Answer),
    Skipped,
}

impl Response {
    #[must_use]
    pub fn answer(&self) -> Option<&Answer> {
        match self {
            Response::Answered(answer) => Some(answer),
            Response::Skipped => None,
        }
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Response::Skipped)
    }
}
