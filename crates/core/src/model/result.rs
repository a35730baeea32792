use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::answer::Answer;
use crate::model::ids::{QuestionId, QuizId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizResultError {
    #[error("result has {answers} answer entries but {total} questions")]
    AnswerCountMismatch { total: u32, answers: usize },

    #[error("score ({score}) does not match correct entries ({correct})")]
    ScoreMismatch { score: u32, correct: u32 },

    #[error("skipped count ({skipped}) does not match skipped entries ({flagged})")]
    SkippedMismatch { skipped: u32, flagged: u32 },

    #[error("answer for question {0} is marked both skipped and correct")]
    SkippedButCorrect(QuestionId),

    #[error("too many questions for a single result: {len}")]
    TooManyQuestions { len: usize },
}

/// What was submitted for a question when the session was scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmittedAnswer {
    Answered(Answer),
    Skipped,
}

impl SubmittedAnswer {
    #[must_use]
    pub fn answer(&self) -> Option<&Answer> {
        match self {
            SubmittedAnswer::Answered(answer) => Some(answer),
            SubmittedAnswer::Skipped => None,
        }
    }
}

/// Per-question line of a scored result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub submitted: SubmittedAnswer,
    pub is_correct: bool,
    pub is_skipped: bool,
}

impl AnswerRecord {
    #[must_use]
    pub fn answered(question_id: QuestionId, answer: Answer, is_correct: bool) -> Self {
        Self {
            question_id,
            submitted: SubmittedAnswer::Answered(answer),
            is_correct,
            is_skipped: false,
        }
    }

    #[must_use]
    pub fn skipped(question_id: QuestionId) -> Self {
        Self {
            question_id,
            submitted: SubmittedAnswer::Skipped,
            is_correct: false,
            is_skipped: true,
        }
    }
}

/// Immutable outcome of one completed quiz session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    quiz_id: QuizId,
    score: u32,
    total_questions: u32,
    time_spent_secs: u64,
    skipped_count: u32,
    completed_at: DateTime<Utc>,
    answers: Vec<AnswerRecord>,
}

impl QuizResult {
    /// Build a result from scored answer lines, deriving all counts.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultError::TooManyQuestions` if the count cannot fit in `u32`,
    /// or `QuizResultError::SkippedButCorrect` for a contradictory line.
    pub fn from_answers(
        quiz_id: QuizId,
        time_spent_secs: u64,
        completed_at: DateTime<Utc>,
        answers: Vec<AnswerRecord>,
    ) -> Result<Self, QuizResultError> {
        let (correct, skipped) = tally(&answers)?;
        let total_questions = u32::try_from(answers.len())
            .map_err(|_| QuizResultError::TooManyQuestions { len: answers.len() })?;
        Ok(Self {
            quiz_id,
            score: correct,
            total_questions,
            time_spent_secs,
            skipped_count: skipped,
            completed_at,
            answers,
        })
    }

    /// Rehydrate a result from persisted storage, checking that the stored
    /// counts agree with the stored answer lines.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultError` if any count disagrees.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        quiz_id: QuizId,
        score: u32,
        total_questions: u32,
        time_spent_secs: u64,
        skipped_count: u32,
        completed_at: DateTime<Utc>,
        answers: Vec<AnswerRecord>,
    ) -> Result<Self, QuizResultError> {
        if usize::try_from(total_questions).ok() != Some(answers.len()) {
            return Err(QuizResultError::AnswerCountMismatch {
                total: total_questions,
                answers: answers.len(),
            });
        }
        let (correct, flagged) = tally(&answers)?;
        if correct != score {
            return Err(QuizResultError::ScoreMismatch { score, correct });
        }
        if flagged != skipped_count {
            return Err(QuizResultError::SkippedMismatch {
                skipped: skipped_count,
                flagged,
            });
        }
        Ok(Self {
            quiz_id,
            score,
            total_questions,
            time_spent_secs,
            skipped_count,
            completed_at,
            answers,
        })
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u64 {
        self.time_spent_secs
    }

    #[must_use]
    pub fn skipped_count(&self) -> u32 {
        self.skipped_count
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn answer_for(&self, question_id: QuestionId) -> Option<&AnswerRecord> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }

    /// Questions that were not skipped.
    #[must_use]
    pub fn answered_count(&self) -> u32 {
        self.total_questions.saturating_sub(self.skipped_count)
    }

    /// Score as a whole percentage of all questions, rounded half up.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.total_questions == 0 {
            return 0;
        }
        let score = u64::from(self.score);
        let total = u64::from(self.total_questions);
        u32::try_from((200 * score + total) / (2 * total)).unwrap_or(100)
    }
}

fn tally(answers: &[AnswerRecord]) -> Result<(u32, u32), QuizResultError> {
    let mut correct = 0_u32;
    let mut skipped = 0_u32;
    for line in answers {
        if line.is_skipped && line.is_correct {
            return Err(QuizResultError::SkippedButCorrect(line.question_id));
        }
        if line.is_correct {
            correct = correct.saturating_add(1);
        }
        if line.is_skipped {
            skipped = skipped.saturating_add(1);
        }
    }
    Ok((correct, skipped))
}
