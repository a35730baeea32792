//! Scoring of a finished quiz session.
//!
//! Pure functions over the authored questions and the responses collected by a
//! session. No clock access: callers pass both timestamps in.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::model::{
    Answer, AnswerRecord, CorrectAnswer, Question, QuestionId, QuizId, QuizResult,
    QuizResultError, Response,
};
use crate::time::elapsed_whole_secs;

/// Returns true if `answer` is exactly the question's correct answer.
///
/// Multiple-choice answers compare as sets: order is irrelevant, and a missing
/// or extra option makes the answer wrong. An answer of the wrong shape is never
/// correct.
///
/// # Examples
///
/// ```
/// # use quiz_core::model::{Answer, Question, QuestionId};
/// # use quiz_core::scoring::is_correct;
/// let q = Question::multiple_choice(
///     QuestionId::new(1),
///     "Pick the evens",
///     vec!["0".into(), "1".into(), "2".into()],
///     [0, 2],
///     None,
/// )
/// .unwrap();
/// assert!(is_correct(&q, &Answer::multiple([2, 0])));
/// assert!(!is_correct(&q, &Answer::multiple([0, 1, 2])));
/// ```
#[must_use]
pub fn is_correct(question: &Question, answer: &Answer) -> bool {
    match (question.correct(), answer) {
        (CorrectAnswer::Single(correct), Answer::Single(selected)) => correct == selected,
        (CorrectAnswer::Multiple(correct), Answer::Multiple(selected)) => correct == selected,
        _ => false,
    }
}

/// Score one answer line.
///
/// A question with no recorded response is scored as skipped; this only
/// happens when a timer forces completion.
#[must_use]
pub fn score_question(question: &Question, response: Option<&Response>) -> AnswerRecord {
    match response {
        Some(Response::Answered(answer)) => {
            AnswerRecord::answered(question.id(), answer.clone(), is_correct(question, answer))
        }
        Some(Response::Skipped) | None => AnswerRecord::skipped(question.id()),
    }
}

/// Score a whole session, in session order.
///
/// `time_spent_secs` is the whole seconds between `started_at` and
/// `completed_at`, never negative.
///
/// # Errors
///
/// Returns `QuizResultError::TooManyQuestions` if the question count does not fit in `u32`.
pub fn score_responses(
    quiz_id: QuizId,
    questions: &[Question],
    responses: &HashMap<QuestionId, Response>,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
) -> Result<QuizResult, QuizResultError> {
    let answers = questions
        .iter()
        .map(|q| score_question(q, responses.get(&q.id())))
        .collect();
    QuizResult::from_answers(
        quiz_id,
        elapsed_whole_secs(started_at, completed_at),
        completed_at,
        answers,
    )
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
