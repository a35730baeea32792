use quiz_core::model::{
    Answer, AnswerRecord, CorrectAnswer, Question, QuestionId, QuestionKind, QuizId,
    SubmittedAnswer,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn usize_to_i64(field: &'static str, v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn quiz_id_from_i64(v: i64) -> Result<QuizId, StorageError> {
    Ok(QuizId::new(i64_to_u64("quiz_id", v)?))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

pub(crate) fn from_json<T: DeserializeOwned>(raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn parse_question_kind(s: &str) -> Result<QuestionKind, StorageError> {
    match s {
        "single-choice" => Ok(QuestionKind::SingleChoice),
        "multiple-choice" => Ok(QuestionKind::MultipleChoice),
        _ => Err(StorageError::Serialization(format!("invalid question kind: {s}"))),
    }
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let id = question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let kind = parse_question_kind(row.try_get::<String, _>("kind").map_err(ser)?.as_str())?;
    let options: Vec<String> = from_json(&row.try_get::<String, _>("options").map_err(ser)?)?;
    let correct: CorrectAnswer = from_json(&row.try_get::<String, _>("correct").map_err(ser)?)?;

    Question::from_persisted(
        id,
        row.try_get("text").map_err(ser)?,
        options,
        kind,
        correct,
        row.try_get("explanation").map_err(ser)?,
    )
    .map_err(ser)
}

/// Skipped lines are stored with a NULL `submitted` column.
pub(crate) fn submitted_to_json(submitted: &SubmittedAnswer) -> Result<Option<String>, StorageError> {
    submitted.answer().map(to_json).transpose()
}

pub(crate) fn map_answer_row(row: &sqlx::sqlite::SqliteRow) -> Result<AnswerRecord, StorageError> {
    let question_id = question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?;
    let submitted = match row.try_get::<Option<String>, _>("submitted").map_err(ser)? {
        Some(raw) => SubmittedAnswer::Answered(from_json::<Answer>(&raw)?),
        None => SubmittedAnswer::Skipped,
    };
    let is_correct = row.try_get::<i64, _>("is_correct").map_err(ser)? != 0;
    let is_skipped = row.try_get::<i64, _>("is_skipped").map_err(ser)? != 0;
    if is_skipped != matches!(submitted, SubmittedAnswer::Skipped) {
        return Err(StorageError::Serialization(format!(
            "answer for question {question_id} has inconsistent skip state"
        )));
    }

    Ok(AnswerRecord {
        question_id,
        submitted,
        is_correct,
        is_skipped,
    })
}
