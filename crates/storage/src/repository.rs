use async_trait::async_trait;
use quiz_core::model::{Quiz, QuizId, QuizResult, ResultId, ValidatedQuiz};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A persisted result together with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResultRow {
    pub id: ResultId,
    pub result: QuizResult,
}

impl QuizResultRow {
    #[must_use]
    pub fn new(id: ResultId, result: QuizResult) -> Self {
        Self { id, result }
    }
}

/// Repository contract for authored quizzes.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Persist a freshly validated quiz and assign it an id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the quiz cannot be stored.
    async fn insert_new_quiz(&self, quiz: ValidatedQuiz) -> Result<QuizId, StorageError>;

    /// Persist or replace a quiz under its existing id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the quiz cannot be stored.
    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError>;

    /// Fetch a quiz by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read or decode failures; a missing quiz is `Ok(None)`.
    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError>;

    /// List quizzes ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read or decode failures.
    async fn list_quizzes(&self, limit: u32) -> Result<Vec<Quiz>, StorageError>;

    /// Delete a quiz. Results recorded for it are kept.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the quiz does not exist.
    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError>;
}

/// Append-only store of completed quiz results.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Append a result and return its storage id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append_result(&self, result: &QuizResult) -> Result<ResultId, StorageError>;

    /// Fetch a result by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_result(&self, id: ResultId) -> Result<QuizResult, StorageError>;

    /// List results newest first, optionally restricted to one quiz.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read or decode failures.
    async fn list_results(
        &self,
        quiz_id: Option<QuizId>,
        limit: u32,
    ) -> Result<Vec<QuizResultRow>, StorageError>;
}

fn lock_err<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[derive(Default)]
struct QuizTable {
    rows: BTreeMap<QuizId, Quiz>,
    next_id: u64,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    quizzes: Arc<Mutex<QuizTable>>,
    results: Arc<Mutex<Vec<QuizResultRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn insert_new_quiz(&self, quiz: ValidatedQuiz) -> Result<QuizId, StorageError> {
        let mut guard = self.quizzes.lock().map_err(lock_err)?;
        let last = guard.rows.keys().next_back().map_or(0, QuizId::value);
        let next = guard.next_id.max(last) + 1;
        guard.next_id = next;
        let id = QuizId::new(next);
        guard.rows.insert(id, quiz.assign_id(id));
        Ok(id)
    }

    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        let mut guard = self.quizzes.lock().map_err(lock_err)?;
        guard.rows.insert(quiz.id(), quiz.clone());
        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        let guard = self.quizzes.lock().map_err(lock_err)?;
        Ok(guard.rows.get(&id).cloned())
    }

    async fn list_quizzes(&self, limit: u32) -> Result<Vec<Quiz>, StorageError> {
        let guard = self.quizzes.lock().map_err(lock_err)?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(guard.rows.values().take(limit).cloned().collect())
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError> {
        let mut guard = self.quizzes.lock().map_err(lock_err)?;
        guard
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    async fn append_result(&self, result: &QuizResult) -> Result<ResultId, StorageError> {
        let mut guard = self.results.lock().map_err(lock_err)?;
        let id = guard.last().map_or(1, |row| row.id + 1);
        guard.push(QuizResultRow::new(id, result.clone()));
        Ok(id)
    }

    async fn get_result(&self, id: ResultId) -> Result<QuizResult, StorageError> {
        let guard = self.results.lock().map_err(lock_err)?;
        guard
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.result.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn list_results(
        &self,
        quiz_id: Option<QuizId>,
        limit: u32,
    ) -> Result<Vec<QuizResultRow>, StorageError> {
        let guard = self.results.lock().map_err(lock_err)?;
        let mut rows: Vec<QuizResultRow> = guard
            .iter()
            .filter(|row| quiz_id.is_none_or(|id| row.result.quiz_id() == id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.result
                .completed_at()
                .cmp(&a.result.completed_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub quizzes: Arc<dyn QuizRepository>,
    pub results: Arc<dyn ResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let quizzes: Arc<dyn QuizRepository> = Arc::new(repo.clone());
        let results: Arc<dyn ResultRepository> = Arc::new(repo);
        Self { quizzes, results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{Answer, AnswerRecord, QuestionId};
    use quiz_core::time::fixed_now;

    use crate::sample::sample_quiz_draft;

    fn result_at(quiz_id: u64, minutes: i64) -> QuizResult {
        QuizResult::from_answers(
            QuizId::new(quiz_id),
            30,
            fixed_now() + Duration::minutes(minutes),
            vec![AnswerRecord::answered(
                QuestionId::new(1),
                Answer::Single(0),
                true,
            )],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let repo = InMemoryRepository::new();
        let first = repo
            .insert_new_quiz(sample_quiz_draft().validate(fixed_now()).unwrap())
            .await
            .unwrap();
        let second = repo
            .insert_new_quiz(sample_quiz_draft().validate(fixed_now()).unwrap())
            .await
            .unwrap();
        assert_eq!(first, QuizId::new(1));
        assert_eq!(second, QuizId::new(2));

        let listed = repo.list_quizzes(10).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id(), first);
    }

    #[tokio::test]
    async fn delete_missing_quiz_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo.delete_quiz(QuizId::new(4)).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn results_list_newest_first_and_filter_by_quiz() {
        let repo = InMemoryRepository::new();
        repo.append_result(&result_at(1, 0)).await.unwrap();
        let newest = repo.append_result(&result_at(2, 10)).await.unwrap();
        repo.append_result(&result_at(1, 5)).await.unwrap();

        let all = repo.list_results(None, 10).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, newest);

        let only_first = repo.list_results(Some(QuizId::new(1)), 10).await.unwrap();
        assert_eq!(only_first.len(), 2);
        assert!(only_first.iter().all(|r| r.result.quiz_id() == QuizId::new(1)));

        let limited = repo.list_results(None, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }
}
