use std::sync::Arc;

use quiz_core::model::{Quiz, QuizDraft, QuizId};
use storage::repository::{QuizRepository, StorageError};

use crate::Clock;
use crate::error::CatalogError;

/// Authoring-side access to quizzes: create, browse, edit and delete.
#[derive(Clone)]
pub struct QuizCatalogService {
    clock: Clock,
    quizzes: Arc<dyn QuizRepository>,
}

impl QuizCatalogService {
    #[must_use]
    pub fn new(clock: Clock, quizzes: Arc<dyn QuizRepository>) -> Self {
        Self { clock, quizzes }
    }

    /// Validate a draft and persist it as a new quiz.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Quiz` for validation failures.
    /// Returns `CatalogError::Storage` if persistence fails.
    pub async fn create_quiz(&self, draft: QuizDraft) -> Result<Quiz, CatalogError> {
        let validated = draft.validate(self.clock.now())?;
        let id = self.quizzes.insert_new_quiz(validated.clone()).await?;
        tracing::info!(quiz_id = %id, title = %validated.title, "quiz created");
        Ok(validated.assign_id(id))
    }

    /// List quizzes ordered by ID, up to the given limit.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn list_quizzes(&self, limit: u32) -> Result<Vec<Quiz>, CatalogError> {
        Ok(self.quizzes.list_quizzes(limit).await?)
    }

    /// Fetch a quiz by ID.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the quiz does not exist.
    pub async fn get_quiz(&self, id: QuizId) -> Result<Quiz, CatalogError> {
        self.quizzes
            .get_quiz(id)
            .await?
            .ok_or(CatalogError::NotFound(id))
    }

    /// Replace a quiz's content, keeping its id and creation time.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the quiz does not exist,
    /// `CatalogError::Quiz` if the draft is invalid.
    pub async fn update_quiz(&self, id: QuizId, draft: QuizDraft) -> Result<Quiz, CatalogError> {
        let existing = self.get_quiz(id).await?;
        let now = self.clock.now();
        let validated = draft.validate(now)?;
        let updated = Quiz::from_persisted(
            id,
            validated.title,
            validated.description,
            validated.time_limit_secs,
            validated.shuffle_questions,
            validated.questions,
            existing.created_at(),
            now,
        )?;
        self.quizzes.upsert_quiz(&updated).await?;
        tracing::info!(quiz_id = %id, "quiz updated");
        Ok(updated)
    }

    /// Delete a quiz. Results recorded for it stay in history.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the quiz does not exist.
    pub async fn delete_quiz(&self, id: QuizId) -> Result<(), CatalogError> {
        match self.quizzes.delete_quiz(id).await {
            Ok(()) => {
                tracing::info!(quiz_id = %id, "quiz deleted");
                Ok(())
            }
            Err(StorageError::NotFound) => Err(CatalogError::NotFound(id)),
            Err(err) => Err(err.into()),
        }
    }
}
