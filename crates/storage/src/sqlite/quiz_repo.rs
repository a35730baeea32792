use quiz_core::model::{Question, Quiz, QuizId, ValidatedQuiz};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};

use super::SqliteRepository;
use super::mapping::{
    conn, map_question_row, quiz_id_from_i64, ser, to_json, u32_from_i64, u64_to_i64,
    usize_to_i64,
};
use crate::repository::{QuizRepository, StorageError};

async fn insert_questions(
    tx: &mut Transaction<'_, Sqlite>,
    quiz_id: i64,
    questions: &[Question],
) -> Result<(), StorageError> {
    for (position, question) in questions.iter().enumerate() {
        sqlx::query(
            r"
            INSERT INTO questions (quiz_id, id, position, text, kind, options, correct, explanation)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(quiz_id)
        .bind(u64_to_i64("question_id", question.id().value())?)
        .bind(usize_to_i64("position", position)?)
        .bind(question.text())
        .bind(question.kind().as_str())
        .bind(to_json(&question.options())?)
        .bind(to_json(question.correct())?)
        .bind(question.explanation())
        .execute(&mut **tx)
        .await
        .map_err(conn)?;
    }
    Ok(())
}

impl SqliteRepository {
    async fn questions_for(&self, quiz_id: i64) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, text, kind, options, correct, explanation
            FROM questions
            WHERE quiz_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_question_row).collect()
    }

    async fn quiz_from_row(&self, row: &SqliteRow) -> Result<Quiz, StorageError> {
        let raw_id: i64 = row.try_get("id").map_err(ser)?;
        let time_limit = row
            .try_get::<Option<i64>, _>("time_limit_secs")
            .map_err(ser)?
            .map(|v| u32_from_i64("time_limit_secs", v))
            .transpose()?;
        let questions = self.questions_for(raw_id).await?;

        Quiz::from_persisted(
            quiz_id_from_i64(raw_id)?,
            row.try_get("title").map_err(ser)?,
            row.try_get("description").map_err(ser)?,
            time_limit,
            row.try_get::<i64, _>("shuffle_questions").map_err(ser)? != 0,
            questions,
            row.try_get("created_at").map_err(ser)?,
            row.try_get("updated_at").map_err(ser)?,
        )
        .map_err(ser)
    }
}

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn insert_new_quiz(&self, quiz: ValidatedQuiz) -> Result<QuizId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let res = sqlx::query(
            r"
            INSERT INTO quizzes (title, description, time_limit_secs, shuffle_questions, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ",
        )
        .bind(&quiz.title)
        .bind(&quiz.description)
        .bind(quiz.time_limit_secs.map(i64::from))
        .bind(i64::from(quiz.shuffle_questions))
        .bind(quiz.created_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        let id = res.last_insert_rowid();
        insert_questions(&mut tx, id, &quiz.questions).await?;
        tx.commit().await.map_err(conn)?;

        quiz_id_from_i64(id)
    }

    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        let id = u64_to_i64("quiz_id", quiz.id().value())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO quizzes (id, title, description, time_limit_secs, shuffle_questions, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                time_limit_secs = excluded.time_limit_secs,
                shuffle_questions = excluded.shuffle_questions,
                updated_at = excluded.updated_at
            ",
        )
        .bind(id)
        .bind(quiz.title())
        .bind(quiz.description())
        .bind(quiz.time_limit_secs().map(i64::from))
        .bind(i64::from(quiz.shuffle_questions()))
        .bind(quiz.created_at())
        .bind(quiz.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query("DELETE FROM questions WHERE quiz_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        insert_questions(&mut tx, id, quiz.questions()).await?;

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, title, description, time_limit_secs, shuffle_questions, created_at, updated_at
            FROM quizzes WHERE id = ?1
            ",
        )
        .bind(u64_to_i64("quiz_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => self.quiz_from_row(&row).await.map(Some),
            None => Ok(None),
        }
    }

    async fn list_quizzes(&self, limit: u32) -> Result<Vec<Quiz>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, description, time_limit_secs, shuffle_questions, created_at, updated_at
            FROM quizzes
            ORDER BY id ASC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut quizzes = Vec::with_capacity(rows.len());
        for row in rows {
            quizzes.push(self.quiz_from_row(&row).await?);
        }
        Ok(quizzes)
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM quizzes WHERE id = ?1")
            .bind(u64_to_i64("quiz_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
