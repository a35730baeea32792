use quiz_core::model::{QuizId, QuizResult, ResultId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{
    conn, i64_to_u64, map_answer_row, quiz_id_from_i64, ser, submitted_to_json, u32_from_i64,
    u64_to_i64, usize_to_i64,
};
use crate::repository::{QuizResultRow, ResultRepository, StorageError};

impl SqliteRepository {
    async fn result_from_row(&self, row: &SqliteRow) -> Result<QuizResultRow, StorageError> {
        let id: i64 = row.try_get("id").map_err(ser)?;

        let answer_rows = sqlx::query(
            r"
            SELECT question_id, submitted, is_correct, is_skipped
            FROM result_answers
            WHERE result_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        let answers = answer_rows
            .iter()
            .map(map_answer_row)
            .collect::<Result<Vec<_>, _>>()?;

        let result = QuizResult::from_persisted(
            quiz_id_from_i64(row.try_get("quiz_id").map_err(ser)?)?,
            u32_from_i64("score", row.try_get("score").map_err(ser)?)?,
            u32_from_i64("total_questions", row.try_get("total_questions").map_err(ser)?)?,
            i64_to_u64("time_spent_secs", row.try_get("time_spent_secs").map_err(ser)?)?,
            u32_from_i64("skipped_count", row.try_get("skipped_count").map_err(ser)?)?,
            row.try_get("completed_at").map_err(ser)?,
            answers,
        )
        .map_err(ser)?;

        Ok(QuizResultRow::new(id, result))
    }
}

#[async_trait::async_trait]
impl ResultRepository for SqliteRepository {
    async fn append_result(&self, result: &QuizResult) -> Result<ResultId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let res = sqlx::query(
            r"
            INSERT INTO quiz_results (quiz_id, score, total_questions, time_spent_secs, skipped_count, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(u64_to_i64("quiz_id", result.quiz_id().value())?)
        .bind(i64::from(result.score()))
        .bind(i64::from(result.total_questions()))
        .bind(u64_to_i64("time_spent_secs", result.time_spent_secs())?)
        .bind(i64::from(result.skipped_count()))
        .bind(result.completed_at())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;
        let id = res.last_insert_rowid();

        for (position, record) in result.answers().iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO result_answers (result_id, position, question_id, submitted, is_correct, is_skipped)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(id)
            .bind(usize_to_i64("position", position)?)
            .bind(u64_to_i64("question_id", record.question_id.value())?)
            .bind(submitted_to_json(&record.submitted)?)
            .bind(i64::from(record.is_correct))
            .bind(i64::from(record.is_skipped))
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        tracing::debug!(result_id = id, quiz_id = %result.quiz_id(), "result appended");
        Ok(id)
    }

    async fn get_result(&self, id: ResultId) -> Result<QuizResult, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, quiz_id, score, total_questions, time_spent_secs, skipped_count, completed_at
            FROM quiz_results WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        Ok(self.result_from_row(&row).await?.result)
    }

    async fn list_results(
        &self,
        quiz_id: Option<QuizId>,
        limit: u32,
    ) -> Result<Vec<QuizResultRow>, StorageError> {
        let quiz_filter = quiz_id
            .map(|id| u64_to_i64("quiz_id", id.value()))
            .transpose()?;

        let rows = sqlx::query(
            r"
            SELECT id, quiz_id, score, total_questions, time_spent_secs, skipped_count, completed_at
            FROM quiz_results
            WHERE ?1 IS NULL OR quiz_id = ?1
            ORDER BY completed_at DESC, id DESC
            LIMIT ?2
            ",
        )
        .bind(quiz_filter)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(self.result_from_row(&row).await?);
        }
        Ok(out)
    }
}
