use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::SqliteInitError;

/// Runs the versioned migrations for the current schema.
///
/// Version 1 creates quizzes with their ordered questions, and the append-only
/// result tables. Results carry no foreign key to `quizzes`: history outlives
/// a deleted quiz.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if is_applied(pool, 1).await? {
        debug!(version = 1, "schema already migrated");
        return Ok(());
    }

    debug!(version = 1, "applying schema migration");
    let mut tx = pool.begin().await?;

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS quizzes (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                time_limit_secs INTEGER CHECK (time_limit_secs IS NULL OR time_limit_secs > 0),
                shuffle_questions INTEGER NOT NULL CHECK (shuffle_questions IN (0, 1)),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        ",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS questions (
                quiz_id INTEGER NOT NULL,
                id INTEGER NOT NULL,
                position INTEGER NOT NULL CHECK (position >= 0),
                text TEXT NOT NULL,
                kind TEXT NOT NULL,
                options TEXT NOT NULL,
                correct TEXT NOT NULL,
                explanation TEXT,
                PRIMARY KEY (quiz_id, id),
                FOREIGN KEY (quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE
            );
        ",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS quiz_results (
                id INTEGER PRIMARY KEY,
                quiz_id INTEGER NOT NULL,
                score INTEGER NOT NULL CHECK (score >= 0),
                total_questions INTEGER NOT NULL CHECK (total_questions >= 0),
                time_spent_secs INTEGER NOT NULL CHECK (time_spent_secs >= 0),
                skipped_count INTEGER NOT NULL CHECK (skipped_count >= 0),
                completed_at TEXT NOT NULL
            );
        ",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS result_answers (
                result_id INTEGER NOT NULL,
                position INTEGER NOT NULL CHECK (position >= 0),
                question_id INTEGER NOT NULL,
                submitted TEXT,
                is_correct INTEGER NOT NULL CHECK (is_correct IN (0, 1)),
                is_skipped INTEGER NOT NULL CHECK (is_skipped IN (0, 1)),
                PRIMARY KEY (result_id, position),
                FOREIGN KEY (result_id) REFERENCES quiz_results(id) ON DELETE CASCADE
            );
        ",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r"
            CREATE INDEX IF NOT EXISTS idx_questions_quiz_position
                ON questions (quiz_id, position);
        ",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r"
            CREATE INDEX IF NOT EXISTS idx_quiz_results_quiz_completed
                ON quiz_results (quiz_id, completed_at);
        ",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r"
            INSERT INTO schema_migrations (version, applied_at)
            VALUES (?1, ?2)
            ON CONFLICT(version) DO NOTHING
        ",
    )
    .bind(1_i64)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
