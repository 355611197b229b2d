use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs the versioned migrations for the answer store.
///
/// Version 1 creates the `answers` table keyed by `(session, question_number)`
/// plus one secondary index per lookup the quiz performs.
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

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS answers (
                    session TEXT NOT NULL,
                    question_number INTEGER NOT NULL CHECK (question_number >= 0),
                    selected_choices TEXT NOT NULL,
                    timestamp INTEGER NOT NULL,
                    PRIMARY KEY (session, question_number)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        for stmt in [
            "CREATE INDEX IF NOT EXISTS idx_answers_session ON answers (session);",
            "CREATE INDEX IF NOT EXISTS idx_answers_question ON answers (question_number);",
            "CREATE INDEX IF NOT EXISTS idx_answers_timestamp ON answers (timestamp);",
        ] {
            sqlx::query(stmt).execute(&mut *tx).await?;
        }

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
    }

    Ok(())
}
