use quiz_core::model::{Answer, QuestionNumber, SessionToken};
use sqlx::SqliteConnection;

use super::SqliteRepository;
use super::mapping::{encode_selection, map_answer_row, question_number_to_i64};
use crate::repository::{AnswerRepository, StorageError};

fn conn_err(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

async fn upsert_on(conn: &mut SqliteConnection, answer: &Answer) -> Result<(), StorageError> {
    sqlx::query(
        r"
        INSERT INTO answers (session, question_number, selected_choices, timestamp)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(session, question_number) DO UPDATE SET
            selected_choices = excluded.selected_choices,
            timestamp = excluded.timestamp
        ",
    )
    .bind(answer.session.as_str())
    .bind(question_number_to_i64(answer.question_number))
    .bind(encode_selection(&answer.selected_choices)?)
    .bind(answer.timestamp)
    .execute(conn)
    .await
    .map_err(conn_err)?;
    Ok(())
}

#[async_trait::async_trait]
impl AnswerRepository for SqliteRepository {
    async fn get_answer(
        &self,
        session: &SessionToken,
        question: QuestionNumber,
    ) -> Result<Option<Answer>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT session, question_number, selected_choices, timestamp
            FROM answers
            WHERE session = ?1 AND question_number = ?2
            ",
        )
        .bind(session.as_str())
        .bind(question_number_to_i64(question))
        .fetch_optional(&self.pool)
        .await
        .map_err(conn_err)?;

        row.as_ref().map(map_answer_row).transpose()
    }

    async fn put_answer(&self, answer: &Answer) -> Result<(), StorageError> {
        let mut conn = self.pool.acquire().await.map_err(conn_err)?;
        upsert_on(&mut *conn, answer).await
    }

    async fn bulk_put(&self, answers: &[Answer]) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn_err)?;
        for answer in answers {
            upsert_on(&mut *tx, answer).await?;
        }
        tx.commit().await.map_err(conn_err)?;
        Ok(())
    }

    async fn list_by_session(&self, session: &SessionToken) -> Result<Vec<Answer>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT session, question_number, selected_choices, timestamp
            FROM answers
            WHERE session = ?1
            ORDER BY question_number
            ",
        )
        .bind(session.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn_err)?;

        rows.iter().map(map_answer_row).collect()
    }

    async fn list_by_question(
        &self,
        question: QuestionNumber,
    ) -> Result<Vec<Answer>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT session, question_number, selected_choices, timestamp
            FROM answers
            WHERE question_number = ?1
            ORDER BY session
            ",
        )
        .bind(question_number_to_i64(question))
        .fetch_all(&self.pool)
        .await
        .map_err(conn_err)?;

        rows.iter().map(map_answer_row).collect()
    }

    async fn latest_for_session(
        &self,
        session: &SessionToken,
    ) -> Result<Option<Answer>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT session, question_number, selected_choices, timestamp
            FROM answers
            WHERE session = ?1
            ORDER BY timestamp DESC, question_number DESC
            LIMIT 1
            ",
        )
        .bind(session.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn_err)?;

        row.as_ref().map(map_answer_row).transpose()
    }
}
