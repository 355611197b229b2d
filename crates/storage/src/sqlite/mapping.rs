use quiz_core::model::{Answer, QuestionNumber, SessionToken};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} out of range")))
}

pub(crate) fn question_number_to_i64(q: QuestionNumber) -> i64 {
    i64::from(q.value())
}

/// Selections are stored as a JSON array so order and duplicates survive.
pub(crate) fn encode_selection(selected: &[usize]) -> Result<String, StorageError> {
    serde_json::to_string(selected).map_err(ser)
}

pub(crate) fn decode_selection(raw: &str) -> Result<Vec<usize>, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn map_answer_row(row: &sqlx::sqlite::SqliteRow) -> Result<Answer, StorageError> {
    let session: String = row.try_get("session").map_err(ser)?;
    let question_number = i64_to_u32(
        "question_number",
        row.try_get::<i64, _>("question_number").map_err(ser)?,
    )?;
    let selected_raw: String = row.try_get("selected_choices").map_err(ser)?;
    let timestamp: i64 = row.try_get("timestamp").map_err(ser)?;

    Ok(Answer::new(
        SessionToken::new(session),
        QuestionNumber::new(question_number),
        decode_selection(&selected_raw)?,
        timestamp,
    ))
}
