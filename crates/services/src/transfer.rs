//! Portable session files.
//!
//! A transfer record is a JSON object carrying the session token, the export
//! time and every stored answer of that session:
//!
//! ```json
//! { "uuid": "…", "timestamp": 1700000000000,
//!   "answers": [ { "uuid": "…", "question_number": 1,
//!                  "selected_choices": [0], "timestamp": 1700000000000 } ] }
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use quiz_core::model::{Answer, QuestionNumber, SessionToken};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storage::repository::AnswerRepository;
use tracing::info;

use crate::Clock;
use crate::error::TransferError;
use crate::routes::Route;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub uuid: SessionToken,
    /// Epoch milliseconds at export time.
    pub timestamp: i64,
    pub answers: Vec<Answer>,
}

impl TransferRecord {
    /// Pretty-printed JSON, the on-disk form.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Encode` if serialization fails.
    pub fn to_pretty_json(&self) -> Result<String, TransferError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate and decode a transfer file.
    ///
    /// The outer value must be an object with a non-empty string `uuid` and
    /// an `answers` array. Every row needs a string `uuid` and an unsigned
    /// `question_number`; one row without them rejects the whole file. Row
    /// values are otherwise taken as-is, including question numbers outside
    /// the bank and a `uuid` differing from the outer one. Choice entries
    /// that cannot be an index, such as `-1` or `"a"`, are dropped. Missing
    /// timestamps read as 0.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Malformed` describing the first problem found.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TransferError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| TransferError::Malformed(format!("not JSON: {e}")))?;
        let Value::Object(mut outer) = value else {
            return Err(TransferError::Malformed("expected a JSON object".into()));
        };

        let uuid = match outer.get("uuid") {
            Some(Value::String(s)) if !s.is_empty() => SessionToken::new(s.clone()),
            _ => return Err(TransferError::Malformed("missing session uuid".into())),
        };
        let Some(Value::Array(rows)) = outer.remove("answers") else {
            return Err(TransferError::Malformed("answers must be an array".into()));
        };
        let timestamp = outer.get("timestamp").and_then(Value::as_i64).unwrap_or(0);

        let answers = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                serde_json::from_value::<TransferRow>(row)
                    .map(TransferRow::into_answer)
                    .map_err(|e| TransferError::Malformed(format!("answer {i}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            uuid,
            timestamp,
            answers,
        })
    }
}

/// One incoming answer row, before choice indices are checked.
#[derive(Deserialize)]
struct TransferRow {
    uuid: SessionToken,
    question_number: QuestionNumber,
    #[serde(default)]
    selected_choices: Vec<Value>,
    #[serde(default)]
    timestamp: Value,
}

impl TransferRow {
    fn into_answer(self) -> Answer {
        let selected = self
            .selected_choices
            .iter()
            .filter_map(Value::as_u64)
            .filter_map(|n| usize::try_from(n).ok())
            .collect();
        Answer::new(
            self.uuid,
            self.question_number,
            selected,
            self.timestamp.as_i64().unwrap_or(0),
        )
    }
}

/// Suggested file name: `qa-session-{uuid}-{YYYY-MM-DD}.json`.
#[must_use]
pub fn export_file_name(session: &SessionToken, at: DateTime<Utc>) -> String {
    format!("qa-session-{session}-{}.json", at.format("%Y-%m-%d"))
}

/// Outcome of a successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    /// The outer session of the file.
    pub session: SessionToken,
    pub imported: usize,
    /// The outer session's most recent stored question, else its summary.
    pub redirect: Route,
}

/// Moves sessions between the answer store and transfer files.
#[derive(Clone)]
pub struct TransferService {
    clock: Clock,
    answers: Arc<dyn AnswerRepository>,
}

impl TransferService {
    #[must_use]
    pub fn new(clock: Clock, answers: Arc<dyn AnswerRepository>) -> Self {
        Self { clock, answers }
    }

    /// Snapshot every stored answer of `session`.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Storage` if the session cannot be read.
    pub async fn export(&self, session: &SessionToken) -> Result<TransferRecord, TransferError> {
        let mut answers = self.answers.list_by_session(session).await?;
        answers.sort_by_key(|a| a.question_number);
        info!(session = %session, answers = answers.len(), "exporting session");
        Ok(TransferRecord {
            uuid: session.clone(),
            timestamp: self.clock.now_millis(),
            answers,
        })
    }

    /// File name for an export taken now.
    #[must_use]
    pub fn file_name(&self, session: &SessionToken) -> String {
        export_file_name(session, self.clock.now())
    }

    /// Decode `bytes` and upsert every row under its own embedded `uuid`.
    ///
    /// Nothing is written unless the whole file decodes.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Malformed` for a rejected file, or
    /// `TransferError::Storage` if the rows cannot be written or read back.
    pub async fn import(&self, bytes: &[u8]) -> Result<ImportOutcome, TransferError> {
        let record = TransferRecord::from_slice(bytes)?;
        self.answers.bulk_put(&record.answers).await?;

        let session = record.uuid;
        let redirect = match self.answers.latest_for_session(&session).await? {
            Some(latest) => Route::question(&session, latest.question_number),
            None => Route::summary(&session),
        };
        info!(
            session = %session,
            imported = record.answers.len(),
            redirect = %redirect,
            "imported session"
        );
        Ok(ImportOutcome {
            session,
            imported: record.answers.len(),
            redirect,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    fn service(repo: &InMemoryRepository) -> TransferService {
        TransferService::new(fixed_clock(), Arc::new(repo.clone()))
    }

    #[test]
    fn file_name_uses_utc_date() {
        assert_eq!(
            export_file_name(&SessionToken::new("abc"), fixed_now()),
            "qa-session-abc-2023-11-14.json"
        );
    }

    #[test]
    fn rejects_wrong_outer_shapes() {
        for bad in [
            &b"not json"[..],
            br#"[]"#,
            br#"{"answers": []}"#,
            br#"{"uuid": "", "answers": []}"#,
            br#"{"uuid": 5, "answers": []}"#,
            br#"{"uuid": "x"}"#,
            br#"{"uuid": "x", "answers": {}}"#,
        ] {
            assert!(
                matches!(
                    TransferRecord::from_slice(bad),
                    Err(TransferError::Malformed(_))
                ),
                "accepted {}",
                String::from_utf8_lossy(bad)
            );
        }
    }

    #[test]
    fn one_bad_row_rejects_the_file() {
        let raw = br#"{"uuid": "x", "timestamp": 1, "answers": [
            {"uuid": "x", "question_number": 1, "selected_choices": [0], "timestamp": 1},
            {"uuid": "x", "question_number": "two", "selected_choices": [], "timestamp": 2}
        ]}"#;
        let err = TransferRecord::from_slice(raw).unwrap_err();
        assert!(err.to_string().contains("answer 1"));
    }

    #[test]
    fn out_of_range_values_are_accepted() {
        let raw = br#"{"uuid": "x", "answers": [
            {"uuid": "x", "question_number": 9999, "selected_choices": [42], "timestamp": 1}
        ]}"#;
        let record = TransferRecord::from_slice(raw).unwrap();
        assert_eq!(record.timestamp, 0);
        assert_eq!(record.answers[0].question_number, QuestionNumber::new(9999));
    }

    #[tokio::test]
    async fn unusable_choice_indices_are_dropped_not_rejected() {
        let repo = InMemoryRepository::new();
        let raw = br#"{"uuid": "x", "answers": [
            {"uuid": "x", "question_number": 1, "selected_choices": [-1], "timestamp": 5},
            {"uuid": "x", "question_number": 2, "selected_choices": [1, "a", 2.5, 3]}
        ]}"#;
        let outcome = service(&repo).import(raw).await.unwrap();
        assert_eq!(outcome.imported, 2);

        let s = SessionToken::new("x");
        let first = repo
            .get_answer(&s, QuestionNumber::FIRST)
            .await
            .unwrap()
            .expect("row 1 stored");
        assert!(first.selected_choices.is_empty());
        assert_eq!(first.timestamp, 5);
        let second = repo
            .get_answer(&s, QuestionNumber::new(2))
            .await
            .unwrap()
            .expect("row 2 stored");
        assert_eq!(second.selected_choices, vec![1, 3]);
        assert_eq!(second.timestamp, 0);
        assert_eq!(outcome.redirect, Route::question(&s, QuestionNumber::FIRST));
    }

    #[tokio::test]
    async fn malformed_import_writes_nothing() {
        let repo = InMemoryRepository::new();
        let raw = br#"{"uuid": "x", "answers": [
            {"uuid": "x", "question_number": 1, "selected_choices": [0], "timestamp": 1},
            {"uuid": "x"}
        ]}"#;
        assert!(service(&repo).import(raw).await.is_err());
        assert!(
            repo.list_by_session(&SessionToken::new("x"))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn export_then_import_restores_rows() {
        let source = InMemoryRepository::new();
        let s = SessionToken::new("round");
        source
            .bulk_put(&[
                Answer::new(s.clone(), QuestionNumber::new(2), vec![1, 3], 20),
                Answer::new(s.clone(), QuestionNumber::new(1), vec![], 10),
            ])
            .await
            .unwrap();

        let record = service(&source).export(&s).await.unwrap();
        assert_eq!(record.timestamp, fixed_clock().now_millis());
        let json = record.to_pretty_json().unwrap();
        assert!(json.contains('\n'));

        let target = InMemoryRepository::new();
        let outcome = service(&target).import(json.as_bytes()).await.unwrap();
        assert_eq!(outcome.session, s);
        assert_eq!(outcome.imported, 2);
        assert_eq!(
            outcome.redirect,
            Route::question(&s, QuestionNumber::new(2))
        );

        let mut restored = target.list_by_session(&s).await.unwrap();
        restored.sort_by_key(|a| a.question_number);
        assert_eq!(restored, record.answers);
    }
}
