use async_trait::async_trait;
use quiz_core::model::{Answer, QuestionNumber, SessionToken, most_recent};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::watch::{AnswerWatchers, ObservedAnswers};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for answer rows.
///
/// Rows are keyed by `(session, question_number)`; writes are upserts.
#[async_trait]
pub trait AnswerRepository: Send + Sync {
    /// Fetch the row for one question of a session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_answer(
        &self,
        session: &SessionToken,
        question: QuestionNumber,
    ) -> Result<Option<Answer>, StorageError>;

    /// Insert or overwrite a single row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be stored.
    async fn put_answer(&self, answer: &Answer) -> Result<(), StorageError>;

    /// Upsert many rows, each under its own key.
    ///
    /// Backends apply the batch atomically where they can. Callers must still
    /// tolerate partial application when the medium fails mid-batch.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any row cannot be stored.
    async fn bulk_put(&self, answers: &[Answer]) -> Result<(), StorageError>;

    /// All rows of a session. No ordering is promised.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn list_by_session(&self, session: &SessionToken) -> Result<Vec<Answer>, StorageError>;

    /// All rows for one question across sessions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn list_by_question(&self, question: QuestionNumber)
    -> Result<Vec<Answer>, StorageError>;

    /// The most recently saved row of a session (ties go to the higher
    /// question number).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn latest_for_session(
        &self,
        session: &SessionToken,
    ) -> Result<Option<Answer>, StorageError> {
        let answers = self.list_by_session(session).await?;
        Ok(most_recent(&answers).cloned())
    }
}

type AnswerKey = (SessionToken, QuestionNumber);

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    answers: Arc<Mutex<BTreeMap<AnswerKey, Answer>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            answers: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }
}

fn key_of(answer: &Answer) -> AnswerKey {
    (answer.session.clone(), answer.question_number)
}

#[async_trait]
impl AnswerRepository for InMemoryRepository {
    async fn get_answer(
        &self,
        session: &SessionToken,
        question: QuestionNumber,
    ) -> Result<Option<Answer>, StorageError> {
        let guard = self
            .answers
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&(session.clone(), question)).cloned())
    }

    async fn put_answer(&self, answer: &Answer) -> Result<(), StorageError> {
        let mut guard = self
            .answers
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key_of(answer), answer.clone());
        Ok(())
    }

    async fn bulk_put(&self, answers: &[Answer]) -> Result<(), StorageError> {
        let mut guard = self
            .answers
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        for answer in answers {
            guard.insert(key_of(answer), answer.clone());
        }
        Ok(())
    }

    async fn list_by_session(&self, session: &SessionToken) -> Result<Vec<Answer>, StorageError> {
        let guard = self
            .answers
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let from = (session.clone(), QuestionNumber::new(0));
        let to = (session.clone(), QuestionNumber::new(u32::MAX));
        Ok(guard.range(from..=to).map(|(_, a)| a.clone()).collect())
    }

    async fn list_by_question(
        &self,
        question: QuestionNumber,
    ) -> Result<Vec<Answer>, StorageError> {
        let guard = self
            .answers
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .values()
            .filter(|a| a.question_number == question)
            .cloned()
            .collect())
    }
}

/// Answer storage plus its change notifications, behind trait objects for
/// easy backend swapping.
///
/// `answers` is already wrapped so that successful writes notify `watchers`.
#[derive(Clone)]
pub struct Storage {
    pub answers: Arc<dyn AnswerRepository>,
    pub watchers: AnswerWatchers,
}

impl Storage {
    /// Wrap a raw backend so its writes are observable.
    #[must_use]
    pub fn observed(backend: Arc<dyn AnswerRepository>) -> Self {
        let watchers = AnswerWatchers::new();
        let answers: Arc<dyn AnswerRepository> =
            Arc::new(ObservedAnswers::new(backend, watchers.clone()));
        Self { answers, watchers }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::observed(Arc::new(InMemoryRepository::new()))
    }
}
