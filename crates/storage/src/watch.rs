//! Change notifications for answer queries.
//!
//! Consumers register a callback for a query shape and re-run that query when
//! it fires. Notifications are a reactivity hint only: the repository stays
//! the source of truth, and a listener must read state back instead of
//! trusting the order in which notifications arrive.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use quiz_core::model::{Answer, QuestionNumber, SessionToken};

use crate::repository::{AnswerRepository, StorageError};

/// Query shapes a listener can watch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnswerQuery {
    /// Any row of the session.
    Session(SessionToken),
    /// The single row for one question of the session.
    Answer(SessionToken, QuestionNumber),
}

impl AnswerQuery {
    #[must_use]
    pub fn matches(&self, answer: &Answer) -> bool {
        match self {
            AnswerQuery::Session(session) => answer.session == *session,
            AnswerQuery::Answer(session, question) => {
                answer.session == *session && answer.question_number == *question
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&AnswerQuery) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(SubscriptionId, AnswerQuery, Listener)>,
}

/// Listener registry shared between a store and its consumers.
#[derive(Clone, Default)]
pub struct AnswerWatchers {
    registry: Arc<Mutex<Registry>>,
}

impl AnswerWatchers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` to run whenever a write touches `query`.
    pub fn subscribe(
        &self,
        query: AnswerQuery,
        listener: impl Fn(&AnswerQuery) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.next_id += 1;
        let id = SubscriptionId(registry.next_id);
        registry.entries.push((id, query, Arc::new(listener)));
        id
    }

    /// Returns `false` when the id was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let before = registry.entries.len();
        registry.entries.retain(|(entry_id, _, _)| *entry_id != id);
        registry.entries.len() != before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fire every listener whose query matches at least one changed row.
    ///
    /// Each listener fires at most once per call. Listeners run after the
    /// registry lock is released, so they may subscribe or unsubscribe.
    /// Returns the number of listeners invoked.
    pub fn notify(&self, changed: &[Answer]) -> usize {
        let due: Vec<(AnswerQuery, Listener)> = {
            let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry
                .entries
                .iter()
                .filter(|(_, query, _)| changed.iter().any(|a| query.matches(a)))
                .map(|(_, query, listener)| (query.clone(), Arc::clone(listener)))
                .collect()
        };
        for (query, listener) in &due {
            listener(query);
        }
        due.len()
    }
}

/// Repository decorator that notifies watchers after successful writes.
pub struct ObservedAnswers {
    inner: Arc<dyn AnswerRepository>,
    watchers: AnswerWatchers,
}

impl ObservedAnswers {
    #[must_use]
    pub fn new(inner: Arc<dyn AnswerRepository>, watchers: AnswerWatchers) -> Self {
        Self { inner, watchers }
    }
}

#[async_trait]
impl AnswerRepository for ObservedAnswers {
    async fn get_answer(
        &self,
        session: &SessionToken,
        question: QuestionNumber,
    ) -> Result<Option<Answer>, StorageError> {
        self.inner.get_answer(session, question).await
    }

    async fn put_answer(&self, answer: &Answer) -> Result<(), StorageError> {
        self.inner.put_answer(answer).await?;
        self.watchers.notify(std::slice::from_ref(answer));
        Ok(())
    }

    async fn bulk_put(&self, answers: &[Answer]) -> Result<(), StorageError> {
        self.inner.bulk_put(answers).await?;
        self.watchers.notify(answers);
        Ok(())
    }

    async fn list_by_session(&self, session: &SessionToken) -> Result<Vec<Answer>, StorageError> {
        self.inner.list_by_session(session).await
    }

    async fn list_by_question(
        &self,
        question: QuestionNumber,
    ) -> Result<Vec<Answer>, StorageError> {
        self.inner.list_by_question(question).await
    }

    async fn latest_for_session(
        &self,
        session: &SessionToken,
    ) -> Result<Option<Answer>, StorageError> {
        self.inner.latest_for_session(session).await
    }
}
