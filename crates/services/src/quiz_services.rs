use std::sync::Arc;

use quiz_core::model::QuestionBank;
use storage::repository::Storage;
use storage::watch::AnswerWatchers;

use crate::Clock;
use crate::error::QuizServicesError;
use crate::navigator::QuizNavigator;
use crate::summary::SummaryService;
use crate::transfer::TransferService;

/// Assembles the quiz services over one answer store and one question bank.
#[derive(Clone)]
pub struct QuizServices {
    bank: Arc<QuestionBank>,
    watchers: AnswerWatchers,
    navigator: Arc<QuizNavigator>,
    summary: Arc<SummaryService>,
    transfer: Arc<TransferService>,
}

impl QuizServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `QuizServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        bank: Arc<QuestionBank>,
    ) -> Result<Self, QuizServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock, bank))
    }

    /// Build services over a fresh in-memory store.
    #[must_use]
    pub fn in_memory(clock: Clock, bank: Arc<QuestionBank>) -> Self {
        Self::from_storage(Storage::in_memory(), clock, bank)
    }

    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock, bank: Arc<QuestionBank>) -> Self {
        let navigator = Arc::new(QuizNavigator::new(
            clock,
            Arc::clone(&bank),
            Arc::clone(&storage.answers),
        ));
        let summary = Arc::new(SummaryService::new(
            Arc::clone(&bank),
            Arc::clone(&storage.answers),
        ));
        let transfer = Arc::new(TransferService::new(clock, Arc::clone(&storage.answers)));

        Self {
            bank,
            watchers: storage.watchers,
            navigator,
            summary,
            transfer,
        }
    }

    #[must_use]
    pub fn bank(&self) -> Arc<QuestionBank> {
        Arc::clone(&self.bank)
    }

    /// Change notifications for the answer store behind these services.
    #[must_use]
    pub fn watchers(&self) -> &AnswerWatchers {
        &self.watchers
    }

    #[must_use]
    pub fn navigator(&self) -> Arc<QuizNavigator> {
        Arc::clone(&self.navigator)
    }

    #[must_use]
    pub fn summary(&self) -> Arc<SummaryService> {
        Arc::clone(&self.summary)
    }

    #[must_use]
    pub fn transfer(&self) -> Arc<TransferService> {
        Arc::clone(&self.transfer)
    }
}
