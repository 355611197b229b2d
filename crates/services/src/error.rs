//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `QuizNavigator`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NavigatorError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SummaryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SummaryError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the transfer codec and `TransferService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransferError {
    #[error("malformed transfer file: {0}")]
    Malformed(String),
    #[error("failed to encode transfer file: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while parsing a route path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RouteError {
    #[error("unknown route: {0}")]
    Unknown(String),
    #[error("invalid question number in route: {0}")]
    QuestionNumber(String),
}

/// Errors emitted while bootstrapping quiz services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
