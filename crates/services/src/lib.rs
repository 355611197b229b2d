#![forbid(unsafe_code)]

pub mod error;
pub mod navigator;
pub mod quiz_services;
pub mod routes;
pub mod summary;
pub mod transfer;

pub use quiz_core::Clock;

pub use error::{NavigatorError, QuizServicesError, RouteError, SummaryError, TransferError};
pub use navigator::{Direction, Progress, QuestionView, QuizNavigator, RandomPick};
pub use quiz_services::QuizServices;
pub use routes::Route;
pub use summary::{AnsweredRow, SummaryReport, SummaryService};
pub use transfer::{ImportOutcome, TransferRecord, TransferService, export_file_name};
