mod answer;
mod attempt;
mod bank;
mod ids;
pub(crate) mod question;

pub use answer::{Answer, most_recent};
pub use attempt::{ChoiceMark, QuestionAttempt};
pub use bank::{BankError, QuestionBank};
pub use ids::{ParseIdError, QuestionNumber, SessionToken};
pub use question::{Choice, Question, QuestionRequirements, SelectMode, UNCATEGORIZED};
