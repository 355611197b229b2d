use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::ids::{QuestionNumber, SessionToken};

/// One saved answer, keyed by `(session, question_number)`.
///
/// Field names match the transfer file format. `selected_choices` keeps the
/// order it was stored in but is compared as a set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(rename = "uuid")]
    pub session: SessionToken,
    pub question_number: QuestionNumber,
    pub selected_choices: Vec<usize>,
    /// Epoch milliseconds of the last save.
    pub timestamp: i64,
}

impl Answer {
    #[must_use]
    pub fn new(
        session: SessionToken,
        question_number: QuestionNumber,
        selected_choices: Vec<usize>,
        timestamp: i64,
    ) -> Self {
        Self {
            session,
            question_number,
            selected_choices,
            timestamp,
        }
    }

    /// Selected indices with duplicates removed.
    #[must_use]
    pub fn selection(&self) -> BTreeSet<usize> {
        self.selected_choices.iter().copied().collect()
    }

    #[must_use]
    pub fn has_selection(&self) -> bool {
        !self.selected_choices.is_empty()
    }

    /// Orders answers by recency: later timestamp first, ties broken by the
    /// higher question number.
    #[must_use]
    pub fn recency_cmp(&self, other: &Self) -> Ordering {
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.question_number.cmp(&self.question_number))
    }
}

/// Returns the most recently saved answer, if any.
#[must_use]
pub fn most_recent(answers: &[Answer]) -> Option<&Answer> {
    answers.iter().min_by(|a, b| a.recency_cmp(b))
}
