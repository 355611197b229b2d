use std::collections::BTreeSet;

use crate::model::answer::Answer;
use crate::model::ids::{QuestionNumber, SessionToken};
use crate::model::question::{Question, SelectMode};

/// Highlight state of one choice in the question view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceMark {
    /// Revealed and flagged correct.
    Correct,
    /// Revealed, selected, and not correct.
    WrongSelection,
    /// Not yet revealed, currently selected.
    Selected,
    Neutral,
}

/// Selection and reveal state of the question currently on screen.
///
/// `revealed` is never persisted: it is derived from whether an answer row
/// existed when the question was loaded, and flips to true on reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionAttempt {
    session: SessionToken,
    question_number: QuestionNumber,
    mode: SelectMode,
    choice_count: usize,
    selected: BTreeSet<usize>,
    revealed: bool,
}

impl QuestionAttempt {
    /// Builds the view state for `question`, resuming from `stored` when a
    /// row exists.
    #[must_use]
    pub fn load(session: SessionToken, question: &Question, stored: Option<&Answer>) -> Self {
        let (selected, revealed) = match stored {
            Some(answer) => (answer.selection(), true),
            None => (BTreeSet::new(), false),
        };
        Self {
            session,
            question_number: question.question_number,
            mode: question.select_mode(),
            choice_count: question.choices.len(),
            selected,
            revealed,
        }
    }

    #[must_use]
    pub fn session(&self) -> &SessionToken {
        &self.session
    }

    #[must_use]
    pub fn question_number(&self) -> QuestionNumber {
        self.question_number
    }

    #[must_use]
    pub fn mode(&self) -> SelectMode {
        self.mode
    }

    #[must_use]
    pub fn selected(&self) -> &BTreeSet<usize> {
        &self.selected
    }

    #[must_use]
    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Applies a click on choice `index`.
    ///
    /// Single-select replaces the selection; multi-select toggles membership.
    /// Returns `false` without changing anything when the question is already
    /// revealed or the index is not a choice of this question.
    pub fn toggle_choice(&mut self, index: usize) -> bool {
        if self.revealed || index >= self.choice_count {
            return false;
        }
        match self.mode {
            SelectMode::Single => {
                self.selected.clear();
                self.selected.insert(index);
            }
            SelectMode::Multi { .. } => {
                if !self.selected.remove(&index) {
                    self.selected.insert(index);
                }
            }
        }
        true
    }

    /// Whether the "answer" action should be offered.
    #[must_use]
    pub fn can_reveal(&self) -> bool {
        !self.revealed && !self.selected.is_empty()
    }

    pub fn mark_revealed(&mut self) {
        self.revealed = true;
    }

    /// Snapshot of the current selection as a storable row.
    #[must_use]
    pub fn to_answer(&self, timestamp: i64) -> Answer {
        Answer::new(
            self.session.clone(),
            self.question_number,
            self.selected.iter().copied().collect(),
            timestamp,
        )
    }

    /// Highlight for every choice of `question`, in choice order.
    #[must_use]
    pub fn choice_marks(&self, question: &Question) -> Vec<ChoiceMark> {
        (0..question.choices.len())
            .map(|i| {
                let correct = question.is_correct_choice(i);
                let selected = self.is_selected(i);
                match (self.revealed, correct, selected) {
                    (true, true, _) => ChoiceMark::Correct,
                    (true, false, true) => ChoiceMark::WrongSelection,
                    (_, _, true) => ChoiceMark::Selected,
                    _ => ChoiceMark::Neutral,
                }
            })
            .collect()
    }
}
