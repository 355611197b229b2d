use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use quiz_core::model::{
    Answer, Question, QuestionAttempt, QuestionBank, QuestionNumber, SessionToken,
};
use rand::Rng;
use rand::seq::IndexedRandom;
use storage::repository::AnswerRepository;
use tracing::{debug, info};

use crate::Clock;
use crate::error::NavigatorError;
use crate::routes::Route;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// What the question page should render for a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionView {
    Question(QuestionAttempt),
    /// The number is outside the bank. Rendered as a page, not an error.
    NotFound,
}

/// Result of asking for a random unanswered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomPick {
    Question(QuestionNumber),
    /// Every question in the bank already has a stored answer.
    AllAnswered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

/// Position of a question within the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: QuestionNumber,
    pub total: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Question {} of {}", self.current, self.total)
    }
}

//
// ─── NAVIGATOR ─────────────────────────────────────────────────────────────────
//

/// Moves a session through the question bank and persists answers on the way.
///
/// Every navigation action saves the on-screen selection first. A failed save
/// aborts the navigation and surfaces the storage error.
#[derive(Clone)]
pub struct QuizNavigator {
    clock: Clock,
    bank: Arc<QuestionBank>,
    answers: Arc<dyn AnswerRepository>,
}

impl QuizNavigator {
    #[must_use]
    pub fn new(clock: Clock, bank: Arc<QuestionBank>, answers: Arc<dyn AnswerRepository>) -> Self {
        Self {
            clock,
            bank,
            answers,
        }
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn question(&self, number: QuestionNumber) -> Option<&Question> {
        self.bank.get(number)
    }

    /// Fresh session positioned on the first question.
    #[must_use]
    pub fn start_session(&self) -> Route {
        let session = SessionToken::generate();
        info!(session = %session, "starting new session");
        Route::question(&session, QuestionNumber::FIRST)
    }

    /// Fresh session positioned on a uniformly random question.
    #[must_use]
    pub fn start_random(&self) -> Route {
        self.start_random_with(&mut rand::rng())
    }

    pub(crate) fn start_random_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Route {
        let session = SessionToken::generate();
        let last = self.bank.last_number().value();
        let number = QuestionNumber::new(rng.random_range(1..=last));
        info!(session = %session, question = number.value(), "starting new session at random question");
        Route::question(&session, number)
    }

    /// Resolve the view state for one question of a session.
    ///
    /// A stored row means the question was already answered: its selection is
    /// restored and the question loads revealed.
    ///
    /// # Errors
    ///
    /// Returns `NavigatorError::Storage` if the stored row cannot be read.
    pub async fn load_question(
        &self,
        session: &SessionToken,
        number: QuestionNumber,
    ) -> Result<QuestionView, NavigatorError> {
        let Some(question) = self.bank.get(number) else {
            debug!(session = %session, question = number.value(), "question not in bank");
            return Ok(QuestionView::NotFound);
        };
        let stored = self.answers.get_answer(session, number).await?;
        Ok(QuestionView::Question(QuestionAttempt::load(
            session.clone(),
            question,
            stored.as_ref(),
        )))
    }

    #[must_use]
    pub fn progress(&self, number: QuestionNumber) -> Progress {
        Progress {
            current: number,
            total: self.bank.len(),
            has_prev: number.prev().is_some_and(|n| self.bank.contains(n)),
            has_next: number.next().is_some_and(|n| self.bank.contains(n)),
        }
    }

    /// Persist the attempt's current selection, empty or not.
    ///
    /// # Errors
    ///
    /// Returns `NavigatorError::Storage` if the row cannot be written.
    pub async fn save(&self, attempt: &QuestionAttempt) -> Result<Answer, NavigatorError> {
        let answer = attempt.to_answer(self.clock.now_millis());
        self.answers.put_answer(&answer).await?;
        debug!(
            session = %answer.session,
            question = answer.question_number.value(),
            selected = ?answer.selected_choices,
            "saved answer"
        );
        Ok(answer)
    }

    /// Save the selection and lock the question.
    ///
    /// Revealing an already revealed question does nothing. Callers check
    /// `QuestionAttempt::can_reveal` before offering the action.
    ///
    /// # Errors
    ///
    /// Returns `NavigatorError::Storage` if the save fails. The attempt stays
    /// unrevealed on error.
    pub async fn reveal(&self, attempt: &mut QuestionAttempt) -> Result<(), NavigatorError> {
        if attempt.is_revealed() {
            return Ok(());
        }
        self.save(attempt).await?;
        attempt.mark_revealed();
        Ok(())
    }

    /// Save and step one question forward or back.
    ///
    /// The selection is always saved. Returns `None` when the step would
    /// leave the bank.
    ///
    /// # Errors
    ///
    /// Returns `NavigatorError::Storage` if the save fails.
    pub async fn advance(
        &self,
        attempt: &QuestionAttempt,
        direction: Direction,
    ) -> Result<Option<Route>, NavigatorError> {
        self.save(attempt).await?;
        let current = attempt.question_number();
        let target = match direction {
            Direction::Next => current.next(),
            Direction::Prev => current.prev(),
        };
        let Some(target) = target.filter(|n| self.bank.contains(*n)) else {
            return Ok(None);
        };
        debug!(session = %attempt.session(), from = current.value(), to = target.value(), "advance");
        Ok(Some(Route::question(attempt.session(), target)))
    }

    /// Save, then pick uniformly among questions with no stored row.
    ///
    /// The current question counts as answered once saved, so it is never
    /// picked.
    ///
    /// # Errors
    ///
    /// Returns `NavigatorError::Storage` if the save or the session scan fails.
    pub async fn jump_to_random_unanswered(
        &self,
        attempt: &QuestionAttempt,
    ) -> Result<RandomPick, NavigatorError> {
        self.save(attempt).await?;
        let stored = self.answers.list_by_session(attempt.session()).await?;
        let pick = self.pick_unanswered(&stored, &mut rand::rng());
        debug!(session = %attempt.session(), pick = ?pick, "random unanswered");
        Ok(pick)
    }

    pub(crate) fn pick_unanswered<R: Rng + ?Sized>(
        &self,
        stored: &[Answer],
        rng: &mut R,
    ) -> RandomPick {
        let answered: HashSet<QuestionNumber> = stored.iter().map(|a| a.question_number).collect();
        let remaining: Vec<QuestionNumber> = self
            .bank
            .numbers()
            .filter(|n| !answered.contains(n))
            .collect();
        match remaining.choose(rng) {
            Some(number) => RandomPick::Question(*number),
            None => RandomPick::AllAnswered,
        }
    }

    /// Save and head to the session summary.
    ///
    /// # Errors
    ///
    /// Returns `NavigatorError::Storage` if the save fails.
    pub async fn jump_to_summary(&self, attempt: &QuestionAttempt) -> Result<Route, NavigatorError> {
        self.save(attempt).await?;
        Ok(Route::summary(attempt.session()))
    }
}
