use thiserror::Error;

use crate::model::ids::QuestionNumber;
use crate::model::question::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error("question bank is empty")]
    Empty,

    #[error("question at position {position} is numbered {found}")]
    NonDenseNumbering { position: usize, found: u32 },

    #[error("question bank is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

//
// ─── BANK ──────────────────────────────────────────────────────────────────────
//

/// Read-only, ordered question bank.
///
/// Numbering is dense and 1-based, so question `n` always lives at index
/// `n - 1`. The bank is built once and shared behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Builds a bank from questions in display order.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Empty` for an empty list and
    /// `BankError::NonDenseNumbering` when numbers are not exactly `1..=len`.
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        if questions.is_empty() {
            return Err(BankError::Empty);
        }
        for (position, q) in questions.iter().enumerate() {
            if q.question_number.index() != Some(position) {
                return Err(BankError::NonDenseNumbering {
                    position,
                    found: q.question_number.value(),
                });
            }
        }
        Ok(Self { questions })
    }

    /// Parses a JSON array of questions.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Parse` for malformed JSON, or a numbering error.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, BankError> {
        let questions: Vec<Question> = serde_json::from_slice(bytes)?;
        Self::new(questions)
    }

    /// Total question count. Never zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Highest valid question number.
    #[must_use]
    pub fn last_number(&self) -> QuestionNumber {
        QuestionNumber::new(u32::try_from(self.questions.len()).unwrap_or(u32::MAX))
    }

    #[must_use]
    pub fn contains(&self, number: QuestionNumber) -> bool {
        self.get(number).is_some()
    }

    #[must_use]
    pub fn get(&self, number: QuestionNumber) -> Option<&Question> {
        self.questions.get(number.index()?)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    /// All valid question numbers in order.
    pub fn numbers(&self) -> impl Iterator<Item = QuestionNumber> + '_ {
        self.questions.iter().map(|q| q.question_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::fixtures::question;

    #[test]
    fn lookup_is_by_one_based_number() {
        let bank = QuestionBank::new(vec![
            question(1, Some("D1"), &[true, false]),
            question(2, Some("D2"), &[false, true]),
        ])
        .unwrap();

        assert_eq!(bank.len(), 2);
        assert_eq!(bank.last_number(), QuestionNumber::new(2));
        assert_eq!(bank.get(QuestionNumber::new(2)).unwrap().domain_label(), "D2");
        assert!(bank.get(QuestionNumber::new(0)).is_none());
        assert!(bank.get(QuestionNumber::new(3)).is_none());
    }

    #[test]
    fn rejects_gaps_and_empty_banks() {
        assert!(matches!(QuestionBank::new(Vec::new()), Err(BankError::Empty)));

        let err = QuestionBank::new(vec![
            question(1, None, &[true]),
            question(3, None, &[true]),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            BankError::NonDenseNumbering {
                position: 1,
                found: 3
            }
        ));
    }

    #[test]
    fn parses_json_array() {
        let json = br#"[
            {"question_number": 1, "question": "q", "choices": [
                {"text": "a", "explanation": "", "is_correct": true}
            ], "correct_index": 0}
        ]"#;
        let bank = QuestionBank::from_json_slice(json).unwrap();
        assert_eq!(bank.numbers().collect::<Vec<_>>(), vec![QuestionNumber::FIRST]);

        assert!(matches!(
            QuestionBank::from_json_slice(b"{}"),
            Err(BankError::Parse(_))
        ));
    }
}
