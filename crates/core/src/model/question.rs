use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionNumber;

/// Domain label used when a question carries none.
pub const UNCATEGORIZED: &str = "Uncategorized";

//
// ─── CHOICE ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    #[serde(default)]
    pub explanation: String,
    pub is_correct: bool,
}

//
// ─── REQUIREMENTS ──────────────────────────────────────────────────────────────
//

/// Scenario hints extracted alongside each question. Carried as metadata only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct QuestionRequirements {
    pub latency: Option<String>,
    pub throughput: Option<String>,
    pub cost_focus: bool,
    pub security_focus: bool,
    pub scalability: bool,
    pub real_time: bool,
    pub batch: bool,
    pub pii_handling: bool,
    pub multi_language: bool,
}

//
// ─── SELECT MODE ───────────────────────────────────────────────────────────────
//

/// How a question accepts selections.
///
/// A question is single-select iff exactly one choice is flagged correct;
/// every other count, zero included, is multi-select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    Single,
    Multi { correct: usize },
}

impl SelectMode {
    #[must_use]
    pub fn from_correct_count(count: usize) -> Self {
        if count == 1 {
            Self::Single
        } else {
            Self::Multi { correct: count }
        }
    }

    #[must_use]
    pub fn is_single(self) -> bool {
        matches!(self, Self::Single)
    }

    /// Badge shown next to multi-select questions.
    ///
    /// Single-select questions and questions with no correct choice get none.
    #[must_use]
    pub fn label(self) -> Option<String> {
        let Self::Multi { correct } = self else {
            return None;
        };
        let word = match correct {
            0 | 1 => return None,
            2 => "two",
            3 => "three",
            4 => "four",
            5 => "five",
            n => return Some(format!("Select {n}")),
        };
        Some(format!("Select {word}"))
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// One immutable record of the question bank.
///
/// `correct_index` is only consistent with `choices` when exactly one choice
/// is correct; multi-correct questions are scored from the `is_correct` flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question_number: QuestionNumber,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub user_status: String,
    pub question: String,
    pub choices: Vec<Choice>,
    pub correct_index: usize,
    #[serde(default)]
    pub services_mentioned: Vec<String>,
    #[serde(default)]
    pub requirements: QuestionRequirements,
}

impl Question {
    /// Domain label, falling back to [`UNCATEGORIZED`].
    #[must_use]
    pub fn domain_label(&self) -> &str {
        self.domain.as_deref().unwrap_or(UNCATEGORIZED)
    }

    /// Indices of all choices flagged correct, ascending.
    #[must_use]
    pub fn correct_indices(&self) -> Vec<usize> {
        self.choices
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_correct)
            .map(|(i, _)| i)
            .collect()
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.choices.iter().filter(|c| c.is_correct).count()
    }

    #[must_use]
    pub fn select_mode(&self) -> SelectMode {
        SelectMode::from_correct_count(self.correct_count())
    }

    #[must_use]
    pub fn select_label(&self) -> Option<String> {
        self.select_mode().label()
    }

    #[must_use]
    pub fn is_correct_choice(&self, index: usize) -> bool {
        self.choices.get(index).is_some_and(|c| c.is_correct)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::question;
    use super::*;

    #[test]
    fn single_correct_choice_is_single_select() {
        let q = question(1, None, &[false, true, false]);
        assert_eq!(q.select_mode(), SelectMode::Single);
        assert_eq!(q.select_label(), None);
        assert_eq!(q.correct_indices(), vec![1]);
    }

    #[test]
    fn select_labels_spell_small_counts() {
        assert_eq!(
            SelectMode::from_correct_count(2).label().as_deref(),
            Some("Select two")
        );
        assert_eq!(
            SelectMode::from_correct_count(4).label().as_deref(),
            Some("Select four")
        );
        assert_eq!(
            SelectMode::from_correct_count(5).label().as_deref(),
            Some("Select five")
        );
    }

    #[test]
    fn select_labels_use_digits_past_five() {
        assert_eq!(
            SelectMode::from_correct_count(7).label().as_deref(),
            Some("Select 7")
        );
    }

    #[test]
    fn no_correct_choice_is_multi_without_label() {
        let q = question(1, None, &[false, false]);
        assert_eq!(q.select_mode(), SelectMode::Multi { correct: 0 });
        assert_eq!(q.select_label(), None);
    }

    #[test]
    fn four_correct_choices_render_select_four() {
        let q = question(3, None, &[true, true, true, true, false]);
        assert_eq!(q.select_label().as_deref(), Some("Select four"));
    }

    #[test]
    fn missing_domain_is_uncategorized() {
        assert_eq!(question(1, None, &[true]).domain_label(), UNCATEGORIZED);
        assert_eq!(question(1, Some("D1"), &[true]).domain_label(), "D1");
    }

    #[test]
    fn deserializes_bank_record_with_optional_fields() {
        let json = r#"{
            "question_number": 4,
            "domain": null,
            "question": "Pick one",
            "choices": [
                {"text": "a", "explanation": "no", "is_correct": false},
                {"text": "b", "explanation": "yes", "is_correct": true}
            ],
            "correct_index": 1,
            "services_mentioned": ["S3"],
            "requirements": {"latency": "low", "cost_focus": true}
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.question_number, QuestionNumber::new(4));
        assert_eq!(q.domain_label(), UNCATEGORIZED);
        assert_eq!(q.requirements.latency.as_deref(), Some("low"));
        assert!(q.requirements.cost_focus);
        assert!(!q.requirements.batch);
        assert!(q.is_correct_choice(1));
        assert!(!q.is_correct_choice(9));
    }
}
