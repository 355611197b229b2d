use std::sync::Arc;

use quiz_core::model::{Answer, Question, QuestionBank, QuestionNumber, SessionToken};
use quiz_core::scoring::{self, BucketStats, Correctness, SessionStats, TOP_SERVICE_BUCKETS};
use storage::repository::AnswerRepository;
use tracing::{debug, warn};

use crate::error::SummaryError;
use crate::routes::Route;

/// Character budget for choice texts in the answered-questions table.
pub const CHOICE_PREVIEW_CHARS: usize = 80;

/// One row of the answered-questions table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsweredRow {
    pub question_number: QuestionNumber,
    pub question: String,
    pub selected: Vec<String>,
    pub correct: Vec<String>,
    pub correctness: Correctness,
}

/// Everything the summary page shows for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryReport {
    pub session: SessionToken,
    pub total_questions: usize,
    pub stats: SessionStats,
    /// Rows with a non-empty selection, by question number.
    pub answered: Vec<AnsweredRow>,
}

impl SummaryReport {
    #[must_use]
    pub fn top_services(&self) -> Vec<&BucketStats> {
        self.stats.top_services(TOP_SERVICE_BUCKETS)
    }
}

/// Builds summary reports from the bank and stored answers.
#[derive(Clone)]
pub struct SummaryService {
    bank: Arc<QuestionBank>,
    answers: Arc<dyn AnswerRepository>,
}

impl SummaryService {
    #[must_use]
    pub fn new(bank: Arc<QuestionBank>, answers: Arc<dyn AnswerRepository>) -> Self {
        Self { bank, answers }
    }

    /// Aggregate a session into bucket statistics plus the answered table.
    ///
    /// # Errors
    ///
    /// Returns `SummaryError::Storage` if the session cannot be read.
    pub async fn report(&self, session: &SessionToken) -> Result<SummaryReport, SummaryError> {
        let answers = self.answers.list_by_session(session).await?;
        let stats = scoring::aggregate(&self.bank, &answers);
        if stats.skipped > 0 {
            warn!(session = %session, skipped = stats.skipped, "answers reference unknown questions");
        }
        let answered = answered_rows(&self.bank, answers);
        debug!(session = %session, answered = answered.len(), "built summary");

        Ok(SummaryReport {
            session: session.clone(),
            total_questions: self.bank.len(),
            stats,
            answered,
        })
    }

    /// Where "back to questions" leads: the most recently saved question,
    /// else the first one.
    ///
    /// # Errors
    ///
    /// Returns `SummaryError::Storage` if the session cannot be read.
    pub async fn back_to_questions(&self, session: &SessionToken) -> Result<Route, SummaryError> {
        let latest = self.answers.latest_for_session(session).await?;
        let number = latest.map_or(QuestionNumber::FIRST, |a| a.question_number);
        Ok(Route::question(session, number))
    }
}

fn answered_rows(bank: &QuestionBank, mut answers: Vec<Answer>) -> Vec<AnsweredRow> {
    answers.retain(Answer::has_selection);
    answers.sort_by_key(|a| a.question_number);
    answers
        .iter()
        .filter_map(|answer| {
            let question = bank.get(answer.question_number)?;
            Some(AnsweredRow {
                question_number: answer.question_number,
                question: question.question.clone(),
                selected: choice_previews(question, answer.selection()),
                correct: choice_previews(question, question.correct_indices()),
                correctness: scoring::classify(question, Some(answer)),
            })
        })
        .collect()
}

fn choice_previews(question: &Question, indices: impl IntoIterator<Item = usize>) -> Vec<String> {
    indices
        .into_iter()
        .filter_map(|i| question.choices.get(i))
        .map(|c| preview(&c.text, CHOICE_PREVIEW_CHARS))
        .collect()
}

/// Cuts `text` to `limit` characters, marking the cut with `...`.
#[must_use]
pub fn preview(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Choice, QuestionRequirements};
    use storage::repository::InMemoryRepository;

    fn question(number: u32, domain: &str, services: &[&str], flags: &[bool]) -> Question {
        Question {
            question_number: QuestionNumber::new(number),
            domain: Some(domain.to_owned()),
            user_status: String::new(),
            question: format!("Question {number}"),
            choices: flags
                .iter()
                .enumerate()
                .map(|(i, f)| Choice {
                    text: format!("Choice {i}"),
                    explanation: String::new(),
                    is_correct: *f,
                })
                .collect(),
            correct_index: flags.iter().position(|f| *f).unwrap_or(0),
            services_mentioned: services.iter().map(|s| (*s).to_owned()).collect(),
            requirements: QuestionRequirements::default(),
        }
    }

    fn service(repo: &InMemoryRepository) -> SummaryService {
        let bank = QuestionBank::new(vec![
            question(1, "D1", &["S3"], &[true, false, false]),
            question(2, "D2", &["S3", "Lambda"], &[true, false, true]),
            question(3, "D1", &[], &[false, true, false]),
        ])
        .unwrap();
        SummaryService::new(Arc::new(bank), Arc::new(repo.clone()))
    }

    fn answer(q: u32, selected: &[usize], ts: i64) -> Answer {
        Answer::new(
            SessionToken::new("s"),
            QuestionNumber::new(q),
            selected.to_vec(),
            ts,
        )
    }

    #[test]
    fn preview_cuts_on_char_boundaries() {
        assert_eq!(preview("short", 80), "short");
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("ééééé", 2), "éé...");
        let exact = "x".repeat(80);
        assert_eq!(preview(&exact, 80), exact);
    }

    #[tokio::test]
    async fn report_lists_only_non_empty_selections_in_order() {
        let repo = InMemoryRepository::new();
        repo.bulk_put(&[
            answer(3, &[1], 3),
            answer(2, &[0, 2], 2),
            answer(1, &[], 1),
            answer(9, &[0], 4),
        ])
        .await
        .unwrap();

        let report = service(&repo).report(&SessionToken::new("s")).await.unwrap();

        let numbers: Vec<u32> = report
            .answered
            .iter()
            .map(|r| r.question_number.value())
            .collect();
        assert_eq!(numbers, vec![2, 3]);
        assert_eq!(report.answered[0].selected, vec!["Choice 0", "Choice 2"]);
        assert_eq!(report.answered[0].correct, vec!["Choice 0", "Choice 2"]);
        assert_eq!(report.answered[0].correctness, Correctness::Correct);
        assert_eq!(report.stats.skipped, 1);
        assert_eq!(report.total_questions, 3);

        // empty selection on Q1 still counts as answered in the D1 bucket
        let d1 = &report.stats.domains[0];
        assert_eq!((d1.total, d1.answered, d1.correct), (2, 2, 1));
    }

    #[tokio::test]
    async fn services_rank_by_answered() {
        let repo = InMemoryRepository::new();
        repo.put_answer(&answer(2, &[0], 1)).await.unwrap();
        repo.put_answer(&answer(1, &[0], 2)).await.unwrap();

        let report = service(&repo).report(&SessionToken::new("s")).await.unwrap();
        let labels: Vec<&str> = report
            .top_services()
            .iter()
            .map(|b| b.label.as_str())
            .collect();
        assert_eq!(labels, vec!["S3", "Lambda"]);
    }

    #[tokio::test]
    async fn back_to_questions_prefers_latest_answer() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);
        let s = SessionToken::new("s");

        assert_eq!(
            svc.back_to_questions(&s).await.unwrap(),
            Route::question(&s, QuestionNumber::FIRST)
        );

        repo.bulk_put(&[answer(3, &[1], 10), answer(2, &[0], 50)])
            .await
            .unwrap();
        assert_eq!(
            svc.back_to_questions(&s).await.unwrap(),
            Route::question(&s, QuestionNumber::new(2))
        );
    }
}
