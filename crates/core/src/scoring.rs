use std::collections::{BTreeSet, HashMap};

use crate::model::{Answer, Question, QuestionBank};

/// Number of service buckets shown on the summary.
pub const TOP_SERVICE_BUCKETS: usize = 20;

//
// ─── PER-QUESTION CLASSIFICATION ───────────────────────────────────────────────
//

/// Outcome of one question for the answered-questions table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Correctness {
    Correct,
    Partial,
    Incorrect,
    Unanswered,
}

impl Correctness {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Correctness::Correct => "Correct",
            Correctness::Partial => "Partial",
            Correctness::Incorrect => "Incorrect",
            Correctness::Unanswered => "Unanswered",
        }
    }
}

/// Classifies a stored answer against the full set of correct choices.
///
/// `Correct` requires the selection to equal the correct set exactly;
/// `Partial` is any other selection that hits at least one correct choice.
#[must_use]
pub fn classify(question: &Question, answer: Option<&Answer>) -> Correctness {
    let Some(answer) = answer.filter(|a| a.has_selection()) else {
        return Correctness::Unanswered;
    };
    let selected = answer.selection();
    let correct: BTreeSet<usize> = question.correct_indices().into_iter().collect();

    if selected == correct {
        Correctness::Correct
    } else if !selected.is_disjoint(&correct) {
        Correctness::Partial
    } else {
        Correctness::Incorrect
    }
}

/// Correctness rule used for domain and service buckets.
///
/// Only a single selected choice equal to `correct_index` counts, so a fully
/// correct multi-select answer does not. [`classify`] can disagree with this
/// on multi-select questions.
#[must_use]
pub fn counts_as_bucket_correct(question: &Question, answer: &Answer) -> bool {
    matches!(answer.selected_choices.as_slice(), [only] if *only == question.correct_index)
}

//
// ─── BUCKETS ───────────────────────────────────────────────────────────────────
//

/// Accumulator for one domain or service label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketStats {
    pub label: String,
    pub total: u32,
    pub answered: u32,
    pub correct: u32,
}

impl BucketStats {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            total: 0,
            answered: 0,
            correct: 0,
        }
    }

    /// Share of answered questions that were correct, rounded half-up to a
    /// whole percent. Zero when nothing was answered.
    ///
    /// # Examples
    ///
    /// ```
    /// # use quiz_core::scoring::BucketStats;
    /// let stats = BucketStats { label: "D1".into(), total: 9, answered: 3, correct: 2 };
    /// assert_eq!(stats.score_percent(), 67);
    /// ```
    #[must_use]
    pub fn score_percent(&self) -> u32 {
        if self.answered == 0 {
            return 0;
        }
        let correct = u64::from(self.correct);
        let answered = u64::from(self.answered);
        let rounded = (correct * 200 + answered) / (answered * 2);
        u32::try_from(rounded).unwrap_or(u32::MAX)
    }
}

/// Buckets in first-seen order, with label lookup.
#[derive(Debug, Default)]
struct BucketSet {
    buckets: Vec<BucketStats>,
    index: HashMap<String, usize>,
}

impl BucketSet {
    fn entry(&mut self, label: &str) -> &mut BucketStats {
        let slot = match self.index.get(label) {
            Some(&slot) => slot,
            None => {
                self.buckets.push(BucketStats::new(label));
                let slot = self.buckets.len() - 1;
                self.index.insert(label.to_owned(), slot);
                slot
            }
        };
        &mut self.buckets[slot]
    }

    fn get_mut(&mut self, label: &str) -> Option<&mut BucketStats> {
        let slot = *self.index.get(label)?;
        self.buckets.get_mut(slot)
    }
}

//
// ─── AGGREGATION ───────────────────────────────────────────────────────────────
//

/// Per-domain and per-service statistics for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// One bucket per domain in the bank, in first-seen bank order.
    pub domains: Vec<BucketStats>,
    /// One bucket per service label in the bank, in first-seen bank order.
    pub services: Vec<BucketStats>,
    /// Answers whose question number did not resolve in the bank.
    pub skipped: usize,
}

impl SessionStats {
    /// Service buckets by `answered` descending, ties in bank order.
    #[must_use]
    pub fn top_services(&self, limit: usize) -> Vec<&BucketStats> {
        let mut ranked: Vec<&BucketStats> = self.services.iter().collect();
        ranked.sort_by(|a, b| b.answered.cmp(&a.answered));
        ranked.truncate(limit);
        ranked
    }
}

/// Reduces a session's answers against the whole bank.
///
/// Totals come from the bank, so buckets exist even when nothing was
/// answered. Every resolvable answer row bumps `answered`, empty selections
/// included. Service buckets overlap: a question mentioning several services
/// counts toward each of them.
#[must_use]
pub fn aggregate(bank: &QuestionBank, answers: &[Answer]) -> SessionStats {
    let mut domains = BucketSet::default();
    let mut services = BucketSet::default();

    for q in bank.iter() {
        domains.entry(q.domain_label()).total += 1;
        for service in &q.services_mentioned {
            services.entry(service).total += 1;
        }
    }

    let mut skipped = 0;
    for answer in answers {
        let Some(q) = bank.get(answer.question_number) else {
            skipped += 1;
            continue;
        };
        let correct = counts_as_bucket_correct(q, answer);

        let bump = |bucket: &mut BucketStats| {
            bucket.answered += 1;
            if correct {
                bucket.correct += 1;
            }
        };
        if let Some(bucket) = domains.get_mut(q.domain_label()) {
            bump(bucket);
        }
        for service in &q.services_mentioned {
            if let Some(bucket) = services.get_mut(service) {
                bump(bucket);
            }
        }
    }

    SessionStats {
        domains: domains.buckets,
        services: services.buckets,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::fixtures::question;
    use crate::model::{QuestionNumber, SessionToken};

    fn answer(q: u32, selected: &[usize]) -> Answer {
        Answer::new(
            SessionToken::new("s"),
            QuestionNumber::new(q),
            selected.to_vec(),
            1,
        )
    }

    fn with_services(mut q: Question, services: &[&str]) -> Question {
        q.services_mentioned = services.iter().map(|s| (*s).to_owned()).collect();
        q
    }

    /// Q1 single (correct 0, D1), Q2 multi (0 and 2, D2), Q3 single (correct 1, D1).
    fn scenario_bank() -> QuestionBank {
        QuestionBank::new(vec![
            question(1, Some("D1"), &[true, false, false]),
            question(2, Some("D2"), &[true, false, true]),
            question(3, Some("D1"), &[false, true, false]),
        ])
        .unwrap()
    }

    fn domain<'a>(stats: &'a SessionStats, label: &str) -> &'a BucketStats {
        stats.domains.iter().find(|b| b.label == label).unwrap()
    }

    #[test]
    fn classification_covers_all_outcomes() {
        let q = question(1, None, &[true, false, true, false]);
        assert_eq!(classify(&q, None), Correctness::Unanswered);
        assert_eq!(classify(&q, Some(&answer(1, &[]))), Correctness::Unanswered);
        assert_eq!(classify(&q, Some(&answer(1, &[2, 0]))), Correctness::Correct);
        assert_eq!(classify(&q, Some(&answer(1, &[0]))), Correctness::Partial);
        assert_eq!(classify(&q, Some(&answer(1, &[0, 1]))), Correctness::Partial);
        assert_eq!(classify(&q, Some(&answer(1, &[1, 3]))), Correctness::Incorrect);
    }

    #[test]
    fn duplicate_indices_do_not_break_set_equality() {
        let q = question(1, None, &[true, true]);
        assert_eq!(classify(&q, Some(&answer(1, &[1, 0, 1]))), Correctness::Correct);
    }

    #[test]
    fn empty_session_has_zeroed_buckets() {
        let bank = QuestionBank::new(vec![
            with_services(question(1, Some("D1"), &[true]), &["S3", "EC2"]),
            with_services(question(2, None, &[true]), &["S3"]),
        ])
        .unwrap();

        let stats = aggregate(&bank, &[]);

        assert_eq!(stats.domains.len(), 2);
        assert_eq!(domain(&stats, "D1").total, 1);
        assert_eq!(domain(&stats, "Uncategorized").total, 1);
        for bucket in stats.domains.iter().chain(&stats.services) {
            assert_eq!(bucket.answered, 0);
            assert_eq!(bucket.correct, 0);
            assert_eq!(bucket.score_percent(), 0);
        }
        assert_eq!(stats.services[0].label, "S3");
        assert_eq!(stats.services[0].total, 2);
    }

    #[test]
    fn single_correct_answer_counts_in_bucket() {
        let stats = aggregate(&scenario_bank(), &[answer(1, &[0])]);
        let d1 = domain(&stats, "D1");
        assert_eq!((d1.answered, d1.correct, d1.total), (1, 1, 2));
    }

    #[test]
    fn multi_select_correct_answer_is_not_bucket_correct() {
        let bank = scenario_bank();
        let multi = answer(2, &[0, 2]);
        let stats = aggregate(&bank, &[answer(1, &[0]), multi.clone()]);

        let d2 = domain(&stats, "D2");
        assert_eq!((d2.answered, d2.correct), (1, 0));
        let q2 = bank.get(QuestionNumber::new(2)).unwrap();
        assert_eq!(classify(q2, Some(&multi)), Correctness::Correct);
    }

    #[test]
    fn empty_selection_counts_as_answered_not_correct() {
        let stats = aggregate(&scenario_bank(), &[answer(3, &[])]);
        let d1 = domain(&stats, "D1");
        assert_eq!((d1.answered, d1.correct), (1, 0));
    }

    #[test]
    fn domains_keep_first_seen_order() {
        let stats = aggregate(&scenario_bank(), &[]);
        let labels: Vec<_> = stats.domains.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["D1", "D2"]);
    }

    #[test]
    fn unresolvable_rows_are_skipped() {
        let stats = aggregate(&scenario_bank(), &[answer(99, &[0]), answer(0, &[0])]);
        assert_eq!(stats.skipped, 2);
        assert!(stats.domains.iter().all(|b| b.answered == 0));
    }

    #[test]
    fn services_overlap_across_buckets() {
        let bank = QuestionBank::new(vec![
            with_services(question(1, Some("D"), &[true, false]), &["A", "B"]),
            with_services(question(2, Some("D"), &[true, false]), &["B"]),
        ])
        .unwrap();
        let stats = aggregate(&bank, &[answer(1, &[0]), answer(2, &[1])]);

        let a = &stats.services[0];
        let b = &stats.services[1];
        assert_eq!((a.label.as_str(), a.total, a.answered, a.correct), ("A", 1, 1, 1));
        assert_eq!((b.label.as_str(), b.total, b.answered, b.correct), ("B", 2, 2, 1));
        assert_eq!(b.score_percent(), 50);
    }

    #[test]
    fn top_services_rank_by_answered_and_truncate() {
        let mut questions = Vec::new();
        for n in 1..=25_u32 {
            let label = format!("S{n}");
            questions.push(with_services(question(n, None, &[true]), &[label.as_str()]));
        }
        let bank = QuestionBank::new(questions).unwrap();
        let stats = aggregate(&bank, &[answer(25, &[0]), answer(7, &[0])]);

        let top = stats.top_services(TOP_SERVICE_BUCKETS);
        assert_eq!(top.len(), 20);
        assert_eq!(top[0].label, "S7");
        assert_eq!(top[1].label, "S25");
        assert_eq!(top[2].label, "S1");
    }

    #[test]
    fn score_rounds_half_up() {
        let bucket = |correct, answered| BucketStats {
            label: String::new(),
            total: 10,
            answered,
            correct,
        };
        assert_eq!(bucket(1, 8).score_percent(), 13);
        assert_eq!(bucket(1, 3).score_percent(), 33);
        assert_eq!(bucket(3, 3).score_percent(), 100);
        assert_eq!(bucket(0, 0).score_percent(), 0);
    }
}
