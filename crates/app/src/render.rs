//! Plain-text views for the terminal front-end.

use std::fmt::Write as _;

use comfy_table::{Cell, Table};
use quiz_core::model::{ChoiceMark, Question, QuestionAttempt};
use services::{Progress, SummaryReport};

fn mark_prefix(mark: ChoiceMark) -> &'static str {
    match mark {
        ChoiceMark::Correct => "[+]",
        ChoiceMark::WrongSelection => "[-]",
        ChoiceMark::Selected => "[x]",
        ChoiceMark::Neutral => "[ ]",
    }
}

pub fn question(question: &Question, attempt: &QuestionAttempt, progress: &Progress) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{progress}  ({})", question.domain_label());
    if !question.user_status.is_empty() {
        let _ = writeln!(out, "{}", question.user_status);
    }
    let _ = writeln!(out, "{}", question.question);
    if let Some(label) = question.select_label() {
        let _ = writeln!(out, "{label}");
    }

    let revealed = attempt.is_revealed();
    for (i, (choice, mark)) in question
        .choices
        .iter()
        .zip(attempt.choice_marks(question))
        .enumerate()
    {
        let _ = writeln!(out, "  {} {}. {}", mark_prefix(mark), i + 1, choice.text);
        if revealed && !choice.explanation.is_empty() {
            let _ = writeln!(out, "        {}", choice.explanation);
        }
    }
    out
}

pub fn summary(report: &SummaryReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Session {}", report.session);
    let _ = writeln!(
        out,
        "Answered {} of {} questions",
        report.answered.len(),
        report.total_questions
    );

    let mut domains = Table::new();
    domains.set_header(vec!["Domain", "Questions", "Answered", "Correct", "Score"]);
    for bucket in &report.stats.domains {
        domains.add_row(vec![
            Cell::new(&bucket.label),
            Cell::new(bucket.total),
            Cell::new(bucket.answered),
            Cell::new(bucket.correct),
            Cell::new(format!("{}%", bucket.score_percent())),
        ]);
    }
    let _ = writeln!(out, "\n{domains}");

    let top = report.top_services();
    if !top.is_empty() {
        let mut services = Table::new();
        services.set_header(vec!["Service", "Questions", "Answered", "Correct", "Score"]);
        for bucket in top {
            services.add_row(vec![
                Cell::new(&bucket.label),
                Cell::new(bucket.total),
                Cell::new(bucket.answered),
                Cell::new(bucket.correct),
                Cell::new(format!("{}%", bucket.score_percent())),
            ]);
        }
        let _ = writeln!(out, "\n{services}");
    }

    if !report.answered.is_empty() {
        let mut rows = Table::new();
        rows.set_header(vec!["#", "Question", "Your answer", "Correct answer", "Result"]);
        for row in &report.answered {
            rows.add_row(vec![
                Cell::new(row.question_number),
                Cell::new(&row.question),
                Cell::new(row.selected.join("\n")),
                Cell::new(row.correct.join("\n")),
                Cell::new(row.correctness.as_str()),
            ]);
        }
        let _ = writeln!(out, "\n{rows}");
    }
    out
}

pub fn entry() -> String {
    [
        "Quiz",
        "  quiz start            begin a new session at question 1",
        "  quiz start --random   begin a new session at a random question",
        "  quiz import <file>    resume a session from an exported file",
    ]
    .join("\n")
}

pub const PLAY_HELP: &str =
    "choices: 1..n toggle | a answer | n next | p prev | r random | s summary | q quit";
