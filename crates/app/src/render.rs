use std::fmt::Write as _;

use quiz_core::model::{Quiz, QuestionKind, Response};
use services::{
    HistoryItem, HistoryStats, QuestionView, ScoreBand, SessionMode, SessionSnapshot, Urgency,
    format_clock,
};

pub const HELP: &str = "\
Commands:
  <n>            choose option n (toggles it on multiple-choice questions)
  s, skip        skip the current question
  n, next        next question
  p, prev        previous question
  f, finish      finish and score the quiz
  r, review      review answers after finishing
  again          restart the quiz
  h, help        show this help
  q, quit        leave the quiz";

fn urgency_label(remaining_secs: u32) -> &'static str {
    match Urgency::for_remaining(remaining_secs) {
        Urgency::Calm => "",
        Urgency::Warning => " (hurry)",
        Urgency::Critical => " (!)",
    }
}

#[must_use]
pub fn time_left(remaining_secs: u32) -> String {
    format!(
        "time left {}{}",
        format_clock(u64::from(remaining_secs)),
        urgency_label(remaining_secs)
    )
}

fn option_marker(kind: QuestionKind, selected: bool) -> &'static str {
    match (kind, selected) {
        (QuestionKind::SingleChoice, true) => "(x)",
        (QuestionKind::SingleChoice, false) => "( )",
        (QuestionKind::MultipleChoice, true) => "[x]",
        (QuestionKind::MultipleChoice, false) => "[ ]",
    }
}

fn status_word(view: &QuestionView) -> &'static str {
    match (&view.outcome, &view.response) {
        (Some(outcome), _) if outcome.is_skipped => "skipped",
        (Some(outcome), _) if outcome.is_correct => "correct",
        (Some(_), _) => "wrong",
        (None, Some(Response::Skipped)) => "skipped",
        (None, Some(Response::Answered(_))) => "answered",
        (None, None) => "open",
    }
}

/// The active question with its options, progress and remaining time.
#[must_use]
pub fn question_screen(snapshot: &SessionSnapshot, remaining_secs: Option<u32>) -> String {
    let mut out = String::new();
    let progress = &snapshot.progress;
    let _ = write!(
        out,
        "\n{} - question {}/{} - answered {}, skipped {}",
        snapshot.title,
        progress.position,
        progress.total,
        progress.answered,
        progress.skipped,
    );
    if snapshot.mode == SessionMode::Reviewing {
        out.push_str(" - review");
    } else if let Some(secs) = remaining_secs {
        let _ = write!(out, " - {}", time_left(secs));
    }
    out.push('\n');

    let Some(view) = snapshot.active_question() else {
        return out;
    };
    let _ = writeln!(out, "{} [{}]", view.text, status_word(view));
    for (index, option) in view.options.iter().enumerate() {
        let selected = view
            .response
            .as_ref()
            .and_then(Response::answer)
            .is_some_and(|answer| answer.includes(index));
        let correct = view
            .outcome
            .as_ref()
            .is_some_and(|outcome| outcome.correct.contains(index));
        let _ = writeln!(
            out,
            "  {} {}. {}{}",
            option_marker(view.kind, selected),
            index + 1,
            option,
            if correct { "  <- correct" } else { "" }
        );
    }
    if let Some(explanation) = view.outcome.as_ref().and_then(|o| o.explanation.as_deref()) {
        let _ = writeln!(out, "  note: {explanation}");
    }
    if snapshot.mode == SessionMode::InProgress && snapshot.can_finish {
        out.push_str("All questions resolved; type 'finish' to score.\n");
    }
    out
}

/// Score summary after a session is scored.
#[must_use]
pub fn result_screen(snapshot: &SessionSnapshot) -> String {
    let Some(result) = &snapshot.result else {
        return String::new();
    };
    let mut out = String::new();
    let _ = writeln!(out, "\n{} - attempt {}", snapshot.title, snapshot.attempt);
    let _ = writeln!(
        out,
        "score {}/{} ({}%), skipped {}, time {}",
        result.score(),
        result.total_questions(),
        result.percentage(),
        result.skipped_count(),
        format_clock(result.time_spent_secs()),
    );
    for (index, view) in snapshot.questions.iter().enumerate() {
        let _ = writeln!(out, "  {:>2}. {:<8} {}", index + 1, status_word(view), view.text);
    }
    out.push_str("Type 'review' to step through answers, 'again' to retry or 'quit'.\n");
    out
}

#[must_use]
pub fn quiz_list(quizzes: &[Quiz]) -> String {
    if quizzes.is_empty() {
        return "No quizzes yet. Use 'import <quiz.json>' or run the seed binary.\n".to_string();
    }
    let mut out = String::new();
    for quiz in quizzes {
        let limit = quiz
            .time_limit_secs()
            .map_or_else(|| "untimed".to_string(), |secs| format_clock(u64::from(secs)));
        let _ = writeln!(
            out,
            "{:>4}  {}  ({} questions, {}{})",
            quiz.id(),
            quiz.title(),
            quiz.questions().len(),
            limit,
            if quiz.shuffle_questions() { ", shuffled" } else { "" }
        );
    }
    out
}

fn band_label(band: ScoreBand) -> &'static str {
    match band {
        ScoreBand::High => "high",
        ScoreBand::Medium => "medium",
        ScoreBand::Low => "low",
    }
}

#[must_use]
pub fn history(items: &[HistoryItem], stats: &HistoryStats) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "attempts {}, average {:.0}%, average time {:.0} min, skipped {}",
        stats.total_attempts,
        stats.average_percentage,
        stats.average_minutes(),
        stats.total_skipped,
    );
    for item in items {
        let _ = writeln!(
            out,
            "{}  {}  {}/{} ({}%, {})  {} skipped  {}",
            item.completed_at.format("%Y-%m-%d %H:%M"),
            item.quiz_title,
            item.score,
            item.total_questions,
            item.percentage,
            band_label(item.band),
            item.skipped_count,
            format_clock(item.time_spent_secs),
        );
    }
    out
}
