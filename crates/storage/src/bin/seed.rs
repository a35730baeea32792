use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use quiz_core::model::{Answer, CorrectAnswer, Question, QuestionId, Response};
use quiz_core::scoring::score_responses;
use storage::repository::Storage;
use storage::sample::sample_quiz_draft;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    results: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidResults { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidResults { raw } => write!(f, "invalid --results value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite://quiz.sqlite3?mode=rwc".into());
        let mut results = std::env::var("QUIZ_SEED_RESULTS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(3);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--results" => {
                    let value = require_value(&mut args, "--results")?;
                    results = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidResults { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            results,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://quiz.sqlite3?mode=rwc)");
    eprintln!("  --results <n>             Number of past attempts to record (default: 3)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  QUIZ_DB_URL, QUIZ_SEED_RESULTS");
}

fn correct_answer(question: &Question) -> Answer {
    match question.correct() {
        CorrectAnswer::Single(index) => Answer::Single(*index),
        CorrectAnswer::Multiple(set) => Answer::Multiple(set.clone()),
    }
}

/// Attempt `n` answers everything correctly except every `n + 2`-th question,
/// which it skips.
fn sample_responses(questions: &[Question], n: u32) -> HashMap<QuestionId, Response> {
    let stride = n as usize + 2;
    questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let response = if (i + 1) % stride == 0 {
                Response::Skipped
            } else {
                Response::Answered(correct_answer(q))
            };
            (q.id(), response)
        })
        .collect()
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let validated = sample_quiz_draft().validate(now)?;
    let questions = validated.questions.clone();
    let quiz_id = storage.quizzes.insert_new_quiz(validated).await?;

    for i in 0..args.results {
        let completed_at = now - Duration::days(i64::from(i) * 2);
        let started_at = completed_at - Duration::seconds(90 + i64::from(i) * 15);
        let responses = sample_responses(&questions, i);
        let result = score_responses(quiz_id, &questions, &responses, started_at, completed_at)?;
        let _ = storage.results.append_result(&result).await?;
    }

    println!(
        "Seeded quiz {} with {} past attempts into {}",
        quiz_id, args.results, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
