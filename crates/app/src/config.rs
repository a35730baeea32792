use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use quiz_core::model::QuizId;

pub const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";
pub const DEFAULT_LOG_FILTER: &str = "warn";
pub const DEFAULT_TICK_MS: u64 = 1000;

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    MissingQuizId { command: &'static str },
    MissingPath { command: &'static str },
    InvalidQuizId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidSeed { raw: String },
    InvalidTick { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::MissingQuizId { command } => write!(f, "{command} requires a quiz id"),
            ArgsError::MissingPath { command } => write!(f, "{command} requires a JSON file path"),
            ArgsError::InvalidQuizId { raw } => write!(f, "invalid quiz id: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::InvalidTick { raw } => write!(f, "invalid --tick-ms value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Play(QuizId),
    History,
    Delete(QuizId),
    Import(PathBuf),
    Edit(QuizId, PathBuf),
    Export(QuizId),
    Help,
}

/// Runtime settings, from the environment first and then from flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_url: String,
    pub shuffle_seed: Option<u64>,
    pub tick: Duration,
    pub log_filter: String,
}

impl AppConfig {
    /// Read `QUIZ_DB_URL`, `QUIZ_SHUFFLE_SEED`, `QUIZ_TICK_MS` and `QUIZ_LOG`
    /// (falling back to `RUST_LOG`). Unparseable numbers fall back to defaults.
    #[must_use]
    pub fn from_env(env: impl Fn(&str) -> Option<String>) -> Self {
        let db_url = env("QUIZ_DB_URL").map_or_else(
            || normalize_sqlite_url(DEFAULT_DB_URL),
            |raw| normalize_sqlite_url(&raw),
        );
        let shuffle_seed = env("QUIZ_SHUFFLE_SEED").and_then(|v| v.trim().parse().ok());
        let tick_ms = env("QUIZ_TICK_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_TICK_MS);
        let log_filter = env("QUIZ_LOG")
            .or_else(|| env("RUST_LOG"))
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Self {
            db_url,
            shuffle_seed,
            tick: Duration::from_millis(tick_ms),
            log_filter,
        }
    }
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn quiz_id_arg(
    args: &mut impl Iterator<Item = String>,
    command: &'static str,
) -> Result<QuizId, ArgsError> {
    let raw = args.next().ok_or(ArgsError::MissingQuizId { command })?;
    raw.parse().map_err(|_| ArgsError::InvalidQuizId { raw })
}

fn path_arg(
    args: &mut impl Iterator<Item = String>,
    command: &'static str,
) -> Result<PathBuf, ArgsError> {
    args.next()
        .map(PathBuf::from)
        .ok_or(ArgsError::MissingPath { command })
}

/// Parse a subcommand and flags on top of `config`.
///
/// # Errors
///
/// Returns `ArgsError` for unknown subcommands or flags and malformed values.
pub fn parse_args(
    args: impl IntoIterator<Item = String>,
    mut config: AppConfig,
) -> Result<(Command, AppConfig), ArgsError> {
    let mut args = args.into_iter();
    let mut command = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                let value = require_value(&mut args, "--db")?;
                if value.trim().is_empty() {
                    return Err(ArgsError::InvalidDbUrl { raw: value });
                }
                config.db_url = normalize_sqlite_url(&value);
            }
            "--seed" => {
                let value = require_value(&mut args, "--seed")?;
                let seed = value
                    .parse::<u64>()
                    .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?;
                config.shuffle_seed = Some(seed);
            }
            "--tick-ms" => {
                let value = require_value(&mut args, "--tick-ms")?;
                let ms = value
                    .parse::<u64>()
                    .ok()
                    .filter(|ms| *ms > 0)
                    .ok_or_else(|| ArgsError::InvalidTick { raw: value.clone() })?;
                config.tick = Duration::from_millis(ms);
            }
            "--help" | "-h" => return Ok((Command::Help, config)),
            flag if flag.starts_with('-') => return Err(ArgsError::UnknownArg(arg)),
            _ if command.is_some() => return Err(ArgsError::UnknownArg(arg)),
            "list" => command = Some(Command::List),
            "history" => command = Some(Command::History),
            "play" => command = Some(Command::Play(quiz_id_arg(&mut args, "play")?)),
            "delete" => command = Some(Command::Delete(quiz_id_arg(&mut args, "delete")?)),
            "import" => command = Some(Command::Import(path_arg(&mut args, "import")?)),
            "edit" => {
                let id = quiz_id_arg(&mut args, "edit")?;
                command = Some(Command::Edit(id, path_arg(&mut args, "edit")?));
            }
            "export" => command = Some(Command::Export(quiz_id_arg(&mut args, "export")?)),
            _ => return Err(ArgsError::UnknownCommand(arg)),
        }
    }

    Ok((command.unwrap_or(Command::List), config))
}

/// Turn a bare or relative `SQLite` path into an absolute `sqlite://` URL.
#[must_use]
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite:file:") {
        return trimmed.to_string();
    }

    let path_str = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [options] [list]");
    eprintln!("  cargo run -p app -- [options] play <quiz-id>");
    eprintln!("  cargo run -p app -- [options] history");
    eprintln!("  cargo run -p app -- [options] delete <quiz-id>");
    eprintln!("  cargo run -p app -- [options] import <quiz.json>");
    eprintln!("  cargo run -p app -- [options] edit <quiz-id> <quiz.json>");
    eprintln!("  cargo run -p app -- [options] export <quiz-id>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: {DEFAULT_DB_URL})");
    eprintln!("  --seed <n>                Reproducible question shuffling");
    eprintln!("  --tick-ms <ms>            Timer period (default: {DEFAULT_TICK_MS})");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_SHUFFLE_SEED, QUIZ_TICK_MS, QUIZ_LOG (or RUST_LOG)");
}
