use std::sync::Arc;

use services::{
    Clock, HistoryService, QuizCatalogService, QuizPlayService, QuizPlayer, SeededShuffler,
    spawn_result_writer,
};
use storage::repository::Storage;

mod authoring;
mod config;
mod play;
mod render;
mod telemetry;

use config::{AppConfig, ArgsError, Command, parse_args, print_usage};

const LIST_LIMIT: u32 = 200;
const HISTORY_LIMIT: u32 = 50;

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let base = AppConfig::from_env(|key| std::env::var(key).ok());
    let (command, config) = parse_args(std::env::args().skip(1), base).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    if command == Command::Help {
        print_usage();
        return Ok(());
    }

    telemetry::init_tracing(&config.log_filter)?;

    // Storage is opened and migrated here, never inside services.
    prepare_sqlite_file(&config.db_url)?;
    let storage = Storage::sqlite(&config.db_url).await?;
    tracing::debug!(db_url = %config.db_url, ?command, "storage ready");
    let clock = Clock::default_clock();

    match command {
        Command::List => {
            let catalog = QuizCatalogService::new(clock, Arc::clone(&storage.quizzes));
            print!("{}", render::quiz_list(&catalog.list_quizzes(LIST_LIMIT).await?));
        }
        Command::History => {
            let history =
                HistoryService::new(Arc::clone(&storage.quizzes), Arc::clone(&storage.results));
            let items = history.list_recent(HISTORY_LIMIT).await?;
            let stats = history.stats().await?;
            print!("{}", render::history(&items, &stats));
        }
        Command::Delete(id) => {
            let catalog = QuizCatalogService::new(clock, Arc::clone(&storage.quizzes));
            catalog.delete_quiz(id).await?;
            println!("Deleted quiz {id}.");
        }
        Command::Import(path) => {
            let catalog = QuizCatalogService::new(clock, Arc::clone(&storage.quizzes));
            let quiz = authoring::import_quiz(&catalog, &path).await?;
            println!("Imported quiz {} ({}).", quiz.id(), quiz.title());
        }
        Command::Edit(id, path) => {
            let catalog = QuizCatalogService::new(clock, Arc::clone(&storage.quizzes));
            let quiz = authoring::edit_quiz(&catalog, id, &path).await?;
            println!("Updated quiz {} ({}).", quiz.id(), quiz.title());
        }
        Command::Export(id) => {
            let catalog = QuizCatalogService::new(clock, Arc::clone(&storage.quizzes));
            println!("{}", authoring::export_quiz(&catalog, id).await?);
        }
        Command::Play(id) => play_quiz(&config, clock, &storage, id).await?,
        Command::Help => print_usage(),
    }
    Ok(())
}

async fn play_quiz(
    config: &AppConfig,
    clock: Clock,
    storage: &Storage,
    quiz_id: quiz_core::model::QuizId,
) -> Result<(), Box<dyn std::error::Error>> {
    let (sink, writer) = spawn_result_writer(Arc::clone(&storage.results));
    let mut service = QuizPlayService::new(clock, Arc::clone(&storage.quizzes), Arc::new(sink))
        .with_tick(config.tick);
    if let Some(seed) = config.shuffle_seed {
        service = service.with_shuffler(Arc::new(SeededShuffler::new(seed)));
    }

    let (mut player, mut events) = QuizPlayer::new(service);
    let outcome = play::run(&mut player, &mut events, quiz_id).await;

    // The writer stops once every sink handle is gone.
    drop(player);
    drop(events);
    let written = writer.await?;
    tracing::info!(written, "results saved");
    outcome
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" || db_url.starts_with("sqlite:file:") {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
