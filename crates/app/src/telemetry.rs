use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::DEFAULT_LOG_FILTER;

/// Install a stderr `fmt` subscriber filtered by `directives`.
///
/// Malformed directives fall back to the default filter so a typo in
/// `QUIZ_LOG` never keeps the app from starting.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(directives: &str) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_new(directives).unwrap_or_else(|err| {
        eprintln!("ignoring log filter {directives:?}: {err}");
        EnvFilter::new(DEFAULT_LOG_FILTER)
    });

    Registry::default()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()?;
    Ok(())
}
