pub mod types;
pub mod error;
pub mod config;
pub mod ledger;
pub mod ranking;
pub mod pairing;
pub mod friendly;
pub mod reorder;
pub mod lifecycle;
pub mod store;
pub mod commands;

pub use commands::TournamentSession;
pub use config::TournamentConfig;
pub use error::{Refusal, TournamentError};
pub use ledger::Ledger;
pub use types::*;

use std::{fs, path::Path};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Route `tracing` output to a daily `tournament.log` under `logs_dir`.
///
/// Keep the returned guard alive for as long as logs should be flushed.
/// Calling this twice leaves the first subscriber in place.
pub fn init_logging(logs_dir: &Path) -> WorkerGuard {
    fs::create_dir_all(logs_dir).ok();
    let file_appender = tracing_appender::rolling::daily(logs_dir, "tournament.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .try_init();
    if installed.is_ok() {
        info!("Swiss rounds engine logging to {}", logs_dir.display());
    }
    guard
}

/// Load `.env`, start logging under the crate's `logs/` directory and open the
/// tournament stored in the data directory.
pub fn start() -> Result<(SharedSession, WorkerGuard), String> {
    config::load_env_file();
    let guard = init_logging(&config::logs_dir());
    let session = TournamentSession::open_default().map_err(|e| e.to_string())?;
    Ok((commands::shared(session), guard))
}
