//! File logging for the TUI process.
//!
//! The terminal belongs to ratatui while planrev runs, so log records go to
//! `$XDG_STATE_HOME/planrev/planrev.log` through a non-blocking writer. The
//! filter comes from `PLANREV_LOG` and defaults to `warn`.

use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const FILTER_ENV: &str = "PLANREV_LOG";

/// Directory holding the log file.
fn state_dir() -> Option<PathBuf> {
    std::env::var("XDG_STATE_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".local").join("state"))
        })
        .map(|base| base.join("planrev"))
}

/// Installs the global subscriber.
///
/// Returns the writer guard, which must live until the process exits so
/// buffered records are flushed. Returns `None` and leaves logging disabled
/// when the log file cannot be opened.
pub fn init() -> Option<WorkerGuard> {
    let dir = state_dir()?;
    std::fs::create_dir_all(&dir).ok()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("planrev.log"))
        .ok()?;

    let (writer, guard) = tracing_appender::non_blocking(file);
    let filter = EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .ok()?;

    Some(guard)
}
