//! Logging setup
//!
//! Stderr logging through `tracing_subscriber` with the usual env-filter
//! override, plus an optional non-rolling file appender in the settings
//! directory for diagnosing helper-tool trouble after the fact.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "devprof.log";

/// Build the stderr filter: `RUST_LOG` wins, otherwise warnings only, or
/// crate-level debug with `--verbose`.
fn stderr_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("devprof=debug")
        } else {
            EnvFilter::new("warn")
        }
    })
}

/// Initialize stderr-only logging.
pub fn init(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(stderr_filter(verbose))
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize stderr logging plus a log file in the settings directory.
/// The returned guard must stay alive for the duration of the process or
/// buffered log lines are dropped.
pub fn init_with_file(verbose: bool, settings_dir: &Path) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(settings_dir)?;
    let appender = tracing_appender::rolling::never(settings_dir, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(stderr_filter(verbose))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();

    Ok(guard)
}
