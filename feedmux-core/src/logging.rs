//! File logging
//!
//! One log file per day under `$XDG_STATE_HOME/feedmux/`, named
//! `feedmux.YYYY-MM-DD.log`. Old days beyond `logging.max_files` are pruned
//! by the appender. `RUST_LOG` overrides the configured level.

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const FILE_PREFIX: &str = "feedmux";
const FILE_SUFFIX: &str = "log";

/// Keeps the background writer alive; pending lines are flushed on drop.
#[must_use = "logging stops when the guard is dropped"]
pub struct LoggingGuard {
    _worker: WorkerGuard,
}

/// Start file logging in [`Config::state_dir`].
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    init_in(&Config::state_dir(), config)
}

/// Start file logging in `dir`, creating it if needed.
///
/// If a global subscriber is already installed it stays in place and this
/// call only opens the file.
pub fn init_in(dir: &Path, config: &LoggingConfig) -> Result<LoggingGuard> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(&config.level)?,
    };
    let (writer, worker) = tracing_appender::non_blocking(daily_appender(dir, config.max_files)?);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init()
        .is_ok();

    tracing::info!(dir = %dir.display(), level = %config.level, installed, "Logging started");
    Ok(LoggingGuard { _worker: worker })
}

/// Parse a configured level such as `info` or `warn,feedmux_core=debug`.
fn level_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level)
        .map_err(|e| Error::Config(format!("invalid logging.level {:?}: {}", level, e)))
}

fn daily_appender(dir: &Path, max_files: usize) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(FILE_PREFIX)
        .filename_suffix(FILE_SUFFIX)
        .max_log_files(max_files.max(1))
        .build(dir)
        .map_err(|e| Error::Config(format!("cannot open log in {}: {}", dir.display(), e)))
}

/// Route log output to the test harness. Safe to call more than once.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
