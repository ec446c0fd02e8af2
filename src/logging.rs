//! Tracing subscriber setup.
//!
//! Events go to the console (coloured) and to `<log_dir>/app.log` (plain).
//! `RUST_LOG` overrides the per-environment default filter.

use crate::config::Environment;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE_NAME: &str = "app.log";

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(environment: Environment) -> &'static str {
    if environment.is_production() {
        "info"
    } else {
        "debug,sqlx=info,tower_http=debug"
    }
}

/// Install the global subscriber. Returns the path of the log file.
///
/// # Errors
/// Fails if the log directory or file cannot be created, or if a global
/// subscriber is already installed.
pub fn init_logging(environment: Environment, log_dir: &str) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(log_dir)?;
    let log_path = Path::new(log_dir).join(LOG_FILE_NAME);
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(environment)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .try_init()?;

    Ok(log_path)
}
