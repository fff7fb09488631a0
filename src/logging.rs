//! Diagnostic logging
//!
//! The TUI owns the terminal, so events go to `~/.querybook/querybook.log`.
//! Nothing is installed unless `QUERYBOOK_LOG` holds a filter directive.

use crate::config;
use crate::error::{ConfigError, ConfigResult};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter, e.g. `querybook=debug`
pub const LOG_ENV: &str = "QUERYBOOK_LOG";

pub fn log_file() -> ConfigResult<PathBuf> {
    Ok(config::config_dir()?.join("querybook.log"))
}

/// Install the file subscriber when `QUERYBOOK_LOG` is set.
/// Returns the log path when logging was enabled.
pub fn init() -> ConfigResult<Option<PathBuf>> {
    let Some(directive) = std::env::var(LOG_ENV).ok().filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    let path = log_file()?;
    init_to(&path, &directive)?;
    Ok(Some(path))
}

/// Append events matching `directive` to `path`
pub fn init_to(path: &Path, directive: &str) -> ConfigResult<()> {
    let filter = EnvFilter::try_new(directive)
        .map_err(|e| ConfigError::Invalid(format!("{}: {}", LOG_ENV, e)))?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| ConfigError::Invalid(format!("logging already initialised: {}", e)))?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "logging started");
    Ok(())
}
