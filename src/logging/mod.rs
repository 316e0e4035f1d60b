// Run logging
//
// Installs the tracing subscriber for the binary. Logs go to stderr, or to a
// per-run file under a log directory when one is configured.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// `data_generation_<timestamp>.log` with spaces, `:` and `-` mapped to `_`
pub fn log_file_name(started_at: DateTime<Local>) -> String {
    sanitize_log_name(&format!(
        "data_generation_{}.log",
        started_at.format("%Y-%m-%d %H:%M:%S%.6f")
    ))
}

pub fn sanitize_log_name(name: &str) -> String {
    name.replace([' ', ':', '-'], "_")
}

/// Install the global subscriber.
///
/// Returns the log file path when logging to a directory.
pub fn init_tracing(log_dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let path = dir.join(log_file_name(Local::now()));
            let file = File::create(&path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;
            Ok(Some(path))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;
            Ok(None)
        }
    }
}
