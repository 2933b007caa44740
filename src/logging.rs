use anyhow::{anyhow, Context};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;

use crate::config::ExtractionConfig;

/// Picks the log level: `-q` wins, then `-v`, then the configured level.
/// Unknown configured levels fall back to `warn`.
pub fn resolve_level(quiet: bool, verbose: bool, configured: &str) -> Level {
    if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        configured.trim().parse().unwrap_or(Level::WARN)
    }
}

/// `<home>/.pdf_extractor/logs/pdf_extractor.log`
pub fn default_log_file() -> Option<PathBuf> {
    dirs::home_dir().map(|home| {
        home.join(".pdf_extractor")
            .join("logs")
            .join("pdf_extractor.log")
    })
}

/// Where log lines go when file logging is enabled.
pub fn log_file_for(config: &ExtractionConfig) -> Option<PathBuf> {
    if !config.log_to_file {
        return None;
    }
    config.log_file_path.clone().or_else(default_log_file)
}

/// Installs the global subscriber. Logs go to stderr (stdout carries results
/// and JSON-RPC), or to `log_file` in append mode without ANSI colors.
pub fn init(level: Level, log_file: Option<&Path>) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt().with_max_level(level);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| anyhow!("failed to install logger: {}", e))
        }
        None => builder
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow!("failed to install logger: {}", e)),
    }
}
