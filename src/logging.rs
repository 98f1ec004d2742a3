//! Tracing setup for the board (file) and the one-shot subcommands (stderr).

use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Environment variable that overrides the configured filter
pub const LOG_ENV: &str = "PARTYSLOTS_LOG";

const DEFAULT_LEVEL: &str = "info";
const LOG_FILE_PREFIX: &str = "partyslots.log";

fn env_filter(config: &LoggingConfig) -> EnvFilter {
  EnvFilter::try_from_env(LOG_ENV)
    .unwrap_or_else(|_| EnvFilter::new(config.level.as_deref().unwrap_or(DEFAULT_LEVEL)))
}

/// Directory for the board's daily log files
pub fn log_directory(config: &LoggingConfig) -> PathBuf {
  config
    .directory
    .clone()
    .or_else(|| dirs::data_dir().map(|d| d.join("partyslots").join("logs")))
    .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Log to a daily-rolling file; the terminal belongs to the UI.
///
/// Keep the returned guard alive until exit or buffered lines are lost.
pub fn init_file(config: &LoggingConfig) -> Result<WorkerGuard> {
  let directory = log_directory(config);
  std::fs::create_dir_all(&directory)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", directory.display(), e))?;

  let appender = tracing_appender::rolling::daily(&directory, LOG_FILE_PREFIX);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::registry()
    .with(env_filter(config))
    .with(fmt::layer().with_ansi(false).with_writer(writer))
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}

/// Log to stderr, leaving stdout for command output
pub fn init_stderr(config: &LoggingConfig) -> Result<()> {
  tracing_subscriber::registry()
    .with(env_filter(config))
    .with(fmt::layer().with_writer(std::io::stderr))
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_explicit_log_directory_wins() {
    let config = LoggingConfig {
      level: None,
      directory: Some(PathBuf::from("/var/log/partyslots")),
    };
    assert_eq!(log_directory(&config), PathBuf::from("/var/log/partyslots"));
  }

  #[test]
  fn test_default_log_directory_is_per_app() {
    let dir = log_directory(&LoggingConfig::default());
    assert!(dir.ends_with("logs"));
  }
}
