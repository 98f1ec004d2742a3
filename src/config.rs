use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::availability::{BatchOptions, DEFAULT_MAX_CONCURRENT_PROBES};
use crate::booking::schedule::SlotSchedule;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub backend: BackendConfig,
  #[serde(default)]
  pub availability: AvailabilityConfig,
  #[serde(default)]
  pub schedule: SlotSchedule,
  #[serde(default)]
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
  /// Base URL of the booking REST API (e.g. "https://booking.example.com/api/v1")
  pub url: String,
  /// Request timeout in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityConfig {
  /// Party size used when probing the week grid
  #[serde(default = "default_party_size")]
  pub party_size: u32,
  #[serde(default = "default_max_concurrent_probes")]
  pub max_concurrent_probes: usize,
  /// Auto refresh period; 0 disables auto refresh
  #[serde(default = "default_refresh_interval_secs")]
  pub refresh_interval_secs: u64,
  /// Quiet interval before a typed-in slot is checked
  #[serde(default = "default_debounce_ms")]
  pub debounce_ms: u64,
  /// Days shown at once in the board
  #[serde(default = "default_visible_days")]
  pub visible_days: usize,
}

impl Default for AvailabilityConfig {
  fn default() -> Self {
    Self {
      party_size: default_party_size(),
      max_concurrent_probes: default_max_concurrent_probes(),
      refresh_interval_secs: default_refresh_interval_secs(),
      debounce_ms: default_debounce_ms(),
      visible_days: default_visible_days(),
    }
  }
}

impl AvailabilityConfig {
  pub fn refresh_interval(&self) -> Duration {
    Duration::from_secs(self.refresh_interval_secs)
  }

  pub fn debounce(&self) -> Duration {
    Duration::from_millis(self.debounce_ms)
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
  /// Default filter directive, overridden by PARTYSLOTS_LOG
  pub level: Option<String>,
  /// Directory for the board's log files
  pub directory: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
  20
}

fn default_party_size() -> u32 {
  10
}

fn default_max_concurrent_probes() -> usize {
  DEFAULT_MAX_CONCURRENT_PROBES
}

fn default_refresh_interval_secs() -> u64 {
  300
}

fn default_debounce_ms() -> u64 {
  600
}

fn default_visible_days() -> usize {
  7
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./partyslots.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/partyslots/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/partyslots/config.yaml\n\
                 See partyslots.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("partyslots.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("partyslots").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Invalid config file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config =
      serde_yaml::from_str(contents).map_err(|e| eyre!("Failed to parse config: {}", e))?;
    config.validate()?;
    Ok(config)
  }

  fn validate(&self) -> Result<()> {
    url::Url::parse(&self.backend.url)
      .map_err(|e| eyre!("backend.url '{}' is not a valid URL: {}", self.backend.url, e))?;

    let availability = &self.availability;
    if availability.party_size == 0 {
      return Err(eyre!("availability.party_size must be at least 1"));
    }
    if availability.max_concurrent_probes == 0 {
      return Err(eyre!("availability.max_concurrent_probes must be at least 1"));
    }
    if availability.visible_days == 0 {
      return Err(eyre!("availability.visible_days must be at least 1"));
    }
    if self.schedule.weekday.is_empty() && self.schedule.weekend.is_empty() {
      return Err(eyre!("schedule must define at least one slot"));
    }
    Ok(())
  }

  /// Probe settings for the batch coordinator
  pub fn batch_options(&self) -> BatchOptions {
    BatchOptions {
      party_size: self.availability.party_size,
      max_concurrent: self.availability.max_concurrent_probes,
      schedule: self.schedule.clone(),
    }
  }

  /// Get the booking API token from environment variables.
  ///
  /// Checks PARTYSLOTS_API_TOKEN first, then BOOKING_API_TOKEN as fallback.
  /// The token is optional: backends without auth accept anonymous reads.
  pub fn get_api_token() -> Option<String> {
    std::env::var("PARTYSLOTS_API_TOKEN")
      .or_else(|_| std::env::var("BOOKING_API_TOKEN"))
      .ok()
      .filter(|t| !t.trim().is_empty())
  }
}
