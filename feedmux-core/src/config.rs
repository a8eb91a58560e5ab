//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/feedmux/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/feedmux/` (~/.config/feedmux/)
//! - State/Logs: `$XDG_STATE_HOME/feedmux/` (~/.local/state/feedmux/)

use crate::autocomplete::{Suggester, DEFAULT_MAX_SUGGESTIONS, DEFAULT_TRIGGER};
use crate::combo::MIN_COMBO_RUN;
use crate::error::{Error, Result};
use crate::types::DisplayMode;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Feed capacity and ordering
    #[serde(default)]
    pub feed: FeedConfig,

    /// Autocomplete behaviour
    #[serde(default)]
    pub autocomplete: AutocompleteConfig,

    /// Ingest filters
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Feed buffer configuration
#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    /// Records kept while the reader is at the bottom
    #[serde(default = "default_soft_cap")]
    pub soft_cap: usize,

    /// Records kept while the reader has scrolled up
    #[serde(default = "default_hard_cap")]
    pub hard_cap: usize,

    /// Display ordering
    #[serde(default)]
    pub display_mode: DisplayMode,

    /// Shortest emote run shown as a combo (only 2 is supported)
    #[serde(default = "default_combo_min_run")]
    pub combo_min_run: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            soft_cap: default_soft_cap(),
            hard_cap: default_hard_cap(),
            display_mode: DisplayMode::default(),
            combo_min_run: default_combo_min_run(),
        }
    }
}

fn default_soft_cap() -> usize {
    150
}

fn default_hard_cap() -> usize {
    500
}

fn default_combo_min_run() -> usize {
    MIN_COMBO_RUN
}

/// Autocomplete configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AutocompleteConfig {
    /// Character that switches completion to nicks
    #[serde(default = "default_trigger")]
    pub trigger: char,

    /// Maximum number of suggestions
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    /// Delay before recomputing suggestions after a keystroke
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for AutocompleteConfig {
    fn default() -> Self {
        Self {
            trigger: default_trigger(),
            max_suggestions: default_max_suggestions(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl AutocompleteConfig {
    pub fn suggester(&self) -> Suggester {
        Suggester::new(self.trigger, self.max_suggestions)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_trigger() -> char {
    DEFAULT_TRIGGER
}

fn default_max_suggestions() -> usize {
    DEFAULT_MAX_SUGGESTIONS
}

fn default_debounce_ms() -> u64 {
    150
}

/// Ingest filter configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct IngestConfig {
    /// Authors whose records never reach the feed (case-insensitive)
    #[serde(default)]
    pub ignored_authors: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.feed.soft_cap == 0 {
            return Err(Error::Config(
                "feed.soft_cap must be at least 1".to_string(),
            ));
        }
        if self.feed.hard_cap < self.feed.soft_cap {
            return Err(Error::Config(format!(
                "feed.hard_cap ({}) must not be below feed.soft_cap ({})",
                self.feed.hard_cap, self.feed.soft_cap
            )));
        }
        if self.feed.combo_min_run != MIN_COMBO_RUN {
            return Err(Error::Config(format!(
                "feed.combo_min_run is fixed at {}",
                MIN_COMBO_RUN
            )));
        }
        if self.autocomplete.max_suggestions == 0 {
            return Err(Error::Config(
                "autocomplete.max_suggestions must be at least 1".to_string(),
            ));
        }
        if self.autocomplete.trigger.is_whitespace() {
            return Err(Error::Config(
                "autocomplete.trigger must not be whitespace".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/feedmux/config.toml` (~/.config/feedmux/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("feedmux").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/feedmux/` (~/.local/state/feedmux/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("feedmux")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// Called by the CLI before anything reads these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.feed.soft_cap, 150);
        assert_eq!(config.feed.hard_cap, 500);
        assert_eq!(config.feed.display_mode, DisplayMode::ByArrival);
        assert_eq!(config.autocomplete.trigger, '@');
        assert_eq!(config.autocomplete.max_suggestions, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[feed]
soft_cap = 50
hard_cap = 300
display_mode = "by_timestamp"

[autocomplete]
trigger = "+"
max_suggestions = 5

[ingest]
ignored_authors = ["SpamBot", "another"]

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.feed.soft_cap, 50);
        assert_eq!(config.feed.display_mode, DisplayMode::ByTimestamp);
        assert_eq!(config.autocomplete.trigger, '+');
        assert_eq!(config.autocomplete.debounce_ms, 150);
        assert_eq!(config.ingest.ignored_authors.len(), 2);
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_caps() {
        let mut config = Config::default();
        config.feed.hard_cap = 10;
        config.feed.soft_cap = 20;
        assert!(config.validate().is_err());

        config.feed.soft_cap = 0;
        config.feed.hard_cap = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.feed.combo_min_run = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[feed]\nsoft_cap = 7\nhard_cap = 9").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.feed.soft_cap, 7);
        assert_eq!(config.feed.hard_cap, 9);
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[autocomplete]\nmax_suggestions = 0").unwrap();
        assert!(matches!(
            Config::load_from(file.path()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_paths_under_feedmux_dirs() {
        assert!(Config::config_path().ends_with("feedmux/config.toml"));
        assert!(Config::state_dir().ends_with("feedmux"));
    }
}
