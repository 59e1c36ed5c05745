//! Configuration for Eris.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::errors::ErisError;
use crate::ErisResult;

/// Main configuration for Eris.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Rule storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Feedback settings.
    #[serde(default)]
    pub feedback: FeedbackConfig,

    /// Seed rule settings.
    #[serde(default)]
    pub rules: RulesConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Name the bot answers as in the chat session.
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            bot_name: default_bot_name(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_bot_name() -> String {
    "Eris".to_string()
}

/// Rule storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database path.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".eris/eris.db")
}

/// Feedback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// How long the chat session waits for feedback (in seconds).
    #[serde(default = "default_feedback_timeout")]
    pub timeout_secs: u64,

    /// Ratings strictly below this value flag the rule for revision.
    #[serde(default = "default_low_rating_threshold")]
    pub low_rating_threshold: u8,

    /// Ask for a rating after every reply in the chat session.
    #[serde(default = "default_true")]
    pub prompt_for_rating: bool,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_feedback_timeout(),
            low_rating_threshold: default_low_rating_threshold(),
            prompt_for_rating: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_feedback_timeout() -> u64 {
    60
}

fn default_low_rating_threshold() -> u8 {
    3
}

/// An `(input, output)` pair loaded at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedRule {
    pub input: String,
    pub output: String,
}

/// Seed rule settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Load the built-in rules (and `seed`) every time the store is opened.
    #[serde(default = "default_true")]
    pub seed_on_start: bool,

    /// Extra seed rules, loaded after the built-in ones.
    #[serde(default)]
    pub seed: Vec<SeedRule>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            seed_on_start: true,
            seed: Vec::new(),
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> ErisResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that parse but make no sense.
    pub fn validate(&self) -> ErisResult<()> {
        if !(1..=6).contains(&self.feedback.low_rating_threshold) {
            return Err(ErisError::config(format!(
                "feedback.low_rating_threshold must be between 1 and 6, got {}",
                self.feedback.low_rating_threshold
            )));
        }

        if self.feedback.timeout_secs == 0 {
            return Err(ErisError::config(
                "feedback.timeout_secs must be at least 1",
            ));
        }

        if self.rules.seed.iter().any(|seed| seed.input.is_empty()) {
            return Err(ErisError::config("rules.seed entries need a non-empty input"));
        }

        Ok(())
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> ErisResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Creates default configuration.
    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig::default(),
            storage: StorageConfig::default(),
            feedback: FeedbackConfig::default(),
            rules: RulesConfig::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
