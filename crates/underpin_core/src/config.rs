//! Runtime configuration for logging and the severity logger.
//!
//! # Responsibility
//! - Provide build-mode aware defaults.
//! - Load overrides from JSON or `UNDERPIN_*` environment variables.
//!
//! # Invariants
//! - A loaded config is always validated before it is returned.

use crate::error::{CoreError, CoreResult};
use crate::logging::{default_log_level, normalize_level};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_LOG_LEVEL: &str = "UNDERPIN_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "UNDERPIN_LOG_DIR";
pub const ENV_MAX_VOLUME: &str = "UNDERPIN_MAX_VOLUME";
pub const ENV_CHANNEL_CAPACITY: &str = "UNDERPIN_CHANNEL_CAPACITY";

const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// `log` facade bootstrap settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Rotating log files go here; `None` logs to stderr.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

/// Severity logger settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Channels with a higher volume never record.
    pub max_volume: u8,
    /// Per-channel retention; `None` keeps everything.
    pub channel_capacity: Option<usize>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            max_volume: default_max_volume(),
            channel_capacity: Some(DEFAULT_CHANNEL_CAPACITY),
        }
    }
}

/// Returns the default volume threshold for the current build mode.
///
/// - `debug` builds admit every default channel.
/// - `release` builds drop the `debug` channel.
pub fn default_max_volume() -> u8 {
    if cfg!(debug_assertions) {
        8
    } else {
        7
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub logging: LoggingConfig,
    pub logger: LoggerConfig,
}

impl CoreConfig {
    pub fn from_json(raw: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|err| CoreError::validation_failed("config", err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `UNDERPIN_*`
    /// names.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        let mut config = Self::default();
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            config.logging.level = level;
        }
        if let Some(dir) = lookup(ENV_LOG_DIR).filter(|dir| !dir.trim().is_empty()) {
            config.logging.log_dir = Some(PathBuf::from(dir.trim()));
        }
        if let Some(volume) = lookup(ENV_MAX_VOLUME) {
            config.logger.max_volume = volume.trim().parse().map_err(|_| {
                CoreError::validation_failed(ENV_MAX_VOLUME, format!("`{volume}` is not 0-255"))
            })?;
        }
        if let Some(capacity) = lookup(ENV_CHANNEL_CAPACITY) {
            config.logger.channel_capacity = parse_capacity(&capacity)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        normalize_level(&self.logging.level)?;
        if let Some(dir) = &self.logging.log_dir {
            if !dir.is_absolute() {
                return Err(CoreError::validation_failed(
                    "logging.log_dir",
                    format!("must be an absolute path, got `{}`", dir.display()),
                ));
            }
        }
        if self.logger.channel_capacity == Some(0) {
            return Err(CoreError::validation_failed(
                "logger.channel_capacity",
                "must be positive; omit it for unbounded channels",
            ));
        }
        Ok(())
    }
}

fn parse_capacity(raw: &str) -> CoreResult<Option<usize>> {
    match raw.trim() {
        "" | "none" | "unbounded" => Ok(None),
        value => value.parse().map(Some).map_err(|_| {
            CoreError::validation_failed(ENV_CHANNEL_CAPACITY, format!("`{value}` is not a count"))
        }),
    }
}
