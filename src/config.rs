//! Configuration loader and validator for the guild bot.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::model::{ChannelId, GuildId, RoleId};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub site: Site,
    pub guild: Guild,
    pub reminders: Reminders,
    pub pagination: Pagination,
}

/// Companion site API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Site {
    pub base_url: String,
    pub api_key: String,
}

/// Guild-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Guild {
    pub id: GuildId,
    pub staff_roles: Vec<RoleId>,
}

/// Reminder policy settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reminders {
    pub max_per_user: usize,
    pub whitelisted_channels: Vec<ChannelId>,
}

/// Interactive pagination settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub timeout_seconds: u64,
    pub max_size: usize,
    pub max_lines: Option<usize>,
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.site.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("site.base_url must be non-empty"));
    }
    if reqwest::Url::parse(&cfg.site.base_url).is_err() {
        return Err(ConfigError::Invalid("site.base_url must be a valid URL"));
    }
    if cfg.site.api_key.trim().is_empty() {
        return Err(ConfigError::Invalid("site.api_key must be non-empty"));
    }

    if cfg.guild.id == 0 {
        return Err(ConfigError::Invalid("guild.id must be non-zero"));
    }

    if cfg.reminders.max_per_user == 0 {
        return Err(ConfigError::Invalid("reminders.max_per_user must be > 0"));
    }

    if cfg.pagination.timeout_seconds == 0 {
        return Err(ConfigError::Invalid(
            "pagination.timeout_seconds must be > 0",
        ));
    }
    if cfg.pagination.max_size == 0 {
        return Err(ConfigError::Invalid("pagination.max_size must be > 0"));
    }
    if cfg.pagination.max_lines == Some(0) {
        return Err(ConfigError::Invalid(
            "pagination.max_lines must be > 0 when set",
        ));
    }

    Ok(())
}

/// Example YAML configuration, also used as a fixture by tests.
pub fn example() -> &'static str {
    r#"site:
  base_url: "https://api.example.org/"
  api_key: "YOUR_SITE_API_KEY"

guild:
  id: 267624335836053506
  staff_roles:
    - 267628507062992896
    - 267629731250176001

reminders:
  max_per_user: 5
  whitelisted_channels:
    - 267659945086812160

pagination:
  timeout_seconds: 300
  max_size: 500
  max_lines: 3
"#
}
