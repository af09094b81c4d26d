//! Application configuration loaded from file and environment.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::CommunityId;

/// Directory under the user's config dir holding `config.toml`.
pub const CONFIG_DIR: &str = "plantbot";
/// Environment variable prefix, e.g. `PLANTBOT_TICK_INTERVAL_SECS`.
pub const ENV_PREFIX: &str = "PLANTBOT";

const DEFAULT_TICK_SECS: u64 = 30;
const DEFAULT_PREFIX: &str = "$plant";
const CONFIG_HEADER: &str = "# PlantBot configuration\n";

/// Runtime settings for the bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where community snapshots are written.
    pub data_dir: PathBuf,
    /// Seconds between ticks.
    pub tick_interval_secs: u64,
    /// Token that marks a message as a plant command.
    pub command_prefix: String,
    /// Communities to load at startup, before anyone talks to the bot.
    #[serde(default)]
    pub communities: Vec<CommunityId>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            tick_interval_secs: DEFAULT_TICK_SECS,
            command_prefix: DEFAULT_PREFIX.to_string(),
            communities: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Default location of `config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
            .join("config.toml")
    }

    /// Load from the default path, layered over defaults and under `PLANTBOT_*`.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path())
    }

    /// Load from `path` (optional), layered over defaults and under `PLANTBOT_*`.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("data_dir", defaults.data_dir.to_string_lossy().to_string())?
            .set_default("tick_interval_secs", defaults.tick_interval_secs)?
            .set_default("command_prefix", defaults.command_prefix)?
            .set_default("communities", Vec::<String>::new())?
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("communities"),
            )
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;

        let config: Self = settings
            .try_deserialize()
            .context("invalid configuration")?;
        if config.tick_interval_secs == 0 {
            anyhow::bail!("tick_interval_secs must be at least 1");
        }
        Ok(config)
    }

    /// Tick period as a [`Duration`].
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    /// Render as the TOML written by [`ensure_default_config`].
    pub fn to_toml(&self) -> Result<String> {
        let body = toml::to_string_pretty(self).context("failed to encode configuration")?;
        Ok(format!("{CONFIG_HEADER}{body}"))
    }
}

/// Default snapshot directory under the user's data dir.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join("communities")
}

/// Write a default config file at the default path if none exists.
pub fn ensure_default_config() -> Result<PathBuf> {
    ensure_default_config_at(AppConfig::default_path())
}

/// Write a default config file at `path` if none exists.
pub fn ensure_default_config_at(path: impl Into<PathBuf>) -> Result<PathBuf> {
    let path = path.into();
    if path.exists() {
        return Ok(path);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, AppConfig::default().to_toml()?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
