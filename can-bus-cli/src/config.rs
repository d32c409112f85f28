//! Configuration loading and parsing

use anyhow::{Context, Result};
use can_bus_decoder::ReaderConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub reader: ReaderConfig,
    #[serde(default)]
    pub publish: PublishConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublishConfig {
    /// Snapshot polling interval in milliseconds
    #[serde(default = "default_interval")]
    pub interval_ms: u64,
    #[serde(default)]
    pub format: OutputFormat,
    /// Skip signals older than this; publish everything known when unset
    pub max_age_ms: Option<u64>,
}

fn default_interval() -> u64 {
    100
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval(),
            format: OutputFormat::default(),
            max_age_ms: None,
        }
    }
}

impl PublishConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn max_age(&self) -> Option<Duration> {
        self.max_age_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if config.publish.interval_ms == 0 {
        anyhow::bail!("publish.interval_ms must be greater than zero in {:?}", path);
    }

    Ok(config)
}
