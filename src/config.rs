use anyhow::Context;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/cerebro-guard.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the analysis service; requests go to `<service_url>/analyze`.
    #[serde(default = "default_service_url")]
    pub service_url: String,
    #[serde(default)]
    pub animation: AnimationConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

fn default_service_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_tick_millis() -> u64 {
    15
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            service_url: default_service_url(),
            animation: AnimationConfig::default(),
            logging: Some(LoggingConfig {
                level: "info".to_string(),
            }),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {path}"))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {path}"))?;
        Ok(config)
    }

    /// Load `path`, falling back to defaults when the default location does
    /// not exist. An explicitly chosen file must be readable.
    pub fn load(path: &str, explicit: bool) -> anyhow::Result<Self> {
        if !explicit && !Path::new(path).exists() {
            log::debug!("No configuration at {path}, using defaults");
            return Ok(Config::default());
        }
        Self::from_file(path)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {path}"))?;
        Ok(())
    }

    pub fn animation_tick(&self) -> Duration {
        Duration::from_millis(self.animation.tick_millis)
    }

    pub fn log_level(&self) -> Option<LevelFilter> {
        self.logging
            .as_ref()
            .and_then(|logging| logging.level.parse().ok())
    }
}
