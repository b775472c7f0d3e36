//! Poller configuration: a TOML file in the OS config directory, with an
//! env-var override for the path.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollerConfig {
    pub bridge: BridgeConfig,
    pub poll: PollConfig,
    pub retry: RetryConfig,
}

/// Bridge endpoint and the fixed transport timeouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub url: String,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollConfig {
    pub interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_secs: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            bridge: BridgeConfig {
                url: "http://127.0.0.1:8778/jolokia".to_string(),
                connect_timeout_secs: 30,
                read_timeout_secs: 30,
            },
            poll: PollConfig { interval_secs: 30 },
            retry: RetryConfig {
                max_attempts: 3,
                delay_secs: 5,
            },
        }
    }
}

impl PollerConfig {
    /// Load config from disk, falling back to defaults when no file exists
    /// yet.
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        if config_path.exists() {
            let content = tokio::fs::read_to_string(&config_path).await?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// `BEANPOLL_CONFIG` overrides the OS-specific default location.
    pub fn config_file_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("BEANPOLL_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        path.push("beanpoll");
        path.push("config.toml");
        Ok(path)
    }
}
