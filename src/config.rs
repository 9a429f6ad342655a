//! Configuration Management
//!
//! Loads the pvectl configuration file. Values are layered
//! as CLI flags > environment (`PVE_*`) > config file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Request timeout when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// API endpoint, e.g. `https://pve1.lan:8006`
    #[serde(default)]
    pub host: Option<String>,
    /// API token id, e.g. `root@pam!pvectl`
    #[serde(default)]
    pub token_id: Option<String>,
    /// API token secret
    #[serde(default)]
    pub token_secret: Option<String>,
    /// Accept self-signed certificates
    #[serde(default)]
    pub insecure: bool,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pvectl").join("config.json"))
    }

    /// Load configuration from disk, then apply environment overrides
    pub fn load() -> Self {
        let mut config = Self::config_path()
            .filter(|path| path.exists())
            .and_then(|path| std::fs::read_to_string(path).ok())
            .map(|content| Self::from_json(&content))
            .unwrap_or_default();

        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Parse a config file body; malformed content yields the defaults
    pub fn from_json(content: &str) -> Self {
        serde_json::from_str(content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed config file: {}", e);
            Self::default()
        })
    }

    /// Override fields from `PVE_HOST`, `PVE_TOKEN_ID` and `PVE_TOKEN_SECRET`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(host) = non_empty("PVE_HOST") {
            self.host = Some(host);
        }
        if let Some(id) = non_empty("PVE_TOKEN_ID") {
            self.token_id = Some(id);
        }
        if let Some(secret) = non_empty("PVE_TOKEN_SECRET") {
            self.token_secret = Some(secret);
        }
    }

    pub fn effective_host(&self) -> Option<String> {
        self.host.clone().filter(|h| !h.is_empty())
    }

    /// `id=secret` as expected after `PVEAPIToken=`; `None` unless both are set
    pub fn effective_api_token(&self) -> Option<String> {
        match (&self.token_id, &self.token_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some(format!("{}={}", id, secret))
            }
            _ => None,
        }
    }

    pub fn effective_timeout_secs(&self) -> u64 {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
    }
}
