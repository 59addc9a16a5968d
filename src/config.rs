//! Configuration management for showdeck
//!
//! Handles config file loading/saving and the API token.
//! Config is stored at ~/.config/showdeck/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::tvmaze::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::net::handler::DEFAULT_RETRY_DELAY;
use crate::views::{GenreBucketOptions, DEFAULT_DEBOUNCE};

/// Environment variable checked before the config file for the API token
pub const TOKEN_ENV: &str = "TVMAZE_API_TOKEN";

/// Application configuration. Every field is optional; accessors fill in
/// the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API base URL (default https://api.tvmaze.com)
    pub base_url: Option<String>,
    /// Bearer token sent with every request
    pub api_token: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Extra attempts after a retryable failure
    pub retry: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    /// Quiet period before a search runs
    pub debounce_ms: Option<u64>,
    /// Index pages scanned by the genre and top-rated views
    pub pages_to_scan: Option<u32>,
    pub per_genre_limit: Option<usize>,
    pub min_rating: Option<f64>,
}

impl Config {
    /// Get config file path (~/.config/showdeck/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("showdeck").join("config.toml"))
    }

    /// Load config from the default path, or return default if not found
    pub fn load() -> Self {
        Self::path().map(|p| Self::load_from(&p)).unwrap_or_default()
    }

    /// Load config from `path`. A missing or unreadable file yields the defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(text) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match toml::from_str(&text) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                Self::default()
            }
        }
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// API token with fallback chain:
    /// 1. Environment variable TVMAZE_API_TOKEN
    /// 2. Token from config file
    pub fn api_token(&self) -> Option<String> {
        std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.api_token.clone())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn retry(&self) -> u32 {
        self.retry.unwrap_or(0)
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_RETRY_DELAY)
    }

    pub fn debounce(&self) -> Duration {
        self.debounce_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_DEBOUNCE)
    }

    pub fn genre_options(&self) -> GenreBucketOptions {
        let defaults = GenreBucketOptions::default();
        GenreBucketOptions {
            pages_to_scan: self.pages_to_scan.unwrap_or(defaults.pages_to_scan),
            per_genre_limit: self.per_genre_limit.unwrap_or(defaults.per_genre_limit),
            min_rating: self.min_rating.unwrap_or(defaults.min_rating),
        }
    }
}
