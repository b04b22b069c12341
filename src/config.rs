//! Configuration loading for todosync.
//!
//! Settings come from three layers, later layers winning:
//! built-in defaults → `config.toml` (explicit `--config` path or the
//! platform config directory) → CLI flags.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";
const DEFAULT_APP_ID: &str = "todo";

/// Default list refresh interval in milliseconds.
const DEFAULT_REFRESH_INTERVAL_MS: u64 = 1000;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub backend: BackendConfig,
    pub refresh: RefreshConfig,
}

/// Connection settings for the hosted backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BackendConfig {
    /// Base URL of the backend (e.g. `https://baas.example.com`).
    pub base_url: String,
    /// Application id registered with the backend.
    pub app_id: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.into(),
            app_id: DEFAULT_APP_ID.into(),
        }
    }
}

/// Polling refresher settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RefreshConfig {
    /// Delay between one fetch completing and the next starting.
    pub interval_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Config {
    /// Load configuration from `path`, or from the platform config
    /// directory when no path is given. A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path(),
        };

        let config = match path {
            Some(p) if p.exists() => {
                let raw = std::fs::read_to_string(&p)
                    .with_context(|| format!("failed to read config at {}", p.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("failed to parse config at {}", p.display()))?
            }
            _ => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Platform config file location (`<config dir>/todosync/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "todosync")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Reject values that cannot produce a working client.
    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            bail!("backend.base_url cannot be empty");
        }
        if self.backend.app_id.trim().is_empty() {
            bail!("backend.app_id cannot be empty");
        }
        if self.refresh.interval_ms == 0 {
            // A zero-delay poll loop would spin against the backend.
            bail!("refresh.interval_ms must be at least 1");
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────
