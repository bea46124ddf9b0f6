// File: ./src/config.rs
// Handles configuration loading, saving, and defaults.
use crate::context::AppContext;
use crate::storage::LocalStorage;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;

/// Address of a locally running development backend. Not a default: an
/// empty `backend_url` keeps the journal local.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5858/api";

fn default_true() -> bool {
    true
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_page_size() -> usize {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    /// Base URL of the backend API. Empty means local storage only.
    #[serde(default)]
    pub backend_url: String,
    /// Conversation session the remote events are keyed by.
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub allow_insecure_certs: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Upper bound on rows fetched by a remote list.
    #[serde(default)]
    pub remote_fetch_limit: Option<u32>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_true")]
    pub seed_demo_events: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            session_id: None,
            allow_insecure_certs: false,
            // Match the serde defaults
            timeout_secs: 10,
            remote_fetch_limit: None,
            page_size: 10,
            seed_demo_events: true,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load the configuration, falling back to defaults when no file exists.
    /// Returns a contextualized error if reading or parsing fails.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;

        Ok(config)
    }

    pub fn save(&self, ctx: &dyn AppContext) -> Result<()> {
        let path = ctx.get_config_file_path()?;
        LocalStorage::with_lock(&path, || {
            let toml_str = toml::to_string_pretty(self)?;
            LocalStorage::atomic_write(&path, toml_str)?;
            Ok(())
        })?;
        Ok(())
    }

    pub fn get_path_string(ctx: &dyn AppContext) -> Result<String> {
        let path = ctx.get_config_file_path()?;
        Ok(path.to_string_lossy().to_string())
    }

    /// The session to use for remote calls, if any. Blank ids count as unset.
    pub fn active_session(&self) -> Option<&str> {
        self.session_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level
            .parse()
            .unwrap_or(log::LevelFilter::Info)
    }
}
