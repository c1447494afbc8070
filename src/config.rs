//! Configuration loading.
//!
//! Folio reads a single `config.toml` (default `~/.folio/config.toml`). Every
//! section and field has a default, so a missing file or an empty one yields a
//! working configuration. Secrets are never stored in the file: the OpenAI
//! key is read from the environment variable named by `openai.api_key_env`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::p13n::cache::DEFAULT_PREFIX;
use crate::providers::openai::{DEFAULT_MODEL, OPENAI_API_BASE};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Persona rewriting and its cache.
    #[serde(default)]
    pub p13n: P13nConfig,

    /// OpenAI access for rewrites.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Chat endpoint limits.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Analytics endpoint screening.
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

/// Persona rewriting settings.
#[derive(Debug, Deserialize)]
pub struct P13nConfig {
    /// Whether rewrites may be requested at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Namespace prefix for cache keys.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// SQLite file backing the cache. Defaults to `p13n.db` in [`config_dir`].
    #[serde(default)]
    pub database: Option<PathBuf>,
}

impl P13nConfig {
    /// Configured database path, or the default under [`config_dir`].
    ///
    /// # Errors
    ///
    /// Returns an error if no path is configured and the home directory
    /// cannot be determined.
    pub fn database_path(&self) -> anyhow::Result<PathBuf> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => Ok(config_dir()?.join("p13n.db")),
        }
    }
}

impl Default for P13nConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            cache_prefix: default_cache_prefix(),
            database: None,
        }
    }
}

/// OpenAI client settings.
#[derive(Debug, Deserialize)]
pub struct OpenAiConfig {
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Chat completions endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl OpenAiConfig {
    /// API key from the configured environment variable, if set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            model: default_model(),
            base_url: default_base_url(),
        }
    }
}

/// Chat rate limit settings.
#[derive(Debug, Deserialize)]
pub struct ChatConfig {
    /// Requests allowed per client per window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds.
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_seconds: default_window_seconds(),
        }
    }
}

/// Analytics event screening settings.
#[derive(Debug, Deserialize)]
pub struct AnalyticsConfig {
    /// Events accepted per client in any sliding minute.
    #[serde(default = "default_max_events_per_minute")]
    pub max_events_per_minute: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            max_events_per_minute: default_max_events_per_minute(),
        }
    }
}

// Default value functions for serde

fn default_true() -> bool {
    true
}
fn default_cache_prefix() -> String {
    DEFAULT_PREFIX.to_owned()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_owned()
}
fn default_model() -> String {
    DEFAULT_MODEL.to_owned()
}
fn default_base_url() -> String {
    OPENAI_API_BASE.to_owned()
}
fn default_max_requests() -> u32 {
    20
}
fn default_window_seconds() -> u64 {
    900
}
fn default_max_events_per_minute() -> u32 {
    60
}

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config at {}: {e}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config at {}: {e}", path.display()))?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_or_default(path: &Path) -> anyhow::Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}

/// Resolve the default config directory (`~/.folio/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".folio"))
}
