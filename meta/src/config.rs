//! Configuration for metadata queries.
//!
//! Resolution order for [`Config::load`]:
//! 1. `ROUNDUP_CONFIG` environment variable (path to a TOML file)
//! 2. `config.toml` in the platform config directory (via `directories`)
//! 3. Built-in defaults
//!
//! `ROUNDUP_METADATA_URL` then overrides the metadata URL from whichever
//! source was used.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_VAR: &str = "ROUNDUP_CONFIG";

/// Environment variable overriding the metadata base URL.
pub const METADATA_URL_VAR: &str = "ROUNDUP_METADATA_URL";

/// Host the metadata service answers on inside a Rancher environment.
pub const DEFAULT_HOSTNAME: &str = "rancher-metadata";

/// Roundup configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the metadata service, ending with `/`.
    #[serde(default = "default_metadata_url")]
    pub metadata_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_metadata_url() -> String {
    url_for_host(DEFAULT_HOSTNAME)
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("roundup/{}", env!("CARGO_PKG_VERSION"))
}

/// Base URL of the `latest` metadata API on a host.
pub fn url_for_host(host: &str) -> String {
    format!("http://{}/latest/", host)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metadata_url: default_metadata_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Create a config pointing at an explicit base URL.
    pub fn with_url(metadata_url: impl Into<String>) -> Self {
        Self {
            metadata_url: normalize_base_url(metadata_url.into()),
            ..Self::default()
        }
    }

    /// Create a config pointing at the `latest` API of a metadata host.
    pub fn with_hostname(host: &str) -> Self {
        Self::with_url(url_for_host(host))
    }

    /// Load config using the standard resolution order.
    pub fn load() -> Result<Self> {
        let mut config = match resolve_config_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };

        if let Ok(url) = std::env::var(METADATA_URL_VAR) {
            if !url.is_empty() {
                config.metadata_url = url;
            }
        }

        config.metadata_url = normalize_base_url(std::mem::take(&mut config.metadata_url));
        Ok(config)
    }

    /// Load config from a TOML file, falling back to defaults when the file
    /// does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.metadata_url = normalize_base_url(config.metadata_url);
        if config.timeout_secs == 0 {
            return Err(Error::Config(format!(
                "{}: timeout_secs must be at least 1",
                path.display()
            )));
        }
        Ok(config)
    }

    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full URL for a path relative to the metadata base URL.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.metadata_url, path.trim_start_matches('/'))
    }
}

/// Ensure the base URL ends with exactly one `/` so relative paths can be
/// appended directly.
fn normalize_base_url(mut url: String) -> String {
    let trimmed = url.trim_end_matches('/').len();
    url.truncate(trimmed);
    url.push('/');
    url
}

/// Path of the config file to load, if any.
fn resolve_config_path() -> Option<PathBuf> {
    // 1. Environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
        return Some(PathBuf::from(path));
    }

    // 2. Platform config directory
    ProjectDirs::from("", "", "roundup").map(|dirs| dirs.config_dir().join("config.toml"))
}
