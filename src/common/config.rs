//! # Configuration Utilities
//!
//! TOML configuration for the client, with the service base URL overridable
//! from the environment.
//!
//! # Example TOML
//!
//! ```toml
//! [service]
//! base_url = "http://localhost:5000"
//! request_timeout_secs = 60
//! health_timeout_secs = 5
//!
//! [output]
//! download_dir = "downloads"
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable that overrides `service.base_url`.
pub const API_URL_ENV: &str = "STEGO_API_URL";

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Load a TOML configuration file and deserialize it into the specified type.
///
/// # Example
/// ```ignore
/// let config: ClientConfig = load_config("config/client.toml")?;
/// ```
pub fn load_config<T>(path: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where the steganography service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL without trailing slash (e.g., "http://localhost:5000")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Upper bound for a hide/extract round trip (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Upper bound for the health probe (seconds)
    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory stego images are saved into
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_health_timeout() -> u64 {
    5
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            health_timeout_secs: default_health_timeout(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
        }
    }
}

impl ClientConfig {
    /// Loads client configuration from a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        load_config(path)
    }

    /// Loads the file when given, falls back to defaults otherwise, then
    /// applies the `STEGO_API_URL` override.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_override(std::env::var(API_URL_ENV).ok()))
    }

    /// Replaces the base URL when an override is present and non-empty.
    pub fn with_env_override(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.service.base_url = url;
        }
        self.service.base_url = self.service.base_url.trim_end_matches('/').to_string();
        self
    }
}

impl ServiceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }
}
