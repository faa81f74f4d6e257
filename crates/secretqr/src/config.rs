//! Configuration management for secretqr.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "secretqr";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "messages.db";

/// Hostname used in share URLs when the store has no `domain` entry.
pub const DEFAULT_FALLBACK_DOMAIN: &str = "qr.julianschwab.dev";

/// Config-table key holding the share domain.
pub const DEFAULT_DOMAIN_KEY: &str = "domain";

/// File name of the exported QR image.
pub const DEFAULT_EXPORT_FILE: &str = "qrcode.png";

/// A hostname with an optional port, no scheme and no path.
const HOSTNAME_PATTERN: &str =
    r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*(?::\d{1,5})?$";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `SECRETQR_`, sections split on `__`)
/// 2. TOML config file at `~/.config/secretqr/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store configuration.
    pub store: StoreConfig,
    /// Share URL configuration.
    pub share: ShareConfig,
    /// QR rendering configuration.
    pub qr: QrConfig,
    /// Web server configuration.
    pub server: ServerConfig,
}

/// Which store backend holds the `messages` and `config` tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Local `SQLite` database.
    #[default]
    Sqlite,
    /// Hosted PostgREST-compatible store.
    Rest,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Rest => write!(f, "rest"),
        }
    }
}

/// Store-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend to use.
    pub backend: StoreBackend,
    /// Path to the `SQLite` database file.
    /// Defaults to `~/.local/share/secretqr/messages.db`
    pub database_path: Option<PathBuf>,
    /// Base URL of the hosted store, e.g. `https://project.supabase.co`.
    pub rest_url: Option<String>,
    /// API key sent to the hosted store.
    pub api_key: Option<String>,
    /// Request timeout for the hosted store in seconds.
    pub timeout_secs: u64,
}

/// Share URL configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Hostname used until (or unless) the store supplies one.
    pub fallback_domain: String,
    /// Key of the config entry holding the share domain.
    pub domain_key: String,
}

/// QR rendering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrConfig {
    /// Pixels per QR module in the raster export.
    pub module_px: u32,
    /// White padding added on every side of the exported image.
    pub padding_px: u32,
    /// File name used when exporting the QR image.
    pub export_file: String,
    /// Minimum edge length of the SVG rendering in the web view.
    pub svg_size: u32,
}

/// Web server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the web server binds to.
    pub bind: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            database_path: None, // Resolved to the data dir at runtime
            rest_url: None,
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            fallback_domain: DEFAULT_FALLBACK_DOMAIN.to_string(),
            domain_key: DEFAULT_DOMAIN_KEY.to_string(),
        }
    }
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            module_px: 8,
            padding_px: 32,
            export_file: DEFAULT_EXPORT_FILE.to_string(),
            svg_size: 256,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("SECRETQR_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_hostname(&self.share.fallback_domain) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "fallback_domain must be a bare hostname, got '{}'",
                    self.share.fallback_domain
                ),
            });
        }

        if self.share.domain_key.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "domain_key must not be empty".to_string(),
            });
        }

        if self.qr.module_px == 0 {
            return Err(Error::ConfigValidation {
                message: "module_px must be greater than 0".to_string(),
            });
        }

        if self.qr.padding_px == 0 {
            return Err(Error::ConfigValidation {
                message: "padding_px must be greater than 0".to_string(),
            });
        }

        if !self
            .qr
            .export_file
            .to_ascii_lowercase()
            .ends_with(".png")
        {
            return Err(Error::ConfigValidation {
                message: format!("export_file must end in .png, got '{}'", self.qr.export_file),
            });
        }

        if self.store.backend == StoreBackend::Rest {
            let Some(url) = self.store.rest_url.as_deref() else {
                return Err(Error::ConfigValidation {
                    message: "rest backend requires store.rest_url".to_string(),
                });
            };
            if reqwest::Url::parse(url).is_err() {
                return Err(Error::ConfigValidation {
                    message: format!("invalid store.rest_url: {url}"),
                });
            }
            if !matches!(self.store.api_key.as_deref(), Some(key) if !key.is_empty()) {
                return Err(Error::ConfigValidation {
                    message: "rest backend requires store.api_key".to_string(),
                });
            }
            if self.store.timeout_secs == 0 {
                return Err(Error::ConfigValidation {
                    message: "timeout_secs must be greater than 0".to_string(),
                });
            }
        }

        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(Error::ConfigValidation {
                message: format!("invalid server.bind address: {}", self.server.bind),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.store
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the hosted store request timeout as a Duration.
    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store.timeout_secs)
    }
}

/// Check that `domain` is a hostname (optionally with a port) and nothing else.
#[must_use]
pub fn is_valid_hostname(domain: &str) -> bool {
    // The pattern is a compile-time constant; failure here would be a bug.
    Regex::new(HOSTNAME_PATTERN).is_ok_and(|re| re.is_match(domain))
}
