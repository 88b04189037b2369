#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for hotswap
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/hotswap/config.toml)
//! - Environment variables
//! - CLI flags

pub mod layout;

pub use layout::Layout;

use hotswap_errors::{ConfigError, Error};
use hotswap_types::{InstallDefaults, InstallMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub app: AppConfig,

    #[serde(default)]
    pub install: InstallConfig,

    #[serde(default)]
    pub paths: PathConfig,
}

/// Update server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub deployment_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Facts about the running native binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_version")]
    pub app_version: String,
    /// File tree shipped inside the binary; base for diffs when nothing is installed
    #[serde(default)]
    pub binary_content_dir: Option<PathBuf>,
}

/// Install defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    #[serde(default)]
    pub install_mode: InstallMode,
    #[serde(default = "default_mandatory_install_mode")]
    pub mandatory_install_mode: InstallMode,
    /// 0 disables the rollback timer
    #[serde(default)]
    pub rollback_timeout_ms: u64,
    #[serde(default)]
    pub minimum_background_secs: u64,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub data_root: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: None,
            deployment_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_version: default_app_version(),
            binary_content_dir: None,
        }
    }
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            install_mode: InstallMode::OnNextRestart,
            mandatory_install_mode: default_mandatory_install_mode(),
            rollback_timeout_ms: 0,
            minimum_background_secs: 0,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_app_version() -> String {
    "1.0.0".to_string()
}

fn default_mandatory_install_mode() -> InstallMode {
    InstallMode::Immediate
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("hotswap").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if fs::try_exists(&config_path).await.unwrap_or(false) {
            Self::load_from_file(&config_path).await
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Ok(url) = std::env::var("HOTSWAP_SERVER_URL") {
            self.server.url = Some(url);
        }

        if let Ok(key) = std::env::var("HOTSWAP_DEPLOYMENT_KEY") {
            self.server.deployment_key = Some(key);
        }

        if let Ok(version) = std::env::var("HOTSWAP_APP_VERSION") {
            self.app.app_version = version;
        }

        if let Ok(mode) = std::env::var("HOTSWAP_INSTALL_MODE") {
            self.install.install_mode = mode.parse().map_err(|_| ConfigError::InvalidValue {
                field: "HOTSWAP_INSTALL_MODE".to_string(),
                value: mode,
            })?;
        }

        if let Ok(root) = std::env::var("HOTSWAP_DATA_ROOT") {
            self.paths.data_root = Some(PathBuf::from(root));
        }

        Ok(())
    }

    /// Check values that serde cannot
    ///
    /// # Errors
    ///
    /// Returns an error if `app.app_version` is not a semantic version.
    pub fn validate(&self) -> Result<(), Error> {
        semver::Version::parse(&self.app.app_version).map_err(|_| ConfigError::InvalidValue {
            field: "app.app_version".to_string(),
            value: self.app.app_version.clone(),
        })?;
        Ok(())
    }

    /// Server URL, required by commands that talk to the update server
    ///
    /// # Errors
    ///
    /// Returns an error if no server URL is configured.
    pub fn server_url(&self) -> Result<&str, Error> {
        self.server
            .url
            .as_deref()
            .ok_or_else(|| missing("server.url"))
    }

    /// Deployment key for update checks
    ///
    /// # Errors
    ///
    /// Returns an error if no deployment key is configured.
    pub fn deployment_key(&self) -> Result<&str, Error> {
        self.server
            .deployment_key
            .as_deref()
            .ok_or_else(|| missing("server.deployment_key"))
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }

    /// Get the data root (with default)
    #[must_use]
    pub fn data_root(&self) -> PathBuf {
        self.paths.data_root.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("hotswap")
        })
    }

    #[must_use]
    pub fn layout(&self) -> Layout {
        Layout::new(self.data_root())
    }

    /// Explicit install defaults handed to the orchestrator
    #[must_use]
    pub fn install_defaults(&self) -> InstallDefaults {
        let rollback_timeout = match self.install.rollback_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        InstallDefaults {
            install_mode: self.install.install_mode,
            mandatory_install_mode: self.install.mandatory_install_mode,
            rollback_timeout,
            minimum_background_duration: Duration::from_secs(self.install.minimum_background_secs),
        }
    }
}

fn missing(field: &str) -> Error {
    ConfigError::MissingField {
        field: field.to_string(),
    }
    .into()
}
