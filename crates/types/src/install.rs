//! Install modes, options and the resolved policy for one install

use hotswap_errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// When a committed package becomes the running one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallMode {
    /// Reload right after commit
    Immediate,
    /// Picked up at the next cold start
    #[default]
    OnNextRestart,
    /// Picked up when the app returns from background
    OnNextResume,
}

impl InstallMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Immediate => "IMMEDIATE",
            Self::OnNextRestart => "ON_NEXT_RESTART",
            Self::OnNextResume => "ON_NEXT_RESUME",
        }
    }
}

impl fmt::Display for InstallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstallMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "IMMEDIATE" => Ok(Self::Immediate),
            "ON_NEXT_RESTART" => Ok(Self::OnNextRestart),
            "ON_NEXT_RESUME" => Ok(Self::OnNextResume),
            _ => Err(ConfigError::InvalidValue {
                field: "install_mode".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Engine-wide defaults for installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallDefaults {
    pub install_mode: InstallMode,
    pub mandatory_install_mode: InstallMode,
    pub rollback_timeout: Option<Duration>,
    pub minimum_background_duration: Duration,
}

impl Default for InstallDefaults {
    fn default() -> Self {
        Self {
            install_mode: InstallMode::OnNextRestart,
            mandatory_install_mode: InstallMode::Immediate,
            rollback_timeout: None,
            minimum_background_duration: Duration::ZERO,
        }
    }
}

/// Caller-supplied overrides. Unset fields fall back to [`InstallDefaults`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallOptions {
    pub install_mode: Option<InstallMode>,
    pub mandatory_install_mode: Option<InstallMode>,
    /// A zero duration disables the rollback timer
    pub rollback_timeout: Option<Duration>,
    pub minimum_background_duration: Option<Duration>,
}

impl InstallOptions {
    #[must_use]
    pub fn with_install_mode(mut self, mode: InstallMode) -> Self {
        self.install_mode = Some(mode);
        self
    }

    #[must_use]
    pub fn with_rollback_timeout(mut self, timeout: Duration) -> Self {
        self.rollback_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_minimum_background_duration(mut self, duration: Duration) -> Self {
        self.minimum_background_duration = Some(duration);
        self
    }

    /// Apply the mandatory-update policy: a mandatory package installs with
    /// the mandatory mode instead of the regular one.
    #[must_use]
    pub fn with_mandatory_policy(mut self, is_mandatory: bool, defaults: &InstallDefaults) -> Self {
        if is_mandatory {
            self.install_mode = Some(
                self.mandatory_install_mode
                    .unwrap_or(defaults.mandatory_install_mode),
            );
        }
        self
    }

    /// Merge over the engine defaults.
    #[must_use]
    pub fn resolve(&self, defaults: &InstallDefaults) -> ResolvedInstall {
        let rollback_timeout = match self.rollback_timeout {
            Some(timeout) if timeout.is_zero() => None,
            Some(timeout) => Some(timeout),
            None => defaults.rollback_timeout,
        };
        ResolvedInstall {
            install_mode: self.install_mode.unwrap_or(defaults.install_mode),
            rollback_timeout,
            minimum_background_duration: self
                .minimum_background_duration
                .unwrap_or(defaults.minimum_background_duration),
        }
    }
}

/// Fully-resolved policy for a single install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedInstall {
    pub install_mode: InstallMode,
    pub rollback_timeout: Option<Duration>,
    pub minimum_background_duration: Duration,
}

/// Stages of one install attempt, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallPhase {
    Unzipping,
    Deploying,
    MetadataWritten,
    PreInstallValidated,
    Committed,
    Failed,
}

impl fmt::Display for InstallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unzipping => "unzipping",
            Self::Deploying => "deploying",
            Self::MetadataWritten => "metadata_written",
            Self::PreInstallValidated => "pre_install_validated",
            Self::Committed => "committed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}
