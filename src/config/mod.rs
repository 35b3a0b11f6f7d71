//! Configuration module for the relay
//!
//! Settings come from an optional TOML file, with command line flags applied
//! on top. Every section and field has a default, so an empty file (or no
//! file at all) is a valid configuration.
//!
//! # Config Location
//!
//! Without `--config`, the file is looked up in the platform config directory:
//! - **Linux**: `~/.config/opensignals-relay/config.toml`
//! - **macOS**: `~/Library/Application Support/opensignals-relay/config.toml`
//! - **Windows**: `%APPDATA%\opensignals-relay\config.toml`
//!
//! # Example
//!
//! ```toml
//! recordings = ["data/breath-short.txt"]
//!
//! [sink]
//! host = "127.0.0.1"
//! port = 41235
//! address = "/sensor"
//!
//! [playback]
//! frequency_hz = 60.0
//! loop_enabled = false
//! channels = "all"
//! gap_policy = "omit"
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "opensignals-relay";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Get the default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}

/// Complete relay configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Recordings to play when none are given on the command line
    pub recordings: Vec<PathBuf>,
    pub sink: SinkSettings,
    pub playback: PlaybackSettings,
    pub logging: LoggingSettings,
}

impl RelayConfig {
    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RelayError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            RelayError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// The file `load_or_default` reads: `path` itself, or the default
    /// location when it exists
    pub fn resolve_path(path: Option<&Path>) -> Option<PathBuf> {
        match path {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        }
    }

    /// Load `path`, or the default location when `path` is `None`.
    ///
    /// A missing default file yields the default config; an explicit path
    /// that cannot be read is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match Self::resolve_path(path) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Save the config as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RelayError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| RelayError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            RelayError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Reject values the relay cannot run with
    pub fn validate(&self) -> Result<()> {
        self.playback.interval()?;
        if self.sink.port == 0 {
            return Err(RelayError::Config("sink port must not be 0".to_string()));
        }
        if self.sink.host.is_empty() {
            return Err(RelayError::Config("sink host must not be empty".to_string()));
        }
        if !self.sink.address.starts_with('/') {
            return Err(RelayError::Config(format!(
                "OSC address must start with '/', got {:?}",
                self.sink.address
            )));
        }
        Ok(())
    }
}
