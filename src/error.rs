//! Error handling for the relay
//!
//! This module defines the error taxonomy shared by the parser, resampler,
//! scheduler and sinks, plus a Result alias for use throughout the crate.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for relay operations
#[derive(Error, Debug)]
pub enum RelayError {
    /// Header marker missing, header JSON malformed, or device content missing
    #[error("Format error in {path:?}{}: {message}", device_suffix(.device))]
    Format {
        path: PathBuf,
        device: Option<String>,
        message: String,
    },

    /// Row width or cell content does not match the declared columns
    #[error("Data shape error in {path:?} at line {line}: {message}")]
    DataShape {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// The sink rejected or failed to deliver a sample
    #[error("Delivery error at tick {tick} ({channel}): {message}")]
    Delivery {
        tick: u64,
        channel: String,
        message: String,
    },

    /// Errors related to configuration loading/saving or invalid parameters
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<RelayError>,
    },
}

fn device_suffix(device: &Option<String>) -> String {
    device
        .as_ref()
        .map(|d| format!(" (device {})", d))
        .unwrap_or_default()
}

impl RelayError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        RelayError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a format error for a file, optionally naming the device
    pub fn format(path: &Path, device: Option<&str>, message: impl Into<String>) -> Self {
        RelayError::Format {
            path: path.to_path_buf(),
            device: device.map(str::to_string),
            message: message.into(),
        }
    }

    /// Create a data shape error for a 1-based line of a file
    pub fn data_shape(path: &Path, line: usize, message: impl Into<String>) -> Self {
        RelayError::DataShape {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    /// Create a delivery error for a tick
    pub fn delivery(tick: u64, channel: impl Into<String>, message: impl Into<String>) -> Self {
        RelayError::Delivery {
            tick,
            channel: channel.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
