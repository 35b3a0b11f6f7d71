//! Settings sections of the relay configuration
//!
//! # Main Types
//!
//! - [`SinkSettings`] - Where normalized samples are sent
//! - [`PlaybackSettings`] - Playback frequency, looping and channel selection
//! - [`LoggingSettings`] - Log filter and optional log file

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{RelayError, Result};
use crate::recording::GapPolicy;
use crate::sink::osc::DEFAULT_OSC_ADDRESS;
use crate::types::ChannelSelection;

/// Default OSC server host
pub const DEFAULT_SINK_HOST: &str = "127.0.0.1";

/// Default OSC server port
pub const DEFAULT_SINK_PORT: u16 = 41235;

/// Default playback frequency in Hz (a common video frame rate)
pub const DEFAULT_PLAYBACK_FREQUENCY_HZ: f64 = 30.0;

/// OSC sink settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkSettings {
    /// OSC server host name or IP
    pub host: String,
    /// OSC server UDP port
    pub port: u16,
    /// OSC address pattern for single-channel samples
    pub address: String,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_SINK_HOST.to_string(),
            port: DEFAULT_SINK_PORT,
            address: DEFAULT_OSC_ADDRESS.to_string(),
        }
    }
}

impl SinkSettings {
    /// `host:port` for socket resolution
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Playback settings for recorded files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Output rate in Hz, independent of the recording's sampling rate
    pub frequency_hz: f64,
    /// Restart from the first row after the last one
    pub loop_enabled: bool,
    /// Channels forwarded per tick
    pub channels: ChannelSelection,
    /// Handling of empty windows when upsampling
    pub gap_policy: GapPolicy,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            frequency_hz: DEFAULT_PLAYBACK_FREQUENCY_HZ,
            loop_enabled: true,
            channels: ChannelSelection::default(),
            gap_policy: GapPolicy::default(),
        }
    }
}

impl PlaybackSettings {
    /// Time between ticks.
    ///
    /// Fails for frequencies that are not positive, or so low that the
    /// interval does not fit in a `Duration`.
    pub fn interval(&self) -> Result<Duration> {
        let frequency = self.frequency_hz;
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(RelayError::Config(format!(
                "playback frequency must be a positive number of Hz, got {}",
                frequency
            )));
        }
        Duration::try_from_secs_f64(1.0 / frequency).map_err(|e| {
            RelayError::Config(format!(
                "playback frequency {} Hz gives an unusable tick interval: {}",
                frequency, e
            ))
        })
    }
}

/// Logging settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub filter: Option<String>,
    /// Also write logs to this file
    pub file: Option<PathBuf>,
}
