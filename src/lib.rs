//! # OpenSignals Relay
//!
//! Replays biosignal recordings captured by OpenSignals (r)evolution to a
//! real-time consumer. A recording is parsed, resampled to the playback
//! frequency, normalized against each channel's resolution and streamed one
//! row per tick, typically as OSC over UDP.
//!
//! ## Architecture
//!
//! - **Recording**: header and row parsing, resampling and normalization
//! - **Playback**: the paced scheduler and cooperative stop signal
//! - **Sink**: the [`SampleSink`] trait with OSC and queue implementations
//! - **Config**: TOML settings with command line overrides
//!
//! ## Example
//!
//! ```no_run
//! use opensignals_relay::{
//!     config::PlaybackSettings,
//!     playback::{play_file, StopSignal},
//!     sink::OscSink,
//! };
//!
//! fn main() -> opensignals_relay::Result<()> {
//!     let sink = OscSink::connect("127.0.0.1:41235", "/sensor")?;
//!     let settings = PlaybackSettings {
//!         loop_enabled: false,
//!         ..Default::default()
//!     };
//!     let stats = play_file("breath.txt", &settings, sink, StopSignal::new())?;
//!     println!("delivered {} samples", stats.delivered);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod playback;
pub mod recording;
pub mod sink;
pub mod types;

// Re-export commonly used types
pub use config::RelayConfig;
pub use error::{RelayError, Result, ResultExt};
pub use playback::{PlaybackScheduler, PreparedRecording, StopSignal};
pub use recording::{RecordingMetadata, SampleSeries};
pub use sink::{ChannelSink, OscSink, SampleSink};
pub use types::{ChannelSelection, PlaybackStats, SampleBundle};
