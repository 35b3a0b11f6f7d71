//! Paced playback of prepared recordings
//!
//! - [`PreparedRecording`] - parses and resamples one file up front
//! - [`PlaybackScheduler`] - delivers one row per tick to a [`SampleSink`](crate::sink::SampleSink)
//! - [`StopSignal`] - cooperative cancellation shared between runs

pub mod pipeline;
pub mod scheduler;
pub mod signal;

pub use pipeline::{play_file, PreparedRecording};
pub use scheduler::{Pacing, PlaybackScheduler, PlaybackState, TickOutcome};
pub use signal::StopSignal;
