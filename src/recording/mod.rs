//! Recorded OpenSignals data
//!
//! This module turns an OpenSignals text recording into a series that is
//! ready for paced playback:
//!
//! - [`parser`] reads the header and raw integer rows
//! - [`resampler`] converts the series to the playback rate
//! - [`normalizer`] scales raw values against each channel's resolution
//!
//! # Known limitations
//!
//! - Only the first device of a multi-device recording is played back
//! - Rate conversion takes the minimum of each window, not an interpolation

pub mod normalizer;
pub mod parser;
pub mod resampler;
pub mod types;

pub use normalizer::{normalize, Normalizer};
pub use parser::{parse_file, parse_reader};
pub use resampler::{resample, GapPolicy};
pub use types::{value_limit, RecordingMetadata, SampleSeries};
