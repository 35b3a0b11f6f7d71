//! Recording data types

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::{RelayError, Result};

/// Largest supported channel resolution in bits.
///
/// `2^63 - 1` is the largest limit representable as `i64`.
pub const MAX_RESOLUTION_BITS: u32 = 63;

/// Metadata describing a single recording, as declared in its header
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordingMetadata {
    /// Header key of the device this recording belongs to (usually a MAC address)
    pub device_id: String,
    /// Human readable device name, when the header has one
    pub device_name: Option<String>,
    /// Samples per second at acquisition time
    pub sampling_rate: f64,
    /// Data column names, excluding the leading sample index column
    pub channel_names: Vec<String>,
    /// Bit resolution per channel, aligned with `channel_names`
    pub resolution_bits: Vec<u32>,
    /// Sensor types declared by the header
    pub sensors: Vec<String>,
    /// Channel labels declared by the header
    pub labels: Vec<String>,
    /// Acquisition start, from the header's `date` and `time` fields
    pub started_at: Option<NaiveDateTime>,
    /// Other devices present in the header and ignored by playback
    pub extra_devices: Vec<String>,
}

impl RecordingMetadata {
    /// Create metadata with the required fields; optional fields are left empty.
    ///
    /// Every channel needs a resolution within `1..=MAX_RESOLUTION_BITS`.
    pub fn new(
        device_id: impl Into<String>,
        sampling_rate: f64,
        channel_names: Vec<String>,
        resolution_bits: Vec<u32>,
    ) -> Result<Self> {
        if resolution_bits.len() != channel_names.len() {
            return Err(RelayError::Config(format!(
                "{} resolutions given for {} channels",
                resolution_bits.len(),
                channel_names.len()
            )));
        }
        if let Some((name, bits)) = channel_names
            .iter()
            .zip(&resolution_bits)
            .find(|(_, bits)| !(1..=MAX_RESOLUTION_BITS).contains(*bits))
        {
            return Err(RelayError::Config(format!(
                "resolution of channel {} must be within 1..={} bits, got {}",
                name, MAX_RESOLUTION_BITS, bits
            )));
        }

        Ok(Self {
            device_id: device_id.into(),
            device_name: None,
            sampling_rate,
            channel_names,
            resolution_bits,
            sensors: Vec::new(),
            labels: Vec::new(),
            started_at: None,
            extra_devices: Vec::new(),
        })
    }

    /// Number of data channels
    pub fn channel_count(&self) -> usize {
        self.channel_names.len()
    }

    /// Index of a channel by name
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channel_names.iter().position(|c| c == name)
    }

    /// Maximum representable raw value of a channel: `2^bits - 1`
    pub fn value_limit(&self, channel: usize) -> Option<i64> {
        self.resolution_bits.get(channel).map(|&bits| value_limit(bits))
    }

    /// Limits for every channel, in channel order
    pub fn value_limits(&self) -> Vec<i64> {
        self.resolution_bits.iter().map(|&b| value_limit(b)).collect()
    }

    /// Index of the first analog channel (resolution above one bit).
    ///
    /// Falls back to the first channel for all-digital recordings.
    pub fn primary_channel(&self) -> usize {
        self.resolution_bits
            .iter()
            .position(|&bits| bits > 1)
            .unwrap_or(0)
    }
}

/// Compute `2^bits - 1`.
///
/// `bits` is clamped to `1..=MAX_RESOLUTION_BITS`, so the limit is always
/// at least 1 and fits in `i64`.
pub fn value_limit(bits: u32) -> i64 {
    let bits = bits.clamp(1, MAX_RESOLUTION_BITS);
    ((1u64 << bits) - 1) as i64
}

/// Raw sample rows of a recording
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SampleSeries {
    width: usize,
    rows: Vec<Vec<i64>>,
}

impl SampleSeries {
    /// Create an empty series whose rows have `width` values
    pub fn new(width: usize) -> Self {
        Self {
            width,
            rows: Vec::new(),
        }
    }

    /// Build a series from rows.
    ///
    /// Returns `None` if any row differs in width from `width`.
    pub fn from_rows(width: usize, rows: Vec<Vec<i64>>) -> Option<Self> {
        if rows.iter().any(|r| r.len() != width) {
            return None;
        }
        Some(Self { width, rows })
    }

    /// Append a row. The row must match the series width.
    pub fn push(&mut self, row: Vec<i64>) {
        assert_eq!(row.len(), self.width, "row width mismatch");
        self.rows.push(row);
    }

    /// Values per row
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if there are no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row at `index`
    pub fn row(&self, index: usize) -> Option<&[i64]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Iterate over rows
    pub fn rows(&self) -> impl Iterator<Item = &[i64]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Iterate over one channel's values
    pub fn channel(&self, channel: usize) -> impl Iterator<Item = i64> + '_ {
        self.rows.iter().map(move |r| r[channel])
    }
}
