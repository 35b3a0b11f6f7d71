//! OpenSignals text file parser
//!
//! Recordings start with a short comment block:
//!
//! ```text
//! # OpenSignals Text File Format. Version 1
//! # {"00:07:80:79:6F:DB": {"sampling rate": 1000, "column": ["nSeq", "DI", "PORT1_CHN1"], "resolution": [16], ...}}
//! # EndOfHeader
//! 0 0 32768
//! 1 0 32771
//! ```
//!
//! The line after the start marker holds a JSON object keyed by device id.
//! Only the first device is played back; further devices are reported in
//! [`RecordingMetadata::extra_devices`]. The remaining lines are
//! whitespace-separated integer rows whose first value is the sample index.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{RelayError, Result};

use super::types::{RecordingMetadata, SampleSeries, MAX_RESOLUTION_BITS};

/// Line that introduces the JSON header
pub const START_HEADER_MARKER: &str = "# OpenSignals Text File Format. Version 1";

/// Start marker written by older OpenSignals releases
pub const LEGACY_START_HEADER_MARKER: &str = "# OpenSignals Text File Format";

/// Line that terminates the comment block
pub const END_HEADER_MARKER: &str = "# EndOfHeader";

const COMMENT_PREFIX: char = '#';

/// Per-device header content. Unknown keys are ignored.
#[derive(Debug, Deserialize)]
struct DeviceHeader {
    #[serde(rename = "sampling rate")]
    sampling_rate: Option<f64>,
    column: Option<Vec<String>>,
    resolution: Option<Vec<i64>>,
    #[serde(rename = "device name")]
    device_name: Option<String>,
    #[serde(default)]
    sensor: Vec<String>,
    #[serde(default)]
    label: Vec<String>,
    date: Option<String>,
    time: Option<String>,
}

/// Parse a recording file into its metadata and raw sample rows.
///
/// Fails with [`RelayError::Format`] when no usable header is found, and with
/// [`RelayError::DataShape`] when rows do not match the declared columns.
pub fn parse_file(path: impl AsRef<Path>) -> Result<(RecordingMetadata, SampleSeries)> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| RelayError::Io(e).with_context(format!("Failed to open {:?}", path)))?;
    parse_reader(BufReader::new(file), path)
}

/// Parse a recording from any buffered reader. `path` is only used in errors.
pub fn parse_reader<R: BufRead>(reader: R, path: &Path) -> Result<(RecordingMetadata, SampleSeries)> {
    let mut lines = reader.lines().enumerate();

    let mut header: Option<String> = None;
    let mut expect_header = false;
    while let Some((_, line)) = lines.next() {
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);
        if expect_header {
            header = Some(line.to_string());
            break;
        }
        if line == START_HEADER_MARKER || line == LEGACY_START_HEADER_MARKER {
            expect_header = true;
            continue;
        }
        if line == END_HEADER_MARKER {
            break;
        }
    }

    let Some(header) = header else {
        return Err(RelayError::format(
            path,
            None,
            "did not find the format header, check that the file is an OpenSignals text recording",
        ));
    };
    let metadata = parse_header(&header, path)?;
    tracing::debug!(
        "Parsed header of {:?}: device {}, {} Hz, channels {:?}",
        path,
        metadata.device_id,
        metadata.sampling_rate,
        metadata.channel_names
    );

    let declared_width = metadata.channel_count() + 1;
    let mut series = SampleSeries::new(metadata.channel_count());
    for (index, line) in lines {
        let line = line?;
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) {
            continue;
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        if tokens.len() != declared_width {
            return Err(RelayError::data_shape(
                path,
                line_no,
                format!(
                    "expected {} columns (index + {} channels), found {}",
                    declared_width,
                    metadata.channel_count(),
                    tokens.len()
                ),
            ));
        }

        let mut row = Vec::with_capacity(metadata.channel_count());
        for (channel, token) in metadata.channel_names.iter().zip(&tokens[1..]) {
            let value = token.parse::<i64>().map_err(|_| {
                RelayError::data_shape(
                    path,
                    line_no,
                    format!("value {:?} of channel {} is not an integer", token, channel),
                )
            })?;
            row.push(value);
        }
        series.push(row);
    }

    if series.is_empty() {
        return Err(RelayError::data_shape(path, 0, "recording contains no sample rows"));
    }

    tracing::debug!(
        "Read {} rows x {} channels from {:?}",
        series.len(),
        series.width(),
        path
    );
    Ok((metadata, series))
}

/// Parse the JSON header line into metadata for the first device
fn parse_header(line: &str, path: &Path) -> Result<RecordingMetadata> {
    let json = line.trim_start_matches(|c: char| c == COMMENT_PREFIX || c.is_whitespace());
    let devices: Map<String, Value> = serde_json::from_str(json)
        .map_err(|e| RelayError::format(path, None, format!("malformed header JSON: {}", e)))?;

    let mut devices = devices.into_iter();
    let Some((device_id, content)) = devices.next() else {
        return Err(RelayError::format(path, None, "header contains no device"));
    };
    let extra_devices: Vec<String> = devices.map(|(id, _)| id).collect();
    if !extra_devices.is_empty() {
        tracing::warn!(
            "{:?} holds {} additional device(s) {:?}; only {} is played back",
            path,
            extra_devices.len(),
            extra_devices,
            device_id
        );
    }

    let device = device_id.as_str();
    let header: DeviceHeader = serde_json::from_value(content).map_err(|e| {
        RelayError::format(path, Some(device), format!("invalid header content: {}", e))
    })?;

    let sampling_rate = header
        .sampling_rate
        .ok_or_else(|| RelayError::format(path, Some(device), "missing \"sampling rate\""))?;
    if !(sampling_rate.is_finite() && sampling_rate > 0.0) {
        return Err(RelayError::format(
            path,
            Some(device),
            format!("sampling rate must be positive, got {}", sampling_rate),
        ));
    }

    let columns = header
        .column
        .ok_or_else(|| RelayError::format(path, Some(device), "missing \"column\""))?;
    if columns.len() < 2 {
        return Err(RelayError::format(
            path,
            Some(device),
            "\"column\" must list the index column and at least one channel",
        ));
    }
    let channel_names: Vec<String> = columns[1..].to_vec();

    let resolution = header
        .resolution
        .ok_or_else(|| RelayError::format(path, Some(device), "missing \"resolution\""))?;
    let resolution_bits = align_resolution(&resolution, &channel_names, path, device)?;

    let mut metadata =
        RecordingMetadata::new(device_id.clone(), sampling_rate, channel_names, resolution_bits)?;
    metadata.device_name = header.device_name;
    metadata.sensors = header.sensor;
    metadata.labels = header.label;
    metadata.started_at = acquisition_start(header.date.as_deref(), header.time.as_deref());
    metadata.extra_devices = extra_devices;
    Ok(metadata)
}

/// Map declared resolutions onto channels.
///
/// OpenSignals only lists resolutions for analog channels, which follow the
/// digital I/O columns. Resolutions therefore align to the trailing channels
/// and any leading, uncovered channel is treated as a 1-bit digital input.
fn align_resolution(
    resolution: &[i64],
    channels: &[String],
    path: &Path,
    device: &str,
) -> Result<Vec<u32>> {
    if resolution.is_empty() {
        return Err(RelayError::format(path, Some(device), "\"resolution\" is empty"));
    }
    if resolution.len() > channels.len() {
        return Err(RelayError::data_shape(
            path,
            0,
            format!(
                "header declares {} resolutions for {} channels",
                resolution.len(),
                channels.len()
            ),
        ));
    }

    let mut bits = vec![1u32; channels.len() - resolution.len()];
    for (&res, channel) in resolution.iter().zip(&channels[channels.len() - resolution.len()..]) {
        if !(1..=MAX_RESOLUTION_BITS as i64).contains(&res) {
            return Err(RelayError::format(
                path,
                Some(device),
                format!(
                    "resolution of channel {} must be within 1..={} bits, got {}",
                    channel, MAX_RESOLUTION_BITS, res
                ),
            ));
        }
        bits.push(res as u32);
    }
    Ok(bits)
}

/// Combine header `date` ("2018-7-5") and `time` ("10:29:43.249")
fn acquisition_start(date: Option<&str>, time: Option<&str>) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date?, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time?, "%H:%M:%S%.f").ok()?;
    Some(date.and_time(time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = r#"# {"00:07:80:79:6F:DB": {"sensor": ["ECG"], "device name": "00:07:80:79:6F:DB", "column": ["nSeq", "DI", "PORT1_CHN1"], "sampling rate": 1000, "label": ["PORT1_CHN1"], "resolution": [16], "date": "2018-7-5", "time": "10:29:43.249"}}"#;

    fn write_recording(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn recording(rows: &str) -> String {
        format!(
            "{}\n{}\n{}\n{}",
            START_HEADER_MARKER, HEADER, END_HEADER_MARKER, rows
        )
    }

    #[test]
    fn test_parse_opensignals_file() {
        let file = write_recording(&recording("0 0 32768\n1 1 32771\n2 0 32700\n"));
        let (meta, series) = parse_file(file.path()).unwrap();

        assert_eq!(meta.device_id, "00:07:80:79:6F:DB");
        assert_eq!(meta.sampling_rate, 1000.0);
        assert_eq!(meta.channel_names, vec!["DI", "PORT1_CHN1"]);
        assert_eq!(meta.resolution_bits, vec![1, 16]);
        assert_eq!(meta.value_limits(), vec![1, 65535]);
        assert_eq!(meta.sensors, vec!["ECG"]);
        assert_eq!(meta.primary_channel(), 1);
        assert_eq!(
            meta.started_at.unwrap().format("%Y-%m-%d %H:%M:%S").to_string(),
            "2018-07-05 10:29:43"
        );

        assert_eq!(series.len(), 3);
        assert_eq!(series.width(), 2);
        assert_eq!(series.row(1), Some(&[1, 32771][..]));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let file = write_recording(&recording("0 0 10\n1 0 20\n"));
        let first = parse_file(file.path()).unwrap();
        let second = parse_file(file.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_legacy_marker_and_crlf() {
        let content = format!(
            "{}\r\n{}\r\n{}\r\n0 0 5\r\n",
            LEGACY_START_HEADER_MARKER, HEADER, END_HEADER_MARKER
        );
        let file = write_recording(&content);
        let (_, series) = parse_file(file.path()).unwrap();
        assert_eq!(series.row(0), Some(&[0, 5][..]));
    }

    #[test]
    fn test_end_marker_before_start_marker() {
        let content = format!("{}\n{}\n{}\n0 0 1\n", END_HEADER_MARKER, START_HEADER_MARKER, HEADER);
        let file = write_recording(&content);
        let err = parse_file(file.path()).unwrap_err();
        assert!(matches!(err, RelayError::Format { .. }), "{err}");
    }

    #[test]
    fn test_missing_header() {
        let file = write_recording("0 0 1\n1 0 2\n");
        assert!(matches!(
            parse_file(file.path()),
            Err(RelayError::Format { .. })
        ));
    }

    #[test]
    fn test_malformed_header_json() {
        let content = format!("{}\n# {{not json\n{}\n0 1\n", START_HEADER_MARKER, END_HEADER_MARKER);
        let file = write_recording(&content);
        let err = parse_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("malformed header JSON"));
    }

    #[test]
    fn test_missing_sampling_rate_names_device() {
        let content = format!(
            "{}\n# {{\"AA:BB\": {{\"column\": [\"nSeq\", \"CH1\"], \"resolution\": [16]}}}}\n{}\n0 1\n",
            START_HEADER_MARKER, END_HEADER_MARKER
        );
        let file = write_recording(&content);
        match parse_file(file.path()).unwrap_err() {
            RelayError::Format { device, message, .. } => {
                assert_eq!(device.as_deref(), Some("AA:BB"));
                assert!(message.contains("sampling rate"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_row_width_mismatch() {
        let file = write_recording(&recording("0 0 10\n1 20\n"));
        match parse_file(file.path()).unwrap_err() {
            RelayError::DataShape { line, .. } => assert_eq!(line, 5),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_integer_value_names_channel() {
        let file = write_recording(&recording("0 0 1.5\n"));
        let err = parse_file(file.path()).unwrap_err();
        assert!(matches!(err, RelayError::DataShape { .. }));
        assert!(err.to_string().contains("PORT1_CHN1"));
    }

    #[test]
    fn test_empty_recording() {
        let file = write_recording(&recording(""));
        assert!(matches!(
            parse_file(file.path()),
            Err(RelayError::DataShape { .. })
        ));
    }

    #[test]
    fn test_first_device_wins() {
        let content = format!(
            "{}\n# {{\"ZZ\": {{\"sampling rate\": 100, \"column\": [\"nSeq\", \"A\"], \"resolution\": [8]}}, \"AA\": {{\"sampling rate\": 10, \"column\": [\"nSeq\", \"B\"], \"resolution\": [4]}}}}\n{}\n0 7\n",
            START_HEADER_MARKER, END_HEADER_MARKER
        );
        let file = write_recording(&content);
        let (meta, _) = parse_file(file.path()).unwrap();
        assert_eq!(meta.device_id, "ZZ");
        assert_eq!(meta.extra_devices, vec!["AA"]);
        assert_eq!(meta.value_limits(), vec![255]);
    }

    #[test]
    fn test_invalid_resolution() {
        let content = format!(
            "{}\n# {{\"AA\": {{\"sampling rate\": 100, \"column\": [\"nSeq\", \"A\"], \"resolution\": [0]}}}}\n{}\n0 7\n",
            START_HEADER_MARKER, END_HEADER_MARKER
        );
        let file = write_recording(&content);
        assert!(matches!(
            parse_file(file.path()),
            Err(RelayError::Format { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = parse_file("/nonexistent/recording.txt").unwrap_err();
        assert!(err.to_string().contains("Failed to open"));
    }
}
