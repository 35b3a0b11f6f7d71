//! Builders for OpenSignals recording fixtures

use std::io::Write;
use tempfile::NamedTempFile;

/// Builder for OpenSignals text recordings written to a temporary file
pub struct RecordingBuilder {
    device: String,
    sampling_rate: f64,
    channels: Vec<String>,
    resolution: Vec<u32>,
    rows: Vec<Vec<i64>>,
    legacy_marker: bool,
}

impl RecordingBuilder {
    pub fn new(device: &str) -> Self {
        Self {
            device: device.to_string(),
            sampling_rate: 1000.0,
            channels: vec!["CH1".to_string()],
            resolution: vec![16],
            rows: Vec::new(),
            legacy_marker: false,
        }
    }

    pub fn sampling_rate(mut self, rate: f64) -> Self {
        self.sampling_rate = rate;
        self
    }

    pub fn channels(mut self, channels: &[&str]) -> Self {
        self.channels = channels.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn resolution(mut self, bits: &[u32]) -> Self {
        self.resolution = bits.to_vec();
        self
    }

    pub fn legacy_marker(mut self) -> Self {
        self.legacy_marker = true;
        self
    }

    pub fn row(mut self, values: &[i64]) -> Self {
        self.rows.push(values.to_vec());
        self
    }

    /// Add `count` rows produced by `f(row_index)`
    pub fn rows_with(mut self, count: usize, f: impl Fn(usize) -> Vec<i64>) -> Self {
        self.rows.extend((0..count).map(f));
        self
    }

    /// Render the recording as text
    pub fn render(&self) -> String {
        let mut columns = vec!["\"nSeq\"".to_string()];
        columns.extend(self.channels.iter().map(|c| format!("\"{}\"", c)));
        let resolution: Vec<String> = self.resolution.iter().map(|b| b.to_string()).collect();

        let marker = if self.legacy_marker {
            "# OpenSignals Text File Format"
        } else {
            "# OpenSignals Text File Format. Version 1"
        };
        let mut text = format!(
            "{}\n# {{\"{}\": {{\"sampling rate\": {}, \"column\": [{}], \"resolution\": [{}], \"device name\": \"{}\"}}}}\n# EndOfHeader\n",
            marker,
            self.device,
            self.sampling_rate,
            columns.join(", "),
            resolution.join(", "),
            self.device
        );
        for (i, row) in self.rows.iter().enumerate() {
            let values: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            text.push_str(&format!("{}\t{}\n", i % 16, values.join("\t")));
        }
        text
    }

    /// Write the recording to a temporary file
    pub fn build(self) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp recording");
        file.write_all(self.render().as_bytes())
            .expect("write temp recording");
        file
    }
}
