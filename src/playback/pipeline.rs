//! Per-file preparation: parse, resample and hand off to a scheduler
//!
//! Everything that can fail about a file fails here, before the first tick.

use std::path::{Path, PathBuf};

use crate::config::PlaybackSettings;
use crate::error::{Result, ResultExt};
use crate::recording::{parse_file, resample, RecordingMetadata, SampleSeries};
use crate::sink::SampleSink;
use crate::types::PlaybackStats;

use super::scheduler::PlaybackScheduler;
use super::signal::StopSignal;

/// A recording parsed and resampled to the playback frequency
#[derive(Debug, Clone)]
pub struct PreparedRecording {
    pub path: PathBuf,
    pub metadata: RecordingMetadata,
    /// Rows at the playback frequency
    pub series: SampleSeries,
    /// Row count as read from the file
    pub source_rows: usize,
    settings: PlaybackSettings,
}

impl PreparedRecording {
    /// Parse `path` and resample it for `settings`
    pub fn load(path: impl AsRef<Path>, settings: &PlaybackSettings) -> Result<Self> {
        let path = path.as_ref();
        let (metadata, raw) = parse_file(path)?;
        let series = resample(
            &raw,
            metadata.sampling_rate,
            settings.frequency_hz,
            settings.gap_policy,
        )
        .with_context(|| format!("Failed to resample {:?}", path))?;

        tracing::info!(
            "Loaded {:?}: device {}, {} channels, {} rows at {} Hz -> {} rows at {} Hz",
            path,
            metadata.device_id,
            metadata.channel_count(),
            raw.len(),
            metadata.sampling_rate,
            series.len(),
            settings.frequency_hz
        );

        Ok(Self {
            path: path.to_path_buf(),
            source_rows: raw.len(),
            metadata,
            series,
            settings: settings.clone(),
        })
    }

    /// Build a scheduler that plays this recording into `sink`
    pub fn scheduler<S: SampleSink>(
        self,
        sink: S,
        stop: StopSignal,
    ) -> Result<PlaybackScheduler<S>> {
        let scheduler = PlaybackScheduler::new(&self.metadata, self.series, &self.settings, sink)
            .with_context(|| format!("Cannot play {:?}", self.path))?;
        Ok(scheduler.with_stop_signal(stop))
    }
}

/// Load `path` and play it into `sink` until it ends or `stop` is raised
pub fn play_file<S: SampleSink>(
    path: impl AsRef<Path>,
    settings: &PlaybackSettings,
    sink: S,
    stop: StopSignal,
) -> Result<PlaybackStats> {
    let prepared = PreparedRecording::load(path, settings)?;
    let mut scheduler = prepared.scheduler(sink, stop)?;
    Ok(scheduler.run())
}
