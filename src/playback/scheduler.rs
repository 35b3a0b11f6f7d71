//! Paced playback of a prepared series
//!
//! Each tick reads the row at the current index, normalizes it, forwards it to
//! the sink and then sleeps for whatever is left of the tick interval. Pacing
//! is best effort: cumulative drift over a long run is accepted.

use std::time::{Duration, Instant};

use crate::config::PlaybackSettings;
use crate::error::{RelayError, Result};
use crate::recording::{Normalizer, RecordingMetadata, SampleSeries};
use crate::sink::SampleSink;
use crate::types::{ChannelSelection, PlaybackStats};

use super::signal::StopSignal;

/// State of a playback run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Delivering rows
    #[default]
    Running,
    /// Past the last row; transient while deciding whether to loop
    EndOfData,
    /// Finished or cancelled, terminal
    Stopped,
}

impl PlaybackState {
    pub fn is_stopped(&self) -> bool {
        matches!(self, PlaybackState::Stopped)
    }
}

/// How ticks are spaced in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// Sleep out the remainder of every tick interval
    #[default]
    Realtime,
    /// Run ticks back to back (tests, benchmarks)
    Unpaced,
}

/// Result of a single scheduler step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The row at `index` was delivered
    Delivered { index: usize },
    /// Playback wrapped back to the first row; no row was read
    Wrapped,
    /// The last row was played and looping is disabled
    Finished,
    /// The stop signal was raised before this tick
    Cancelled,
}

/// Channels resolved against a recording
#[derive(Debug, Clone, Copy)]
enum Forward {
    Single(usize),
    All,
}

/// Drives paced delivery of one series to one sink
pub struct PlaybackScheduler<S: SampleSink> {
    series: SampleSeries,
    normalizer: Normalizer,
    forward: Forward,
    sink: S,
    interval: Duration,
    pacing: Pacing,
    stop: StopSignal,
    state: PlaybackState,
    current_index: usize,
    loop_enabled: bool,
    tick: u64,
    stats: PlaybackStats,
}

impl<S: SampleSink> PlaybackScheduler<S> {
    /// Create a scheduler for a series already resampled to `settings.frequency_hz`
    pub fn new(
        metadata: &RecordingMetadata,
        series: SampleSeries,
        settings: &PlaybackSettings,
        sink: S,
    ) -> Result<Self> {
        if series.is_empty() {
            return Err(RelayError::Config("nothing to play: series is empty".to_string()));
        }
        if series.width() != metadata.channel_count() {
            return Err(RelayError::Config(format!(
                "series has {} channels but the recording declares {}",
                series.width(),
                metadata.channel_count()
            )));
        }
        let interval = settings.interval()?;

        let forward = match &settings.channels {
            ChannelSelection::Primary => Forward::Single(metadata.primary_channel()),
            ChannelSelection::All => Forward::All,
            ChannelSelection::Single(name) => {
                Forward::Single(metadata.channel_index(name).ok_or_else(|| {
                    RelayError::Config(format!(
                        "channel {:?} not found, recording has {:?}",
                        name, metadata.channel_names
                    ))
                })?)
            }
        };

        Ok(Self {
            series,
            normalizer: Normalizer::new(metadata),
            forward,
            sink,
            interval,
            pacing: Pacing::Realtime,
            stop: StopSignal::new(),
            state: PlaybackState::Running,
            current_index: 0,
            loop_enabled: settings.loop_enabled,
            tick: 0,
            stats: PlaybackStats::default(),
        })
    }

    /// Set how ticks are spaced
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Use a shared stop signal
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Get current state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Index of the next row to deliver
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Statistics so far
    pub fn stats(&self) -> &PlaybackStats {
        &self.stats
    }

    /// Run one tick.
    ///
    /// A failed delivery is returned as [`RelayError::Delivery`] after the
    /// tick has been paced and the index advanced, so calling `step` again
    /// simply continues with the next row.
    pub fn step(&mut self) -> Result<TickOutcome> {
        if self.state.is_stopped() {
            return Ok(TickOutcome::Finished);
        }
        if self.stop.is_stopped() {
            tracing::debug!("Playback cancelled at row {}", self.current_index);
            self.state = PlaybackState::Stopped;
            return Ok(TickOutcome::Cancelled);
        }

        let start = Instant::now();
        let index = self.current_index;
        if index >= self.series.len() {
            self.state = PlaybackState::EndOfData;
            if self.loop_enabled {
                self.current_index = 0;
                self.stats.loops += 1;
                self.state = PlaybackState::Running;
                tracing::debug!("Looping playback (pass {})", self.stats.loops + 1);
                return Ok(TickOutcome::Wrapped);
            }
            self.state = PlaybackState::Stopped;
            return Ok(TickOutcome::Finished);
        }

        let delivery = self.deliver(index);
        self.current_index += 1;
        self.tick += 1;
        self.stats.ticks += 1;
        if delivery.is_ok() {
            self.stats.delivered += 1;
        } else {
            self.stats.failed += 1;
        }

        self.pace(start);
        delivery.map(|()| TickOutcome::Delivered { index })
    }

    /// Run until the data ends or the stop signal is raised.
    ///
    /// Delivery errors are logged and playback continues.
    pub fn run(&mut self) -> PlaybackStats {
        self.run_with(|e| tracing::warn!("{}", e))
    }

    /// Run until the data ends or the stop signal is raised, passing every
    /// delivery error to `on_error`
    pub fn run_with(&mut self, mut on_error: impl FnMut(&RelayError)) -> PlaybackStats {
        let started = Instant::now();
        tracing::info!(
            "Playing {} rows at {:.3} Hz (loop {})",
            self.series.len(),
            1.0 / self.interval.as_secs_f64(),
            if self.loop_enabled { "on" } else { "off" }
        );

        loop {
            match self.step() {
                Ok(TickOutcome::Delivered { .. }) | Ok(TickOutcome::Wrapped) => {}
                Ok(TickOutcome::Finished) | Ok(TickOutcome::Cancelled) => break,
                Err(e) => on_error(&e),
            }
        }

        self.stats.elapsed += started.elapsed();
        tracing::info!(
            "Playback stopped after {} ticks ({} delivered, {} failed, {} loops)",
            self.stats.ticks,
            self.stats.delivered,
            self.stats.failed,
            self.stats.loops
        );
        self.stats.clone()
    }

    fn deliver(&mut self, index: usize) -> Result<()> {
        let Some(row) = self.series.row(index) else {
            return Ok(());
        };
        match self.forward {
            Forward::Single(channel) => {
                let tag = self.normalizer.channel_name(channel);
                let value = self.normalizer.channel(channel, row[channel]);
                tracing::trace!("tick {} {} = {}", self.tick, tag, value);
                self.sink
                    .send(tag, value)
                    .map_err(|e| RelayError::delivery(self.tick, tag, e.to_string()))
            }
            Forward::All => {
                let bundle = self.normalizer.row(row);
                tracing::trace!("tick {} {:?}", self.tick, bundle.samples);
                self.sink
                    .send_bundle(&bundle)
                    .map_err(|e| RelayError::delivery(self.tick, "all channels", e.to_string()))
            }
        }
    }

    fn pace(&mut self, start: Instant) {
        if self.pacing == Pacing::Unpaced {
            return;
        }
        let elapsed = start.elapsed();
        if elapsed < self.interval {
            std::thread::sleep(self.interval - elapsed);
        } else {
            self.stats.overruns += 1;
        }
    }
}
