//! Core data types shared by playback and sinks
//!
//! # Main Types
//!
//! - [`ChannelSelection`] - Which channels a run forwards each tick
//! - [`SampleBundle`] - Every channel of one row, normalized and named
//! - [`PlaybackStats`] - Counters reported when a run finishes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Channels forwarded to the sink on each tick
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelSelection {
    /// The first analog channel of the recording, one value per tick
    #[default]
    Primary,
    /// A single named channel, one value per tick
    Single(String),
    /// Every channel, sent together as a named bundle
    All,
}

impl ChannelSelection {
    /// Parse a command line value: `primary`, `all`, or a channel name
    pub fn parse(value: &str) -> Self {
        match value {
            "primary" => ChannelSelection::Primary,
            "all" => ChannelSelection::All,
            name => ChannelSelection::Single(name.to_string()),
        }
    }
}

impl fmt::Display for ChannelSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelSelection::Primary => write!(f, "primary"),
            ChannelSelection::Single(name) => write!(f, "{}", name),
            ChannelSelection::All => write!(f, "all"),
        }
    }
}

/// All channels of one row, in channel order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampleBundle {
    /// `(channel name, normalized value)` pairs
    pub samples: Vec<(String, f64)>,
}

impl SampleBundle {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Value of a channel by name
    pub fn get(&self, channel: &str) -> Option<f64> {
        self.samples
            .iter()
            .find(|(name, _)| name == channel)
            .map(|(_, v)| *v)
    }
}

/// Playback statistics for a single run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackStats {
    /// Ticks that read a row and attempted delivery
    pub ticks: u64,
    /// Ticks whose delivery succeeded
    pub delivered: u64,
    /// Ticks whose delivery failed
    pub failed: u64,
    /// Number of times playback wrapped back to the first row
    pub loops: u64,
    /// Ticks whose work took longer than the target interval
    pub overruns: u64,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl PlaybackStats {
    /// Calculate the delivery success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.ticks == 0 {
            100.0
        } else {
            (self.delivered as f64 / self.ticks as f64) * 100.0
        }
    }

    /// Effective ticks per second over the run
    pub fn effective_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.ticks as f64 / secs
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_selection_parse() {
        assert_eq!(ChannelSelection::parse("primary"), ChannelSelection::Primary);
        assert_eq!(ChannelSelection::parse("all"), ChannelSelection::All);
        assert_eq!(
            ChannelSelection::parse("PORT1_CHN1"),
            ChannelSelection::Single("PORT1_CHN1".to_string())
        );
        assert_eq!(ChannelSelection::parse("A2").to_string(), "A2");
    }

    #[test]
    fn test_bundle_lookup() {
        let bundle = SampleBundle {
            samples: vec![("A1".to_string(), 0.25), ("A2".to_string(), 0.5)],
        };
        assert_eq!(bundle.get("A2"), Some(0.5));
        assert_eq!(bundle.get("A3"), None);
        assert_eq!(bundle.len(), 2);
    }

    #[test]
    fn test_stats_success_rate() {
        let stats = PlaybackStats {
            ticks: 4,
            delivered: 3,
            failed: 1,
            ..Default::default()
        };
        assert_eq!(stats.success_rate(), 75.0);
        assert_eq!(PlaybackStats::default().success_rate(), 100.0);
        assert_eq!(PlaybackStats::default().effective_rate(), 0.0);
    }
}
