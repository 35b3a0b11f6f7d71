//! Raw value normalization

use crate::types::SampleBundle;

use super::types::RecordingMetadata;

/// Map a raw value into a fraction of the channel's limit.
///
/// Values are not clamped: a raw value above `limit` yields a result above
/// `1.0`, which callers should treat as a data-quality signal.
pub fn normalize(raw: i64, limit: i64) -> f64 {
    raw as f64 / limit as f64
}

/// Normalizes whole rows using the per-channel limits of one recording
#[derive(Debug, Clone)]
pub struct Normalizer {
    channel_names: Vec<String>,
    limits: Vec<i64>,
}

impl Normalizer {
    pub fn new(metadata: &RecordingMetadata) -> Self {
        Self {
            channel_names: metadata.channel_names.clone(),
            limits: metadata.value_limits(),
        }
    }

    /// Normalize one channel value
    pub fn channel(&self, channel: usize, raw: i64) -> f64 {
        let limit = self.limits[channel];
        if raw > limit {
            tracing::debug!(
                "Channel {} value {} exceeds its limit {}",
                self.channel_names[channel],
                raw,
                limit
            );
        }
        normalize(raw, limit)
    }

    /// Normalize a full row into a bundle named after the channels
    pub fn row(&self, row: &[i64]) -> SampleBundle {
        SampleBundle {
            samples: row
                .iter()
                .enumerate()
                .map(|(channel, &raw)| (self.channel_names[channel].clone(), self.channel(channel, raw)))
                .collect(),
        }
    }

    pub fn channel_name(&self, channel: usize) -> &str {
        &self.channel_names[channel]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::types::value_limit;
    use proptest::prelude::*;

    #[test]
    fn test_sixteen_bit_value() {
        let value = normalize(100, value_limit(16));
        assert!((value - 0.0015259).abs() < 1e-7);
    }

    #[test]
    fn test_out_of_range_value_is_not_clamped() {
        let value = normalize(70000, value_limit(16));
        assert!(value > 1.0);
    }

    #[test]
    fn test_row_bundle() {
        let meta = RecordingMetadata::new("dev", 100.0, vec!["DI".into(), "EMG".into()], vec![1, 10]).unwrap();
        let bundle = Normalizer::new(&meta).row(&[1, 1023]);
        assert_eq!(
            bundle.samples,
            vec![("DI".to_string(), 1.0), ("EMG".to_string(), 1.0)]
        );
    }

    proptest! {
        #[test]
        fn test_limit_normalizes_to_exactly_one(bits in 1u32..=63) {
            let limit = value_limit(bits);
            prop_assert_eq!(limit as u64, (1u64 << bits) - 1);
            prop_assert_eq!(normalize(limit, limit), 1.0);
        }
    }
}
