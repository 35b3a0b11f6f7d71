//! Rate conversion for recorded series
//!
//! Source row `i` is stamped `i / source_rate` seconds. Rows are bucketed into
//! windows of `1 / target_rate` seconds anchored at zero, and every window is
//! reduced to the per-channel minimum of its rows.
//!
//! Minimum reduction is an approximation inherited from the first playback
//! tool; it is kept as a stable contract, not as a claim about biosignal
//! fidelity.

use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};

use super::types::SampleSeries;

/// What to emit for a window without any source rows (upsampling)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GapPolicy {
    /// Repeat the previous output row
    #[default]
    CarryForward,
    /// Drop the window; output is shorter than the window count
    Omit,
}

/// Largest number of rows `resample` will produce.
///
/// Ten million rows is over 90 hours at 30 Hz. Larger outputs come from
/// extreme upsampling and are rejected instead of allocated.
pub const MAX_RESAMPLED_ROWS: usize = 10_000_000;

/// Window index of source row `i`: `floor(i * target / source)`.
///
/// Equivalent to `floor((i / source) / (1 / target))` with a single rounding step.
fn window_of(i: usize, source_rate: f64, target_rate: f64) -> usize {
    (i as f64 * target_rate / source_rate).floor() as usize
}

/// Number of windows spanned by `len` source rows, or `None` when it would
/// exceed [`MAX_RESAMPLED_ROWS`]
pub fn window_count(len: usize, source_rate: f64, target_rate: f64) -> Option<usize> {
    if len == 0 {
        return Some(0);
    }
    let last = ((len - 1) as f64 * target_rate / source_rate).floor();
    if last < MAX_RESAMPLED_ROWS as f64 {
        Some(last as usize + 1)
    } else {
        None
    }
}

fn check_rate(rate: f64, what: &str) -> Result<()> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(RelayError::Config(format!(
            "{} must be a positive number of samples per second, got {}",
            what, rate
        )))
    }
}

/// Convert `series` from `source_rate` to `target_rate` samples per second
pub fn resample(
    series: &SampleSeries,
    source_rate: f64,
    target_rate: f64,
    gaps: GapPolicy,
) -> Result<SampleSeries> {
    check_rate(source_rate, "source rate")?;
    check_rate(target_rate, "target rate")?;

    if source_rate == target_rate {
        return Ok(series.clone());
    }

    let windows = window_count(series.len(), source_rate, target_rate).ok_or_else(|| {
        RelayError::Config(format!(
            "resampling {} rows from {} Hz to {} Hz would exceed {} rows",
            series.len(),
            source_rate,
            target_rate,
            MAX_RESAMPLED_ROWS
        ))
    })?;
    let mut reduced: Vec<Option<Vec<i64>>> = vec![None; windows];
    for (i, row) in series.rows().enumerate() {
        let slot = &mut reduced[window_of(i, source_rate, target_rate)];
        match slot {
            Some(min) => {
                for (m, &v) in min.iter_mut().zip(row) {
                    *m = (*m).min(v);
                }
            }
            None => *slot = Some(row.to_vec()),
        }
    }

    let mut out = SampleSeries::new(series.width());
    let mut gap_count = 0usize;
    let mut previous: Option<Vec<i64>> = None;
    for window in reduced {
        match window {
            Some(row) => {
                previous = Some(row.clone());
                out.push(row);
            }
            None => {
                gap_count += 1;
                if let (GapPolicy::CarryForward, Some(prev)) = (gaps, &previous) {
                    out.push(prev.clone());
                }
            }
        }
    }

    if gap_count > 0 {
        tracing::debug!(
            "{} of {} windows had no source rows ({:?})",
            gap_count,
            windows,
            gaps
        );
    }
    tracing::debug!(
        "Resampled {} rows at {} Hz to {} rows at {} Hz",
        series.len(),
        source_rate,
        out.len(),
        target_rate
    );
    Ok(out)
}
