//! Fill (pour) event detection
//!
//! The pyrometer view is briefly blocked when metal is poured, which shows
//! up as a sharp step after the peak followed by a dip below the pour
//! floor. The candidate is the sample just before the step; it is accepted
//! only if its own reading is a plausible pour temperature.

use super::stats::nan_argmax;
use crate::config::{FillStrategy, FillThresholds};

/// Detect the fill Index in a row-aligned `(index, values)` window.
///
/// Returns `None` if the channel is empty or all-NaN, if no step/dip pair
/// follows the peak, or if range validation rejects the candidate (under
/// [`FillStrategy::Strict`], the first rejection ends the search).
pub fn detect_fill(index: &[u64], values: &[f64], thresholds: &FillThresholds) -> Option<u64> {
    debug_assert_eq!(index.len(), values.len());

    let peak = nan_argmax(values)?;

    for i in peak..values.len().saturating_sub(1) {
        let (current, next) = (values[i], values[i + 1]);
        if current.is_nan() || next.is_nan() {
            continue;
        }
        if (next - current).abs() <= thresholds.drop_threshold {
            continue;
        }

        let window_end = (i + thresholds.dip_window).min(values.len());
        let dipped = values[i..window_end]
            .iter()
            .any(|&v| v < thresholds.dip_threshold);
        if !dipped {
            continue;
        }

        if (thresholds.valid_min..=thresholds.valid_max).contains(&current) {
            return Some(index[i]);
        }
        match thresholds.strategy {
            FillStrategy::Strict => return None,
            FillStrategy::ContinueScan => continue,
        }
    }

    None
}
