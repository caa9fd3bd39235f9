//! Pressure / vacuum extrema over a heating window

use super::stats::{nan_max, nan_min};
use crate::types::Segment;

/// Index of the first sample whose step from its predecessor exceeds
/// `threshold`. Pairs with a missing sample are skipped.
pub fn first_temperature_change(index: &[u64], values: &[f64], threshold: f64) -> Option<u64> {
    values
        .windows(2)
        .position(|w| !w[0].is_nan() && !w[1].is_nan() && (w[1] - w[0]).abs() > threshold)
        .map(|pos| index[pos + 1])
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PressureExtrema {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Min and max of `values` over the rows whose Index lies in `window`.
///
/// `index` must be sorted. An empty or all-NaN window yields `None` for both.
pub fn pressure_extrema(index: &[u64], values: &[f64], window: Segment) -> PressureExtrema {
    let from = index.partition_point(|&i| i < window.start);
    let to = index.partition_point(|&i| i <= window.end);
    if from >= to {
        return PressureExtrema::default();
    }
    let slice = &values[from..to];
    PressureExtrema {
        min: nan_min(slice),
        max: nan_max(slice),
    }
}
