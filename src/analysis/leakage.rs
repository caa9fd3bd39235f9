//! Leak-rate estimation over form-closed pressure readings
//!
//! With the form closed and the pumps idle, chamber pressure creeps up at
//! the leak rate. Such ramps sit between stretches at the resting
//! ("stable") pressure. Each ramp whose per-sample growth is dominated by
//! the expected band is measured, and the last one in the stream wins.

use std::ops::Range;

use super::stats::{nan_argmax, nan_argmin};
use crate::config::LeakageConfig;
use crate::types::LeakageMeasurement;

/// Scaled pressure of rows with the form closed and pressure under the cap.
///
/// Rows with a missing pressure or form reading are dropped.
pub fn closed_form_pressure(pressure: &[f64], form: &[f64], cfg: &LeakageConfig) -> Vec<f64> {
    pressure
        .iter()
        .zip(form)
        .map(|(&p, &f)| (p * cfg.pressure_scale, f))
        .filter(|&(p, f)| p <= cfg.pressure_cap && f == 0.0)
        .map(|(p, _)| p)
        .collect()
}

/// Center of the most populated histogram bin, first bin on ties.
///
/// Bins span the observed range; a constant series gets a unit-wide range
/// around its value.
pub fn stable_value(values: &[f64], bins: usize) -> Option<f64> {
    let lo = values.iter().copied().reduce(f64::min)?;
    let hi = values.iter().copied().reduce(f64::max)?;
    let (lo, hi) = if lo == hi { (lo - 0.5, hi + 0.5) } else { (lo, hi) };
    let bins = bins.max(1);
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in values {
        let k = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[k] += 1;
    }

    let best = counts
        .iter()
        .enumerate()
        .fold((0, 0), |(bk, bn), (k, &n)| if n > bn { (k, n) } else { (bk, bn) })
        .0;
    Some(lo + (best as f64 + 0.5) * width)
}

/// Maximal runs of consecutive positions within `tolerance` of `stable`,
/// as inclusive `(first, last)` position pairs.
pub fn stable_intervals(values: &[f64], stable: f64, tolerance: f64) -> Vec<(usize, usize)> {
    let mut intervals = Vec::new();
    let mut open: Option<(usize, usize)> = None;

    for (pos, &v) in values.iter().enumerate() {
        if v >= stable - tolerance && v <= stable + tolerance {
            open = match open {
                Some((first, last)) if last + 1 == pos => Some((first, pos)),
                Some(run) => {
                    intervals.push(run);
                    Some((pos, pos))
                }
                None => Some((pos, pos)),
            };
        }
    }
    intervals.extend(open);
    intervals
}

/// Whether the growth band `[low, high)` is the most populated band of a
/// band grid anchored on it. Ties go to the lowest band.
pub fn is_valid_growth(deltas: &[f64], cfg: &LeakageConfig) -> bool {
    let (Some(min), Some(max)) = (
        deltas.iter().copied().reduce(f64::min),
        deltas.iter().copied().reduce(f64::max),
    ) else {
        return false;
    };

    let base = cfg.growth_band_low;
    let width = cfg.growth_band_high - cfg.growth_band_low;

    // (band number, lower edge), band 0 being the growth band itself
    let mut bands: Vec<(i64, f64)> = Vec::new();
    let mut k = 0i64;
    while base + k as f64 * width <= max + width {
        bands.push((k, base + k as f64 * width));
        k += 1;
    }
    let mut j = 0i64;
    while base - j as f64 * width >= min - width {
        bands.push((-(j + 1), base - (j + 1) as f64 * width));
        j += 1;
    }
    bands.sort_by_key(|&(k, _)| k);

    let mut counts = vec![0usize; bands.len()];
    for &d in deltas {
        if let Some(slot) = bands.iter().position(|&(_, lo)| lo <= d && d < lo + width) {
            counts[slot] += 1;
        }
    }

    let winner = counts
        .iter()
        .enumerate()
        .fold((0, 0), |(bi, bn), (i, &n)| if n > bn { (i, n) } else { (bi, bn) })
        .0;
    bands.get(winner).is_some_and(|&(k, _)| k == 0)
}

/// Measure the rate of one widened ramp.
///
/// The minimum of the first half anchors the start, skipped forward past
/// the stabilization period when room allows; the overall maximum bounds
/// the end. At most `target_offset` samples are measured.
pub fn measure_ramp(ramp: &[f64], cfg: &LeakageConfig) -> Option<LeakageMeasurement> {
    if ramp.len() < cfg.min_samples {
        return None;
    }

    let start = nan_argmin(&ramp[..ramp.len() / 2])?;
    let end = nan_argmax(ramp)?;

    let mut calc_start = start + cfg.stabilization_skip;
    if calc_start >= end {
        calc_start = start;
    }
    if end <= calc_start {
        return None;
    }

    let (calc_end, rows) = if calc_start + cfg.target_offset <= end {
        (calc_start + cfg.target_offset, cfg.target_offset)
    } else {
        (end, end - calc_start)
    };

    Some(LeakageMeasurement {
        offset: rows,
        rate: (ramp[calc_end] - ramp[calc_start]) * cfg.volume_coefficient / rows as f64,
    })
}

/// Candidate ramps between stable stretches, widened for measurement.
///
/// Yields `(candidate, widened)` position ranges in stream order: the
/// lead-in before the first stable stretch, each gap between stretches,
/// then the trail after the last one.
fn candidate_ramps(len: usize, intervals: &[(usize, usize)], widen: usize) -> Vec<(Range<usize>, Range<usize>)> {
    let (Some(&(first_start, _)), Some(&(_, last_end))) = (intervals.first(), intervals.last()) else {
        return Vec::new();
    };

    let mut ramps = vec![(0..first_start, 0..(first_start + widen).min(len))];
    for pair in intervals.windows(2) {
        let (gap_start, gap_end) = (pair[0].1 + 1, pair[1].0);
        ramps.push((
            gap_start..gap_end,
            pair[0].1.saturating_sub(widen)..(gap_end + widen).min(len),
        ));
    }
    ramps.push((last_end + 1..len, last_end.saturating_sub(widen)..len));
    ramps
}

/// The last valid leak-rate measurement of a stream, if any.
pub fn last_valid_leakage(pressure: &[f64], form: &[f64], cfg: &LeakageConfig) -> Option<LeakageMeasurement> {
    let closed = closed_form_pressure(pressure, form, cfg);
    let stable = stable_value(&closed, cfg.histogram_bins)?;
    let intervals = stable_intervals(&closed, stable, cfg.stable_tolerance);

    let mut latest = None;
    for (candidate, widened) in candidate_ramps(closed.len(), &intervals, cfg.widen) {
        let ramp = &closed[candidate];
        if ramp.is_empty() || ramp.iter().any(|&p| p > cfg.pressure_cap) {
            continue;
        }
        let deltas: Vec<f64> = ramp.windows(2).map(|w| w[1] - w[0]).collect();
        if !is_valid_growth(&deltas, cfg) {
            continue;
        }
        if let Some(m) = measure_ramp(&closed[widened], cfg) {
            if m.offset >= cfg.min_valid_offset {
                latest = Some(m);
            }
        }
    }
    latest
}
