//! Form actuation speed classifier
//!
//! The form should travel at one nominal speed, or two for a two-stage
//! stroke. Speeds are taken from a median-filtered derivative, binned, and
//! the two most common bins become the cycle's speeds. A bin whose raw
//! samples stray from the filtered trace too often marks the stroke as
//! erratic.

use statrs::statistics::{Data, Median};

use crate::config::FormSpeedConfig;
use crate::types::{FormSpeed, FormStatus};

/// Sliding median of odd width `window`, zero-padded at both ends.
///
/// A window holding a missing sample yields NaN.
pub fn median_filter(values: &[f64], window: usize) -> Vec<f64> {
    let half = window / 2;
    let n = values.len() as isize;
    (0..values.len())
        .map(|center| {
            let center = center as isize;
            let samples: Vec<f64> = (center - half as isize..=center + half as isize)
                .map(|i| if i < 0 || i >= n { 0.0 } else { values[i as usize] })
                .collect();
            if samples.iter().any(|v| v.is_nan()) {
                f64::NAN
            } else {
                Data::new(samples).median()
            }
        })
        .collect()
}

fn bin_of(value: f64, tolerance: f64) -> i64 {
    (value / tolerance).round_ties_even() as i64
}

/// Classify the form trace of one segment.
pub fn classify_form_speed(form: &[f64], cfg: &FormSpeedConfig) -> FormSpeed {
    if form.len() < 2 {
        return FormSpeed::default();
    }

    let raw: Vec<f64> = form.windows(2).map(|w| (w[1] - w[0]) * cfg.rate_scale).collect();
    let mut filtered = median_filter(&raw, cfg.median_window);
    if filtered.len() >= 2 {
        let trim = cfg.edge_trim.min(filtered.len());
        let len = filtered.len();
        filtered[..trim].fill(f64::NAN);
        filtered[len - trim..].fill(f64::NAN);
    }

    let bins: Vec<Option<i64>> = filtered
        .iter()
        .map(|&v| (!v.is_nan()).then(|| bin_of(v, cfg.bin_tolerance)))
        .collect();

    // Bin counts over positive speeds, in first-seen order
    let mut counts: Vec<(i64, usize)> = Vec::new();
    for (&v, bin) in filtered.iter().zip(&bins) {
        let Some(bin) = *bin else { continue };
        if v <= 0.0 {
            continue;
        }
        match counts.iter_mut().find(|(b, _)| *b == bin) {
            Some((_, n)) => *n += 1,
            None => counts.push((bin, 1)),
        }
    }
    if counts.is_empty() {
        return FormSpeed::default();
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let modes: Vec<i64> = counts.iter().take(2).map(|&(bin, _)| bin).collect();

    let match_ratio = |mode: i64| -> Option<f64> {
        let members: Vec<usize> = (0..filtered.len())
            .filter(|&i| bins[i] == Some(mode))
            .collect();
        if members.is_empty() {
            return None;
        }
        let matches = members
            .iter()
            .filter(|&&i| (raw[i] - filtered[i]).abs() < cfg.match_tolerance)
            .count();
        Some(matches as f64 / members.len() as f64)
    };

    let erratic = modes
        .iter()
        .filter_map(|&mode| match_ratio(mode))
        .any(|ratio| ratio < cfg.min_match_ratio);

    FormSpeed {
        speed_form_1: modes.first().map(|&b| b as f64 * cfg.bin_tolerance),
        speed_form_2: modes.get(1).map(|&b| b as f64 * cfg.bin_tolerance),
        form_status: if erratic { FormStatus::Error } else { FormStatus::Ok },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> FormSpeedConfig {
        FormSpeedConfig::default()
    }

    /// Form trace built from per-sample steps
    fn trace(steps: &[f64]) -> Vec<f64> {
        let mut form = vec![0.0];
        for s in steps {
            let last = form[form.len() - 1];
            form.push(last + s);
        }
        form
    }

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn test_median_filter_zero_pads_edges() {
        let out = median_filter(&[1.0, 2.0, 3.0, 4.0, 5.0], 5);
        assert_eq!(out, vec![1.0, 2.0, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_median_filter_nan_window() {
        let out = median_filter(&[1.0, f64::NAN, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0], 5);
        assert!(out[3].is_nan());
        assert_eq!(out[5], 1.0);
    }

    #[test]
    fn test_single_speed_leaves_second_null() {
        let form = trace(&[0.5; 20]);
        let speed = classify_form_speed(&form, &cfg());
        assert!(approx(speed.speed_form_1, 6.0));
        assert_eq!(speed.speed_form_2, None);
        assert_eq!(speed.form_status, FormStatus::Ok);
    }

    #[test]
    fn test_two_stage_stroke() {
        let mut steps = vec![0.5; 15];
        steps.extend([1.0; 10]);
        let speed = classify_form_speed(&trace(&steps), &cfg());
        assert!(approx(speed.speed_form_1, 6.0));
        assert!(approx(speed.speed_form_2, 12.0));
        assert_eq!(speed.form_status, FormStatus::Ok);
    }

    #[test]
    fn test_jerky_stroke_is_error() {
        // Every third step is a jolt; the median hides it, the raw trace does not.
        let steps: Vec<f64> = (0..30).map(|i| if i % 3 == 2 { 1.5 } else { 0.5 }).collect();
        let speed = classify_form_speed(&trace(&steps), &cfg());
        assert!(approx(speed.speed_form_1, 6.0));
        assert_eq!(speed.form_status, FormStatus::Error);
    }

    #[test]
    fn test_no_positive_speed_or_too_short() {
        assert_eq!(classify_form_speed(&[3.0; 10], &cfg()), FormSpeed::default());
        assert_eq!(classify_form_speed(&[3.0], &cfg()), FormSpeed::default());
        let retracting = trace(&[-0.5; 10]);
        assert_eq!(classify_form_speed(&retracting, &cfg()), FormSpeed::default());
    }

    #[test]
    fn test_tied_bins_keep_first_seen_order() {
        // Two equally long stages: the earlier speed ranks first.
        let mut steps = vec![1.0; 10];
        steps.extend([0.5; 10]);
        let speed = classify_form_speed(&trace(&steps), &cfg());
        // 12.0 covers filtered positions 2..=9, 6.0 covers 10..=17
        assert!(approx(speed.speed_form_1, 12.0));
        assert!(approx(speed.speed_form_2, 6.0));
    }
}
