//! Time and temperature aggregation around the fill event

use super::stats::nan_max;
use crate::config::HoldingConfig;

/// Inclusive temperature band considered "held near the peak".
///
/// Peaks above `high_cutoff` use the fixed floor `high_floor`; lower peaks
/// use a band of `band_width` ending at the peak.
pub fn holding_band(max_value: f64, cfg: &HoldingConfig) -> (f64, f64) {
    if max_value > cfg.high_cutoff {
        (cfg.high_floor, max_value)
    } else {
        (max_value - cfg.band_width, max_value)
    }
}

/// Holding duration and the gap from the end of holding to the fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HoldingTimes {
    /// Seconds spent inside the holding band
    pub holding_time: Option<u64>,
    /// Seconds between the last in-band sample and the fill
    pub time_to_pour: Option<u64>,
}

/// Holding time of a whole temperature series against an external peak.
///
/// Both outputs are `None` without a fill or without any in-band sample.
pub fn holding_and_pour_time(
    index: &[u64],
    values: &[f64],
    max_value: f64,
    fill: Option<u64>,
    cfg: &HoldingConfig,
    period_secs: u64,
) -> HoldingTimes {
    let Some(fill) = fill else {
        return HoldingTimes::default();
    };

    let (low, high) = holding_band(max_value, cfg);
    let in_band: Vec<u64> = index
        .iter()
        .zip(values)
        .filter(|&(_, &v)| v >= low && v <= high)
        .map(|(&idx, _)| idx)
        .collect();

    let Some(&last) = in_band.last() else {
        return HoldingTimes::default();
    };

    HoldingTimes {
        holding_time: Some(in_band.len() as u64 * period_secs),
        time_to_pour: Some(fill.abs_diff(last) * period_secs),
    }
}

/// Seconds from the peak to the fill; `None` if the fill precedes the peak.
pub fn full_holding_time(peak: u64, fill: u64, period_secs: u64) -> Option<u64> {
    (fill >= peak).then(|| (fill - peak) * period_secs)
}

/// Seconds a segment's pyrometer stays near the segment's own peak.
///
/// Peaks above `segment_high_cutoff` count every sample at or above the
/// cutoff; otherwise samples within `band_width` below the peak count.
pub fn segment_holding_time(values: &[f64], cfg: &HoldingConfig, period_secs: u64) -> u64 {
    let Some(peak) = nan_max(values) else {
        return 0;
    };

    let count = if peak > cfg.segment_high_cutoff {
        values.iter().filter(|&&v| v >= cfg.segment_high_cutoff).count()
    } else {
        let low = peak - cfg.band_width;
        values.iter().filter(|&&v| v >= low && v <= peak).count()
    };
    count as u64 * period_secs
}

/// Row-aligned D/T thermocouple pairs of the holding window
#[derive(Debug, Clone, Copy)]
pub struct ThermocouplePairs<'a> {
    pub left_d: &'a [f64],
    pub right_d: &'a [f64],
    pub left_t: &'a [f64],
    pub right_t: &'a [f64],
}

/// Minutes during which some D reading and some T reading both exceed
/// `threshold`.
pub fn thermocouple_holding_minutes(pairs: ThermocouplePairs<'_>, threshold: f64, period_secs: u64) -> f64 {
    let hot = |v: f64| v > threshold;
    let rows = pairs
        .left_d
        .iter()
        .zip(pairs.right_d)
        .zip(pairs.left_t.iter().zip(pairs.right_t))
        .filter(|&((&dl, &dr), (&tl, &tr))| (hot(dl) || hot(dr)) && (hot(tl) || hot(tr)))
        .count();
    rows as f64 * period_secs as f64 / 60.0
}

/// First Index, after the first row, where the pyrometer differs from its
/// predecessor. A NaN neighbour always counts as a change.
pub fn heating_start(index: &[u64], values: &[f64]) -> Option<u64> {
    values
        .windows(2)
        .position(|w| w[1] != w[0])
        .map(|pos| index[pos + 1])
}

/// Heating duration in minutes over the inclusive Index window
/// `[start, end]`; zero when the window is empty.
pub fn heating_minutes(start: u64, end: u64, period_secs: u64) -> f64 {
    (end + 1).saturating_sub(start) as f64 * period_secs as f64 / 60.0
}

/// Highest thermocouple reading not above the sensor-fault ceiling
pub fn thermocouple_max(values: &[f64], max_valid: f64) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|&v| v <= max_valid)
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> HoldingConfig {
        HoldingConfig::default()
    }

    #[test]
    fn test_band_selection() {
        assert_eq!(holding_band(1650.0, &cfg()), (1600.0, 1650.0));
        assert_eq!(holding_band(1610.0, &cfg()), (1590.0, 1610.0));
        // exactly at the cutoff uses the relative band
        assert_eq!(holding_band(1620.0, &cfg()), (1600.0, 1620.0));
    }

    #[test]
    fn test_holding_and_pour_time() {
        let index = [1, 2, 3, 4, 5, 6];
        let values = [1500.0, 1605.0, 1650.0, 1620.0, 1590.0, 1400.0];
        let times = holding_and_pour_time(&index, &values, 1650.0, Some(6), &cfg(), 5);
        assert_eq!(times.holding_time, Some(15));
        assert_eq!(times.time_to_pour, Some(10));
    }

    #[test]
    fn test_time_to_pour_is_absolute() {
        let index = [1, 2, 3];
        let values = [1000.0, 1000.0, 1700.0];
        let times = holding_and_pour_time(&index, &values, 1700.0, Some(1), &cfg(), 5);
        assert_eq!(times.holding_time, Some(5));
        assert_eq!(times.time_to_pour, Some(10));
    }

    #[test]
    fn test_no_fill_or_no_band_samples() {
        let index = [1, 2];
        let values = [1000.0, 1000.0];
        assert_eq!(
            holding_and_pour_time(&index, &values, 1650.0, None, &cfg(), 5),
            HoldingTimes::default()
        );
        assert_eq!(
            holding_and_pour_time(&index, &values, 1650.0, Some(2), &cfg(), 5),
            HoldingTimes::default()
        );
    }

    #[test]
    fn test_full_holding_time_guards_order() {
        assert_eq!(full_holding_time(3, 7, 5), Some(20));
        assert_eq!(full_holding_time(7, 7, 5), Some(0));
        assert_eq!(full_holding_time(8, 7, 5), None);
    }

    #[test]
    fn test_segment_holding_high_peak() {
        let values = [1500.0, 1600.0, 1640.0, 1610.0, 1599.0];
        assert_eq!(segment_holding_time(&values, &cfg(), 5), 15);
    }

    #[test]
    fn test_segment_holding_low_peak() {
        let values = [1500.0, 1580.0, 1595.0, 1575.0, f64::NAN];
        assert_eq!(segment_holding_time(&values, &cfg(), 5), 15);
        assert_eq!(segment_holding_time(&[f64::NAN], &cfg(), 5), 0);
    }

    #[test]
    fn test_thermocouple_holding_pairs() {
        let pairs = ThermocouplePairs {
            left_d: &[1510.0, 1400.0, 1400.0, f64::NAN],
            right_d: &[1400.0, 1520.0, 1400.0, 1600.0],
            left_t: &[1400.0, 1400.0, 1600.0, 1600.0],
            right_t: &[1501.0, 1530.0, 1600.0, 1400.0],
        };
        // rows 0, 1 and 3 have a hot D and a hot T; row 2 has no hot D
        let minutes = thermocouple_holding_minutes(pairs, 1500.0, 5);
        assert!((minutes - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_heating_start_and_duration() {
        let index = [10, 11, 12, 13];
        assert_eq!(heating_start(&index, &[20.0, 20.0, 21.0, 22.0]), Some(12));
        assert_eq!(heating_start(&index, &[20.0; 4]), None);
        assert_eq!(heating_start(&index, &[f64::NAN, f64::NAN, 1.0, 1.0]), Some(11));
        assert!((heating_minutes(12, 23, 5) - 1.0).abs() < 1e-12);
        assert_eq!(heating_minutes(13, 12, 5), 0.0);
    }

    #[test]
    fn test_thermocouple_max_drops_faults() {
        assert_eq!(thermocouple_max(&[1500.0, 1800.0, f64::NAN, 1690.0], 1700.0), Some(1690.0));
        assert_eq!(thermocouple_max(&[1800.0], 1700.0), None);
    }
}
