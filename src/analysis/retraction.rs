//! Form retraction detection and the companion readings taken at it

use super::holding::ThermocouplePairs;
use super::stats::finite_or_none;
use crate::types::ReturnTemperatures;

/// First Index where the form starts a retraction of `window` strictly
/// decreasing samples, the starting sample included.
///
/// `index` and `form` cover one segment. Window members are addressed by
/// Index value; a window that runs past the segment end, or that has a
/// gap in the Index axis, is skipped.
pub fn find_retraction(index: &[u64], form: &[f64], window: usize) -> Option<u64> {
    let &end = index.last()?;
    let reach = window.saturating_sub(1) as u64;

    for pos in 1..form.len() {
        let stepped_down = form[pos] < form[pos - 1];
        if !stepped_down {
            continue;
        }
        let start = index[pos];
        if start + reach > end {
            continue;
        }

        let samples: Option<Vec<f64>> = (start..=start + reach)
            .map(|idx| index.binary_search(&idx).ok().map(|p| form[p]))
            .collect();
        let Some(samples) = samples else {
            continue;
        };

        if samples.windows(2).all(|w| w[0] > w[1]) {
            return Some(start);
        }
    }
    None
}

/// D/T readings at the start of the first retraction, or all `None`.
pub fn return_temperatures(
    index: &[u64],
    form: &[f64],
    pairs: ThermocouplePairs<'_>,
    window: usize,
) -> ReturnTemperatures {
    let Some(at) = find_retraction(index, form, window) else {
        return ReturnTemperatures::default();
    };
    let Ok(pos) = index.binary_search(&at) else {
        return ReturnTemperatures::default();
    };
    ReturnTemperatures {
        return_dl: finite_or_none(pairs.left_d[pos]),
        return_dr: finite_or_none(pairs.right_d[pos]),
        return_tl: finite_or_none(pairs.left_t[pos]),
        return_tr: finite_or_none(pairs.right_t[pos]),
    }
}
