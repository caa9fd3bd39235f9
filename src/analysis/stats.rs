//! NaN-aware reductions shared by the extractors
//!
//! NaN marks a missing sample and is skipped by every helper here.
//! Arg-reductions return the first position on ties.

/// Largest non-NaN value
pub fn nan_max(values: &[f64]) -> Option<f64> {
    nan_argmax(values).map(|i| values[i])
}

/// Smallest non-NaN value
pub fn nan_min(values: &[f64]) -> Option<f64> {
    nan_argmin(values).map(|i| values[i])
}

/// Position of the first largest non-NaN value
pub fn nan_argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some(b) if v <= values[b] => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Position of the first smallest non-NaN value
pub fn nan_argmin(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some(b) if v >= values[b] => {}
            _ => best = Some(i),
        }
    }
    best
}

/// `Some(v)` unless `v` is NaN
pub fn finite_or_none(v: f64) -> Option<f64> {
    if v.is_nan() {
        None
    } else {
        Some(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_first_on_ties_skips_nan() {
        let values = [f64::NAN, 3.0, 5.0, 5.0, 1.0];
        assert_eq!(nan_argmax(&values), Some(2));
        assert_eq!(nan_max(&values), Some(5.0));
    }

    #[test]
    fn test_argmin_first_on_ties() {
        let values = [4.0, 1.0, f64::NAN, 1.0];
        assert_eq!(nan_argmin(&values), Some(1));
        assert_eq!(nan_min(&values), Some(1.0));
    }

    #[test]
    fn test_all_nan_is_none() {
        let values = [f64::NAN, f64::NAN];
        assert_eq!(nan_argmax(&values), None);
        assert_eq!(nan_min(&values), None);
        assert_eq!(nan_max(&[]), None);
    }
}
