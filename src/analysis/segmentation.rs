//! Cycle segmentation over the form channel
//!
//! A cycle is a maximal run of consecutive rows whose delimiter value is
//! non-zero. A missing (NaN) delimiter sample is not zero, so it keeps a
//! run open.

use crate::types::Segment;

/// Whether a delimiter sample marks the form as active
#[inline]
pub fn is_active(value: f64) -> bool {
    value != 0.0
}

/// Split the Index axis into maximal active runs of `delimiter`.
///
/// `index` and `delimiter` are row-aligned. The returned segments are
/// sorted and disjoint; a run still open at the last row closes there.
pub fn segment_by_delimiter(index: &[u64], delimiter: &[f64]) -> Vec<Segment> {
    debug_assert_eq!(index.len(), delimiter.len());

    let mut segments = Vec::new();
    let mut open: Option<u64> = None;

    for (pos, (&idx, &value)) in index.iter().zip(delimiter).enumerate() {
        if is_active(value) {
            if open.is_none() {
                open = Some(idx);
            }
        } else if let Some(start) = open.take() {
            segments.push(Segment::new(start, index[pos - 1]));
        }
    }

    if let (Some(start), Some(&last)) = (open, index.last()) {
        segments.push(Segment::new(start, last));
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn one_based(n: usize) -> Vec<u64> {
        (1..=n as u64).collect()
    }

    #[test]
    fn test_runs_become_segments() {
        let form = [0.0, 1.0, 2.0, 0.0, 0.0, 3.0, 0.0];
        let segs = segment_by_delimiter(&one_based(form.len()), &form);
        assert_eq!(segs, vec![Segment::new(2, 3), Segment::new(6, 6)]);
    }

    #[test]
    fn test_open_run_closes_at_last_index() {
        let form = [0.0, 5.0, 5.0];
        let segs = segment_by_delimiter(&one_based(3), &form);
        assert_eq!(segs, vec![Segment::new(2, 3)]);
    }

    #[test]
    fn test_all_zero_and_all_active() {
        assert!(segment_by_delimiter(&one_based(4), &[0.0; 4]).is_empty());
        assert_eq!(
            segment_by_delimiter(&one_based(4), &[1.0; 4]),
            vec![Segment::new(1, 4)]
        );
        assert!(segment_by_delimiter(&[], &[]).is_empty());
    }

    #[test]
    fn test_nan_continues_a_run() {
        let form = [1.0, f64::NAN, 1.0, 0.0];
        let segs = segment_by_delimiter(&one_based(4), &form);
        assert_eq!(segs, vec![Segment::new(1, 3)]);
        // a run may also open on a missing sample
        let segs = segment_by_delimiter(&one_based(3), &[0.0, f64::NAN, 0.0]);
        assert_eq!(segs, vec![Segment::new(2, 2)]);
    }

    #[test]
    fn test_segments_follow_index_values_not_positions() {
        let index = [10, 11, 12, 20, 21];
        let form = [1.0, 1.0, 0.0, 2.0, 2.0];
        let segs = segment_by_delimiter(&index, &form);
        assert_eq!(segs, vec![Segment::new(10, 11), Segment::new(20, 21)]);
    }

    #[test]
    fn test_random_sequences_cover_exactly_the_active_rows() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..200 {
            let n = rng.gen_range(0..60);
            let form: Vec<f64> = (0..n)
                .map(|_| if rng.gen_bool(0.5) { 0.0 } else { rng.gen_range(1..4) as f64 })
                .collect();
            let index = one_based(n);
            let segs = segment_by_delimiter(&index, &form);

            for pair in segs.windows(2) {
                // sorted, disjoint and separated by at least one inactive row
                assert!(pair[0].end + 1 < pair[1].start);
            }
            for (pos, &v) in form.iter().enumerate() {
                let idx = index[pos];
                let covered = segs.iter().any(|s| s.contains(idx));
                assert_eq!(covered, v != 0.0, "row {idx} value {v}");
            }
        }
    }
}
