//! Property tests for the FWHM estimator

use beamscan_stats::{compute_fwhm, FwhmError, Histogram1D};
use proptest::prelude::*;

fn unit_edges(n: usize) -> Vec<f64> {
    (0..=n).map(|i| i as f64).collect()
}

fn counts_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0u32..1000, 1..40).prop_map(|v| v.into_iter().map(f64::from).collect())
}

// === Worked example ===

#[test]
fn test_documented_example() {
    let result = compute_fwhm(&[1.0, 2.0, 10.0, 3.0, 1.0], &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
    assert_eq!(result.left_edge, 2.0);
    assert_eq!(result.right_edge, 3.0);
    assert_eq!(result.width, 1.0);
}

#[test]
fn test_histogram_and_slices_agree() {
    let mut hist = Histogram1D::uniform(20, -10.0, 10.0).unwrap();
    for (x, n) in [(-0.5, 40), (0.5, 38), (-1.5, 25), (1.5, 22), (2.5, 9), (-2.5, 11)] {
        for _ in 0..n {
            hist.fill(x);
        }
    }

    let from_hist = hist.fwhm().unwrap();
    let from_slices = compute_fwhm(hist.counts(), hist.edges()).unwrap();
    assert_eq!(from_hist, from_slices);
    assert_eq!(from_hist.left_edge, -2.0);
    assert_eq!(from_hist.right_edge, 2.0);
}

#[test]
fn test_all_zero_histogram_is_degenerate() {
    let hist = Histogram1D::uniform(8, 0.0, 1.0).unwrap();
    assert_eq!(hist.fwhm().unwrap_err(), FwhmError::DegenerateHistogram);
}

// === Properties ===

proptest! {
    #[test]
    fn test_scale_invariance(counts in counts_strategy(), factor in 0.01f64..1000.0) {
        prop_assume!(counts.iter().any(|&c| c > 0.0));
        let edges = unit_edges(counts.len());
        let scaled: Vec<f64> = counts.iter().map(|c| c * factor).collect();

        let a = compute_fwhm(&counts, &edges).unwrap();
        let b = compute_fwhm(&scaled, &edges).unwrap();

        prop_assert_eq!(a.left_edge, b.left_edge);
        prop_assert_eq!(a.right_edge, b.right_edge);
        prop_assert_eq!(a.width, b.width);
    }

    #[test]
    fn test_rectangular_peak_width(
        n in 3usize..40,
        start in 0usize..40,
        len in 1usize..40,
        height in 1.0f64..1e6,
    ) {
        prop_assume!(start < n);
        let end = (start + len - 1).min(n - 1);
        let mut counts = vec![0.0; n];
        counts[start..=end].iter_mut().for_each(|c| *c = height);

        let result = compute_fwhm(&counts, &unit_edges(n)).unwrap();

        prop_assert_eq!(result.left_edge, start as f64);
        prop_assert_eq!(result.right_edge, (end + 1) as f64);
        prop_assert_eq!(result.width, (end - start + 1) as f64);
    }

    #[test]
    fn test_symmetric_peak_is_centred(half in prop::collection::vec(0u32..500, 0..15), peak in 501u32..2000) {
        // Mirror `half` around a strictly dominant centre bin
        let mut counts: Vec<f64> = half.iter().rev().map(|&c| f64::from(c)).collect();
        let centre = counts.len();
        counts.push(f64::from(peak));
        counts.extend(half.iter().map(|&c| f64::from(c)));

        let result = compute_fwhm(&counts, &unit_edges(counts.len())).unwrap();
        let centre_x = centre as f64 + 0.5;

        prop_assert_eq!(result.peak_index, centre);
        prop_assert!((centre_x - result.left_edge - (result.right_edge - centre_x)).abs() < 1e-9);
    }

    #[test]
    fn test_interval_contains_peak(counts in counts_strategy()) {
        prop_assume!(counts.iter().any(|&c| c > 0.0));
        let edges = unit_edges(counts.len());
        let result = compute_fwhm(&counts, &edges).unwrap();

        prop_assert!(result.left_edge <= edges[result.peak_index]);
        prop_assert!(result.right_edge >= edges[result.peak_index + 1]);
        prop_assert!(result.width > 0.0);
        prop_assert!(result.left_edge >= edges[0]);
        prop_assert!(result.right_edge <= edges[counts.len()]);
    }

    #[test]
    fn test_peak_at_boundaries(tail in prop::collection::vec(0u32..100, 0..20)) {
        let mut first = vec![1000.0];
        first.extend(tail.iter().map(|&c| f64::from(c)));
        let edges = unit_edges(first.len());
        prop_assert_eq!(compute_fwhm(&first, &edges).unwrap().left_edge, edges[0]);

        let last: Vec<f64> = first.iter().rev().copied().collect();
        prop_assert_eq!(compute_fwhm(&last, &edges).unwrap().right_edge, edges[last.len()]);
    }

    #[test]
    fn test_wrong_edge_count_is_invalid(counts in counts_strategy(), extra in 1usize..4) {
        let edges = unit_edges(counts.len() + extra);
        let is_invalid = matches!(compute_fwhm(&counts, &edges), Err(FwhmError::InvalidInput(_)));
        prop_assert!(is_invalid);
    }
}
