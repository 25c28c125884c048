//! Full width at half maximum (FWHM) of a binned peak
//!
//! The estimator scans outward from the highest bin on each side until the
//! count drops below half the peak value. No fit is involved.
//!
//! # Indexing
//!
//! Counts are passed as a plain slice without an underflow slot: slice index
//! `k` is bin `k + 1` in the usual 1-based histogram numbering, and spans
//! `[bin_edges[k], bin_edges[k + 1])`.
//!
//! # Edge convention
//!
//! On the left the reported boundary is the *upper* edge of the first bin
//! below threshold; on the right it is the *lower* edge of the first bin
//! below threshold. The result is the narrowest interval whose crossing
//! points both lie inside the reported bins.
//!
//! Plateaus at the maximum resolve to the lowest index. Multi-peaked inputs
//! are not detected; the scan stops at the first crossing either way.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ratio between FWHM and the standard deviation of a Gaussian, 2 sqrt(2 ln 2).
pub const FWHM_PER_SIGMA: f64 = 2.354_820_045;

/// Errors returned by [`compute_fwhm`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FwhmError {
    /// Malformed arguments (empty counts, shape mismatch, negative counts)
    #[error("Invalid FWHM input: {0}")]
    InvalidInput(String),

    /// Well-formed histogram without any positive count
    #[error("Degenerate histogram: maximum bin content is zero")]
    DegenerateHistogram,
}

/// Result of a FWHM estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FwhmResult {
    /// Boundary of the left-side half-maximum crossing
    pub left_edge: f64,
    /// Boundary of the right-side half-maximum crossing
    pub right_edge: f64,
    /// `right_edge - left_edge`
    pub width: f64,
    /// Slice index (0-based) of the peak bin
    pub peak_index: usize,
    /// Content of the peak bin
    pub peak_value: f64,
}

impl FwhmResult {
    /// Standard deviation of a Gaussian with the same FWHM
    pub fn gaussian_sigma(&self) -> f64 {
        self.width / FWHM_PER_SIGMA
    }

    /// Half of the peak value, the threshold used by the scan
    pub fn half_maximum(&self) -> f64 {
        self.peak_value / 2.0
    }
}

/// Compute the FWHM of a binned distribution
///
/// `bin_counts` holds one non-negative count per bin, `bin_edges` the
/// `bin_counts.len() + 1` strictly increasing bin boundaries.
pub fn compute_fwhm(bin_counts: &[f64], bin_edges: &[f64]) -> Result<FwhmResult, FwhmError> {
    validate(bin_counts, bin_edges)?;

    let (peak_index, peak_value) = peak_of(bin_counts);
    if peak_value == 0.0 {
        return Err(FwhmError::DegenerateHistogram);
    }
    let half = peak_value / 2.0;

    let left_edge = (0..peak_index)
        .rev()
        .find(|&i| bin_counts[i] < half)
        .map_or(bin_edges[0], |i| bin_edges[i + 1]);

    let right_edge = (peak_index + 1..bin_counts.len())
        .find(|&j| bin_counts[j] < half)
        .map_or(bin_edges[bin_counts.len()], |j| bin_edges[j]);

    Ok(FwhmResult {
        left_edge,
        right_edge,
        width: right_edge - left_edge,
        peak_index,
        peak_value,
    })
}

/// Index and value of the first maximum
fn peak_of(bin_counts: &[f64]) -> (usize, f64) {
    let mut peak = (0, bin_counts[0]);
    for (i, &count) in bin_counts.iter().enumerate().skip(1) {
        if count > peak.1 {
            peak = (i, count);
        }
    }
    peak
}

fn validate(bin_counts: &[f64], bin_edges: &[f64]) -> Result<(), FwhmError> {
    if bin_counts.is_empty() {
        return Err(FwhmError::InvalidInput("no bins".to_string()));
    }

    if bin_edges.len() != bin_counts.len() + 1 {
        return Err(FwhmError::InvalidInput(format!(
            "expected {} bin edges for {} bins, got {}",
            bin_counts.len() + 1,
            bin_counts.len(),
            bin_edges.len()
        )));
    }

    if let Some((i, count)) = bin_counts
        .iter()
        .enumerate()
        .find(|(_, c)| !c.is_finite() || **c < 0.0)
    {
        return Err(FwhmError::InvalidInput(format!(
            "bin {} has invalid count {}",
            i, count
        )));
    }

    if bin_edges.iter().any(|e| !e.is_finite()) {
        return Err(FwhmError::InvalidInput("non-finite bin edge".to_string()));
    }

    if bin_edges.windows(2).any(|w| w[1] <= w[0]) {
        return Err(FwhmError::InvalidInput(
            "bin edges are not strictly increasing".to_string(),
        ));
    }

    Ok(())
}
