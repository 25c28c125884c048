//! One-dimensional binned histogram
//!
//! `Histogram1D` is an immutable-by-default value type holding bin edges,
//! per-bin counts and the two flow counters. Bins are addressed with 0-based
//! indices; underflow and overflow are never part of the count slice and are
//! reached through [`BinPosition`] instead.
//!
//! Statistics (`mean`, `rms`, `integral`) are computed from bin centres and
//! in-range contents only.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fwhm::{compute_fwhm, FwhmError, FwhmResult};

/// Errors raised while building or editing histograms
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HistogramError {
    #[error("Invalid bin edges: {0}")]
    InvalidEdges(String),

    #[error("Shape mismatch: {edges} edges cannot hold {counts} bins")]
    ShapeMismatch { edges: usize, counts: usize },

    #[error("Bin {index} out of range (histogram has {n_bins} bins)")]
    BinOutOfRange { index: usize, n_bins: usize },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("FWHM failed: {0}")]
    Fwhm(#[from] FwhmError),
}

/// Result type for histogram operations
pub type StatsResult<T> = Result<T, HistogramError>;

/// Where a coordinate falls along a binned axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinPosition {
    /// Below the lowest edge
    Underflow,
    /// In-range bin (0-based)
    Bin(usize),
    /// At or above the highest edge, or NaN
    Overflow,
}

impl BinPosition {
    /// The in-range bin index, if any
    pub fn index(&self) -> Option<usize> {
        match self {
            BinPosition::Bin(i) => Some(*i),
            _ => None,
        }
    }
}

/// Serialized form; deserialization goes through validation
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Histogram1DData {
    edges: Vec<f64>,
    counts: Vec<f64>,
    #[serde(default)]
    underflow: f64,
    #[serde(default)]
    overflow: f64,
}

/// A 1D histogram with explicit bin edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Histogram1DData", into = "Histogram1DData")]
pub struct Histogram1D {
    edges: Vec<f64>,
    counts: Vec<f64>,
    underflow: f64,
    overflow: f64,
}

impl TryFrom<Histogram1DData> for Histogram1D {
    type Error = HistogramError;

    fn try_from(data: Histogram1DData) -> StatsResult<Self> {
        let hist = Histogram1D::new(data.edges, data.counts)?;
        Ok(hist.with_flow(data.underflow, data.overflow))
    }
}

impl From<Histogram1D> for Histogram1DData {
    fn from(hist: Histogram1D) -> Self {
        Self {
            edges: hist.edges,
            counts: hist.counts,
            underflow: hist.underflow,
            overflow: hist.overflow,
        }
    }
}

impl Histogram1D {
    /// Build a histogram from edges and per-bin counts
    pub fn new(edges: Vec<f64>, counts: Vec<f64>) -> StatsResult<Self> {
        validate_edges(&edges)?;
        if counts.len() + 1 != edges.len() {
            return Err(HistogramError::ShapeMismatch {
                edges: edges.len(),
                counts: counts.len(),
            });
        }
        if let Some(c) = counts.iter().find(|c| !c.is_finite()) {
            return Err(HistogramError::InvalidValue(format!(
                "non-finite bin content {}",
                c
            )));
        }

        Ok(Self {
            edges,
            counts,
            underflow: 0.0,
            overflow: 0.0,
        })
    }

    /// Build an empty histogram over the given edges
    pub fn with_edges(edges: Vec<f64>) -> StatsResult<Self> {
        let n = edges.len().saturating_sub(1);
        Self::new(edges, vec![0.0; n])
    }

    /// Build an empty histogram with `n_bins` equal-width bins over `[low, high)`
    pub fn uniform(n_bins: usize, low: f64, high: f64) -> StatsResult<Self> {
        if n_bins == 0 {
            return Err(HistogramError::InvalidEdges("zero bins".to_string()));
        }
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(HistogramError::InvalidEdges(format!(
                "invalid range [{}, {})",
                low, high
            )));
        }

        let width = (high - low) / n_bins as f64;
        let mut edges: Vec<f64> = (0..n_bins).map(|i| low + width * i as f64).collect();
        edges.push(high);
        Self::with_edges(edges)
    }

    /// Assemble a histogram from parts that are already known to be valid
    pub(crate) fn from_parts(edges: Vec<f64>, counts: Vec<f64>, underflow: f64, overflow: f64) -> Self {
        debug_assert_eq!(edges.len(), counts.len() + 1);
        Self {
            edges,
            counts,
            underflow,
            overflow,
        }
    }

    /// Set the underflow and overflow contents
    pub fn with_flow(mut self, underflow: f64, overflow: f64) -> Self {
        self.underflow = underflow;
        self.overflow = overflow;
        self
    }

    /// Number of in-range bins
    pub fn n_bins(&self) -> usize {
        self.counts.len()
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    pub fn underflow(&self) -> f64 {
        self.underflow
    }

    pub fn overflow(&self) -> f64 {
        self.overflow
    }

    /// Lower edge of the first bin
    pub fn low(&self) -> f64 {
        self.edges[0]
    }

    /// Upper edge of the last bin
    pub fn high(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    /// Locate the bin containing `x`
    pub fn find_bin(&self, x: f64) -> BinPosition {
        locate(&self.edges, x)
    }

    /// Content of bin `index`, `None` when out of range
    pub fn bin_content(&self, index: usize) -> Option<f64> {
        self.counts.get(index).copied()
    }

    /// Content at any position, including the flow bins
    pub fn content_at(&self, position: BinPosition) -> f64 {
        match position {
            BinPosition::Underflow => self.underflow,
            BinPosition::Bin(i) => self.counts.get(i).copied().unwrap_or(0.0),
            BinPosition::Overflow => self.overflow,
        }
    }

    pub fn bin_low_edge(&self, index: usize) -> Option<f64> {
        (index < self.n_bins()).then(|| self.edges[index])
    }

    pub fn bin_upper_edge(&self, index: usize) -> Option<f64> {
        (index < self.n_bins()).then(|| self.edges[index + 1])
    }

    pub fn bin_center(&self, index: usize) -> Option<f64> {
        (index < self.n_bins()).then(|| 0.5 * (self.edges[index] + self.edges[index + 1]))
    }

    pub fn bin_width(&self, index: usize) -> Option<f64> {
        (index < self.n_bins()).then(|| self.edges[index + 1] - self.edges[index])
    }

    /// Overwrite the content of bin `index`
    pub fn set_bin_content(&mut self, index: usize, value: f64) -> StatsResult<()> {
        if !value.is_finite() {
            return Err(HistogramError::InvalidValue(format!(
                "non-finite bin content {}",
                value
            )));
        }
        let n_bins = self.n_bins();
        let slot = self
            .counts
            .get_mut(index)
            .ok_or(HistogramError::BinOutOfRange { index, n_bins })?;
        *slot = value;
        Ok(())
    }

    /// Add one entry at `x`
    pub fn fill(&mut self, x: f64) {
        self.fill_weighted(x, 1.0);
    }

    /// Add an entry of weight `w` at `x`; NaN coordinates are ignored
    pub fn fill_weighted(&mut self, x: f64, w: f64) {
        if x.is_nan() {
            return;
        }
        match self.find_bin(x) {
            BinPosition::Underflow => self.underflow += w,
            BinPosition::Bin(i) => self.counts[i] += w,
            BinPosition::Overflow => self.overflow += w,
        }
    }

    /// Sum of in-range bin contents
    pub fn integral(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Sum of contents of bins `first..=last`
    ///
    /// An empty range (`first > last`) integrates to zero.
    pub fn integral_range(&self, first: usize, last: usize) -> StatsResult<f64> {
        if last >= self.n_bins() {
            return Err(HistogramError::BinOutOfRange {
                index: last,
                n_bins: self.n_bins(),
            });
        }
        if first > last {
            return Ok(0.0);
        }
        Ok(self.counts[first..=last].iter().sum())
    }

    /// Content-weighted mean of the bin centres
    pub fn mean(&self) -> Option<f64> {
        let total = self.integral();
        if total == 0.0 {
            return None;
        }
        let sum: f64 = self
            .counts
            .iter()
            .enumerate()
            .map(|(i, c)| c * self.center_unchecked(i))
            .sum();
        Some(sum / total)
    }

    /// Content-weighted standard deviation of the bin centres
    pub fn rms(&self) -> Option<f64> {
        let total = self.integral();
        let mean = self.mean()?;
        let sum: f64 = self
            .counts
            .iter()
            .enumerate()
            .map(|(i, c)| c * (self.center_unchecked(i) - mean).powi(2))
            .sum();
        Some((sum / total).max(0.0).sqrt())
    }

    /// Standard error of the mean, `rms / sqrt(integral)`
    pub fn standard_error(&self) -> Option<f64> {
        let total = self.integral();
        if total <= 0.0 {
            return None;
        }
        Some(self.rms()? / total.sqrt())
    }

    /// Index of the first bin holding the maximum content
    pub fn maximum_bin(&self) -> usize {
        let mut best = 0;
        for (i, &c) in self.counts.iter().enumerate().skip(1) {
            if c > self.counts[best] {
                best = i;
            }
        }
        best
    }

    /// Largest bin content
    pub fn maximum(&self) -> f64 {
        self.counts[self.maximum_bin()]
    }

    /// Maximum content, skipping over `bin` if it holds the maximum
    ///
    /// Used to ignore a dominant pedestal bin: when `bin` is the maximum bin,
    /// the result is the largest content strictly below it, or `None` if no
    /// other content is smaller.
    pub fn maximum_except_bin(&self, bin: usize) -> Option<f64> {
        let max_bin = self.maximum_bin();
        let max = self.counts[max_bin];
        if max_bin != bin {
            return Some(max);
        }
        self.counts
            .iter()
            .copied()
            .filter(|&c| c < max)
            .fold(None, |acc: Option<f64>, c| Some(acc.map_or(c, |a| a.max(c))))
    }

    /// First bin whose content equals `value`
    pub fn bin_with_content(&self, value: f64) -> Option<usize> {
        self.counts.iter().position(|&c| c == value)
    }

    /// Zero bin `index`
    pub fn clear_bin(&mut self, index: usize) -> StatsResult<()> {
        self.set_bin_content(index, 0.0)
    }

    /// Zero the last in-range bin and the overflow
    pub fn clear_last_bin_and_overflow(&mut self) {
        if let Some(last) = self.counts.last_mut() {
            *last = 0.0;
        }
        self.overflow = 0.0;
    }

    /// Zero the underflow and every bin up to and including the one containing `x`
    pub fn clear_up_to(&mut self, x: f64) {
        self.underflow = 0.0;
        match self.find_bin(x) {
            BinPosition::Underflow => {}
            BinPosition::Bin(i) => self.counts[..=i].iter_mut().for_each(|c| *c = 0.0),
            BinPosition::Overflow => {
                self.counts.iter_mut().for_each(|c| *c = 0.0);
                self.overflow = 0.0;
            }
        }
    }

    /// Multiply every content, flows included, by `factor`
    pub fn scale(&mut self, factor: f64) {
        self.counts.iter_mut().for_each(|c| *c *= factor);
        self.underflow *= factor;
        self.overflow *= factor;
    }

    /// Copy scaled so that the in-range integral equals `total`
    ///
    /// Histograms with a non-positive integral are returned unscaled.
    pub fn normalized_to(&self, total: f64) -> Self {
        let mut out = self.clone();
        let integral = self.integral();
        if integral > 0.0 {
            out.scale(total / integral);
        }
        out
    }

    /// FWHM of the in-range contents
    pub fn fwhm(&self) -> Result<FwhmResult, FwhmError> {
        compute_fwhm(&self.counts, &self.edges)
    }

    /// Factor mapping the axis so that the peak centre lands on 1.0
    ///
    /// The peak is the first bin holding [`maximum_except_bin(0)`](Self::maximum_except_bin),
    /// which skips a dominant first bin. The returned factor is the new upper
    /// axis limit when `[low, high)` is relabelled as `[0, factor)`.
    pub fn peak_scale_factor(&self) -> Option<f64> {
        let peak_value = self.maximum_except_bin(0)?;
        let peak_bin = self.bin_with_content(peak_value)?;
        let center = self.bin_center(peak_bin)?;
        if center == 0.0 {
            return None;
        }
        Some(self.high() / center)
    }

    /// Edges relabelled linearly from `[low, high]` onto `[0, peak_scale_factor]`
    pub fn peak_scaled_edges(&self) -> Option<Vec<f64>> {
        let factor = self.peak_scale_factor()?;
        if !factor.is_finite() || factor <= 0.0 {
            return None;
        }
        let (low, span) = (self.low(), self.high() - self.low());
        Some(
            self.edges
                .iter()
                .map(|e| (e - low) / span * factor)
                .collect(),
        )
    }

    fn center_unchecked(&self, index: usize) -> f64 {
        0.5 * (self.edges[index] + self.edges[index + 1])
    }
}

/// Check that edges describe at least one bin and increase strictly
pub(crate) fn validate_edges(edges: &[f64]) -> StatsResult<()> {
    if edges.len() < 2 {
        return Err(HistogramError::InvalidEdges(format!(
            "need at least 2 edges, got {}",
            edges.len()
        )));
    }
    if edges.iter().any(|e| !e.is_finite()) {
        return Err(HistogramError::InvalidEdges("non-finite edge".to_string()));
    }
    if edges.windows(2).any(|w| w[1] <= w[0]) {
        return Err(HistogramError::InvalidEdges(
            "edges are not strictly increasing".to_string(),
        ));
    }
    Ok(())
}

/// Binary search for the bin of `x` along validated `edges`
pub(crate) fn locate(edges: &[f64], x: f64) -> BinPosition {
    if x.is_nan() || x >= edges[edges.len() - 1] {
        return BinPosition::Overflow;
    }
    if x < edges[0] {
        return BinPosition::Underflow;
    }
    BinPosition::Bin(edges.partition_point(|&e| e <= x) - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charge_like() -> Histogram1D {
        Histogram1D::new(
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            vec![1.0, 2.0, 10.0, 3.0, 1.0],
        )
        .unwrap()
    }

    #[test]
    fn test_uniform_edges() {
        let hist = Histogram1D::uniform(4, 0.0, 2.0).unwrap();
        assert_eq!(hist.n_bins(), 4);
        assert_eq!(hist.edges(), &[0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(hist.integral(), 0.0);
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert!(matches!(
            Histogram1D::new(vec![0.0, 1.0], vec![1.0, 2.0]),
            Err(HistogramError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            Histogram1D::new(vec![0.0, 0.0], vec![1.0]),
            Err(HistogramError::InvalidEdges(_))
        ));
        assert!(Histogram1D::uniform(0, 0.0, 1.0).is_err());
        assert!(Histogram1D::uniform(3, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_find_bin() {
        let hist = Histogram1D::uniform(4, 0.0, 4.0).unwrap();
        assert_eq!(hist.find_bin(-0.1), BinPosition::Underflow);
        assert_eq!(hist.find_bin(0.0), BinPosition::Bin(0));
        assert_eq!(hist.find_bin(1.0), BinPosition::Bin(1));
        assert_eq!(hist.find_bin(3.999), BinPosition::Bin(3));
        assert_eq!(hist.find_bin(4.0), BinPosition::Overflow);
        assert_eq!(hist.find_bin(f64::NAN), BinPosition::Overflow);
    }

    #[test]
    fn test_fill_routes_flows() {
        let mut hist = Histogram1D::uniform(2, 0.0, 2.0).unwrap();
        hist.fill(-1.0);
        hist.fill(0.5);
        hist.fill_weighted(1.5, 2.0);
        hist.fill(7.0);
        hist.fill(f64::NAN);

        assert_eq!(hist.underflow(), 1.0);
        assert_eq!(hist.counts(), &[1.0, 2.0]);
        assert_eq!(hist.overflow(), 1.0);
        assert_eq!(hist.integral(), 3.0);
    }

    #[test]
    fn test_mean_and_rms() {
        let hist = Histogram1D::new(vec![0.0, 2.0, 4.0], vec![1.0, 1.0]).unwrap();
        assert!((hist.mean().unwrap() - 2.0).abs() < 1e-10);
        assert!((hist.rms().unwrap() - 1.0).abs() < 1e-10);
        assert!((hist.standard_error().unwrap() - 1.0 / 2f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_stats_ignore_flows() {
        let hist = Histogram1D::new(vec![0.0, 2.0], vec![4.0])
            .unwrap()
            .with_flow(100.0, 100.0);
        assert_eq!(hist.integral(), 4.0);
        assert_eq!(hist.mean(), Some(1.0));
    }

    #[test]
    fn test_empty_stats_are_none() {
        let hist = Histogram1D::uniform(3, 0.0, 3.0).unwrap();
        assert!(hist.mean().is_none());
        assert!(hist.rms().is_none());
        assert!(hist.standard_error().is_none());
    }

    #[test]
    fn test_integral_range() {
        let hist = charge_like();
        assert_eq!(hist.integral_range(0, 1).unwrap(), 3.0);
        assert_eq!(hist.integral_range(2, 2).unwrap(), 10.0);
        assert_eq!(hist.integral_range(3, 1).unwrap(), 0.0);
        assert!(hist.integral_range(0, 5).is_err());
    }

    #[test]
    fn test_maximum_except_bin() {
        let hist = Histogram1D::new(vec![0.0, 1.0, 2.0, 3.0], vec![50.0, 5.0, 8.0]).unwrap();
        assert_eq!(hist.maximum_bin(), 0);
        assert_eq!(hist.maximum_except_bin(0), Some(8.0));
        assert_eq!(hist.maximum_except_bin(2), Some(50.0));

        let flat = Histogram1D::new(vec![0.0, 1.0, 2.0], vec![3.0, 3.0]).unwrap();
        assert_eq!(flat.maximum_except_bin(0), None);
    }

    #[test]
    fn test_clear_operations() {
        let mut hist = charge_like().with_flow(4.0, 6.0);

        hist.clear_bin(0).unwrap();
        assert_eq!(hist.bin_content(0), Some(0.0));

        hist.clear_last_bin_and_overflow();
        assert_eq!(hist.bin_content(4), Some(0.0));
        assert_eq!(hist.overflow(), 0.0);

        hist.clear_up_to(2.5);
        assert_eq!(hist.underflow(), 0.0);
        assert_eq!(hist.counts(), &[0.0, 0.0, 0.0, 3.0, 0.0]);

        assert!(hist.clear_bin(9).is_err());
    }

    #[test]
    fn test_clear_up_to_overflow_clears_everything() {
        let mut hist = charge_like().with_flow(1.0, 1.0);
        hist.clear_up_to(100.0);
        assert_eq!(hist.integral(), 0.0);
        assert_eq!(hist.overflow(), 0.0);
    }

    #[test]
    fn test_normalized_to_percent() {
        let hist = charge_like();
        let pct = hist.normalized_to(100.0);
        assert!((pct.integral() - 100.0).abs() < 1e-10);
        assert!((pct.bin_content(2).unwrap() - 100.0 * 10.0 / 17.0).abs() < 1e-10);

        let empty = Histogram1D::uniform(2, 0.0, 1.0).unwrap();
        assert_eq!(empty.normalized_to(100.0), empty);
    }

    #[test]
    fn test_fwhm_delegates() {
        let result = charge_like().fwhm().unwrap();
        assert_eq!(result.left_edge, 2.0);
        assert_eq!(result.right_edge, 3.0);
    }

    #[test]
    fn test_peak_scale_factor() {
        // Dominant first bin is skipped, peak sits in bin [4, 6) centred on 5
        let hist = Histogram1D::new(
            vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0],
            vec![90.0, 3.0, 20.0, 6.0, 1.0],
        )
        .unwrap();
        assert_eq!(hist.peak_scale_factor(), Some(2.0));

        let edges = hist.peak_scaled_edges().unwrap();
        assert!((edges[0] - 0.0).abs() < 1e-10);
        assert!((0.5 * (edges[2] + edges[3]) - 1.0).abs() < 1e-10);
        assert!((edges[5] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_serde_validates() {
        let json = serde_json::to_string(&charge_like()).unwrap();
        let back: Histogram1D = serde_json::from_str(&json).unwrap();
        assert_eq!(back, charge_like());

        let bad = r#"{"edges":[0.0,1.0],"counts":[1.0,2.0]}"#;
        assert!(serde_json::from_str::<Histogram1D>(bad).is_err());
    }
}
