//! Summary statistics over small samples of per-run values
//!
//! Used to compare groups of runs (e.g. low-rate vs high-rate) by the
//! spread of a single observable.

use serde::{Deserialize, Serialize};

/// Mean and spread of a sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    /// Number of finite values
    pub count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Population standard deviation (divides by `count`)
    pub rms: f64,
    /// `rms / sqrt(count)`
    pub standard_error: f64,
    pub min: f64,
    pub max: f64,
}

impl SampleSummary {
    /// Summarise the finite values of `values`; `None` if there are none
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let finite: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
        if finite.is_empty() {
            return None;
        }

        let count = finite.len();
        let mean = finite.iter().sum::<f64>() / count as f64;
        let variance = finite.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count as f64;
        let rms = variance.sqrt();

        Some(Self {
            count,
            mean,
            rms,
            standard_error: rms / (count as f64).sqrt(),
            min: finite.iter().copied().fold(f64::INFINITY, f64::min),
            max: finite.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }

    /// `max - min`
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Round `x` to `digits` significant digits
///
/// Zero and non-finite values are returned unchanged.
pub fn round_to_significant(x: f64, digits: u32) -> f64 {
    if x == 0.0 || !x.is_finite() || digits == 0 {
        return x;
    }
    let magnitude = x.abs().log10().floor() as i32;
    let exponent = digits as i32 - 1 - magnitude;
    if exponent >= 0 {
        let factor = 10f64.powi(exponent);
        (x * factor).round() / factor
    } else {
        let factor = 10f64.powi(-exponent);
        (x / factor).round() * factor
    }
}
