//! Charge distributions of several runs prepared for a shared plot
//!
//! Each curve is normalised to percent of its clusters. The x axis of every
//! curve is relabelled with the factor that puts the first run's peak at 1.0,
//! so distributions from different fluxes line up.

use beamscan_stats::{round_to_significant, Histogram1D};
use serde::{Deserialize, Serialize};

use crate::config::{RunInfo, ScanDirection};

/// Headroom above the tallest curve
const Y_HEADROOM: f64 = 1.1;

/// One run's normalised distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayCurve {
    pub run: u32,
    pub flux: f64,
    /// Legend entry, e.g. `"20 kHz/cm^2"`
    pub label: String,
    /// Contents in percent of the in-range integral
    pub histogram: Histogram1D,
}

/// Curves of one histogram name across a flux ramp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeOverlay {
    pub name: String,
    pub direction: ScanDirection,
    pub curves: Vec<OverlayCurve>,
    /// Shared y maximum ignoring the first bin, `None` without curves
    pub y_max: Option<f64>,
    /// Upper x limit that puts the first run's peak at 1.0
    pub x_scale: Option<f64>,
}

impl ChargeOverlay {
    /// Edges of curve `index` relabelled onto `[0, x_scale]`
    pub fn scaled_edges(&self, index: usize) -> Option<Vec<f64>> {
        let factor = self.x_scale?;
        let hist = &self.curves.get(index)?.histogram;
        let (low, span) = (hist.low(), hist.high() - hist.low());
        Some(hist.edges().iter().map(|e| (e - low) / span * factor).collect())
    }
}

/// Legend label for a flux, rounded to two significant digits
pub fn flux_label(flux: f64) -> String {
    format!("{} kHz/cm^2", round_to_significant(flux, 2).round() as i64)
}

/// Normalise and align the distributions of `runs`, kept in the given order
pub fn build_overlay(
    name: impl Into<String>,
    direction: ScanDirection,
    runs: Vec<(RunInfo, Histogram1D)>,
) -> ChargeOverlay {
    let curves: Vec<OverlayCurve> = runs
        .into_iter()
        .map(|(info, hist)| OverlayCurve {
            run: info.run,
            flux: info.flux,
            label: flux_label(info.flux),
            histogram: hist.normalized_to(100.0),
        })
        .collect();

    let y_max = curves
        .iter()
        .filter_map(|c| c.histogram.maximum_except_bin(0))
        .fold(None, |acc: Option<f64>, m| Some(acc.map_or(m, |a| a.max(m))))
        .map(|m| m * Y_HEADROOM);

    let x_scale = curves
        .first()
        .and_then(|c| c.histogram.peak_scale_factor());

    ChargeOverlay {
        name: name.into(),
        direction,
        curves,
        y_max,
        x_scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hist(contents: &[f64]) -> Histogram1D {
        let mut h = Histogram1D::uniform(contents.len(), 0.0, 100.0 * contents.len() as f64).unwrap();
        for (i, &c) in contents.iter().enumerate() {
            h.set_bin_content(i, c).unwrap();
        }
        h
    }

    #[test]
    fn test_flux_label() {
        assert_eq!(flux_label(2.1), "2 kHz/cm^2");
        assert_eq!(flux_label(19.5), "20 kHz/cm^2");
        assert_eq!(flux_label(1543.0), "1500 kHz/cm^2");
    }

    #[test]
    fn test_build_overlay() {
        let runs = vec![
            // Pedestal-dominated: the first bin is ignored for scaling
            (RunInfo { run: 322, flux: 2.1 }, hist(&[50.0, 10.0, 30.0, 10.0])),
            (RunInfo { run: 325, flux: 19.5 }, hist(&[0.0, 1.0, 2.0, 1.0])),
        ];
        let overlay = build_overlay("SumCharge4_ROC4_z", ScanDirection::Up, runs);

        assert_eq!(overlay.curves.len(), 2);
        assert_eq!(overlay.curves[0].run, 322);
        assert_eq!(overlay.curves[1].label, "20 kHz/cm^2");
        for curve in &overlay.curves {
            assert!((curve.histogram.integral() - 100.0).abs() < 1e-10);
        }

        // Second curve peaks at 50%, first at 30% outside its pedestal
        assert!((overlay.y_max.unwrap() - 55.0).abs() < 1e-10);

        // First run's peak is bin 2, centred at 250 on a 400-wide axis
        let factor = overlay.x_scale.unwrap();
        assert!((factor - 400.0 / 250.0).abs() < 1e-10);

        let edges = overlay.scaled_edges(1).unwrap();
        assert_eq!(edges.len(), 5);
        assert!(edges[0].abs() < 1e-10);
        assert!((edges[4] - factor).abs() < 1e-10);
        // Peak centre of the first run lands on 1.0
        assert!(((edges[2] + edges[3]) / 2.0 - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_empty_overlay() {
        let overlay = build_overlay("h", ScanDirection::Down, Vec::new());
        assert!(overlay.curves.is_empty());
        assert_eq!(overlay.y_max, None);
        assert_eq!(overlay.x_scale, None);
        assert_eq!(overlay.scaled_edges(0), None);
    }
}
