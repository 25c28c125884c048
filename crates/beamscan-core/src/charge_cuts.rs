//! Sum-charge stability under successive cuts
//!
//! The same projected sum-charge distribution is re-measured after each
//! stage of masking. Stages are cumulative: `TopBinRemoved` also has the
//! zero bin removed, and so on.

use beamscan_stats::{FwhmError, FwhmResult, Histogram1D, HistogramError};
use serde::{Deserialize, Serialize};

use crate::error::ScanResult;

/// Masking stage applied before measuring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutStage {
    /// Distribution as projected
    Raw,
    /// First (pedestal) bin zeroed
    ZeroBinRemoved,
    /// Last bin and overflow zeroed
    TopBinRemoved,
    /// Underflow and every bin up to the one holding the threshold zeroed
    BelowThresholdRemoved,
}

impl CutStage {
    pub const ALL: [CutStage; 4] = [
        CutStage::Raw,
        CutStage::ZeroBinRemoved,
        CutStage::TopBinRemoved,
        CutStage::BelowThresholdRemoved,
    ];

    /// Apply this stage's mask on top of the previous stages
    fn apply(&self, hist: &mut Histogram1D, threshold: f64) -> ScanResult<()> {
        match self {
            CutStage::Raw => {}
            CutStage::ZeroBinRemoved => hist.clear_bin(0)?,
            CutStage::TopBinRemoved => hist.clear_last_bin_and_overflow(),
            CutStage::BelowThresholdRemoved => hist.clear_up_to(threshold),
        }
        Ok(())
    }
}

/// Measurements after one cut stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeCutRow {
    pub run: u32,
    pub flux: f64,
    pub stage: CutStage,
    pub mean: Option<f64>,
    pub rms: Option<f64>,
    /// Sum of in-range contents
    pub entries: f64,
    pub standard_error: Option<f64>,
    /// `None` when everything has been cut away
    pub fwhm: Option<FwhmResult>,
}

/// Measure `hist` after each cut stage in turn
pub fn charge_cut_study(
    hist: &Histogram1D,
    run: u32,
    flux: f64,
    threshold: f64,
) -> ScanResult<Vec<ChargeCutRow>> {
    let mut working = hist.clone();
    let mut rows = Vec::with_capacity(CutStage::ALL.len());

    for stage in CutStage::ALL {
        stage.apply(&mut working, threshold)?;

        let fwhm = match working.fwhm() {
            Ok(result) => Some(result),
            Err(FwhmError::DegenerateHistogram) => {
                tracing::warn!("Run {}: no FWHM after stage {:?}, histogram is empty", run, stage);
                None
            }
            Err(e) => return Err(HistogramError::Fwhm(e).into()),
        };

        rows.push(ChargeCutRow {
            run,
            flux,
            stage,
            mean: working.mean(),
            rms: working.rms(),
            entries: working.integral(),
            standard_error: working.standard_error(),
            fwhm,
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanError;

    fn sum_charge() -> Histogram1D {
        // 0..10000 in 1000-wide bins: pedestal, a peak near 8500, saturation
        let mut hist = Histogram1D::uniform(10, 0.0, 10_000.0).unwrap();
        let contents = [40.0, 1.0, 2.0, 3.0, 4.0, 6.0, 8.0, 10.0, 8.0, 5.0];
        for (i, &c) in contents.iter().enumerate() {
            hist.set_bin_content(i, c).unwrap();
        }
        hist.with_flow(2.0, 7.0)
    }

    #[test]
    fn test_stages_are_cumulative() {
        let rows = charge_cut_study(&sum_charge(), 322, 2.1, 7500.0).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows.iter().map(|r| r.stage).collect::<Vec<_>>(),
            CutStage::ALL.to_vec()
        );

        assert_eq!(rows[0].entries, 87.0);
        assert_eq!(rows[1].entries, 47.0);
        assert_eq!(rows[2].entries, 42.0);
        // Bins up to and including 7000..8000 are gone, leaving only 8000..9000
        assert_eq!(rows[3].entries, 8.0);
        assert!((rows[3].mean.unwrap() - 8500.0).abs() < 1e-10);
        assert!(rows[3].rms.unwrap().abs() < 1e-10);

        assert!(rows.iter().all(|r| r.run == 322 && r.flux == 2.1));
    }

    #[test]
    fn test_raw_fwhm_follows_pedestal() {
        let rows = charge_cut_study(&sum_charge(), 1, 1.0, 7500.0).unwrap();
        let raw = rows[0].fwhm.unwrap();
        assert_eq!(raw.peak_index, 0);

        let cleaned = rows[1].fwhm.unwrap();
        assert_eq!(cleaned.peak_index, 7);
        // Half maximum is 5: bin 4 (4.0) is the left crossing, nothing on the right drops below
        assert_eq!(cleaned.left_edge, 5000.0);
        assert_eq!(cleaned.right_edge, 10_000.0);
    }

    #[test]
    fn test_standard_error() {
        let rows = charge_cut_study(&sum_charge(), 1, 1.0, 7500.0).unwrap();
        for row in &rows {
            let expected = row.rms.unwrap() / row.entries.sqrt();
            assert!((row.standard_error.unwrap() - expected).abs() < 1e-10);
        }
    }

    #[test]
    fn test_everything_cut() {
        let hist = Histogram1D::new(vec![0.0, 1.0, 2.0], vec![5.0, 3.0]).unwrap();
        let rows = charge_cut_study(&hist, 7, 1.0, 100.0).unwrap();

        let last = rows.last().unwrap();
        assert_eq!(last.entries, 0.0);
        assert_eq!(last.mean, None);
        assert_eq!(last.standard_error, None);
        assert_eq!(last.fwhm, None);
    }

    #[test]
    fn test_negative_count_is_an_error() {
        let hist = Histogram1D::new(vec![0.0, 1.0, 2.0, 3.0], vec![5.0, -1.0, 3.0]).unwrap();
        let err = charge_cut_study(&hist, 7, 1.0, 100.0).unwrap_err();
        assert!(matches!(
            err,
            ScanError::Histogram(HistogramError::Fwhm(FwhmError::InvalidInput(_)))
        ));
    }
}
