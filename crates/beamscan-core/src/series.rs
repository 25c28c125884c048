//! Observable-versus-flux series for one ROC and one flux ramp

use serde::{Deserialize, Serialize};

use crate::config::ScanDirection;
use crate::metrics::{Observable, RunMetrics};

/// One point of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub run: u32,
    /// Beam flux in kHz/cm^2
    pub flux: f64,
    pub value: f64,
    /// Symmetric vertical uncertainty
    pub y_error: f64,
}

/// Points of one observable for one ROC, ordered by run number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxSeries {
    pub telescope: u32,
    pub roc: u8,
    pub roc_name: String,
    pub observable: Observable,
    pub direction: ScanDirection,
    pub points: Vec<SeriesPoint>,
}

impl FluxSeries {
    /// Collect the points of `runs` from per-run metrics
    ///
    /// Runs without metrics, or without a value for this observable, are left out.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        telescope: u32,
        roc: u8,
        roc_name: impl Into<String>,
        observable: Observable,
        direction: ScanDirection,
        runs: &[u32],
        metrics: &[RunMetrics],
        y_error: f64,
    ) -> Self {
        let mut runs = runs.to_vec();
        runs.sort_unstable();

        let points = runs
            .iter()
            .filter_map(|&run| {
                let m = metrics.iter().find(|m| m.run == run)?;
                let value = m.value(roc, observable)?;
                Some(SeriesPoint {
                    run,
                    flux: m.flux,
                    value,
                    y_error,
                })
            })
            .collect();

        Self {
            telescope,
            roc,
            roc_name: roc_name.into(),
            observable,
            direction,
            points,
        }
    }

    /// Output file name without extension, e.g. `SumCharge_Telescope1_ROC4_all`
    pub fn output_stem(&self) -> String {
        format!(
            "{}_Telescope{}_{}_all",
            self.observable.file_stem(),
            self.telescope,
            self.roc_name
        )
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
