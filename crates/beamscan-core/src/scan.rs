//! Flux scan over every run of one telescope
//!
//! [`FluxScan::run`] opens each run in the archive, measures the per-ROC
//! observables, the sum-charge cut stages and the overlay distributions, and
//! gathers them into a [`ScanReport`]. With the `parallel` feature the runs
//! are analysed on the rayon thread pool.

use std::collections::BTreeMap;

use beamscan_io::{HistogramSource, RunArchive};
use beamscan_stats::{Axis, Histogram1D};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::charge_cuts::{charge_cut_study, ChargeCutRow, CutStage};
use crate::config::{
    AnalysisConfig, HistogramNames, RunCatalog, RunInfo, ScanDirection, ScanLists, TelescopeRuns,
};
use crate::error::{ScanError, ScanResult};
use crate::groups::{summarize_groups, GroupSummary};
use crate::metrics::{compute_roc_metrics, Observable, RunMetrics};
use crate::overlay::{build_overlay, ChargeOverlay};
use crate::series::FluxSeries;

/// Analysis of one telescope's runs
#[derive(Debug, Clone)]
pub struct FluxScan<'a> {
    analysis: &'a AnalysisConfig,
    telescope: &'a TelescopeRuns,
}

/// Everything measured in one run
struct RunAnalysis {
    metrics: RunMetrics,
    charge_cuts: Vec<ChargeCutRow>,
    /// Overlay histograms keyed by resolved name
    overlays: BTreeMap<String, Histogram1D>,
}

impl<'a> FluxScan<'a> {
    /// Prepare a scan of `telescope`, validating the catalog first
    pub fn new(catalog: &'a RunCatalog, telescope: u32) -> ScanResult<Self> {
        catalog.validate()?;
        let telescope = catalog
            .telescope(telescope)
            .ok_or(ScanError::UnknownTelescope(telescope))?;
        Ok(Self {
            analysis: &catalog.analysis,
            telescope,
        })
    }

    pub fn telescope(&self) -> &TelescopeRuns {
        self.telescope
    }

    /// Analyse every run of the telescope
    pub fn run(&self, archive: &dyn RunArchive) -> ScanResult<ScanReport> {
        let mut runs: Vec<RunInfo> = self.telescope.runs.clone();
        runs.sort_by_key(|r| r.run);

        tracing::info!(
            "Scanning {} run(s) of telescope {}",
            runs.len(),
            self.telescope.id
        );

        #[cfg(feature = "parallel")]
        let analyses = runs
            .par_iter()
            .map(|info| self.analyse_run(archive, info))
            .collect::<ScanResult<Vec<_>>>()?;

        #[cfg(not(feature = "parallel"))]
        let analyses = runs
            .iter()
            .map(|info| self.analyse_run(archive, info))
            .collect::<ScanResult<Vec<_>>>()?;

        let mut metrics = Vec::with_capacity(analyses.len());
        let mut charge_cuts = Vec::new();
        let mut overlay_inputs: BTreeMap<u32, BTreeMap<String, Histogram1D>> = BTreeMap::new();
        for analysis in analyses {
            overlay_inputs.insert(analysis.metrics.run, analysis.overlays);
            charge_cuts.extend(analysis.charge_cuts);
            metrics.push(analysis.metrics);
        }

        let groups = summarize_groups(&self.telescope.groups, |run| {
            charge_cuts
                .iter()
                .find(|row| row.run == run && row.stage == CutStage::ZeroBinRemoved)
                .and_then(|row| row.mean)
        });

        let overlays = self.build_overlays(&overlay_inputs)?;

        tracing::info!(
            "Telescope {}: {} run(s), {} charge-cut row(s), {} overlay(s)",
            self.telescope.id,
            metrics.len(),
            charge_cuts.len(),
            overlays.len()
        );

        Ok(ScanReport {
            telescope: self.telescope.id,
            rocs: self
                .analysis
                .rocs
                .iter()
                .map(|&roc| (roc, self.telescope.roc_name(roc)))
                .collect(),
            scans: self.telescope.scans.clone(),
            point_error: self.analysis.point_error,
            metrics,
            charge_cuts,
            groups,
            overlays,
        })
    }

    fn analyse_run(&self, archive: &dyn RunArchive, info: &RunInfo) -> ScanResult<RunAnalysis> {
        self.analyse_run_inner(archive, info)
            .map_err(|e| ScanError::in_run(info.run, e))
    }

    fn analyse_run_inner(&self, archive: &dyn RunArchive, info: &RunInfo) -> ScanResult<RunAnalysis> {
        tracing::debug!("Analysing run {} at {} kHz/cm^2", info.run, info.flux);
        let source = archive.open_run(info.run)?;
        let names = &self.analysis.histograms;

        let mut rocs = BTreeMap::new();
        for &roc in &self.analysis.rocs {
            rocs.insert(roc, compute_roc_metrics(source.as_ref(), names, roc)?);
        }

        let roc = self.analysis.charge_cut_roc;
        let sum_charge = source
            .histogram_3d(&HistogramNames::resolve(&names.sum_charge, roc))?
            .project(Axis::Z);
        let charge_cuts =
            charge_cut_study(&sum_charge, info.run, info.flux, self.analysis.charge_threshold)?;

        let overlays = self.load_overlays(source.as_ref(), info.run)?;

        Ok(RunAnalysis {
            metrics: RunMetrics {
                run: info.run,
                flux: info.flux,
                rocs,
            },
            charge_cuts,
            overlays,
        })
    }

    /// Overlay histograms present in the run; absent ones are skipped
    fn load_overlays(
        &self,
        source: &dyn HistogramSource,
        run: u32,
    ) -> ScanResult<BTreeMap<String, Histogram1D>> {
        let mut overlays = BTreeMap::new();
        for name in self.overlay_names() {
            if source.contains(&name) {
                overlays.insert(name.clone(), source.histogram_1d(&name)?);
            } else {
                tracing::debug!("Run {}: no overlay histogram {}", run, name);
            }
        }
        Ok(overlays)
    }

    fn overlay_names(&self) -> Vec<String> {
        let templates = &self.analysis.histograms.overlays;
        templates
            .iter()
            .flat_map(|t| {
                self.analysis
                    .rocs
                    .iter()
                    .map(move |&roc| HistogramNames::resolve(t, roc))
            })
            .collect()
    }

    /// One overlay per histogram name and flux ramp with runs
    fn build_overlays(
        &self,
        inputs: &BTreeMap<u32, BTreeMap<String, Histogram1D>>,
    ) -> ScanResult<Vec<ChargeOverlay>> {
        let mut overlays = Vec::new();
        for direction in ScanDirection::ALL {
            let runs = self.telescope.overlay_runs(direction);
            if runs.is_empty() {
                continue;
            }
            for name in self.overlay_names() {
                let mut curves = Vec::with_capacity(runs.len());
                for &run in runs {
                    let flux = self
                        .telescope
                        .flux_of(run)
                        .ok_or(ScanError::MissingRun(run))?;
                    if let Some(hist) = inputs.get(&run).and_then(|h| h.get(&name)) {
                        curves.push((RunInfo { run, flux }, hist.clone()));
                    }
                }
                if !curves.is_empty() {
                    overlays.push(build_overlay(name, direction, curves));
                }
            }
        }
        Ok(overlays)
    }
}

/// Results of a [`FluxScan`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub telescope: u32,
    /// Analysed ROCs and their names
    pub rocs: BTreeMap<u8, String>,
    pub scans: ScanLists,
    /// Vertical uncertainty given to series points
    pub point_error: f64,
    /// Per-run observables, ascending by run
    pub metrics: Vec<RunMetrics>,
    /// Sum-charge cut stages of every run, four rows per run
    pub charge_cuts: Vec<ChargeCutRow>,
    pub groups: Vec<GroupSummary>,
    pub overlays: Vec<ChargeOverlay>,
}

impl ScanReport {
    /// Series of one observable for one ROC along one flux ramp
    pub fn series(&self, observable: Observable, roc: u8, direction: ScanDirection) -> FluxSeries {
        let roc_name = self
            .rocs
            .get(&roc)
            .cloned()
            .unwrap_or_else(|| format!("ROC{}", roc));
        FluxSeries::build(
            self.telescope,
            roc,
            roc_name,
            observable,
            direction,
            self.scans.get(direction),
            &self.metrics,
            self.point_error,
        )
    }

    /// Every non-empty series over observables, ROCs and flux ramps
    pub fn all_series(&self) -> Vec<FluxSeries> {
        let mut all = Vec::new();
        for observable in Observable::ALL {
            for &roc in self.rocs.keys() {
                for direction in ScanDirection::ALL {
                    let series = self.series(observable, roc, direction);
                    if !series.is_empty() {
                        all.push(series);
                    }
                }
            }
        }
        all
    }

    /// Charge-cut rows of one run, in stage order
    pub fn charge_cuts_of(&self, run: u32) -> Vec<&ChargeCutRow> {
        self.charge_cuts.iter().filter(|r| r.run == run).collect()
    }

    pub fn to_json(&self) -> ScanResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ScanError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> ScanResult<Self> {
        serde_json::from_str(json).map_err(|e| ScanError::Serialization(e.to_string()))
    }
}
