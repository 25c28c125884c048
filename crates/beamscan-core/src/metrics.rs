//! Per-run, per-ROC cluster observables
//!
//! Every observable is derived from the z projection of a 3D
//! (column, row, value) histogram, so only the value distribution matters.

use std::collections::BTreeMap;

use beamscan_io::HistogramSource;
use beamscan_stats::{Axis, BinPosition, Histogram1D};
use serde::{Deserialize, Serialize};

use crate::config::HistogramNames;
use crate::error::ScanResult;

/// Quantities tracked against beam flux
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Observable {
    ClusterSize,
    ClusterSizeFraction1,
    ClusterSizeFraction12,
    LeadingCharge,
    SumCharge,
    SecondCharge,
}

impl Observable {
    pub const ALL: [Observable; 6] = [
        Observable::ClusterSize,
        Observable::ClusterSizeFraction1,
        Observable::ClusterSizeFraction12,
        Observable::LeadingCharge,
        Observable::SumCharge,
        Observable::SecondCharge,
    ];

    /// Y-axis title when plotted against flux
    pub fn axis_title(&self) -> &'static str {
        match self {
            Observable::ClusterSize => "Mean cluster size",
            Observable::ClusterSizeFraction1 => "Fraction of clusters with size 1",
            Observable::ClusterSizeFraction12 => "Fraction of clusters with size 1 or 2",
            Observable::LeadingCharge => "Leading charge within 4-pixel radius",
            Observable::SumCharge => "Sum of charge within 4-pixel radius",
            Observable::SecondCharge => "Charge of second hit in cluster",
        }
    }

    /// Prefix of output file names
    pub fn file_stem(&self) -> &'static str {
        match self {
            Observable::ClusterSize => "ClusterSize",
            Observable::ClusterSizeFraction1 => "ClusterSizeFraction1",
            Observable::ClusterSizeFraction12 => "ClusterSizeFraction12",
            Observable::LeadingCharge => "LeadingCharge",
            Observable::SumCharge => "SumCharge",
            Observable::SecondCharge => "SecondCharge",
        }
    }
}

/// Observables of one ROC in one run
///
/// A value is `None` when its distribution is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RocMetrics {
    pub cluster_size: Option<f64>,
    pub cluster_size_fraction_1: Option<f64>,
    pub cluster_size_fraction_12: Option<f64>,
    pub leading_charge: Option<f64>,
    pub second_charge: Option<f64>,
    /// Mean with the first (pedestal) bin removed
    pub sum_charge: Option<f64>,
}

impl RocMetrics {
    pub fn value(&self, observable: Observable) -> Option<f64> {
        match observable {
            Observable::ClusterSize => self.cluster_size,
            Observable::ClusterSizeFraction1 => self.cluster_size_fraction_1,
            Observable::ClusterSizeFraction12 => self.cluster_size_fraction_12,
            Observable::LeadingCharge => self.leading_charge,
            Observable::SumCharge => self.sum_charge,
            Observable::SecondCharge => self.second_charge,
        }
    }
}

/// Observables of every ROC in one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub run: u32,
    pub flux: f64,
    pub rocs: BTreeMap<u8, RocMetrics>,
}

impl RunMetrics {
    pub fn value(&self, roc: u8, observable: Observable) -> Option<f64> {
        self.rocs.get(&roc)?.value(observable)
    }
}

/// Compute the observables of `roc` from one run's histograms
pub fn compute_roc_metrics(
    source: &dyn HistogramSource,
    names: &HistogramNames,
    roc: u8,
) -> ScanResult<RocMetrics> {
    let projection = |template: &str| -> ScanResult<Histogram1D> {
        let name = HistogramNames::resolve(template, roc);
        Ok(source.histogram_3d(&name)?.project(Axis::Z))
    };

    let cluster_size = projection(&names.cluster_size)?;
    let (fraction_1, fraction_12) = size_fractions(&cluster_size);

    let mut sum_charge = projection(&names.sum_charge)?;
    sum_charge.clear_bin(0)?;

    Ok(RocMetrics {
        cluster_size: cluster_size.mean(),
        cluster_size_fraction_1: fraction_1,
        cluster_size_fraction_12: fraction_12,
        leading_charge: projection(&names.leading_charge)?.mean(),
        second_charge: projection(&names.second_charge)?.mean(),
        sum_charge: sum_charge.mean(),
    })
}

/// Fractions of clusters in the bin holding size 1, and in the bins holding sizes 1 to 2
fn size_fractions(hist: &Histogram1D) -> (Option<f64>, Option<f64>) {
    let total = hist.integral();
    if total <= 0.0 {
        return (None, None);
    }
    let one = hist.find_bin(1.0);
    let two = hist.find_bin(2.0);
    (
        Some(hist.content_at(one) / total),
        Some(span_content(hist, one, two) / total),
    )
}

/// Content of every slot from `first` to `last` inclusive, flow bins included
fn span_content(hist: &Histogram1D, first: BinPosition, last: BinPosition) -> f64 {
    let (first, last) = (slot(hist, first), slot(hist, last));
    (first..=last)
        .map(|s| match s {
            0 => hist.underflow(),
            s if s > hist.n_bins() => hist.overflow(),
            s => hist.counts()[s - 1],
        })
        .sum()
}

/// Position as a slot number: 0 underflow, `1..=n` bins, `n + 1` overflow
fn slot(hist: &Histogram1D, position: BinPosition) -> usize {
    match position {
        BinPosition::Underflow => 0,
        BinPosition::Bin(i) => i + 1,
        BinPosition::Overflow => hist.n_bins() + 1,
    }
}
