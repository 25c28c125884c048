//! Run catalog and analysis settings
//!
//! A catalog lists, per telescope, the runs with their beam flux, the
//! order in which flux was ramped (`scans`), named groups of runs to compare,
//! and the ROC names. Analysis tunables live in `[analysis]`:
//!
//! ```toml
//! [analysis]
//! rocs = [1, 2, 3, 4]
//! charge_cut_roc = 4
//! charge_threshold = 7500.0
//! point_error = 490.0
//!
//! [[telescopes]]
//! id = 1
//! rocs = [{ index = 1, name = "ROC1" }]
//! runs = [{ run = 322, flux = 2.1 }, { run = 325, flux = 19.5 }]
//!
//! [telescopes.scans]
//! up = [322, 325]
//!
//! [telescopes.groups]
//! low_rate = [322]
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use beamscan_io::DirectoryArchive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating a catalog
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

/// Direction of a flux ramp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanDirection {
    Up,
    Down,
    DownExtended,
    Final,
}

impl ScanDirection {
    pub const ALL: [ScanDirection; 4] = [
        ScanDirection::Up,
        ScanDirection::Down,
        ScanDirection::DownExtended,
        ScanDirection::Final,
    ];

    /// Legend label for the direction
    pub fn label(&self) -> &'static str {
        match self {
            ScanDirection::Up => "Increasing flux",
            ScanDirection::Down => "Decreasing flux",
            ScanDirection::DownExtended => "Decreasing flux (extended)",
            ScanDirection::Final => "Highest flux",
        }
    }

    /// Short name used in output file names
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanDirection::Up => "up",
            ScanDirection::Down => "down",
            ScanDirection::DownExtended => "down_extended",
            ScanDirection::Final => "final",
        }
    }
}

/// Histogram name templates; `{roc}` is replaced by the ROC index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramNames {
    /// 3D (column, row, cluster size)
    pub cluster_size: String,
    /// 3D (column, row, leading charge)
    pub leading_charge: String,
    /// 3D (column, row, charge of the second hit)
    pub second_charge: String,
    /// 3D (column, row, summed charge)
    pub sum_charge: String,
    /// 1D charge distributions compared between runs
    pub overlays: Vec<String>,
}

impl Default for HistogramNames {
    fn default() -> Self {
        Self {
            cluster_size: "ClusterSize_ROC{roc}".to_string(),
            leading_charge: "1stCharge4_ROC{roc}".to_string(),
            second_charge: "2ndCharge4_ROC{roc}".to_string(),
            sum_charge: "SumCharge4_ROC{roc}".to_string(),
            overlays: vec![
                "1stCharge4_ROC{roc}_z".to_string(),
                "SumCharge4_ROC{roc}_z".to_string(),
            ],
        }
    }
}

impl HistogramNames {
    /// Substitute `roc` into a template
    pub fn resolve(template: &str, roc: u8) -> String {
        template.replace("{roc}", &roc.to_string())
    }

    fn templates(&self) -> impl Iterator<Item = &String> {
        [
            &self.cluster_size,
            &self.leading_charge,
            &self.second_charge,
            &self.sum_charge,
        ]
        .into_iter()
        .chain(self.overlays.iter())
    }
}

/// Analysis tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// ROC indices with data (ROC 0 is the reference plane)
    pub rocs: Vec<u8>,
    /// ROC used for the sum-charge cut study
    pub charge_cut_roc: u8,
    /// Sum-charge bins up to this value are removed in the last cut stage
    pub charge_threshold: f64,
    /// Vertical uncertainty attached to flux-series points
    pub point_error: f64,
    /// Per-run directory name, `{run}` is replaced by the run number
    pub run_dir_template: String,
    pub histograms: HistogramNames,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            rocs: vec![1, 2, 3, 4],
            charge_cut_roc: 4,
            charge_threshold: 7500.0,
            point_error: 490.0, // two sigma
            run_dir_template: "000{run}".to_string(),
            histograms: HistogramNames::default(),
        }
    }
}

/// A run and the beam flux it was taken at (kHz/cm^2)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub run: u32,
    pub flux: f64,
}

/// Named ROC of a telescope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocInfo {
    pub index: u8,
    pub name: String,
}

/// Run lists per flux ramp
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanLists {
    pub up: Vec<u32>,
    pub down: Vec<u32>,
    pub down_extended: Vec<u32>,
    #[serde(rename = "final")]
    pub final_: Vec<u32>,
}

impl ScanLists {
    pub fn get(&self, direction: ScanDirection) -> &[u32] {
        match direction {
            ScanDirection::Up => &self.up,
            ScanDirection::Down => &self.down,
            ScanDirection::DownExtended => &self.down_extended,
            ScanDirection::Final => &self.final_,
        }
    }
}

/// Everything known about one telescope's runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelescopeRuns {
    pub id: u32,
    #[serde(default)]
    pub rocs: Vec<RocInfo>,
    pub runs: Vec<RunInfo>,
    #[serde(default)]
    pub scans: ScanLists,
    /// Runs drawn in the charge overlays, when they differ from `scans`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay_scans: Option<ScanLists>,
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<u32>>,
}

impl TelescopeRuns {
    /// Beam flux of `run`
    pub fn flux_of(&self, run: u32) -> Option<f64> {
        self.runs.iter().find(|r| r.run == run).map(|r| r.flux)
    }

    /// All run numbers, ascending
    pub fn all_runs(&self) -> Vec<u32> {
        let mut runs: Vec<u32> = self.runs.iter().map(|r| r.run).collect();
        runs.sort_unstable();
        runs
    }

    /// Runs of a flux ramp, ascending by run number
    pub fn runs_in(&self, direction: ScanDirection) -> Vec<u32> {
        let mut runs = self.scans.get(direction).to_vec();
        runs.sort_unstable();
        runs
    }

    /// Runs overlaid for a flux ramp, in catalog order
    pub fn overlay_runs(&self, direction: ScanDirection) -> &[u32] {
        self.overlay_scans
            .as_ref()
            .unwrap_or(&self.scans)
            .get(direction)
    }

    /// Configured ROC name, falling back to `ROC<index>`
    pub fn roc_name(&self, roc: u8) -> String {
        self.rocs
            .iter()
            .find(|r| r.index == roc)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| format!("ROC{}", roc))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for info in &self.runs {
            if !seen.insert(info.run) {
                return Err(ConfigError::InvalidValue(format!(
                    "telescope {}: run {} listed twice",
                    self.id, info.run
                )));
            }
            if !info.flux.is_finite() || info.flux <= 0.0 {
                return Err(ConfigError::InvalidValue(format!(
                    "telescope {}: run {} has invalid flux {}",
                    self.id, info.run, info.flux
                )));
            }
        }

        let overlay_lists = self.overlay_scans.iter().flat_map(|lists| {
            ScanDirection::ALL
                .into_iter()
                .map(move |d| (format!("overlay {}", d.as_str()), lists.get(d)))
        });
        let referenced = ScanDirection::ALL
            .iter()
            .map(|d| (d.as_str().to_string(), self.scans.get(*d)))
            .chain(overlay_lists)
            .chain(self.groups.iter().map(|(k, v)| (k.clone(), v.as_slice())));
        for (list, runs) in referenced {
            if let Some(run) = runs.iter().find(|r| !seen.contains(r)) {
                return Err(ConfigError::InvalidValue(format!(
                    "telescope {}: '{}' references unknown run {}",
                    self.id, list, run
                )));
            }
        }

        let mut rocs = BTreeSet::new();
        if let Some(roc) = self.rocs.iter().find(|r| !rocs.insert(r.index)) {
            return Err(ConfigError::InvalidValue(format!(
                "telescope {}: ROC {} named twice",
                self.id, roc.index
            )));
        }

        Ok(())
    }
}

/// Top-level catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunCatalog {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub telescopes: Vec<TelescopeRuns>,
}

impl RunCatalog {
    /// Load a catalog from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize the catalog to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load a catalog from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize the catalog to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and validate a catalog file; `.json` is parsed as JSON, anything else as TOML
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;

        let catalog = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&text)?,
            _ => Self::from_toml(&text)?,
        };
        catalog.validate()?;

        tracing::info!(
            "Loaded run catalog {:?} with {} telescope(s)",
            path,
            catalog.telescopes.len()
        );
        Ok(catalog)
    }

    pub fn telescope(&self, id: u32) -> Option<&TelescopeRuns> {
        self.telescopes.iter().find(|t| t.id == id)
    }

    /// Run directories under `base`, named by `run_dir_template`
    pub fn directory_archive(&self, base: impl Into<PathBuf>) -> DirectoryArchive {
        DirectoryArchive::with_template(base, self.analysis.run_dir_template.as_str())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let analysis = &self.analysis;

        if analysis.rocs.is_empty() {
            return Err(ConfigError::InvalidValue("rocs must not be empty".to_string()));
        }
        if !analysis.rocs.contains(&analysis.charge_cut_roc) {
            return Err(ConfigError::InvalidValue(format!(
                "charge_cut_roc {} is not in rocs",
                analysis.charge_cut_roc
            )));
        }
        if !analysis.charge_threshold.is_finite() {
            return Err(ConfigError::InvalidValue(
                "charge_threshold must be finite".to_string(),
            ));
        }
        if !analysis.point_error.is_finite() || analysis.point_error < 0.0 {
            return Err(ConfigError::InvalidValue(
                "point_error must be finite and non-negative".to_string(),
            ));
        }
        if !analysis.run_dir_template.contains("{run}") {
            return Err(ConfigError::InvalidValue(
                "run_dir_template must contain {run}".to_string(),
            ));
        }
        if let Some(t) = analysis.histograms.templates().find(|t| !t.contains("{roc}")) {
            return Err(ConfigError::InvalidValue(format!(
                "histogram template '{}' must contain {{roc}}",
                t
            )));
        }

        let mut ids = BTreeSet::new();
        for telescope in &self.telescopes {
            if !ids.insert(telescope.id) {
                return Err(ConfigError::InvalidValue(format!(
                    "telescope {} listed twice",
                    telescope.id
                )));
            }
            telescope.validate()?;
        }

        Ok(())
    }
}
