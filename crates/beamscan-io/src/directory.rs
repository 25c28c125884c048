//! Histogram dumps stored as files in per-run directories
//!
//! Each histogram `<name>` lives next to its siblings as `<name>.json`
//! (serde form of either dimension) or `<name>.csv` (1D only). When both
//! exist the JSON file is used. Runs are found under a base directory
//! through a directory-name template containing `{run}`.

use std::fs;
use std::path::{Path, PathBuf};

use beamscan_stats::{Histogram1D, Histogram3D};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::csv_reader::read_histogram_csv;
use crate::reader::{BoxedSource, HistogramSource, IoError, IoResult, RunArchive};

/// Default per-run directory template, e.g. `000322`
pub const DEFAULT_RUN_TEMPLATE: &str = "000{run}";

/// Histograms of one directory
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    /// Open a directory of histogram dumps
    pub fn open(dir: impl Into<PathBuf>) -> IoResult<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(IoError::FileNotFound(dir.display().to_string()));
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn json_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    fn csv_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }
}

impl HistogramSource for DirectorySource {
    fn histogram_1d(&self, name: &str) -> IoResult<Histogram1D> {
        let json = self.json_path(name);
        if json.is_file() {
            tracing::debug!("Loading 1D histogram {:?}", json);
            return read_json(&json, name, Dimension::One);
        }

        let csv = self.csv_path(name);
        if csv.is_file() {
            tracing::debug!("Loading 1D histogram {:?}", csv);
            return read_histogram_csv(&csv);
        }

        Err(IoError::not_found(name, self.location()))
    }

    fn histogram_3d(&self, name: &str) -> IoResult<Histogram3D> {
        let json = self.json_path(name);
        if json.is_file() {
            tracing::debug!("Loading 3D histogram {:?}", json);
            return read_json(&json, name, Dimension::Three);
        }
        if self.csv_path(name).is_file() {
            return Err(IoError::WrongDimension {
                name: name.to_string(),
                expected: "3D",
            });
        }
        Err(IoError::not_found(name, self.location()))
    }

    fn contains(&self, name: &str) -> bool {
        self.json_path(name).is_file() || self.csv_path(name).is_file()
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}

/// Per-run directories below a common base
#[derive(Debug, Clone)]
pub struct DirectoryArchive {
    base: PathBuf,
    template: String,
}

impl DirectoryArchive {
    /// Archive using [`DEFAULT_RUN_TEMPLATE`]
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self::with_template(base, DEFAULT_RUN_TEMPLATE)
    }

    pub fn with_template(base: impl Into<PathBuf>, template: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            template: template.into(),
        }
    }

    /// Directory holding the histograms of `run`
    pub fn run_dir(&self, run: u32) -> PathBuf {
        self.base
            .join(self.template.replace("{run}", &run.to_string()))
    }
}

impl RunArchive for DirectoryArchive {
    fn open_run(&self, run: u32) -> IoResult<BoxedSource> {
        let dir = self.run_dir(run);
        if !dir.is_dir() {
            tracing::warn!("Run {} has no histogram directory at {:?}", run, dir);
            return Err(IoError::RunNotFound(run));
        }
        Ok(Box::new(DirectorySource::open(dir)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimension {
    One,
    Three,
}

impl Dimension {
    fn label(self) -> &'static str {
        match self {
            Dimension::One => "1D",
            Dimension::Three => "3D",
        }
    }

    /// Dimension of a JSON dump, judged by its edge fields
    fn of(value: &Value) -> Option<Self> {
        if value.get("x_edges").is_some() {
            Some(Dimension::Three)
        } else if value.get("edges").is_some() {
            Some(Dimension::One)
        } else {
            None
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, name: &str, expected: Dimension) -> IoResult<T> {
    let text = fs::read_to_string(path).map_err(|e| IoError::OpenFailed(e.to_string()))?;
    let invalid = |e: serde_json::Error| IoError::InvalidFormat(format!("{}: {}", path.display(), e));

    let value: Value = serde_json::from_str(&text).map_err(invalid)?;
    if matches!(Dimension::of(&value), Some(found) if found != expected) {
        return Err(IoError::WrongDimension {
            name: name.to_string(),
            expected: expected.label(),
        });
    }
    serde_json::from_value(value).map_err(invalid)
}

/// Write any histogram as a JSON dump
pub fn write_histogram_json<T: Serialize>(path: &Path, hist: &T) -> IoResult<()> {
    let text =
        serde_json::to_string_pretty(hist).map_err(|e| IoError::WriteFailed(e.to_string()))?;
    fs::write(path, text).map_err(|e| IoError::WriteFailed(e.to_string()))
}
