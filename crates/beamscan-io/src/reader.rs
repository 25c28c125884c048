//! Histogram source traits and common types
//!
//! A `HistogramSource` hands out named histograms from one run; a
//! `RunArchive` opens the source belonging to a run number. Analysis code
//! only sees these traits, so it runs the same on disk dumps and on
//! in-memory fixtures.

use beamscan_stats::{Histogram1D, Histogram3D, HistogramError};
use thiserror::Error;

/// Errors that can occur while loading histograms
#[derive(Debug, Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to open file: {0}")]
    OpenFailed(String),

    #[error("Failed to write file: {0}")]
    WriteFailed(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Histogram '{name}' not found in {location}")]
    HistogramNotFound { name: String, location: String },

    #[error("Histogram '{name}' is not a {expected} histogram")]
    WrongDimension { name: String, expected: &'static str },

    #[error("Run {0} not available")]
    RunNotFound(u32),

    #[error("Invalid histogram: {0}")]
    Histogram(#[from] HistogramError),
}

/// Result type for I/O operations
pub type IoResult<T> = Result<T, IoError>;

/// Named histograms belonging to one run
pub trait HistogramSource: Send + Sync {
    /// Read a 1D histogram by name
    fn histogram_1d(&self, name: &str) -> IoResult<Histogram1D>;

    /// Read a 3D histogram by name
    fn histogram_3d(&self, name: &str) -> IoResult<Histogram3D>;

    /// Check whether a histogram of either dimension exists
    fn contains(&self, name: &str) -> bool;

    /// Human-readable location, used in error messages
    fn location(&self) -> String;
}

/// A boxed source for dynamic dispatch
pub type BoxedSource = Box<dyn HistogramSource>;

/// Per-run access to histogram sources
pub trait RunArchive: Send + Sync {
    /// Open the histograms of `run`
    fn open_run(&self, run: u32) -> IoResult<BoxedSource>;
}

impl IoError {
    pub(crate) fn not_found(name: &str, location: String) -> Self {
        IoError::HistogramNotFound {
            name: name.to_string(),
            location,
        }
    }
}
