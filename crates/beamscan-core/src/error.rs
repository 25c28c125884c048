//! Error types for beamscan-core

use beamscan_io::IoError;
use beamscan_stats::HistogramError;
use thiserror::Error;

use crate::config::ConfigError;

/// Main error type for flux-scan analysis
#[derive(Error, Debug)]
pub enum ScanError {
    /// Catalog loading or validation failed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Histogram could not be read
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Histogram could not be edited
    #[error("Histogram error: {0}")]
    Histogram(#[from] HistogramError),

    /// Telescope id not present in the catalog
    #[error("Unknown telescope {0}")]
    UnknownTelescope(u32),

    /// Run listed somewhere without a flux entry
    #[error("Run {0} has no flux entry in the catalog")]
    MissingRun(u32),

    /// Report could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Failure while analysing one run
    #[error("Run {run}: {source}")]
    InRun {
        run: u32,
        #[source]
        source: Box<ScanError>,
    },
}

impl ScanError {
    pub(crate) fn in_run(run: u32, err: ScanError) -> Self {
        match err {
            ScanError::InRun { .. } => err,
            other => ScanError::InRun {
                run,
                source: Box::new(other),
            },
        }
    }
}

/// Result type for flux-scan analysis
pub type ScanResult<T> = Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_run_wraps_once() {
        let err = ScanError::in_run(322, ScanError::MissingRun(7));
        assert_eq!(err.to_string(), "Run 322: Run 7 has no flux entry in the catalog");

        let again = ScanError::in_run(325, err);
        assert!(matches!(again, ScanError::InRun { run: 322, .. }));
    }

    #[test]
    fn test_from_io_error() {
        let err: ScanError = IoError::RunNotFound(5).into();
        assert!(matches!(err, ScanError::Io(IoError::RunNotFound(5))));
    }
}
