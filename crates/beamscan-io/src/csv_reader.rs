//! CSV dumps of 1D histograms
//!
//! One row per in-range bin with the header `low,high,content`. Rows must be
//! contiguous: each `low` equals the previous row's `high`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use beamscan_stats::Histogram1D;
use serde::{Deserialize, Serialize};

use crate::reader::{IoError, IoResult};

/// Relative tolerance when matching adjacent bin boundaries
const EDGE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct CsvBin {
    low: f64,
    high: f64,
    content: f64,
}

/// Read a 1D histogram from a CSV dump
pub fn read_histogram_csv(path: &Path) -> IoResult<Histogram1D> {
    if !path.exists() {
        return Err(IoError::FileNotFound(path.display().to_string()));
    }

    let file = File::open(path).map_err(|e| IoError::OpenFailed(e.to_string()))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let mut bins = Vec::new();
    for (i, result) in reader.deserialize::<CsvBin>().enumerate() {
        let bin = result.map_err(|e| {
            IoError::InvalidFormat(format!("{} row {}: {}", path.display(), i + 1, e))
        })?;
        bins.push(bin);
    }

    histogram_from_bins(&bins).map_err(|e| match e {
        IoError::InvalidFormat(msg) => IoError::InvalidFormat(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Write a 1D histogram as a CSV dump; flows are not written
pub fn write_histogram_csv(path: &Path, hist: &Histogram1D) -> IoResult<()> {
    let mut writer =
        csv::Writer::from_path(path).map_err(|e| IoError::WriteFailed(e.to_string()))?;

    for (i, &content) in hist.counts().iter().enumerate() {
        let bin = CsvBin {
            low: hist.edges()[i],
            high: hist.edges()[i + 1],
            content,
        };
        writer
            .serialize(bin)
            .map_err(|e| IoError::WriteFailed(e.to_string()))?;
    }

    writer
        .flush()
        .map_err(|e| IoError::WriteFailed(e.to_string()))
}

fn histogram_from_bins(bins: &[CsvBin]) -> IoResult<Histogram1D> {
    let first = bins
        .first()
        .ok_or_else(|| IoError::InvalidFormat("no bins".to_string()))?;

    let mut edges = Vec::with_capacity(bins.len() + 1);
    edges.push(first.low);
    for (i, pair) in bins.windows(2).enumerate() {
        let (prev, next) = (pair[0].high, pair[1].low);
        let scale = prev.abs().max(next.abs()).max(1.0);
        if (prev - next).abs() > EDGE_TOLERANCE * scale {
            return Err(IoError::InvalidFormat(format!(
                "gap between row {} (high={}) and row {} (low={})",
                i + 1,
                prev,
                i + 2,
                next
            )));
        }
    }
    edges.extend(bins.iter().map(|b| b.high));

    let counts = bins.iter().map(|b| b.content).collect();
    Ok(Histogram1D::new(edges, counts)?)
}
