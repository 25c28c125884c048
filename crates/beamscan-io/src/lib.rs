//! beamscan-io - Histogram loading for beamscan
//!
//! This crate turns histogram dumps into `beamscan-stats` values:
//!
//! - **JSON**: serde form of 1D and 3D histograms
//! - **CSV**: `low,high,content` rows for 1D histograms
//! - **Memory**: in-process maps for fixtures and callers that already hold data
//!
//! # Design
//!
//! All sources implement the `HistogramSource` trait and all run stores the
//! `RunArchive` trait, so analysis code never touches paths directly.

pub mod csv_reader;
pub mod directory;
pub mod memory;
pub mod reader;

pub use csv_reader::*;
pub use directory::*;
pub use memory::*;
pub use reader::*;
