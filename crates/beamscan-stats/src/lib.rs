//! beamscan-stats - Histogram statistics for test-beam analysis
//!
//! This crate provides the numerical building blocks used to summarise
//! detector histograms as a function of beam flux:
//!
//! - **FWHM**: scan-outward full width at half maximum of a binned peak
//! - **Histogram1D**: binned counts with flows, moments and bin masking
//! - **Histogram3D**: (column, row, value) cubes with axis projections
//! - **SampleSummary**: mean and spread of per-run values
//!
//! # Design
//!
//! Every type here is a plain value. Nothing holds global state, so all
//! functions can be called from any thread without coordination.

pub mod fwhm;
pub mod histogram;
pub mod histogram3d;
pub mod summary;

pub use fwhm::*;
pub use histogram::*;
pub use histogram3d::*;
pub use summary::*;
