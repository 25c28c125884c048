//! beamscan-core - Detector response versus beam flux
//!
//! This crate runs the flux-scan analysis of a pixel telescope: for every
//! run in a catalog it reads the run's histograms and tracks how cluster
//! size and collected charge change with the beam flux.
//!
//! # Key Components
//!
//! - **RunCatalog**: runs, fluxes, flux ramps and run groups per telescope
//! - **Metrics**: per-ROC cluster-size and charge observables of one run
//! - **Charge cuts**: sum-charge mean, RMS and FWHM after successive masks
//! - **Groups**: spread of the sum-charge mean within named run groups
//! - **Series**: observable-versus-flux points for one ROC and flux ramp
//! - **Overlay**: normalised, peak-aligned charge distributions
//! - **FluxScan**: drives all of the above over a `RunArchive`

pub mod charge_cuts;
pub mod config;
pub mod error;
pub mod groups;
pub mod metrics;
pub mod overlay;
pub mod scan;
pub mod series;

pub use charge_cuts::*;
pub use config::*;
pub use error::*;
pub use groups::*;
pub use metrics::*;
pub use overlay::*;
pub use scan::*;
pub use series::*;
