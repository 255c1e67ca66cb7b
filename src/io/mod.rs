//! Input/output helpers.
//!
//! - raw application CSV ingest + validation (`ingest`)
//! - stage CSV read/write for applications and feature frames (`dataset`)
//! - scaler/model/metrics JSON read/write (`artifacts`)

pub mod artifacts;
pub mod dataset;
pub mod ingest;

pub use artifacts::*;
pub use dataset::*;
pub use ingest::*;
