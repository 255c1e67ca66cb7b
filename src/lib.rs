//! `credit-pipeline` library crate.
//!
//! The binary (`credit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - stages are reusable (e.g., batch scoring services, notebooks)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod stages;
