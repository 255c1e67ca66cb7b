//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - categorical vocabularies with raw-label parsing (`EducationLevel`,
//!   `EmploymentStatus`, `FamilyStatus`, `GoodsCategory`, ...)
//! - lender/decision/training-method enums
//! - typed application records (`RawRecord`, `Application`)
//! - seniority bucketing (`seniority`)

pub mod frame;
pub mod seniority;
pub mod types;

pub use frame::*;
pub use seniority::*;
pub use types::*;
