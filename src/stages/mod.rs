//! Pipeline stage transforms.
//!
//! Each stage is a pure function over typed records or feature frames; the
//! CLI layer owns all file staging. Order of the chain:
//!
//! prepare -> fill-missing -> fix-anomalies -> derive-features
//!   -> lender-prepare -> split -> train -> evaluate

pub mod anomalies;
pub mod clean;
pub mod features;
pub mod lender;
pub mod prepare;
pub mod split;

pub use anomalies::*;
pub use clean::*;
pub use features::*;
pub use lender::*;
pub use prepare::*;
pub use split::*;
