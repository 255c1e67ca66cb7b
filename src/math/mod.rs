//! Mathematical utilities: summary statistics, scaling, polynomial expansion
//! and least-squares solving.

pub mod poly;
pub mod scaler;
pub mod solve;
pub mod stats;

pub use poly::*;
pub use scaler::*;
pub use solve::*;
pub use stats::*;
