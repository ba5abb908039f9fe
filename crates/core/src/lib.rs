#![forbid(unsafe_code)]

pub mod cache;
pub mod dense;
pub mod evaluator;
pub mod iterate;
pub mod math;
pub mod options;
pub mod penalty;
pub mod problem;
pub mod solution;
pub mod stats;
pub mod traits;

pub use cache::*;
pub use dense::*;
pub use evaluator::*;
pub use iterate::*;
pub use math::*;
pub use options::*;
pub use penalty::*;
pub use problem::*;
pub use solution::*;
pub use stats::*;
pub use traits::*;
