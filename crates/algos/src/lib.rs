#![forbid(unsafe_code)]

pub mod fista;
pub mod penalty;

pub use fista::{lipschitz_bound, FistaSolver, InnerReport, InnerStatus};
pub use penalty::PenaltySolver;
