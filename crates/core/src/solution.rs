use crate::math::RealNumber;
use crate::stats::SolveStats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Status {
    Optimal,
    MaxIterations,
    MaxTime,
    NumericalFailure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution<T: RealNumber> {
    pub primal: Vec<T>,
    /// Multipliers of `Ax = b`, recovered as `rho·Pk`.
    pub equality_dual: Vec<T>,
    pub status: Status,
    /// `0.5·xᵗQx + c·qᵗx` at `primal`, penalty excluded.
    pub objective_value: T,
    pub constraint_residual: T,
    /// Inner iterations summed over all outer iterations.
    pub iterations: usize,
    pub outer_iterations: usize,
    pub stats: SolveStats<T>,
}

impl<T> Solution<T>
where
    T: RealNumber,
{
    pub fn with_capacity(n: usize, m: usize) -> Self {
        Self {
            primal: vec![T::zero(); n],
            equality_dual: vec![T::zero(); m],
            status: Status::NumericalFailure,
            objective_value: T::zero(),
            constraint_residual: T::infinity(),
            iterations: 0,
            outer_iterations: 0,
            stats: SolveStats::new(),
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == Status::Optimal
    }
}
