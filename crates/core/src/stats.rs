use crate::math::RealNumber;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One outer (penalty) iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord<T: RealNumber> {
    pub iteration: usize,
    pub inner_iterations: usize,
    pub inner_converged: bool,
    pub constraint_residual: T,
    pub gradient_mapping_norm: T,
    pub rho: T,
    pub objective: T,
    pub elapsed: Duration,
}

impl<T> IterationRecord<T>
where
    T: RealNumber,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        iteration: usize,
        inner_iterations: usize,
        inner_converged: bool,
        constraint_residual: T,
        gradient_mapping_norm: T,
        rho: T,
        objective: T,
        elapsed: Duration,
    ) -> Self {
        Self {
            iteration,
            inner_iterations,
            inner_converged,
            constraint_residual,
            gradient_mapping_norm,
            rho,
            objective,
            elapsed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveStats<T: RealNumber> {
    pub history: Vec<IterationRecord<T>>,
    pub solve_time: Duration,
    pub gradient_evaluations: usize,
    pub cache_refreshes: usize,
    pub restarts: usize,
}

impl<T> SolveStats<T>
where
    T: RealNumber,
{
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            solve_time: Duration::ZERO,
            gradient_evaluations: 0,
            cache_refreshes: 0,
            restarts: 0,
        }
    }

    pub fn push(&mut self, record: IterationRecord<T>) {
        self.history.push(record);
    }
}

impl<T> Default for SolveStats<T>
where
    T: RealNumber,
{
    fn default() -> Self {
        Self::new()
    }
}
