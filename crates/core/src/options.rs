use crate::math::{cast, RealNumber};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions<T: RealNumber> {
    /// Inner loop stops once the gradient-mapping norm drops below this.
    pub tolerance: T,
    /// Outer loop stops once `‖Ax − b‖∞` drops below this.
    pub constraint_tolerance: T,
    pub max_inner_iterations: usize,
    pub max_outer_iterations: usize,
    pub max_time: Option<Duration>,
    pub rho: T,
    pub rho_growth: T,
    pub rho_max: T,
    /// rho grows when the residual fails to shrink below this fraction of
    /// the previous outer iteration's residual.
    pub residual_decrease: T,
    pub adaptive_restart: bool,
}

impl<T> SolveOptions<T>
where
    T: RealNumber,
{
    pub fn with_tolerance(tolerance: T) -> Self {
        Self {
            tolerance,
            constraint_tolerance: tolerance,
            ..Self::default()
        }
    }
}

impl<T> Default for SolveOptions<T>
where
    T: RealNumber,
{
    fn default() -> Self {
        Self {
            tolerance: cast(1e-6),
            constraint_tolerance: cast(1e-6),
            max_inner_iterations: 5_000,
            max_outer_iterations: 100,
            max_time: None,
            rho: cast(1.0),
            rho_growth: cast(10.0),
            rho_max: cast(1e8),
            residual_decrease: cast(0.25),
            adaptive_restart: true,
        }
    }
}
