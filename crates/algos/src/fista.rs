use anyhow::{ensure, Result};
use itertools::izip;
use penqp_core::dense::DenseMatrix;
use penqp_core::iterate::IterateState;
use penqp_core::math::{all_finite, cast, project_box, RealNumber};
use penqp_core::options::SolveOptions;
use penqp_core::problem::Bounds;
use penqp_core::traits::SmoothObjective;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InnerStatus {
    Converged,
    MaxIterations,
    NonFinite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InnerReport {
    pub status: InnerStatus,
    pub iterations: usize,
    pub restarts: usize,
}

impl InnerReport {
    pub fn converged(&self) -> bool {
        self.status == InnerStatus::Converged
    }
}

/// Upper bound on the largest eigenvalue of a symmetric matrix, used as the
/// Lipschitz constant of the gradient. Falls back to one for a zero matrix;
/// non-finite entries are an error.
pub fn lipschitz_bound<T: RealNumber>(hessian: &DenseMatrix<T>) -> Result<T> {
    ensure!(
        all_finite(hessian.as_slice()),
        "Hessian has non-finite entries"
    );
    let bound = hessian.norm_inf().min(hessian.norm_frobenius());
    ensure!(bound.is_finite(), "Lipschitz bound overflowed");
    Ok(if bound > T::zero() { bound } else { T::one() })
}

/// FISTA with projection onto a box and optional gradient-based restart.
#[derive(Debug, Clone)]
pub struct FistaSolver<T: RealNumber> {
    tolerance: T,
    max_iterations: usize,
    adaptive_restart: bool,
}

impl<T> FistaSolver<T>
where
    T: RealNumber,
{
    pub fn new(tolerance: T, max_iterations: usize, adaptive_restart: bool) -> Self {
        Self {
            tolerance,
            max_iterations,
            adaptive_restart,
        }
    }

    pub fn from_options(options: &SolveOptions<T>) -> Self {
        Self::new(
            options.tolerance,
            options.max_inner_iterations,
            options.adaptive_restart,
        )
    }

    /// Runs until the gradient-mapping norm drops below the tolerance.
    /// `state` must start feasible; it holds the last accepted iterate on
    /// return.
    pub fn run<F>(
        &self,
        objective: &F,
        lipschitz: T,
        bounds: &Bounds<T>,
        state: &mut IterateState<T>,
    ) -> Result<InnerReport>
    where
        F: SmoothObjective<T>,
    {
        let n = objective.dim();
        ensure!(
            state.dim() == n,
            "iterate dimension {} does not match objective dimension {n}",
            state.dim()
        );
        ensure!(
            bounds.lower.len() == n && bounds.upper.len() == n,
            "bounds dimension does not match objective dimension {n}"
        );
        ensure!(lipschitz > T::zero(), "Lipschitz constant must be positive");

        let step = T::one() / lipschitz;
        let two = cast::<T>(2.0);
        let four = cast::<T>(4.0);
        let mut grad = vec![T::zero(); n];
        let mut x_next = vec![T::zero(); n];
        let mut y_next = vec![T::zero(); n];
        let mut t = T::one();
        let mut report = InnerReport {
            status: InnerStatus::MaxIterations,
            iterations: 0,
            restarts: 0,
        };

        for iter in 0..self.max_iterations {
            objective.gradient_into(&state.y_k, &mut grad);
            for (xn, y, g) in izip!(x_next.iter_mut(), &state.y_k, &grad) {
                *xn = *y - step * *g;
            }
            project_box(&mut x_next, &bounds.lower, &bounds.upper);

            // G = L·(y_k − x_next)
            let mut mapping_sq = T::zero();
            let mut restart_test = T::zero();
            for (xn, y, xk) in izip!(&x_next, &state.y_k, &state.x_k) {
                let mapping = lipschitz * (*y - *xn);
                mapping_sq += mapping * mapping;
                restart_test += mapping * (*xn - *xk);
            }
            report.iterations = iter + 1;
            state.g_k_norm = mapping_sq.sqrt();
            if !state.g_k_norm.is_finite() || !all_finite(&x_next) {
                warn!(iteration = iter, "non-finite iterate in accelerated gradient");
                report.status = InnerStatus::NonFinite;
                break;
            }

            let mut t_next = (T::one() + (T::one() + four * t * t).sqrt()) / two;
            let mut momentum = (t - T::one()) / t_next;
            if self.adaptive_restart && restart_test > T::zero() {
                t_next = T::one();
                momentum = T::zero();
                report.restarts += 1;
            }
            for (yn, xn, xk) in izip!(y_next.iter_mut(), &x_next, &state.x_k) {
                *yn = *xn + momentum * (*xn - *xk);
            }
            state.advance(&mut x_next, &mut y_next);
            t = t_next;

            if state.g_k_norm <= self.tolerance {
                report.status = InnerStatus::Converged;
                break;
            }
        }
        trace!(
            iterations = report.iterations,
            restarts = report.restarts,
            status = ?report.status,
            "inner loop finished"
        );
        Ok(report)
    }
}
