use crate::fista::{lipschitz_bound, FistaSolver, InnerStatus};
use anyhow::{ensure, Result};
use penqp_core::iterate::IterateState;
use penqp_core::math::{norm_inf, project_box, RealNumber, Timer};
use penqp_core::options::SolveOptions;
use penqp_core::problem::{Bounds, ProblemData};
use penqp_core::solution::{Solution, Status};
use penqp_core::stats::{IterationRecord, SolveStats};
use tracing::{debug, info, info_span, warn};

/// Outer loop of the penalty method.
///
/// Each sweep minimizes the penalized objective with the accelerated
/// gradient inner loop, then moves the shift `Pk ← Pk + (Ax − b)`. rho is
/// multiplied by `rho_growth` (up to `rho_max`) whenever `‖Ax − b‖∞` fails
/// to shrink by `residual_decrease`; the shift is rescaled by
/// `rho_old / rho_new` so that `rho·Pk` is unchanged by the growth step.
pub struct PenaltySolver<T: RealNumber> {
    options: SolveOptions<T>,
    warm_start: Option<Vec<T>>,
}

impl<T> PenaltySolver<T>
where
    T: RealNumber,
{
    pub fn new(options: SolveOptions<T>) -> Self {
        Self {
            options,
            warm_start: None,
        }
    }

    pub fn with_warm_start(mut self, primal: Vec<T>) -> Self {
        self.warm_start = Some(primal);
        self
    }

    pub fn options(&self) -> &SolveOptions<T> {
        &self.options
    }

    /// Solves `problem` starting from its current penalty state. The penalty
    /// handle is updated in place, so sharers of the handle see the final
    /// rho and shift.
    pub fn solve(&self, problem: &mut ProblemData<T>) -> Result<Solution<T>> {
        let n = problem.nvars();
        let span = info_span!("penalty_solve", nvars = n, ncons = problem.ncons());
        let _guard = span.enter();

        let bounds = problem
            .bounds()
            .cloned()
            .unwrap_or_else(|| Bounds::unbounded(n));
        let mut x0 = match &self.warm_start {
            Some(primal) => {
                ensure!(
                    primal.len() == n,
                    "warm start has {} entries but the problem has {} variables",
                    primal.len(),
                    n
                );
                primal.clone()
            }
            None => vec![T::zero(); n],
        };
        project_box(&mut x0, &bounds.lower, &bounds.upper);

        let penalty = problem.penalty().clone();
        let inner = FistaSolver::from_options(&self.options);
        let mut state = IterateState::from_initial(x0);
        let mut stats = SolveStats::new();
        let mut timer = Timer::start();
        let mut status = Status::MaxIterations;
        let mut previous_residual = T::infinity();
        let mut residual_norm = T::infinity();
        let mut total_inner = 0;
        let mut outer_iterations = 0;

        for outer in 0..self.options.max_outer_iterations {
            if problem.refresh() {
                stats.cache_refreshes += 1;
            }
            let evaluator = problem.evaluator();
            let lipschitz = lipschitz_bound(evaluator.cache().hessian())?;
            let report = inner.run(&evaluator, lipschitz, &bounds, &mut state)?;
            total_inner += report.iterations;
            outer_iterations = outer + 1;
            stats.gradient_evaluations += report.iterations;
            stats.restarts += report.restarts;

            if report.status == InnerStatus::NonFinite {
                warn!(outer, "penalty solve stopped on a non-finite iterate");
                status = Status::NumericalFailure;
                break;
            }

            let residual = problem.constants().constraint_residual(&state.x_k);
            residual_norm = norm_inf(&residual);
            let rho = penalty.rho();
            let objective = problem.constants().quadratic_cost(&state.x_k);
            stats.push(IterationRecord::new(
                outer,
                report.iterations,
                report.converged(),
                residual_norm,
                state.g_k_norm,
                rho,
                objective,
                timer.elapsed(),
            ));
            debug!(
                outer,
                inner = report.iterations,
                restarts = report.restarts,
                residual = residual_norm.to_f64().unwrap_or(f64::NAN),
                mapping_norm = state.g_k_norm.to_f64().unwrap_or(f64::NAN),
                rho = rho.to_f64().unwrap_or(f64::NAN),
                "penalty iteration"
            );

            if report.converged() && residual_norm <= self.options.constraint_tolerance {
                status = Status::Optimal;
                break;
            }
            if let Some(limit) = self.options.max_time {
                if timer.elapsed() > limit {
                    status = Status::MaxTime;
                    break;
                }
            }

            let mut new_rho = rho;
            if residual_norm > self.options.residual_decrease * previous_residual {
                new_rho = (rho * self.options.rho_growth).min(self.options.rho_max);
            }
            let scale = rho / new_rho;
            let mut shift = penalty.shift();
            for (p, r) in shift.iter_mut().zip(residual.iter()) {
                *p = (*p + *r) * scale;
            }
            penalty.set(new_rho, shift)?;
            previous_residual = residual_norm;
            state.reset_momentum();
        }

        timer.stop();
        stats.solve_time = timer.elapsed();
        let rho = penalty.rho();
        let equality_dual = penalty.shift().into_iter().map(|p| rho * p).collect();
        let objective_value = problem.constants().quadratic_cost(&state.x_k);
        info!(
            status = ?status,
            outer = outer_iterations,
            inner = total_inner,
            residual = residual_norm.to_f64().unwrap_or(f64::NAN),
            objective = objective_value.to_f64().unwrap_or(f64::NAN),
            "penalty solve finished"
        );
        Ok(Solution {
            primal: state.x_k,
            equality_dual,
            status,
            objective_value,
            constraint_residual: residual_norm,
            iterations: total_inner,
            outer_iterations,
            stats,
        })
    }
}
