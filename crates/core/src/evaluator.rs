//! Objective and gradient of the penalized problem
//!
//! ```text
//! f(x) = 0.5·xᵗQx + c·qᵗx + (rho/2)·‖Ax − b + Pk‖²
//! ∇f(x) = (Q + rho·AᵗA)x + c·q − rho·Aᵗ(b − Pk)
//! ```
//!
//! where `c` is [`LINEAR_TERM_COEFFICIENT`].

use crate::cache::DerivedCache;
use crate::math::{axpy, cast, dot, RealNumber};
use crate::problem::ProblemConstants;
use crate::traits::{LinearOperator, SmoothObjective};

/// Coefficient applied to `qᵗx` in the objective and to `q` in the gradient.
///
/// 1.0 gives the standard `0.5·xᵗQx + qᵗx` form. Some formulations of this
/// problem document `2·qᵗx`; switching conventions means changing this value
/// only.
pub const LINEAR_TERM_COEFFICIENT: f64 = 1.0;

/// Evaluates the penalized objective against a cache snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a, T> {
    constants: &'a ProblemConstants<T>,
    cache: &'a DerivedCache<T>,
}

impl<'a, T> Evaluator<'a, T>
where
    T: RealNumber,
{
    /// `cache` must be current; outside the crate evaluators come from
    /// [`ProblemData::evaluator`](crate::problem::ProblemData::evaluator).
    pub(crate) fn new(constants: &'a ProblemConstants<T>, cache: &'a DerivedCache<T>) -> Self {
        Self { constants, cache }
    }

    pub fn constants(&self) -> &'a ProblemConstants<T> {
        self.constants
    }

    pub fn cache(&self) -> &'a DerivedCache<T> {
        self.cache
    }

    /// `Ax − (b − Pk)`
    pub fn penalty_residual(&self, x: &[T]) -> Vec<T> {
        let mut residual = vec![T::zero(); self.constants.ncons()];
        self.constants.constraints().apply(x, &mut residual);
        for (r, s) in residual.iter_mut().zip(self.cache.shifted_rhs()) {
            *r -= *s;
        }
        residual
    }

    pub fn objective(&self, x: &[T]) -> T {
        assert_eq!(x.len(), self.constants.nvars(), "objective dimension mismatch");
        let residual = self.penalty_residual(x);
        let half = cast::<T>(0.5);
        self.constants.quadratic_cost(x) + half * self.cache.rho() * dot(&residual, &residual)
    }

    pub fn gradient(&self, x: &[T]) -> Vec<T> {
        let mut grad = vec![T::zero(); self.constants.nvars()];
        self.gradient_into(x, &mut grad);
        grad
    }

    pub fn gradient_into(&self, x: &[T], grad: &mut [T]) {
        assert_eq!(x.len(), self.constants.nvars(), "gradient dimension mismatch");
        self.cache.hessian().apply(x, grad);
        axpy(cast::<T>(LINEAR_TERM_COEFFICIENT), self.constants.linear(), grad);
        axpy(-self.cache.rho(), self.cache.at_shifted_rhs(), grad);
    }
}

impl<'a, T> SmoothObjective<T> for Evaluator<'a, T>
where
    T: RealNumber,
{
    fn dim(&self) -> usize {
        self.constants.nvars()
    }

    fn value(&self, x: &[T]) -> T {
        self.objective(x)
    }

    fn gradient_into(&self, x: &[T], grad: &mut [T]) {
        Evaluator::gradient_into(self, x, grad)
    }
}
