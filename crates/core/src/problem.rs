use crate::cache::DerivedCache;
use crate::dense::DenseMatrix;
use crate::evaluator::{Evaluator, LINEAR_TERM_COEFFICIENT};
use crate::math::{cast, dot, RealNumber};
use crate::penalty::PenaltyHandle;
use crate::traits::LinearOperator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum ProblemError {
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
}

pub type ProblemResult<T> = Result<T, ProblemError>;

/// `Q`, `q`, `A` and `b` of one solve.
///
/// The buffers sit behind `Arc`s so related problems (same `Q`/`A`,
/// different `b`) can share them instead of holding copies.
#[derive(Debug, Clone)]
pub struct ProblemConstants<T> {
    quadratic: Arc<DenseMatrix<T>>,
    linear: Arc<Vec<T>>,
    constraints: Arc<DenseMatrix<T>>,
    rhs: Arc<Vec<T>>,
    n: usize,
}

impl<T> ProblemConstants<T>
where
    T: RealNumber,
{
    pub fn new(
        quadratic: Arc<DenseMatrix<T>>,
        linear: Arc<Vec<T>>,
        constraints: Arc<DenseMatrix<T>>,
        rhs: Arc<Vec<T>>,
        n: usize,
    ) -> ProblemResult<Self> {
        let constants = Self {
            quadratic,
            linear,
            constraints,
            rhs,
            n,
        };
        constants.validate()?;
        Ok(constants)
    }

    pub fn validate(&self) -> ProblemResult<()> {
        let n = self.n;
        self.quadratic.validate()?;
        self.constraints.validate()?;
        if self.quadratic.nrows() != n || self.quadratic.ncols() != n {
            return Err(ProblemError::DimensionMismatch(format!(
                "quadratic matrix is {}x{} but must be square and match variable dimension {n}",
                self.quadratic.nrows(),
                self.quadratic.ncols()
            )));
        }
        if self.linear.len() != n {
            return Err(ProblemError::DimensionMismatch(format!(
                "linear term length {} != nvars {n}",
                self.linear.len()
            )));
        }
        if self.constraints.ncols() != n {
            return Err(ProblemError::DimensionMismatch(format!(
                "constraint matrix columns {} != nvars {n}",
                self.constraints.ncols()
            )));
        }
        if self.constraints.nrows() != self.rhs.len() {
            return Err(ProblemError::DimensionMismatch(format!(
                "constraint rows {} != rhs len {}",
                self.constraints.nrows(),
                self.rhs.len()
            )));
        }
        Ok(())
    }

    pub fn nvars(&self) -> usize {
        self.n
    }

    pub fn ncons(&self) -> usize {
        self.rhs.len()
    }

    pub fn quadratic(&self) -> &DenseMatrix<T> {
        &self.quadratic
    }

    pub fn linear(&self) -> &[T] {
        &self.linear
    }

    pub fn constraints(&self) -> &DenseMatrix<T> {
        &self.constraints
    }

    pub fn rhs(&self) -> &[T] {
        &self.rhs
    }

    /// `0.5·xᵗQx + c·qᵗx`, without the penalty term.
    pub fn quadratic_cost(&self, x: &[T]) -> T {
        let mut qx = vec![T::zero(); self.n];
        self.quadratic.apply(x, &mut qx);
        cast::<T>(0.5) * dot(x, &qx) + cast::<T>(LINEAR_TERM_COEFFICIENT) * dot(self.linear(), x)
    }

    /// `Ax − b`
    pub fn constraint_residual(&self, x: &[T]) -> Vec<T> {
        let mut residual = vec![T::zero(); self.ncons()];
        self.constraints.apply(x, &mut residual);
        for (r, b) in residual.iter_mut().zip(self.rhs.iter()) {
            *r -= *b;
        }
        residual
    }

    pub fn shares_storage_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.quadratic, &other.quadratic)
            && Arc::ptr_eq(&self.linear, &other.linear)
            && Arc::ptr_eq(&self.constraints, &other.constraints)
    }

    fn deep_copy(&self) -> Self {
        Self {
            quadratic: Arc::new(DenseMatrix::clone(&self.quadratic)),
            linear: Arc::new(self.linear.to_vec()),
            constraints: Arc::new(DenseMatrix::clone(&self.constraints)),
            rhs: Arc::new(self.rhs.to_vec()),
            n: self.n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds<T> {
    pub lower: Vec<T>,
    pub upper: Vec<T>,
}

impl<T> Bounds<T>
where
    T: RealNumber,
{
    pub fn unbounded(dim: usize) -> Self {
        Self {
            lower: vec![T::neg_infinity(); dim],
            upper: vec![T::infinity(); dim],
        }
    }

    pub fn validate(&self, nvars: usize) -> ProblemResult<()> {
        if self.lower.len() != nvars {
            return Err(ProblemError::DimensionMismatch(format!(
                "lower bound len {} != nvars {nvars}",
                self.lower.len()
            )));
        }
        if self.upper.len() != nvars {
            return Err(ProblemError::DimensionMismatch(format!(
                "upper bound len {} != nvars {nvars}",
                self.upper.len()
            )));
        }
        Ok(())
    }

    /// Indices where `lower > upper`. Not enforced anywhere; callers that
    /// care can report them.
    pub fn crossed(&self) -> Vec<usize> {
        self.lower
            .iter()
            .zip(self.upper.iter())
            .enumerate()
            .filter(|(_, (lo, hi))| lo > hi)
            .map(|(i, _)| i)
            .collect()
    }
}

/// A QP in penalty form: constants, penalty state, derived cache and bounds.
#[derive(Debug, Clone)]
pub struct ProblemData<T> {
    constants: ProblemConstants<T>,
    penalty: PenaltyHandle<T>,
    cache: DerivedCache<T>,
    bounds: Option<Bounds<T>>,
}

impl<T> ProblemData<T>
where
    T: RealNumber,
{
    /// Builds a problem over shared buffers. Clones of the same `Arc`s and
    /// of the same `penalty` handle may back several problems; penalty
    /// updates made through any clone of the handle are picked up by every
    /// one of them on their next evaluation.
    pub fn from_shared(
        quadratic: Arc<DenseMatrix<T>>,
        linear: Arc<Vec<T>>,
        constraints: Arc<DenseMatrix<T>>,
        rhs: Arc<Vec<T>>,
        penalty: PenaltyHandle<T>,
        n: usize,
    ) -> ProblemResult<Self> {
        let constants = ProblemConstants::new(quadratic, linear, constraints, rhs, n)?;
        let state = penalty.snapshot();
        if state.dim() != constants.ncons() {
            return Err(ProblemError::DimensionMismatch(format!(
                "penalty shift length {} != constraint rows {}",
                state.dim(),
                constants.ncons()
            )));
        }
        let cache = DerivedCache::compute(&constants, &state);
        debug!(
            nvars = constants.nvars(),
            ncons = constants.ncons(),
            "built penalty problem"
        );
        Ok(Self {
            constants,
            penalty,
            cache,
            bounds: None,
        })
    }

    /// Builds a fully independent problem from copies of the inputs.
    pub fn from_values(
        quadratic: &DenseMatrix<T>,
        linear: &[T],
        constraints: &DenseMatrix<T>,
        rhs: &[T],
        shift: &[T],
        rho: T,
    ) -> ProblemResult<Self> {
        Self::from_shared(
            Arc::new(quadratic.clone()),
            Arc::new(linear.to_vec()),
            Arc::new(constraints.clone()),
            Arc::new(rhs.to_vec()),
            PenaltyHandle::new(rho, shift.to_vec()),
            linear.len(),
        )
    }

    /// A sibling problem with a new right-hand side. `Q`, `q`, `A` and the
    /// cached `AᵗA` are shared; the penalty state starts fresh with the
    /// current rho and a zero shift.
    pub fn with_rhs(&self, rhs: Vec<T>) -> ProblemResult<Self> {
        let constants = ProblemConstants::new(
            Arc::clone(&self.constants.quadratic),
            Arc::clone(&self.constants.linear),
            Arc::clone(&self.constants.constraints),
            Arc::new(rhs),
            self.constants.n,
        )?;
        let penalty = PenaltyHandle::zeros(self.penalty.rho(), constants.ncons());
        let cache = DerivedCache::with_ata(&constants, self.cache.shared_ata(), &penalty.snapshot());
        Ok(Self {
            constants,
            penalty,
            cache,
            bounds: self.bounds.clone(),
        })
    }

    /// Deep copy with no storage shared with `self`.
    pub fn detach(&self) -> Self {
        Self {
            constants: self.constants.deep_copy(),
            penalty: self.penalty.deep_clone(),
            cache: self.cache.detached(),
            bounds: self.bounds.clone(),
        }
    }

    pub fn set_bounds(&mut self, lower: Vec<T>, upper: Vec<T>) -> ProblemResult<()> {
        let bounds = Bounds { lower, upper };
        bounds.validate(self.constants.nvars())?;
        self.bounds = Some(bounds);
        Ok(())
    }

    pub fn bounds(&self) -> Option<&Bounds<T>> {
        self.bounds.as_ref()
    }

    pub fn constants(&self) -> &ProblemConstants<T> {
        &self.constants
    }

    pub fn penalty(&self) -> &PenaltyHandle<T> {
        &self.penalty
    }

    pub fn cache(&self) -> &DerivedCache<T> {
        &self.cache
    }

    pub fn nvars(&self) -> usize {
        self.constants.nvars()
    }

    pub fn ncons(&self) -> usize {
        self.constants.ncons()
    }

    pub fn is_cache_current(&self) -> bool {
        self.cache.is_current(self.penalty.generation())
    }

    /// Recomputes the penalty-dependent part of the cache if the penalty
    /// state changed since it was last computed. Returns whether it did.
    pub fn refresh(&mut self) -> bool {
        if self.is_cache_current() {
            return false;
        }
        let state = self.penalty.snapshot();
        self.cache.update(&self.constants, &state);
        trace!(
            generation = state.generation(),
            rho = state.rho().to_f64().unwrap_or(f64::NAN),
            "refreshed derived-quantity cache"
        );
        true
    }

    /// Recomputes every cached quantity, `AᵗA` included.
    pub fn recompute_cache(&mut self) {
        let state = self.penalty.snapshot();
        self.cache = DerivedCache::compute(&self.constants, &state);
        debug!(
            generation = state.generation(),
            "recomputed derived-quantity cache"
        );
    }

    /// Evaluator bound to an up-to-date cache.
    pub fn evaluator(&mut self) -> Evaluator<'_, T> {
        self.refresh();
        Evaluator::new(&self.constants, &self.cache)
    }

    pub fn evaluate_objective(&mut self, x: &[T]) -> T {
        self.evaluator().objective(x)
    }

    pub fn evaluate_gradient(&mut self, x: &[T]) -> Vec<T> {
        self.evaluator().gradient(x)
    }
}
