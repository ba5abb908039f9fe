use crate::dense::DenseMatrix;
use crate::math::RealNumber;
use crate::penalty::PenaltyState;
use crate::problem::ProblemConstants;
use crate::traits::LinearOperator;
use std::sync::Arc;

/// Products of the constraint data that the gradient needs on every inner
/// iteration.
///
/// `ata` depends on `A` alone and is computed once per constraint matrix.
/// The remaining fields depend on the penalty state and are tagged with the
/// generation they were computed against.
#[derive(Debug, Clone)]
pub struct DerivedCache<T> {
    ata: Arc<DenseMatrix<T>>,
    shifted_rhs: Vec<T>,
    at_shifted_rhs: Vec<T>,
    hessian: DenseMatrix<T>,
    rho: T,
    generation: u64,
}

impl<T> DerivedCache<T>
where
    T: RealNumber,
{
    /// Full recomputation, including the `O(m·n²)` product `AᵗA`.
    pub(crate) fn compute(constants: &ProblemConstants<T>, penalty: &PenaltyState<T>) -> Self {
        let ata = Arc::new(constants.constraints().transpose_product());
        Self::with_ata(constants, ata, penalty)
    }

    /// Builds a cache around an already computed `AᵗA` for the same `A`.
    pub(crate) fn with_ata(
        constants: &ProblemConstants<T>,
        ata: Arc<DenseMatrix<T>>,
        penalty: &PenaltyState<T>,
    ) -> Self {
        let rho = penalty.rho();
        let hessian = constants.quadratic().combine(rho, &ata);
        let mut cache = Self {
            ata,
            shifted_rhs: vec![T::zero(); constants.ncons()],
            at_shifted_rhs: vec![T::zero(); constants.nvars()],
            hessian,
            rho,
            generation: penalty.generation(),
        };
        cache.update_shift(constants, penalty);
        cache
    }

    /// Brings the penalty-dependent quantities in line with `penalty`,
    /// keeping `AᵗA`. The combined matrix is only rebuilt when rho moved.
    pub(crate) fn update(&mut self, constants: &ProblemConstants<T>, penalty: &PenaltyState<T>) {
        if penalty.rho() != self.rho {
            self.rho = penalty.rho();
            self.hessian = constants.quadratic().combine(self.rho, &self.ata);
        }
        self.update_shift(constants, penalty);
        self.generation = penalty.generation();
    }

    fn update_shift(&mut self, constants: &ProblemConstants<T>, penalty: &PenaltyState<T>) {
        for ((out, b), p) in self
            .shifted_rhs
            .iter_mut()
            .zip(constants.rhs())
            .zip(penalty.shift())
        {
            *out = *b - *p;
        }
        constants
            .constraints()
            .apply_transpose(&self.shifted_rhs, &mut self.at_shifted_rhs);
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub fn ata(&self) -> &DenseMatrix<T> {
        &self.ata
    }

    pub fn shared_ata(&self) -> Arc<DenseMatrix<T>> {
        Arc::clone(&self.ata)
    }

    /// `b − Pk`
    pub fn shifted_rhs(&self) -> &[T] {
        &self.shifted_rhs
    }

    /// `Aᵗ(b − Pk)`
    pub fn at_shifted_rhs(&self) -> &[T] {
        &self.at_shifted_rhs
    }

    /// `Q + rho·AᵗA`, the Hessian of the penalized objective.
    pub fn hessian(&self) -> &DenseMatrix<T> {
        &self.hessian
    }

    pub fn rho(&self) -> T {
        self.rho
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn detached(&self) -> Self {
        Self {
            ata: Arc::new(DenseMatrix::clone(&self.ata)),
            ..self.clone()
        }
    }
}
