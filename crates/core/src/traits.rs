use crate::math::RealNumber;

pub trait LinearOperator<T: RealNumber>: Send + Sync {
    fn dim(&self) -> (usize, usize);

    fn apply(&self, x: &[T], y: &mut [T]);

    fn apply_transpose(&self, x: &[T], y: &mut [T]);
}

/// A differentiable objective over `R^n`.
///
/// `gradient_into` writes into a caller-owned buffer so inner loops can run
/// without allocating.
pub trait SmoothObjective<T: RealNumber> {
    fn dim(&self) -> usize;

    fn value(&self, x: &[T]) -> T;

    fn gradient_into(&self, x: &[T], grad: &mut [T]);

    fn gradient(&self, x: &[T]) -> Vec<T> {
        let mut grad = vec![T::zero(); self.dim()];
        self.gradient_into(x, &mut grad);
        grad
    }
}
