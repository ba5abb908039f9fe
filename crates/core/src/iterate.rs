use crate::math::RealNumber;
use serde::{Deserialize, Serialize};
use std::mem;

/// Iterates of an accelerated projected-gradient method.
///
/// `x_k`/`x_k_1` are the current and previous primal points, `y_k`/`y_k_1`
/// the current and previous extrapolated points, `g_k_norm` the norm of the
/// last gradient mapping (infinite until the first step).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterateState<T> {
    pub x_k: Vec<T>,
    pub x_k_1: Vec<T>,
    pub y_k: Vec<T>,
    pub y_k_1: Vec<T>,
    pub g_k_norm: T,
}

impl<T> IterateState<T>
where
    T: RealNumber,
{
    pub fn new(n: usize) -> Self {
        Self::from_initial(vec![T::zero(); n])
    }

    pub fn from_initial(x0: Vec<T>) -> Self {
        Self {
            x_k_1: x0.clone(),
            y_k: x0.clone(),
            y_k_1: x0.clone(),
            x_k: x0,
            g_k_norm: T::infinity(),
        }
    }

    pub fn dim(&self) -> usize {
        self.x_k.len()
    }

    /// Shifts `k-1 ← k` and installs `x_next`/`y_next` as the current points.
    /// On return the arguments hold the discarded `k-1` buffers, ready to be
    /// reused as scratch space.
    pub fn advance(&mut self, x_next: &mut Vec<T>, y_next: &mut Vec<T>) {
        assert_eq!(x_next.len(), self.dim(), "iterate dimension mismatch");
        assert_eq!(y_next.len(), self.dim(), "iterate dimension mismatch");
        mem::swap(&mut self.x_k_1, &mut self.x_k);
        mem::swap(&mut self.x_k, x_next);
        mem::swap(&mut self.y_k_1, &mut self.y_k);
        mem::swap(&mut self.y_k, y_next);
    }

    /// Drops accumulated momentum: both extrapolated points collapse onto `x_k`.
    pub fn reset_momentum(&mut self) {
        self.y_k.copy_from_slice(&self.x_k);
        self.y_k_1.copy_from_slice(&self.x_k);
    }
}
