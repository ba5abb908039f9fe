//! Penalty weight and penalty-shift vector.
//!
//! Every mutation bumps a generation counter under the same write lock, so a
//! cache tagged with a generation can tell whether it still matches the
//! state it was computed from.

use crate::math::RealNumber;
use crate::problem::{ProblemError, ProblemResult};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct PenaltyState<T> {
    rho: T,
    shift: Vec<T>,
    generation: u64,
}

impl<T> PenaltyState<T>
where
    T: RealNumber,
{
    pub fn new(rho: T, shift: Vec<T>) -> Self {
        Self {
            rho,
            shift,
            generation: 0,
        }
    }

    pub fn rho(&self) -> T {
        self.rho
    }

    pub fn shift(&self) -> &[T] {
        &self.shift
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn dim(&self) -> usize {
        self.shift.len()
    }

    fn check_dim(&self, len: usize) -> ProblemResult<()> {
        if len != self.shift.len() {
            return Err(ProblemError::DimensionMismatch(format!(
                "penalty shift length {len} != constraint count {}",
                self.shift.len()
            )));
        }
        Ok(())
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

/// Shared handle to a [`PenaltyState`].
///
/// Cloning the handle shares the state: an update through any clone is seen
/// by every problem instance holding one.
#[derive(Debug, Clone)]
pub struct PenaltyHandle<T> {
    inner: Arc<RwLock<PenaltyState<T>>>,
}

impl<T> PenaltyHandle<T>
where
    T: RealNumber,
{
    pub fn new(rho: T, shift: Vec<T>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(PenaltyState::new(rho, shift))),
        }
    }

    pub fn zeros(rho: T, m: usize) -> Self {
        Self::new(rho, vec![T::zero(); m])
    }

    pub fn snapshot(&self) -> PenaltyState<T> {
        self.inner.read().clone()
    }

    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    pub fn rho(&self) -> T {
        self.inner.read().rho
    }

    pub fn shift(&self) -> Vec<T> {
        self.inner.read().shift.clone()
    }

    pub fn dim(&self) -> usize {
        self.inner.read().dim()
    }

    /// Replaces rho and the shift vector in one step.
    pub fn set(&self, rho: T, shift: Vec<T>) -> ProblemResult<()> {
        let mut state = self.inner.write();
        state.check_dim(shift.len())?;
        state.rho = rho;
        state.shift = shift;
        state.bump();
        Ok(())
    }

    pub fn set_rho(&self, rho: T) {
        let mut state = self.inner.write();
        state.rho = rho;
        state.bump();
    }

    pub fn set_shift(&self, shift: Vec<T>) -> ProblemResult<()> {
        let mut state = self.inner.write();
        state.check_dim(shift.len())?;
        state.shift = shift;
        state.bump();
        Ok(())
    }

    /// Mutates the shift vector in place. The generation moves before
    /// `update` runs, so a panicking closure still invalidates caches.
    pub fn update_shift<F>(&self, update: F)
    where
        F: FnOnce(&mut [T]),
    {
        let mut state = self.inner.write();
        state.bump();
        update(&mut state.shift);
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Copies the current state into a new, unshared handle.
    pub fn deep_clone(&self) -> Self {
        Self {
            inner: Arc::new(RwLock::new(self.snapshot())),
        }
    }
}
