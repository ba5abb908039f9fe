use crate::math::{dot, RealNumber};
use crate::problem::{ProblemError, ProblemResult};
use crate::traits::LinearOperator;
use serde::{Deserialize, Serialize};
use sprs::CsMat;

/// Row-major dense matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseMatrix<T> {
    nrows: usize,
    ncols: usize,
    data: Vec<T>,
}

impl<T> DenseMatrix<T>
where
    T: RealNumber,
{
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            data: vec![T::zero(); nrows * ncols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut matrix = Self::zeros(n, n);
        for i in 0..n {
            matrix.data[i * n + i] = T::one();
        }
        matrix
    }

    pub fn from_row_major(nrows: usize, ncols: usize, data: Vec<T>) -> ProblemResult<Self> {
        let matrix = Self { nrows, ncols, data };
        matrix.validate()?;
        Ok(matrix)
    }

    pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> ProblemResult<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map(|row| row.as_ref().len()).unwrap_or(0);
        let mut data = Vec::with_capacity(nrows * ncols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != ncols {
                return Err(ProblemError::DimensionMismatch(format!(
                    "row {i} has length {} but row 0 has length {ncols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self { nrows, ncols, data })
    }

    pub fn from_csc(matrix: &CscMatrix<T>) -> ProblemResult<Self> {
        let csmat = matrix.to_csmat()?;
        let mut dense = Self::zeros(matrix.nrows, matrix.ncols);
        for (value, (row, col)) in csmat.iter() {
            dense.data[row * matrix.ncols + col] = *value;
        }
        Ok(dense)
    }

    pub fn validate(&self) -> ProblemResult<()> {
        if self.data.len() != self.nrows * self.ncols {
            return Err(ProblemError::DimensionMismatch(format!(
                "dense buffer length {} != {} x {}",
                self.data.len(),
                self.nrows,
                self.ncols
            )));
        }
        Ok(())
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.ncols + col]
    }

    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.ncols..(row + 1) * self.ncols]
    }

    pub fn is_symmetric(&self) -> bool {
        if self.nrows != self.ncols {
            return false;
        }
        (0..self.nrows).all(|i| (0..i).all(|j| self.get(i, j) == self.get(j, i)))
    }

    /// Computes `Aᵗ·A`. Only the upper triangle is accumulated; the lower one
    /// is mirrored so the result is exactly symmetric.
    pub fn transpose_product(&self) -> Self {
        let n = self.ncols;
        let mut product = Self::zeros(n, n);
        for i in 0..n {
            for j in i..n {
                let mut acc = T::zero();
                for row in 0..self.nrows {
                    acc += self.data[row * n + i] * self.data[row * n + j];
                }
                product.data[i * n + j] = acc;
                product.data[j * n + i] = acc;
            }
        }
        product
    }

    /// Returns `self + alpha * other`.
    pub fn add_scaled(&self, alpha: T, other: &Self) -> ProblemResult<Self> {
        if self.shape() != other.shape() {
            return Err(ProblemError::DimensionMismatch(format!(
                "cannot add {}x{} and {}x{} matrices",
                self.nrows, self.ncols, other.nrows, other.ncols
            )));
        }
        Ok(self.combine(alpha, other))
    }

    pub(crate) fn combine(&self, alpha: T, other: &Self) -> Self {
        assert_eq!(self.shape(), other.shape(), "matrix sum dimension mismatch");
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| *a + alpha * *b)
            .collect();
        Self {
            nrows: self.nrows,
            ncols: self.ncols,
            data,
        }
    }

    /// Maximum absolute row sum.
    pub fn norm_inf(&self) -> T {
        (0..self.nrows)
            .map(|row| {
                self.row(row)
                    .iter()
                    .fold(T::zero(), |acc, value| acc + value.abs())
            })
            .fold(T::zero(), |acc, value| acc.max(value))
    }

    pub fn norm_frobenius(&self) -> T {
        dot(&self.data, &self.data).sqrt()
    }
}

impl<T> LinearOperator<T> for DenseMatrix<T>
where
    T: RealNumber,
{
    fn dim(&self) -> (usize, usize) {
        self.shape()
    }

    fn apply(&self, x: &[T], y: &mut [T]) {
        assert_eq!(x.len(), self.ncols, "matrix-vector dimension mismatch");
        assert_eq!(y.len(), self.nrows, "matrix-vector output dimension mismatch");
        for (row, out) in y.iter_mut().enumerate() {
            *out = dot(self.row(row), x);
        }
    }

    fn apply_transpose(&self, x: &[T], y: &mut [T]) {
        assert_eq!(x.len(), self.nrows, "transpose product dimension mismatch");
        assert_eq!(y.len(), self.ncols, "transpose product output dimension mismatch");
        y.fill(T::zero());
        for (row, &weight) in x.iter().enumerate() {
            for (out, value) in y.iter_mut().zip(self.row(row)) {
                *out += *value * weight;
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CscMatrix<T> {
    pub nrows: usize,
    pub ncols: usize,
    pub indptr: Vec<usize>,
    pub indices: Vec<usize>,
    pub data: Vec<T>,
}

impl<T> CscMatrix<T>
where
    T: RealNumber,
{
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    pub fn validate(&self) -> ProblemResult<()> {
        if self.indptr.len() != self.ncols + 1 {
            return Err(ProblemError::DimensionMismatch(format!(
                "indptr length {} != ncols + 1 ({})",
                self.indptr.len(),
                self.ncols + 1
            )));
        }
        if self.indices.len() != self.data.len() {
            return Err(ProblemError::DimensionMismatch(format!(
                "indices length {} != data length {}",
                self.indices.len(),
                self.data.len()
            )));
        }
        Ok(())
    }

    pub fn to_csmat(&self) -> ProblemResult<CsMat<T>> {
        self.validate()?;
        CsMat::try_new_csc(
            (self.nrows, self.ncols),
            self.indptr.clone(),
            self.indices.clone(),
            self.data.clone(),
        )
        .map_err(|(_, _, _, err)| {
            ProblemError::DimensionMismatch(format!("invalid CSC structure: {err:?}"))
        })
    }
}
