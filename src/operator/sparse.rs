//! Compressed-sparse-column operator and sparse right-hand sides.
//!
//! `CscMatrix` keeps the symbolic structure and the value buffer behind
//! separate shared handles, so [`CscMatrix::share`] produces a new matrix
//! object whose index/value buffers are the same allocations as the
//! original's. That is exactly the duplication the copy policy wants for
//! sparse operators: a distinct outer object, cheap to build, with no deep
//! copy of the numerical data.

use std::sync::Arc;

use faer::Mat;
use faer::sparse::SymbolicSparseColMat;

use crate::core::traits::Scalar;

#[derive(Debug)]
pub struct CscMatrix<T> {
    symbolic: Arc<SymbolicSparseColMat<usize>>,
    values: Arc<Vec<T>>,
}

impl<T: Scalar> CscMatrix<T> {
    /// Build a CSC matrix from raw column-pointer, row-index, and value
    /// buffers.
    pub fn from_csc(
        nrows: usize,
        ncols: usize,
        col_ptr: Vec<usize>,
        row_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Self {
        let symbolic = SymbolicSparseColMat::new_checked(nrows, ncols, col_ptr, None, row_idx);
        Self { symbolic: Arc::new(symbolic), values: Arc::new(values) }
    }

    pub fn nrows(&self) -> usize {
        self.symbolic.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.symbolic.ncols()
    }

    /// New matrix object sharing this one's index and value buffers.
    pub fn share(&self) -> Self {
        Self { symbolic: Arc::clone(&self.symbolic), values: Arc::clone(&self.values) }
    }

    /// Whether two matrices share the same underlying buffers.
    pub fn shares_buffers_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.symbolic, &other.symbolic) && Arc::ptr_eq(&self.values, &other.values)
    }

    /// Compute y = A · x. `x.len() == ncols()`, `y.len() == nrows()`.
    pub fn spmv(&self, x: &[T], y: &mut [T]) {
        assert_eq!(x.len(), self.ncols());
        assert_eq!(y.len(), self.nrows());
        let col_ptr = self.symbolic.col_ptr();
        let row_idx = self.symbolic.row_idx();
        y.iter_mut().for_each(|yi| *yi = T::zero());
        for j in 0..self.ncols() {
            for k in col_ptr[j]..col_ptr[j + 1] {
                let i = row_idx[k];
                y[i] = y[i] + self.values[k] * x[j];
            }
        }
    }

    /// Materialize as a dense matrix.
    pub fn to_dense(&self) -> Mat<T> {
        let col_ptr = self.symbolic.col_ptr();
        let row_idx = self.symbolic.row_idx();
        let mut out = Mat::zeros(self.nrows(), self.ncols());
        for j in 0..self.ncols() {
            for k in col_ptr[j]..col_ptr[j + 1] {
                out[(row_idx[k], j)] = self.values[k];
            }
        }
        out
    }
}

/// A sparse right-hand side: explicit (index, value) entries of an otherwise
/// zero vector. Buffers are shared handles for the same reason as in
/// [`CscMatrix`].
#[derive(Debug)]
pub struct SparseVec<T> {
    dim: usize,
    indices: Arc<Vec<usize>>,
    values: Arc<Vec<T>>,
}

impl<T: Scalar> SparseVec<T> {
    pub fn new(dim: usize, indices: Vec<usize>, values: Vec<T>) -> Self {
        assert_eq!(indices.len(), values.len(), "index/value buffers must have equal length");
        assert!(indices.iter().all(|&i| i < dim), "sparse index out of bounds");
        Self { dim, indices: Arc::new(indices), values: Arc::new(values) }
    }

    pub fn len(&self) -> usize {
        self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.dim == 0
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, T)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// New vector object sharing this one's buffers.
    pub fn share(&self) -> Self {
        Self { dim: self.dim, indices: Arc::clone(&self.indices), values: Arc::clone(&self.values) }
    }

    pub fn to_dense(&self) -> Vec<T> {
        let mut out = vec![T::zero(); self.dim];
        for (i, v) in self.iter() {
            out[i] = v;
        }
        out
    }
}
