//! Operator and right-hand-side value model.
//!
//! Both [`Operator`] and [`Rhs`] are small handles over shared payloads:
//! cloning a handle aliases the caller's object (observable through
//! [`Operator::same_object`]), while [`Operator::duplicate`] applies the
//! per-class copy rules — dense storage is copied, compressed-sparse-column
//! storage is rebuilt as a new structure sharing its index/value buffers,
//! everything else is deep-copied.

pub mod dense;
pub mod sparse;

pub use sparse::{CscMatrix, SparseVec};

use std::sync::Arc;

use faer::Mat;

use crate::core::traits::Scalar;

/// Concrete operator storage classes.
#[derive(Debug)]
pub enum OperatorRepr<T> {
    /// Dense column-major matrix.
    Dense(Mat<T>),
    /// Compressed-sparse-column matrix.
    Csc(CscMatrix<T>),
    /// Diagonal operator, stored as its diagonal.
    Diagonal(Vec<T>),
}

/// Shared handle to an operator.
#[derive(Clone, Debug)]
pub struct Operator<T> {
    repr: Arc<OperatorRepr<T>>,
}

impl<T: Scalar> Operator<T> {
    pub fn dense(m: Mat<T>) -> Self {
        Self { repr: Arc::new(OperatorRepr::Dense(m)) }
    }

    /// Dense operator from raw column-major storage.
    pub fn dense_from_raw(nrows: usize, ncols: usize, data: Vec<T>) -> Self {
        Self::dense(dense::from_raw(nrows, ncols, data))
    }

    pub fn csc(m: CscMatrix<T>) -> Self {
        Self { repr: Arc::new(OperatorRepr::Csc(m)) }
    }

    pub fn diagonal(d: Vec<T>) -> Self {
        Self { repr: Arc::new(OperatorRepr::Diagonal(d)) }
    }

    pub fn repr(&self) -> &OperatorRepr<T> {
        &self.repr
    }

    pub fn nrows(&self) -> usize {
        match self.repr() {
            OperatorRepr::Dense(m) => m.nrows(),
            OperatorRepr::Csc(m) => m.nrows(),
            OperatorRepr::Diagonal(d) => d.len(),
        }
    }

    pub fn ncols(&self) -> usize {
        match self.repr() {
            OperatorRepr::Dense(m) => m.ncols(),
            OperatorRepr::Csc(m) => m.ncols(),
            OperatorRepr::Diagonal(d) => d.len(),
        }
    }

    pub fn is_square(&self) -> bool {
        self.nrows() == self.ncols()
    }

    pub fn is_diagonal(&self) -> bool {
        matches!(self.repr(), OperatorRepr::Diagonal(_))
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self.repr(), OperatorRepr::Csc(_))
    }

    /// Whether two handles point at the identical operator object.
    pub fn same_object(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.repr, &other.repr)
    }

    /// Distinct operator object per the copy rules: dense contents are
    /// copied, CSC structures share their index/value buffers, diagonals
    /// are deep-copied.
    pub fn duplicate(&self) -> Self {
        match self.repr() {
            OperatorRepr::Dense(m) => Self::dense(m.to_owned()),
            OperatorRepr::Csc(m) => Self::csc(m.share()),
            OperatorRepr::Diagonal(d) => Self::diagonal(d.clone()),
        }
    }

    /// Compute y = A · x.
    pub fn matvec(&self, x: &[T], y: &mut [T]) {
        match self.repr() {
            OperatorRepr::Dense(m) => dense::matvec(m, x, y),
            OperatorRepr::Csc(m) => m.spmv(x, y),
            OperatorRepr::Diagonal(d) => {
                assert_eq!(d.len(), x.len());
                assert_eq!(d.len(), y.len());
                for i in 0..d.len() {
                    y[i] = d[i] * x[i];
                }
            }
        }
    }

    /// Materialize as a dense matrix.
    pub fn to_dense(&self) -> Mat<T> {
        match self.repr() {
            OperatorRepr::Dense(m) => m.to_owned(),
            OperatorRepr::Csc(m) => m.to_dense(),
            OperatorRepr::Diagonal(d) => {
                let mut out = Mat::zeros(d.len(), d.len());
                for (i, &di) in d.iter().enumerate() {
                    out[(i, i)] = di;
                }
                out
            }
        }
    }
}

impl<T: Scalar> From<Mat<T>> for Operator<T> {
    fn from(m: Mat<T>) -> Self {
        Operator::dense(m)
    }
}

impl<T: Scalar> From<CscMatrix<T>> for Operator<T> {
    fn from(m: CscMatrix<T>) -> Self {
        Operator::csc(m)
    }
}

/// Concrete rhs storage classes.
#[derive(Debug)]
pub enum RhsRepr<T> {
    Dense(Vec<T>),
    Sparse(SparseVec<T>),
}

/// Shared handle to a right-hand side.
#[derive(Clone, Debug)]
pub struct Rhs<T> {
    repr: Arc<RhsRepr<T>>,
}

impl<T: Scalar> Rhs<T> {
    pub fn dense(v: Vec<T>) -> Self {
        Self { repr: Arc::new(RhsRepr::Dense(v)) }
    }

    pub fn sparse(v: SparseVec<T>) -> Self {
        Self { repr: Arc::new(RhsRepr::Sparse(v)) }
    }

    pub fn repr(&self) -> &RhsRepr<T> {
        &self.repr
    }

    pub fn len(&self) -> usize {
        match self.repr() {
            RhsRepr::Dense(v) => v.len(),
            RhsRepr::Sparse(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self.repr(), RhsRepr::Sparse(_))
    }

    /// Whether two handles point at the identical rhs object.
    pub fn same_object(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.repr, &other.repr)
    }

    /// Distinct rhs object per the copy rules (dense copied, sparse
    /// sharing its buffers).
    pub fn duplicate(&self) -> Self {
        match self.repr() {
            RhsRepr::Dense(v) => Self::dense(v.clone()),
            RhsRepr::Sparse(v) => Self::sparse(v.share()),
        }
    }

    /// A dense rhs with the same contents. A linear solve's solution is
    /// generally dense, so sparse right-hand sides are converted up front
    /// unless the operator is diagonal.
    pub fn densify(&self) -> Self {
        match self.repr() {
            RhsRepr::Dense(v) => Self::dense(v.clone()),
            RhsRepr::Sparse(v) => Self::dense(v.to_dense()),
        }
    }

    /// Contents as a dense vector (allocates for sparse storage).
    pub fn to_dense_vec(&self) -> Vec<T> {
        match self.repr() {
            RhsRepr::Dense(v) => v.clone(),
            RhsRepr::Sparse(v) => v.to_dense(),
        }
    }

    /// Borrow the dense contents, if dense.
    pub fn as_dense(&self) -> Option<&[T]> {
        match self.repr() {
            RhsRepr::Dense(v) => Some(v),
            RhsRepr::Sparse(_) => None,
        }
    }
}

impl<T: Scalar> From<Vec<T>> for Rhs<T> {
    fn from(v: Vec<T>) -> Self {
        Rhs::dense(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::Mat;

    #[test]
    fn clone_aliases_duplicate_does_not() {
        let a = Operator::<f64>::dense(Mat::identity(3, 3));
        let aliased = a.clone();
        let copied = a.duplicate();
        assert!(a.same_object(&aliased));
        assert!(!a.same_object(&copied));
        assert_eq!(copied.to_dense()[(2, 2)], 1.0);
    }

    #[test]
    fn csc_duplicate_shares_buffers() {
        let m = CscMatrix::from_csc(2, 2, vec![0, 1, 2], vec![0, 1], vec![1.0, 2.0]);
        let a = Operator::csc(m);
        let dup = a.duplicate();
        assert!(!a.same_object(&dup));
        let (OperatorRepr::Csc(orig), OperatorRepr::Csc(copy)) = (a.repr(), dup.repr()) else {
            panic!("expected CSC operators");
        };
        assert!(orig.shares_buffers_with(copy));
    }

    #[test]
    fn diagonal_matvec_scales_elementwise() {
        let a = Operator::diagonal(vec![2.0, 3.0]);
        let mut y = vec![0.0; 2];
        a.matvec(&[1.0, 10.0], &mut y);
        assert_eq!(y, vec![2.0, 30.0]);
    }

    #[test]
    fn dense_matvec_matches_manual_sum() {
        let a = Operator::dense_from_raw(2, 2, vec![1.0, 3.0, 2.0, 4.0]);
        let mut y = vec![0.0; 2];
        a.matvec(&[1.0, 1.0], &mut y);
        assert_eq!(y, vec![3.0, 7.0]);
    }
}
