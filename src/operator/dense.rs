//! Dense-operator helpers on top of Faer.

use faer::Mat;

use crate::core::traits::Scalar;

/// Construct a dense operator from raw column-major storage.
pub(crate) fn from_raw<T: Scalar>(nrows: usize, ncols: usize, data: Vec<T>) -> Mat<T> {
    Mat::from_fn(nrows, ncols, |i, j| data[j * nrows + i])
}

/// Compute y = A · x for a dense matrix.
pub(crate) fn matvec<T: Scalar>(a: &Mat<T>, x: &[T], y: &mut [T]) {
    assert_eq!(a.nrows(), y.len(), "output vector y has incorrect length");
    assert_eq!(a.ncols(), x.len(), "input vector x has incorrect length");
    for i in 0..a.nrows() {
        y[i] = T::zero();
        for j in 0..a.ncols() {
            y[i] = y[i] + a[(i, j)] * x[j];
        }
    }
}
