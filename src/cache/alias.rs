//! Alias/copy decisions for the operator and rhs handed to the cache.
//!
//! An explicit caller flag always wins; otherwise the default comes from the
//! algorithm class (iterative and sparse-factorization algorithms alias,
//! everything else copies). The concrete duplication rules live on
//! [`Operator::duplicate`] and [`Rhs::duplicate`]; the one extra rule here
//! is that a sparse rhs being copied for a non-diagonal operator is
//! converted to dense, since the solution of such a system is dense anyway.

use crate::core::traits::Scalar;
use crate::operator::{Operator, Rhs};

pub(crate) fn resolve_operator<T: Scalar>(
    a: &Operator<T>,
    alias: Option<bool>,
    default_alias: bool,
) -> Operator<T> {
    if alias.unwrap_or(default_alias) {
        a.clone()
    } else {
        a.duplicate()
    }
}

pub(crate) fn resolve_rhs<T: Scalar>(
    b: &Rhs<T>,
    a: &Operator<T>,
    alias: Option<bool>,
    default_alias: bool,
) -> Rhs<T> {
    if alias.unwrap_or(default_alias) {
        b.clone()
    } else if b.is_sparse() && !a.is_diagonal() {
        b.densify()
    } else {
        b.duplicate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::SparseVec;
    use faer::Mat;

    #[test]
    fn explicit_flag_beats_algorithm_default() {
        let a = Operator::<f64>::dense(Mat::identity(2, 2));
        let aliased = resolve_operator(&a, Some(true), false);
        assert!(a.same_object(&aliased));
        let copied = resolve_operator(&a, Some(false), true);
        assert!(!a.same_object(&copied));
    }

    #[test]
    fn sparse_rhs_densifies_for_non_diagonal_operator() {
        let a = Operator::<f64>::dense(Mat::identity(3, 3));
        let b = Rhs::sparse(SparseVec::new(3, vec![1], vec![2.0]));
        let resolved = resolve_rhs(&b, &a, None, false);
        assert!(!resolved.is_sparse());
        assert_eq!(resolved.to_dense_vec(), vec![0.0, 2.0, 0.0]);
    }

    #[test]
    fn sparse_rhs_stays_sparse_for_diagonal_operator() {
        let a = Operator::diagonal(vec![1.0, 2.0, 3.0]);
        let b = Rhs::sparse(SparseVec::new(3, vec![1], vec![2.0]));
        let resolved = resolve_rhs(&b, &a, None, false);
        assert!(resolved.is_sparse());
        assert!(!b.same_object(&resolved));
    }
}
