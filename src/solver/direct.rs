//! Direct dense algorithms backed by Faer factorizations.
//!
//! Each algorithm's payload is the factorization object itself, rebuilt
//! whenever the cache's freshness flag says the operator changed and kept
//! across solves otherwise. That reuse is what makes repeated solves with
//! an unchanged operator cheap.
//!
//! # Usage
//! - `LeftDivide` (partial-pivot LU) for well-conditioned square systems.
//! - `LuFactorization` (full pivoting) for general square systems.
//! - `QrFactorization` for square or rectangular systems, more stable for
//!   nearly singular matrices.
//! - `CholeskyFactorization` for symmetric positive definite systems.
//! - `NormalCholeskyFactorization` solves AᵀA x = Aᵀb, usable when A is
//!   rectangular.
//! - `SvdFactorization` as the rank-revealing last resort.
//! - `DiagonalSolve` for diagonal operators (the one case where a sparse
//!   rhs is consumed directly).

use faer::linalg::solvers::{FullPivLu, Llt, PartialPivLu, Qr, SolveCore, SolveLstsqCore, Svd};
use faer::{Conj, Mat, MatMut, MatRef, Side};
use log::debug;

use crate::core::traits::Scalar;
use crate::error::Error;
use crate::operator::{Operator, OperatorRepr, Rhs, RhsRepr};
use crate::solver::{CacheVal, InitArgs, LinearAlgorithm, SolveArgs};
use crate::utils::convergence::SolveStats;

/// Run `f` on a dense view of the operator, materializing sparse or
/// diagonal storage first.
fn with_dense<T: Scalar, R>(a: &Operator<T>, f: impl for<'m> FnOnce(MatRef<'m, T>) -> R) -> R {
    match a.repr() {
        OperatorRepr::Dense(m) => f(m.as_ref()),
        _ => {
            let tmp = a.to_dense();
            f(tmp.as_ref())
        }
    }
}

/// Copy b into u and solve in place with a factorization.
fn solve_in_place<T: Scalar, F: SolveCore<T>>(factor: &F, b: &Rhs<T>, u: &mut Vec<T>) {
    let mut x = b.to_dense_vec();
    let n = x.len();
    factor.solve_in_place_with_conj(Conj::No, MatMut::from_column_major_slice_mut(&mut x, n, 1));
    *u = x;
}

/// Direct solves report a single iteration and a zero residual.
fn direct_stats<T: Scalar>() -> SolveStats<T> {
    SolveStats { iterations: 1, final_residual: T::zero(), converged: true }
}

/// Plain left-divide: LU with partial pivoting.
pub struct LeftDivide;

impl<T: Scalar> LinearAlgorithm<T> for LeftDivide {
    fn name(&self) -> &'static str {
        "ldiv"
    }

    fn init_cacheval(&self, _args: InitArgs<'_, T>) -> Result<CacheVal<T>, Error> {
        Ok(CacheVal::Ldiv(None))
    }

    fn solve(&self, args: SolveArgs<'_, T>) -> Result<SolveStats<T>, Error> {
        let SolveArgs { a, b, u, cacheval, isfresh, .. } = args;
        if *isfresh || !matches!(cacheval, CacheVal::Ldiv(Some(_))) {
            debug!("ldiv: factorizing {}x{} operator", a.nrows(), a.ncols());
            let factor = with_dense(a, |m| PartialPivLu::new(m));
            *cacheval = CacheVal::Ldiv(Some(factor));
            *isfresh = false;
        }
        let CacheVal::Ldiv(Some(factor)) = &*cacheval else {
            return Err(Error::Solve("ldiv: cache payload missing".into()));
        };
        solve_in_place(factor, b, u);
        Ok(direct_stats())
    }
}

/// LU with full pivoting.
pub struct LuFactorization;

impl<T: Scalar> LinearAlgorithm<T> for LuFactorization {
    fn name(&self) -> &'static str {
        "lu"
    }

    fn init_cacheval(&self, _args: InitArgs<'_, T>) -> Result<CacheVal<T>, Error> {
        Ok(CacheVal::Lu(None))
    }

    fn solve(&self, args: SolveArgs<'_, T>) -> Result<SolveStats<T>, Error> {
        let SolveArgs { a, b, u, cacheval, isfresh, .. } = args;
        if *isfresh || !matches!(cacheval, CacheVal::Lu(Some(_))) {
            debug!("lu: factorizing {}x{} operator", a.nrows(), a.ncols());
            let factor = with_dense(a, |m| FullPivLu::new(m));
            *cacheval = CacheVal::Lu(Some(factor));
            *isfresh = false;
        }
        let CacheVal::Lu(Some(factor)) = &*cacheval else {
            return Err(Error::Solve("lu: cache payload missing".into()));
        };
        solve_in_place(factor, b, u);
        Ok(direct_stats())
    }
}

/// QR factorization.
pub struct QrFactorization;

impl<T: Scalar> LinearAlgorithm<T> for QrFactorization {
    fn name(&self) -> &'static str {
        "qr"
    }

    fn init_cacheval(&self, _args: InitArgs<'_, T>) -> Result<CacheVal<T>, Error> {
        Ok(CacheVal::Qr(None))
    }

    fn solve(&self, args: SolveArgs<'_, T>) -> Result<SolveStats<T>, Error> {
        let SolveArgs { a, b, u, cacheval, isfresh, .. } = args;
        if *isfresh || !matches!(cacheval, CacheVal::Qr(Some(_))) {
            debug!("qr: factorizing {}x{} operator", a.nrows(), a.ncols());
            let factor = with_dense(a, |m| Qr::new(m));
            *cacheval = CacheVal::Qr(Some(factor));
            *isfresh = false;
        }
        let CacheVal::Qr(Some(factor)) = &*cacheval else {
            return Err(Error::Solve("qr: cache payload missing".into()));
        };
        if a.is_square() {
            solve_in_place(factor, b, u);
        } else {
            // Rectangular systems go through the least-squares solve; the
            // solution occupies the first ncols rows of the rhs buffer.
            let mut x = b.to_dense_vec();
            let m = x.len();
            factor.solve_lstsq_in_place_with_conj(
                Conj::No,
                MatMut::from_column_major_slice_mut(&mut x, m, 1),
            );
            x.truncate(a.ncols());
            *u = x;
        }
        Ok(direct_stats())
    }
}

/// Cholesky (LLᵀ) factorization for symmetric positive definite operators.
pub struct CholeskyFactorization;

impl<T: Scalar> LinearAlgorithm<T> for CholeskyFactorization {
    fn name(&self) -> &'static str {
        "cholesky"
    }

    fn init_cacheval(&self, _args: InitArgs<'_, T>) -> Result<CacheVal<T>, Error> {
        Ok(CacheVal::Cholesky(None))
    }

    fn solve(&self, args: SolveArgs<'_, T>) -> Result<SolveStats<T>, Error> {
        let SolveArgs { a, b, u, cacheval, isfresh, .. } = args;
        if *isfresh || !matches!(cacheval, CacheVal::Cholesky(Some(_))) {
            debug!("cholesky: factorizing {}x{} operator", a.nrows(), a.ncols());
            let factor = with_dense(a, |m| Llt::new(m, Side::Lower))
                .map_err(|e| Error::Factorization(format!("cholesky: {e:?}")))?;
            *cacheval = CacheVal::Cholesky(Some(factor));
            *isfresh = false;
        }
        let CacheVal::Cholesky(Some(factor)) = &*cacheval else {
            return Err(Error::Solve("cholesky: cache payload missing".into()));
        };
        solve_in_place(factor, b, u);
        Ok(direct_stats())
    }
}

/// Payload of [`NormalCholeskyFactorization`]: the LLᵀ factor of AᵀA plus
/// Aᵀ itself, needed to form Aᵀb at solve time.
pub struct NormalCholFactor<T: Scalar> {
    pub llt: Llt<T>,
    pub at: Mat<T>,
}

/// Cholesky of the normal equations AᵀA x = Aᵀb.
pub struct NormalCholeskyFactorization;

impl<T: Scalar> LinearAlgorithm<T> for NormalCholeskyFactorization {
    fn name(&self) -> &'static str {
        "normal-cholesky"
    }

    fn init_cacheval(&self, _args: InitArgs<'_, T>) -> Result<CacheVal<T>, Error> {
        Ok(CacheVal::NormalCholesky(None))
    }

    fn solve(&self, args: SolveArgs<'_, T>) -> Result<SolveStats<T>, Error> {
        let SolveArgs { a, b, u, cacheval, isfresh, .. } = args;
        if *isfresh || !matches!(cacheval, CacheVal::NormalCholesky(Some(_))) {
            debug!("normal-cholesky: factorizing {}x{} operator", a.nrows(), a.ncols());
            let ad = a.to_dense();
            let at = ad.transpose().to_owned();
            let gram = &at * &ad;
            let llt = Llt::new(gram.as_ref(), Side::Lower)
                .map_err(|e| Error::Factorization(format!("normal-cholesky: {e:?}")))?;
            *cacheval = CacheVal::NormalCholesky(Some(NormalCholFactor { llt, at }));
            *isfresh = false;
        }
        let CacheVal::NormalCholesky(Some(factor)) = &*cacheval else {
            return Err(Error::Solve("normal-cholesky: cache payload missing".into()));
        };
        let bvec = b.to_dense_vec();
        let bmat = Mat::from_fn(bvec.len(), 1, |i, _| bvec[i]);
        let atb = &factor.at * &bmat;
        let mut x: Vec<T> = (0..atb.nrows()).map(|i| atb[(i, 0)]).collect();
        let n = x.len();
        factor
            .llt
            .solve_in_place_with_conj(Conj::No, MatMut::from_column_major_slice_mut(&mut x, n, 1));
        *u = x;
        Ok(direct_stats())
    }
}

/// Singular value decomposition.
pub struct SvdFactorization;

impl<T: Scalar> LinearAlgorithm<T> for SvdFactorization {
    fn name(&self) -> &'static str {
        "svd"
    }

    fn init_cacheval(&self, _args: InitArgs<'_, T>) -> Result<CacheVal<T>, Error> {
        Ok(CacheVal::Svd(None))
    }

    fn solve(&self, args: SolveArgs<'_, T>) -> Result<SolveStats<T>, Error> {
        let SolveArgs { a, b, u, cacheval, isfresh, .. } = args;
        if *isfresh || !matches!(cacheval, CacheVal::Svd(Some(_))) {
            debug!("svd: factorizing {}x{} operator", a.nrows(), a.ncols());
            let factor = with_dense(a, Svd::new)
                .map_err(|e| Error::Factorization(format!("svd: {e:?}")))?;
            *cacheval = CacheVal::Svd(Some(factor));
            *isfresh = false;
        }
        let CacheVal::Svd(Some(factor)) = &*cacheval else {
            return Err(Error::Solve("svd: cache payload missing".into()));
        };
        solve_in_place(factor, b, u);
        Ok(direct_stats())
    }
}

/// Elementwise divide for diagonal operators.
pub struct DiagonalSolve;

impl<T: Scalar> LinearAlgorithm<T> for DiagonalSolve {
    fn name(&self) -> &'static str {
        "diagonal"
    }

    fn init_cacheval(&self, _args: InitArgs<'_, T>) -> Result<CacheVal<T>, Error> {
        Ok(CacheVal::Empty)
    }

    fn solve(&self, args: SolveArgs<'_, T>) -> Result<SolveStats<T>, Error> {
        let SolveArgs { a, b, u, isfresh, .. } = args;
        let OperatorRepr::Diagonal(d) = a.repr() else {
            return Err(Error::Unsupported("diagonal solve on a non-diagonal operator"));
        };
        u.clear();
        u.resize(d.len(), T::zero());
        match b.repr() {
            RhsRepr::Dense(bv) => {
                for i in 0..d.len() {
                    if d[i] == T::zero() {
                        return Err(Error::ZeroPivot(i));
                    }
                    u[i] = bv[i] / d[i];
                }
            }
            RhsRepr::Sparse(sv) => {
                for (i, v) in sv.iter() {
                    if d[i] == T::zero() {
                        return Err(Error::ZeroPivot(i));
                    }
                    u[i] = v / d[i];
                }
            }
        }
        *isfresh = false;
        Ok(direct_stats())
    }
}
