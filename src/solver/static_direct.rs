//! Static fast path: direct solves for fixed-size operators with no cache.
//!
//! For operators whose size is part of the type, factorization overhead
//! dominates and the general cache machinery is pure cost. When the
//! requested algorithm is absent or on the direct whitelist (left-divide,
//! LU, QR, Cholesky, normal-equations Cholesky, SVD), the system is solved
//! straight through the corresponding nalgebra factorization, with no
//! `LinearCache` allocated at all. Any other algorithm choice falls through
//! to the general path on a materialized dense problem, so an explicit
//! iterative request still works — it just pays the normal setup cost.

use nalgebra::allocator::Allocator;
use nalgebra::{Const, DefaultAllocator, DimDiff, DimMin, DimSub, RealField, SMatrix, SVector, U1};

use crate::cache;
use crate::config::SolveOptions;
use crate::core::problem::{LinearProblem, ReturnCode};
use crate::core::traits::{Scalar, Tolerance};
use crate::error::Error;
use crate::operator::{Operator, Rhs};
use crate::solver::AlgKind;

/// Solution of a statically-sized solve. No heap allocation behind it.
pub struct StaticSolution<T, const N: usize> {
    pub u: SVector<T, N>,
    pub retcode: ReturnCode,
}

/// Solve A·x = b for a fixed-size system.
///
/// `method = None` means plain left-divide. Whitelisted direct methods are
/// dispatched without constructing a cache; anything else falls through to
/// the general cache-based path.
pub fn solve_static<T, const N: usize>(
    a: &SMatrix<T, N, N>,
    b: &SVector<T, N>,
    method: Option<AlgKind>,
) -> Result<StaticSolution<T, N>, Error>
where
    T: Scalar + RealField,
    Const<N>: DimMin<Const<N>, Output = Const<N>> + DimSub<U1>,
    DefaultAllocator: Allocator<DimDiff<Const<N>, U1>>,
{
    let kind = method.unwrap_or(AlgKind::Ldiv);
    if !kind.static_whitelisted() {
        return solve_static_general(a, b, kind);
    }
    let m = *a;
    let u: SVector<T, N> = match kind {
        AlgKind::Ldiv => m
            .lu()
            .solve::<Const<N>, U1, _>(b)
            .ok_or_else(|| Error::Factorization("ldiv: singular operator".into()))?,
        AlgKind::Lu => m
            .full_piv_lu()
            .solve::<Const<N>, U1, _>(b)
            .ok_or_else(|| Error::Factorization("lu: singular operator".into()))?,
        AlgKind::Qr => m
            .qr()
            .solve::<Const<N>, U1, _>(b)
            .ok_or_else(|| Error::Factorization("qr: singular operator".into()))?,
        AlgKind::Cholesky => m
            .cholesky()
            .ok_or_else(|| Error::Factorization("cholesky: operator not positive definite".into()))?
            .solve::<Const<N>, U1, _>(b),
        AlgKind::NormalCholesky => {
            let at = m.transpose();
            (at * m)
                .cholesky()
                .ok_or_else(|| {
                    Error::Factorization("normal-cholesky: gram matrix not positive definite".into())
                })?
                .solve::<Const<N>, U1, _>(&(at * b))
        }
        AlgKind::Svd => m
            .svd(true, true)
            .solve(b, <T as Tolerance>::default_tolerance())
            .map_err(|e| Error::Solve(e.into()))?,
        _ => unreachable!("non-whitelisted kinds fall through before dispatch"),
    };
    Ok(StaticSolution { u, retcode: ReturnCode::Success })
}

/// Fall-through for non-whitelisted algorithms: materialize a dense problem
/// and run it through the ordinary init/solve lifecycle.
fn solve_static_general<T, const N: usize>(
    a: &SMatrix<T, N, N>,
    b: &SVector<T, N>,
    kind: AlgKind,
) -> Result<StaticSolution<T, N>, Error>
where
    T: Scalar + RealField,
{
    let dense = faer::Mat::from_fn(N, N, |i, j| a[(i, j)]);
    let rhs: Vec<T> = b.iter().copied().collect();
    let problem = LinearProblem::new(Operator::dense(dense), Rhs::dense(rhs));
    let sol = cache::solve(&problem, Some(kind.instantiate()), SolveOptions::default())?;
    let u = SVector::from_fn(|i, _| sol.u[i]);
    Ok(StaticSolution { u, retcode: sol.retcode })
}
