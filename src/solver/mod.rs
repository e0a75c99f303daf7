//! Algorithm capability contract and built-in algorithms.
//!
//! Every concrete algorithm — built-in or external — plugs into the cache
//! through [`LinearAlgorithm`]: an optional preconditioner builder, a
//! payload constructor, an optional rhs-changed hook, and the solve hook.
//! The solve hook is the only place matrix/vector-level computation occurs;
//! the cache lifecycle neither retries nor reinterprets its failures.

use std::any::Any;
use std::sync::Arc;

use faer::linalg::solvers::{FullPivLu, Llt, PartialPivLu, Qr, Svd};

use crate::core::assumptions::{Condition, OperatorAssumptions, Squareness};
use crate::core::problem::Params;
use crate::core::traits::Scalar;
use crate::error::Error;
use crate::operator::{Operator, Rhs};
use crate::precond::Preconditioner;
use crate::utils::convergence::{Convergence, SolveStats};

pub mod auto;
pub mod direct;
pub mod krylov;
pub mod static_direct;

pub use auto::AutoSelect;
pub use direct::{
    CholeskyFactorization, DiagonalSolve, LeftDivide, LuFactorization, NormalCholFactor,
    NormalCholeskyFactorization, QrFactorization, SvdFactorization,
};
pub use krylov::{CgSolver, GmresSolver, KrylovWorkspace};
pub use static_direct::{solve_static, StaticSolution};

/// Arguments handed to [`LinearAlgorithm::init_cacheval`].
pub struct InitArgs<'a, T: Scalar> {
    pub a: &'a Operator<T>,
    pub b: &'a Rhs<T>,
    pub u0: &'a [T],
    pub pl: &'a dyn Preconditioner<T>,
    pub pr: &'a dyn Preconditioner<T>,
    pub maxiters: usize,
    pub abstol: T,
    pub reltol: T,
    pub verbose: bool,
    pub assumptions: &'a OperatorAssumptions,
}

/// Disjoint borrows of the cache's fields, handed to
/// [`LinearAlgorithm::solve`].
pub struct SolveArgs<'a, T: Scalar> {
    pub a: &'a Operator<T>,
    pub b: &'a Rhs<T>,
    pub u: &'a mut Vec<T>,
    pub cacheval: &'a mut CacheVal<T>,
    pub isfresh: &'a mut bool,
    pub pl: &'a mut Box<dyn Preconditioner<T>>,
    pub pr: &'a mut Box<dyn Preconditioner<T>>,
    pub conv: Convergence<T>,
    pub verbose: bool,
    pub assumptions: OperatorAssumptions,
}

/// Algorithm-specific cache payload.
///
/// One case per built-in payload, a tagged container for the runtime
/// selector, and an opaque case for external collaborators. The lifecycle
/// code never inspects a payload's interior; each algorithm matches only
/// its own case.
pub enum CacheVal<T: Scalar> {
    /// No state (stateless direct methods).
    Empty,
    /// Partial-pivot LU (plain left-divide).
    Ldiv(Option<PartialPivLu<T>>),
    /// Full-pivot LU.
    Lu(Option<FullPivLu<T>>),
    /// QR factorization.
    Qr(Option<Qr<T>>),
    /// Cholesky (LLᵀ) factorization.
    Cholesky(Option<Llt<T>>),
    /// Cholesky of the normal equations, with Aᵀ retained.
    NormalCholesky(Option<NormalCholFactor<T>>),
    /// Singular value decomposition.
    Svd(Option<Svd<T>>),
    /// Reusable Krylov iteration workspace.
    Krylov(KrylovWorkspace<T>),
    /// Payload of the runtime algorithm selector: the chosen sub-algorithm
    /// plus exactly one concrete payload. Writes are routed to the active
    /// slot, never by overwriting the whole container.
    Deferred(DeferredPayload<T>),
    /// Payload of an external collaborator algorithm.
    Opaque(Box<dyn Any>),
}

/// Tagged payload of [`AutoSelect`].
pub struct DeferredPayload<T: Scalar> {
    pub kind: AlgKind,
    pub alg: Arc<dyn LinearAlgorithm<T>>,
    pub inner: Box<CacheVal<T>>,
}

/// Capability contract every concrete algorithm must satisfy.
pub trait LinearAlgorithm<T: Scalar> {
    /// Short identifier used in diagnostics.
    fn name(&self) -> &'static str;

    /// Krylov-class methods need no upfront factorization and are
    /// considered fresh from construction.
    fn is_iterative(&self) -> bool {
        false
    }

    /// Whether the cache aliases the caller's operator/rhs by default.
    /// Iterative methods alias; sparse-factorization collaborators should
    /// override this to alias as well; everything else copies.
    fn aliases_by_default(&self) -> bool {
        self.is_iterative()
    }

    /// Optional preconditioner builder. `None` resolves to identity
    /// operators sized to the operator's row/column counts.
    fn precs(
        &self,
        a: &Operator<T>,
        p: &Params,
    ) -> Option<(Box<dyn Preconditioner<T>>, Box<dyn Preconditioner<T>>)> {
        let _ = (a, p);
        None
    }

    /// Construct the opaque payload for a fresh cache.
    fn init_cacheval(&self, args: InitArgs<'_, T>) -> Result<CacheVal<T>, Error>;

    /// Invoked when the rhs is reassigned on an existing cache; the
    /// freshness flag is left untouched. Default is a no-op.
    fn rhs_changed(&self, cacheval: &mut CacheVal<T>, b: &Rhs<T>) {
        let _ = (cacheval, b);
    }

    /// Store a payload written from outside the solve hook. The runtime
    /// selector overrides this to route the write into its active slot.
    fn store_cacheval(&self, slot: &mut CacheVal<T>, value: CacheVal<T>) {
        *slot = value;
    }

    /// Solve A·u = b, consulting the freshness flag to decide whether the
    /// payload must be rebuilt and clearing it after a (re)factorization.
    fn solve(&self, args: SolveArgs<'_, T>) -> Result<SolveStats<T>, Error>;
}

/// Built-in algorithm kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgKind {
    /// Plain left-divide (partial-pivot LU).
    Ldiv,
    /// Full-pivot LU.
    Lu,
    /// QR factorization.
    Qr,
    /// Cholesky factorization.
    Cholesky,
    /// Cholesky of the normal equations.
    NormalCholesky,
    /// Singular value decomposition.
    Svd,
    /// Elementwise divide for diagonal operators.
    Diagonal,
    /// Preconditioned conjugate gradients.
    Cg,
    /// Restarted GMRES.
    Gmres,
}

impl AlgKind {
    /// Instantiate the corresponding built-in algorithm.
    pub fn instantiate<T: Scalar>(self) -> Arc<dyn LinearAlgorithm<T>> {
        match self {
            AlgKind::Ldiv => Arc::new(LeftDivide),
            AlgKind::Lu => Arc::new(LuFactorization),
            AlgKind::Qr => Arc::new(QrFactorization),
            AlgKind::Cholesky => Arc::new(CholeskyFactorization),
            AlgKind::NormalCholesky => Arc::new(NormalCholeskyFactorization),
            AlgKind::Svd => Arc::new(SvdFactorization),
            AlgKind::Diagonal => Arc::new(DiagonalSolve),
            AlgKind::Cg => Arc::new(CgSolver),
            AlgKind::Gmres => Arc::new(GmresSolver::default()),
        }
    }

    /// Whether the static fast path may dispatch this kind directly.
    pub fn static_whitelisted(self) -> bool {
        matches!(
            self,
            AlgKind::Ldiv
                | AlgKind::Lu
                | AlgKind::Qr
                | AlgKind::Cholesky
                | AlgKind::NormalCholesky
                | AlgKind::Svd
        )
    }
}

/// Deterministically pick an algorithm from the operator/rhs classes and
/// the caller's assumptions. Pure function, no side effects.
///
/// Safer methods are chosen as the conditioning assumption worsens; sparse
/// and non-square systems go to iterative/orthogonal methods.
pub fn default_algorithm<T: Scalar>(
    a: &Operator<T>,
    b: &Rhs<T>,
    assumptions: &OperatorAssumptions,
) -> AlgKind {
    debug_assert_eq!(a.nrows(), b.len());
    if a.is_diagonal() {
        return AlgKind::Diagonal;
    }
    let square = match assumptions.issquare() {
        Squareness::Square => true,
        Squareness::NonSquare => false,
        Squareness::Unknown => a.is_square(),
    };
    if !square {
        return AlgKind::Qr;
    }
    if a.is_sparse() {
        return AlgKind::Gmres;
    }
    match assumptions.condition() {
        Condition::WellConditioned => AlgKind::Ldiv,
        Condition::IllConditioned => AlgKind::Lu,
        Condition::VeryIllConditioned => AlgKind::Qr,
        Condition::SuperIllConditioned => AlgKind::Svd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::Mat;

    #[test]
    fn selection_tracks_conditioning() {
        let a = Operator::<f64>::dense(Mat::identity(4, 4));
        let b = Rhs::dense(vec![1.0; 4]);
        let pick = |c| default_algorithm(&a, &b, &OperatorAssumptions::new(Some(true), c));
        assert_eq!(pick(Condition::WellConditioned), AlgKind::Ldiv);
        assert_eq!(pick(Condition::IllConditioned), AlgKind::Lu);
        assert_eq!(pick(Condition::VeryIllConditioned), AlgKind::Qr);
        assert_eq!(pick(Condition::SuperIllConditioned), AlgKind::Svd);
    }

    #[test]
    fn selection_prefers_shape_over_conditioning() {
        let a = Operator::<f64>::dense(Mat::zeros(4, 2));
        let b = Rhs::dense(vec![1.0; 4]);
        assert_eq!(default_algorithm(&a, &b, &OperatorAssumptions::from_shape(4, 2)), AlgKind::Qr);

        let diag = Operator::diagonal(vec![1.0, 2.0]);
        let b2 = Rhs::dense(vec![1.0; 2]);
        assert_eq!(
            default_algorithm(&diag, &b2, &OperatorAssumptions::from_shape(2, 2)),
            AlgKind::Diagonal
        );
    }

    #[test]
    fn sparse_square_systems_go_iterative() {
        use crate::operator::CscMatrix;
        let m = CscMatrix::from_csc(2, 2, vec![0, 1, 2], vec![0, 1], vec![1.0, 1.0]);
        let a = Operator::csc(m);
        let b = Rhs::dense(vec![1.0; 2]);
        assert_eq!(
            default_algorithm(&a, &b, &OperatorAssumptions::from_shape(2, 2)),
            AlgKind::Gmres
        );
    }
}
