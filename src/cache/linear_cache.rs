//! The reusable linear-solve cache and its lifecycle.
//!
//! A [`LinearCache`] holds everything needed to repeat a solve: operator,
//! rhs, current solution, parameters, the resolved algorithm, its opaque
//! payload, the freshness flag, preconditioners, tolerances and iteration
//! cap. It is built by [`init`], reused through the setters and
//! [`LinearCache::reinit`]/[`LinearCache::rebuild`], and consumed by
//! [`LinearCache::solve_mut`], which dispatches into the algorithm's solve
//! hook.
//!
//! Field writes are not plain assignments: assigning a new operator or
//! parameter object invalidates the cached factorization state (the next
//! solve must observe `isfresh` and refactorize), while assigning a new rhs
//! only runs the algorithm's rhs-changed hook. A cache is meant for
//! single-owner sequential reuse; nothing here is atomic.

use std::sync::Arc;

use log::debug;

use crate::cache::alias;
use crate::config::SolveOptions;
use crate::core::assumptions::OperatorAssumptions;
use crate::core::problem::{
    LinearProblem, LinearSolution, Params, ReturnCode, SensitivityStrategy,
};
use crate::core::traits::{Scalar, Tolerance};
use crate::error::Error;
use crate::operator::{Operator, Rhs};
use crate::precond::{Identity, Preconditioner};
use crate::solver::{AutoSelect, CacheVal, InitArgs, LinearAlgorithm, SolveArgs};
use crate::utils::convergence::Convergence;

/// Mutable cache for repeated solves of A·x = b.
pub struct LinearCache<T: Scalar> {
    a: Operator<T>,
    b: Rhs<T>,
    u: Vec<T>,
    p: Params,
    alg: Arc<dyn LinearAlgorithm<T>>,
    cacheval: CacheVal<T>,
    isfresh: bool,
    pl: Box<dyn Preconditioner<T>>,
    pr: Box<dyn Preconditioner<T>>,
    abstol: T,
    reltol: T,
    maxiters: usize,
    verbose: bool,
    assumptions: OperatorAssumptions,
    sensitivity: SensitivityStrategy,
}

/// Field updates for [`LinearCache::reinit`]/[`LinearCache::rebuild`].
///
/// `a`/`b`/`u` are applied only when present; `p` is always stored, so an
/// absent parameter object resets the cache to the null-parameters sentinel.
pub struct Reinit<T: Scalar> {
    pub a: Option<Operator<T>>,
    pub b: Option<Rhs<T>>,
    pub u: Option<Vec<T>>,
    pub p: Params,
}

impl<T: Scalar> Default for Reinit<T> {
    fn default() -> Self {
        Self { a: None, b: None, u: None, p: None }
    }
}

impl<T: Scalar> LinearCache<T> {
    pub fn operator(&self) -> &Operator<T> {
        &self.a
    }

    pub fn rhs(&self) -> &Rhs<T> {
        &self.b
    }

    pub fn u(&self) -> &[T] {
        &self.u
    }

    pub fn params(&self) -> &Params {
        &self.p
    }

    pub fn algorithm(&self) -> &Arc<dyn LinearAlgorithm<T>> {
        &self.alg
    }

    pub fn cacheval(&self) -> &CacheVal<T> {
        &self.cacheval
    }

    /// Whether the payload is stale with respect to the operator and must be
    /// rebuilt before the next factorization-dependent solve.
    pub fn is_fresh(&self) -> bool {
        self.isfresh
    }

    pub fn pl(&self) -> &dyn Preconditioner<T> {
        self.pl.as_ref()
    }

    pub fn pr(&self) -> &dyn Preconditioner<T> {
        self.pr.as_ref()
    }

    pub fn abstol(&self) -> T {
        self.abstol
    }

    pub fn reltol(&self) -> T {
        self.reltol
    }

    pub fn maxiters(&self) -> usize {
        self.maxiters
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn assumptions(&self) -> &OperatorAssumptions {
        &self.assumptions
    }

    pub fn sensitivity(&self) -> SensitivityStrategy {
        self.sensitivity
    }

    /// Replace the operator. Invalidates the cached payload.
    pub fn set_operator(&mut self, a: Operator<T>) {
        self.isfresh = true;
        self.a = a;
    }

    /// Replace the parameter object. Invalidates the cached payload.
    pub fn set_parameters(&mut self, p: Params) {
        self.isfresh = true;
        self.p = p;
    }

    /// Replace the rhs. Does not touch the freshness flag; the algorithm's
    /// rhs-changed hook runs instead.
    pub fn set_rhs(&mut self, b: Rhs<T>) {
        let alg = Arc::clone(&self.alg);
        alg.rhs_changed(&mut self.cacheval, &b);
        self.b = b;
    }

    /// Replace the solution vector.
    pub fn set_u(&mut self, u: Vec<T>) {
        self.u = u;
    }

    /// Replace the opaque payload. Routed through the algorithm so the
    /// runtime selector can target the active slot of its container.
    pub fn set_cacheval(&mut self, value: CacheVal<T>) {
        let alg = Arc::clone(&self.alg);
        alg.store_cacheval(&mut self.cacheval, value);
    }

    /// Update fields in place for a changed problem, keeping the resolved
    /// algorithm and the cache's identity. The payload is not rebuilt here;
    /// the next solve observes the freshness flag and refactorizes.
    pub fn reinit(&mut self, args: Reinit<T>) {
        if let Some(a) = args.a {
            self.a = a;
        }
        if let Some(b) = args.b {
            self.b = b;
        }
        if let Some(u) = args.u {
            self.u = u;
        }
        self.p = args.p;
        self.isfresh = true;
        debug!("cache: reinitialized in place ({})", self.alg.name());
    }

    /// Build a new cache for a changed problem, carrying over the same
    /// algorithm and the same opaque payload. Use this instead of
    /// [`LinearCache::reinit`] when in-place field assignment is not
    /// possible.
    pub fn rebuild(self, args: Reinit<T>) -> Self {
        let Self {
            a,
            b,
            u,
            p: _,
            alg,
            cacheval,
            isfresh: _,
            pl,
            pr,
            abstol,
            reltol,
            maxiters,
            verbose,
            assumptions,
            sensitivity,
        } = self;
        Self {
            a: args.a.unwrap_or(a),
            b: args.b.unwrap_or(b),
            u: args.u.unwrap_or(u),
            p: args.p,
            alg,
            cacheval,
            isfresh: true,
            pl,
            pr,
            abstol,
            reltol,
            maxiters,
            verbose,
            assumptions,
            sensitivity,
        }
    }

    /// Dispatch into the algorithm's solve hook and wrap the result.
    ///
    /// The hook consults the freshness flag to decide whether to recompute
    /// its factorization, updates the payload and the solution vector, and
    /// clears the flag after a (re)factorization. Failures from the hook
    /// propagate unmodified.
    pub fn solve_mut(&mut self) -> Result<LinearSolution<T>, Error> {
        let alg = Arc::clone(&self.alg);
        let stats = alg.solve(SolveArgs {
            a: &self.a,
            b: &self.b,
            u: &mut self.u,
            cacheval: &mut self.cacheval,
            isfresh: &mut self.isfresh,
            pl: &mut self.pl,
            pr: &mut self.pr,
            conv: Convergence { abstol: self.abstol, reltol: self.reltol, maxiters: self.maxiters },
            verbose: self.verbose,
            assumptions: self.assumptions,
        })?;
        let retcode = if stats.converged { ReturnCode::Success } else { ReturnCode::MaxIterations };
        Ok(LinearSolution {
            u: self.u.clone(),
            retcode,
            stats,
            problem: LinearProblem {
                a: self.a.clone(),
                b: self.b.clone(),
                u0: None,
                p: self.p.clone(),
            },
        })
    }
}

/// Build a [`LinearCache`] from a problem: resolve aliasing, synthesize the
/// initial guess, resolve preconditioners, coerce tolerances, and construct
/// the algorithm's payload. No algorithm means the runtime selector.
pub fn init<T: Scalar>(
    problem: &LinearProblem<T>,
    algorithm: Option<Arc<dyn LinearAlgorithm<T>>>,
    mut options: SolveOptions<T>,
) -> Result<LinearCache<T>, Error> {
    let alg: Arc<dyn LinearAlgorithm<T>> = algorithm.unwrap_or_else(|| Arc::new(AutoSelect));
    let default_alias = alg.aliases_by_default();
    let a = alias::resolve_operator(&problem.a, options.alias_a, default_alias);
    let b = alias::resolve_rhs(&problem.b, &a, options.alias_b, default_alias);
    let u = match &problem.u0 {
        Some(u0) => u0.clone(),
        None => vec![T::zero(); a.ncols()],
    };
    let assumptions = options
        .assumptions
        .unwrap_or_else(|| OperatorAssumptions::from_shape(a.nrows(), a.ncols()));
    let (pl, pr) = {
        let (opl, opr) = (options.pl.take(), options.pr.take());
        let (apl, apr) = match (&opl, &opr) {
            (Some(_), Some(_)) => (None, None),
            _ => match alg.precs(&a, &problem.p) {
                Some((l, r)) => (Some(l), Some(r)),
                None => (None, None),
            },
        };
        (
            opl.or(apl).unwrap_or_else(|| Box::new(Identity::new(a.nrows()))),
            opr.or(apr).unwrap_or_else(|| Box::new(Identity::new(a.ncols()))),
        )
    };
    let abstol = options.abstol.map(T::coerce_tolerance).unwrap_or_else(T::default_tolerance);
    let reltol = options.reltol.map(T::coerce_tolerance).unwrap_or_else(T::default_tolerance);
    let maxiters = options.maxiters.unwrap_or_else(|| b.len());
    let cacheval = alg.init_cacheval(InitArgs {
        a: &a,
        b: &b,
        u0: &u,
        pl: pl.as_ref(),
        pr: pr.as_ref(),
        maxiters,
        abstol,
        reltol,
        verbose: options.verbose,
        assumptions: &assumptions,
    })?;
    // Iterative methods need no upfront factorization; their payload is
    // already valid at construction.
    let isfresh = match &cacheval {
        CacheVal::Deferred(d) => !d.alg.is_iterative(),
        _ => !alg.is_iterative(),
    };
    Ok(LinearCache {
        a,
        b,
        u,
        p: problem.p.clone(),
        alg,
        cacheval,
        isfresh,
        pl,
        pr,
        abstol,
        reltol,
        maxiters,
        verbose: options.verbose,
        assumptions,
        sensitivity: options.sensitivity,
    })
}

/// Convenience composition: [`init`] followed by
/// [`LinearCache::solve_mut`].
pub fn solve<T: Scalar>(
    problem: &LinearProblem<T>,
    algorithm: Option<Arc<dyn LinearAlgorithm<T>>>,
    options: SolveOptions<T>,
) -> Result<LinearSolution<T>, Error> {
    let mut cache = init(problem, algorithm, options)?;
    cache.solve_mut()
}
