//! Runtime "pick the best algorithm" selector.
//!
//! `AutoSelect` defers the concrete choice to [`default_algorithm`] at cache
//! construction. Its payload is the tagged [`DeferredPayload`] container:
//! the chosen sub-algorithm and exactly one concrete payload. Payload writes
//! and the rhs-changed hook are routed into the active slot rather than
//! replacing the container.

use std::sync::Arc;

use log::debug;

use crate::core::traits::Scalar;
use crate::error::Error;
use crate::operator::Rhs;
use crate::solver::{
    default_algorithm, CacheVal, DeferredPayload, InitArgs, LinearAlgorithm, SolveArgs,
};
use crate::utils::convergence::SolveStats;

pub struct AutoSelect;

impl<T: Scalar> LinearAlgorithm<T> for AutoSelect {
    fn name(&self) -> &'static str {
        "auto"
    }

    fn init_cacheval(&self, args: InitArgs<'_, T>) -> Result<CacheVal<T>, Error> {
        let kind = default_algorithm(args.a, args.b, args.assumptions);
        let alg = kind.instantiate::<T>();
        debug!("auto: selected {} for {}x{} operator", alg.name(), args.a.nrows(), args.a.ncols());
        let inner = alg.init_cacheval(args)?;
        Ok(CacheVal::Deferred(DeferredPayload { kind, alg, inner: Box::new(inner) }))
    }

    fn rhs_changed(&self, cacheval: &mut CacheVal<T>, b: &Rhs<T>) {
        if let CacheVal::Deferred(d) = cacheval {
            let alg = Arc::clone(&d.alg);
            alg.rhs_changed(&mut *d.inner, b);
        }
    }

    fn store_cacheval(&self, slot: &mut CacheVal<T>, value: CacheVal<T>) {
        match (slot, value) {
            // A concrete payload written onto a deferred cache lands in the
            // active sub-slot.
            (CacheVal::Deferred(d), value) if !matches!(value, CacheVal::Deferred(_)) => {
                *d.inner = value;
            }
            (slot, value) => *slot = value,
        }
    }

    fn solve(&self, args: SolveArgs<'_, T>) -> Result<SolveStats<T>, Error> {
        let SolveArgs { a, b, u, cacheval, isfresh, pl, pr, conv, verbose, assumptions } = args;
        let CacheVal::Deferred(d) = cacheval else {
            return Err(Error::Solve("auto: cache payload missing".into()));
        };
        let alg = Arc::clone(&d.alg);
        alg.solve(SolveArgs {
            a,
            b,
            u,
            cacheval: &mut *d.inner,
            isfresh,
            pl,
            pr,
            conv,
            verbose,
            assumptions,
        })
    }
}
