//! Problem and solution value types.
//!
//! A [`LinearProblem`] bundles the operator, the right-hand side, an optional
//! initial guess and an opaque parameter object. The cache only reads it,
//! except through the alias/copy decision made at initialization. Every solve
//! call produces a fresh [`LinearSolution`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::core::traits::Scalar;
use crate::operator::{Operator, Rhs};
use crate::utils::convergence::SolveStats;

/// Opaque parameter object threaded through to an algorithm's
/// preconditioner builder. `None` is the null-parameters sentinel.
pub type Params = Option<Arc<dyn Any + Send + Sync>>;

/// How parameter sensitivities should be propagated by an outer
/// differentiation layer. The cache only stores the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensitivityStrategy {
    /// Adjoint (reverse-mode) sensitivities.
    #[default]
    Adjoint,
    /// Tangent (forward-mode) sensitivities.
    Forward,
    /// No sensitivity propagation.
    Disabled,
}

/// Outcome of a solve, as reported by the algorithm's hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnCode {
    /// The solve met its convergence criteria (direct solves always do).
    Success,
    /// The iteration cap was reached before the tolerances were met.
    MaxIterations,
    /// The algorithm gave up without converging.
    Failure,
}

/// A linear system A·x = b with optional initial guess and parameters.
#[derive(Clone)]
pub struct LinearProblem<T: Scalar> {
    /// The operator A.
    pub a: Operator<T>,
    /// The right-hand side b.
    pub b: Rhs<T>,
    /// Optional initial guess; a zero vector is synthesized when absent.
    pub u0: Option<Vec<T>>,
    /// Opaque parameter object.
    pub p: Params,
}

impl<T: Scalar> fmt::Debug for LinearProblem<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinearProblem")
            .field("a", &self.a)
            .field("b", &self.b)
            .field("u0", &self.u0)
            .field("p", &self.p.as_ref().map(|_| "<params>"))
            .finish()
    }
}

impl<T: Scalar> LinearProblem<T> {
    pub fn new(a: impl Into<Operator<T>>, b: impl Into<Rhs<T>>) -> Self {
        Self { a: a.into(), b: b.into(), u0: None, p: None }
    }

    pub fn with_guess(mut self, u0: Vec<T>) -> Self {
        self.u0 = Some(u0);
        self
    }

    pub fn with_params(mut self, p: Params) -> Self {
        self.p = p;
        self
    }
}

/// Solution wrapper returned by every solve call.
#[derive(Debug)]
pub struct LinearSolution<T: Scalar> {
    /// The computed solution vector.
    pub u: Vec<T>,
    /// Status of the solve.
    pub retcode: ReturnCode,
    /// Iteration count and final residual reported by the algorithm.
    pub stats: SolveStats<T>,
    /// Snapshot of the originating problem (operator/rhs handles are
    /// shared, so this is cheap).
    pub problem: LinearProblem<T>,
}
