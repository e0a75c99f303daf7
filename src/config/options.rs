//! API options for cache initialization.
//!
//! Every field is optional; `None` means "resolve the default": aliasing
//! defaults per algorithm class, tolerances per the rhs element type,
//! maxiters to the rhs length, preconditioners to the algorithm's builder
//! or identity, and assumptions to the operator's actual shape.

use crate::core::assumptions::OperatorAssumptions;
use crate::core::problem::SensitivityStrategy;
use crate::core::traits::Scalar;
use crate::precond::Preconditioner;

/// Options accepted by `init`/`solve`.
pub struct SolveOptions<T: Scalar> {
    /// Store the caller's operator object in the cache instead of a copy.
    pub alias_a: Option<bool>,
    /// Store the caller's rhs object in the cache instead of a copy.
    pub alias_b: Option<bool>,
    /// Absolute tolerance; coerced to the rhs element type before storage.
    pub abstol: Option<f64>,
    /// Relative tolerance; coerced to the rhs element type before storage.
    pub reltol: Option<f64>,
    /// Iteration cap for iterative algorithms.
    pub maxiters: Option<usize>,
    /// Emit per-iteration diagnostics.
    pub verbose: bool,
    /// Explicit left preconditioner.
    pub pl: Option<Box<dyn Preconditioner<T>>>,
    /// Explicit right preconditioner.
    pub pr: Option<Box<dyn Preconditioner<T>>>,
    /// Shape/conditioning assumptions steering default algorithm selection.
    pub assumptions: Option<OperatorAssumptions>,
    /// Sensitivity-propagation tag stored on the cache.
    pub sensitivity: SensitivityStrategy,
}

impl<T: Scalar> Default for SolveOptions<T> {
    fn default() -> Self {
        Self {
            alias_a: None,
            alias_b: None,
            abstol: None,
            reltol: None,
            maxiters: None,
            verbose: false,
            pl: None,
            pr: None,
            assumptions: None,
            sensitivity: SensitivityStrategy::default(),
        }
    }
}
