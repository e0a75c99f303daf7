//! Core value types and scalar traits.

pub mod assumptions;
pub mod problem;
pub mod traits;

pub use assumptions::{Condition, OperatorAssumptions, Squareness};
pub use problem::{LinearProblem, LinearSolution, Params, ReturnCode, SensitivityStrategy};
pub use traits::{Scalar, Tolerance};
