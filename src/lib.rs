//! axb: algorithm-agnostic cached linear solves
//!
//! This crate provides a reusable mutable cache around solving A·x = b, so a
//! caller can swap factorization/iterative algorithms without changing call
//! sites and amortize repeated solves (e.g. inside an outer nonlinear loop)
//! by reusing factorization state across updates to the operator, rhs, or
//! parameters. Concrete algorithms plug in through a small capability
//! contract; a static fast path solves small fixed-size systems without
//! touching the cache at all.

pub mod cache;
pub mod config;
pub mod core;
pub mod error;
pub mod operator;
pub mod precond;
pub mod solver;
pub mod utils;

// Re-exports for convenience
pub use cache::*;
pub use config::*;
pub use core::*;
pub use error::*;
pub use operator::*;
pub use precond::*;
pub use solver::*;
pub use utils::*;

// Re-export SolveStats at the crate root for convenience
pub use utils::convergence::SolveStats;
