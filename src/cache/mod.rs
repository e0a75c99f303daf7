//! Cache lifecycle: aliasing, initialization, reuse, and solves.

pub(crate) mod alias;
pub mod linear_cache;

pub use linear_cache::{init, solve, LinearCache, Reinit};
