//! Preconditioners for the cache protocol.
//!
//! The resolution order at cache initialization is: explicit option, then
//! the algorithm's own builder, then identity operators sized to the
//! operator's row and column counts.

use crate::core::traits::Scalar;
use crate::error::Error;
use crate::operator::Operator;

/// A preconditioner M ≈ A⁻¹.
pub trait Preconditioner<T: Scalar> {
    /// Apply M⁻¹ to r, writing z = M⁻¹ r.
    fn apply(&self, r: &[T], z: &mut [T]) -> Result<(), Error>;
    /// Optionally: setup/factorize from A. Iterative solve hooks call this
    /// again after the operator has been invalidated.
    fn setup(&mut self, _a: &Operator<T>) -> Result<(), Error> {
        Ok(())
    }
    /// Dimension of the space the preconditioner acts on.
    fn dim(&self) -> usize;
}

pub mod identity;
pub mod jacobi;

pub use identity::Identity;
pub use jacobi::Jacobi;
