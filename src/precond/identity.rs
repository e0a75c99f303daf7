//! Identity preconditioner, the default when nothing else is resolved.

use crate::core::traits::Scalar;
use crate::error::Error;
use crate::precond::Preconditioner;

/// Identity operator of a fixed dimension.
pub struct Identity {
    dim: usize,
}

impl Identity {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl<T: Scalar> Preconditioner<T> for Identity {
    fn apply(&self, r: &[T], z: &mut [T]) -> Result<(), Error> {
        z.copy_from_slice(r);
        Ok(())
    }

    fn dim(&self) -> usize {
        self.dim
    }
}
