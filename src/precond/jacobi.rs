// Jacobi preconditioner implementation

use crate::core::traits::Scalar;
use crate::error::Error;
use crate::operator::{Operator, OperatorRepr};
use crate::precond::Preconditioner;

/// Jacobi preconditioner: M⁻¹ = D⁻¹
pub struct Jacobi<T> {
    inv_diag: Vec<T>,
}

impl<T: Scalar> Jacobi<T> {
    /// new with empty state; `setup` extracts the diagonal.
    pub fn new() -> Self {
        Self { inv_diag: Vec::new() }
    }
}

impl<T: Scalar> Default for Jacobi<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> Preconditioner<T> for Jacobi<T> {
    fn setup(&mut self, a: &Operator<T>) -> Result<(), Error> {
        let n = a.nrows();
        let mut diag = vec![T::zero(); n];
        match a.repr() {
            OperatorRepr::Dense(m) => {
                for (i, d) in diag.iter_mut().enumerate() {
                    *d = m[(i, i)];
                }
            }
            OperatorRepr::Csc(m) => {
                let dense = m.to_dense();
                for (i, d) in diag.iter_mut().enumerate() {
                    *d = dense[(i, i)];
                }
            }
            OperatorRepr::Diagonal(d) => diag.copy_from_slice(d),
        }
        // Zero diagonal entries are left unscaled.
        self.inv_diag = diag
            .into_iter()
            .map(|d| if d != T::zero() { T::one() / d } else { T::zero() })
            .collect();
        Ok(())
    }

    fn apply(&self, r: &[T], z: &mut [T]) -> Result<(), Error> {
        for i in 0..r.len() {
            z[i] = self.inv_diag[i] * r[i];
        }
        Ok(())
    }

    fn dim(&self) -> usize {
        self.inv_diag.len()
    }
}
