//! Convergence tracking & tolerance checks for iterative solvers.

use num_traits::Float;

/// Stopping criteria: absolute and relative tolerances plus an iteration cap.
#[derive(Clone, Copy, Debug)]
pub struct Convergence<T> {
    pub abstol: T,
    pub reltol: T,
    pub maxiters: usize,
}

#[derive(Clone, Debug)]
pub struct SolveStats<T> {
    pub iterations: usize,
    pub final_residual: T,
    pub converged: bool,
}

impl<T: Copy + Float> Convergence<T> {
    /// Residual norm at which the solve counts as converged, given the
    /// initial residual `res0`.
    pub fn target(&self, res0: T) -> T {
        Float::max(self.abstol, self.reltol * res0)
    }

    /// Returns (should_stop, stats) given current `res_norm` and iteration `i`.
    pub fn check(&self, res_norm: T, res0: T, i: usize) -> (bool, SolveStats<T>) {
        let converged = res_norm <= self.target(res0);
        let stop = converged || i >= self.maxiters;
        (
            stop,
            SolveStats {
                iterations: i,
                final_residual: res_norm,
                converged,
            },
        )
    }
}
