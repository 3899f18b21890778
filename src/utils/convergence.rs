//! Convergence tracking & tolerance checks for iterative solvers.

use num_traits::Float;

/// Terminal status of a converged solve.
pub const STATUS_CONVERGED: i32 = 0;
/// Terminal status when the residual turned non-finite.
pub const STATUS_BREAKDOWN: i32 = -1;

/// Stopping criteria: stop once ‖r‖ ≤ max(atol, tol · ‖b‖).
#[derive(Clone, Debug)]
pub struct Convergence<T> {
    pub tol: T,
    pub atol: T,
    pub max_iters: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SolveStats<T> {
    pub iterations: usize,
    pub final_residual: T,
    pub converged: bool,
    /// 0 = converged, > 0 = iterations spent without converging, < 0 = breakdown
    pub status: i32,
}

impl<T: Float> SolveStats<T> {
    /// Stats for a solve that has not taken any step yet.
    pub fn initial(residual: T) -> Self {
        Self {
            iterations: 0,
            final_residual: residual,
            converged: false,
            status: 0,
        }
    }

    /// Fill in `status` from `converged`, `iterations` and the final residual.
    pub fn finish(mut self) -> Self {
        self.status = if !self.final_residual.is_finite() {
            self.converged = false;
            STATUS_BREAKDOWN
        } else if self.converged {
            STATUS_CONVERGED
        } else {
            i32::try_from(self.iterations.max(1)).unwrap_or(i32::MAX)
        };
        self
    }
}

impl<T: Copy + Float> Convergence<T> {
    /// Absolute residual threshold for a right-hand side of norm `b_norm`.
    pub fn threshold(&self, b_norm: T) -> T {
        (self.tol * b_norm).max(self.atol)
    }

    /// Returns `(should_stop, converged)` given current `res_norm` and iteration `i`.
    pub fn check(&self, res_norm: T, b_norm: T, i: usize) -> (bool, bool) {
        let converged = res_norm <= self.threshold(b_norm);
        (converged || i >= self.max_iters || !res_norm.is_finite(), converged)
    }
}
