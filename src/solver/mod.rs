//! Krylov solver interface and the monitored batch solver built on it.

use crate::error::PrecondError;
use crate::utils::convergence::SolveStats;

/// Common interface for iterative solvers with a per-iteration observer.
pub trait LinearSolver<M, V> {
    type Scalar: Copy + PartialOrd + From<f64>;

    /// Solve A·x = b starting from the guess in `x`, writing the result into `x`.
    ///
    /// `observer` is called exactly once per iteration with the solver's own
    /// residual measure, and never after this method returns.
    fn solve_observed(
        &mut self,
        a: &M,
        b: &V,
        x: &mut V,
        observer: &mut dyn FnMut(Self::Scalar),
    ) -> Result<SolveStats<Self::Scalar>, PrecondError>;

    /// Solve A·x = b without observing iterations.
    fn solve(&mut self, a: &M, b: &V, x: &mut V) -> Result<SolveStats<Self::Scalar>, PrecondError> {
        self.solve_observed(a, b, x, &mut |_| {})
    }
}

pub mod gmres;
pub use gmres::GmresSolver;

pub mod monitored;
pub use monitored::{BatchSummary, KernelFactory, MonitoredSystemSolver, SolveResult};
