//! Monitored batch solve with optional left preconditioning.
//!
//! Every system `A_k x_k = b_k` of a batch is solved independently from a zero
//! initial guess. When a preconditioner batch is given, the solver runs on
//! `(P_k A_k) x = P_k b_k`. For each system the solution, the kernel's status
//! code, the iteration count and the full residual history are recorded; a
//! system that fails to converge never aborts the batch.
//!
//! # Example
//! ```rust
//! use blockprec::config::SolverOptions;
//! use blockprec::matrix::{MatrixBatch, VectorBatch};
//! use blockprec::solver::MonitoredSystemSolver;
//! use blockprec::utils::NullSink;
//!
//! let a = MatrixBatch::from_row_major(1, 2, &[1.0, 0.0, 0.0, 1.0]).unwrap();
//! let b = VectorBatch::new(vec![vec![2.0, 3.0]]).unwrap();
//! let result = MonitoredSystemSolver::new(SolverOptions::default())
//!     .with_sink(&NullSink)
//!     .solve_batch(&a, &b, None)
//!     .unwrap();
//! assert_eq!(result.status, vec![0]);
//! ```

use crate::config::SolverOptions;
use crate::core::traits::MatVec;
use crate::error::PrecondError;
use crate::matrix::{MatrixBatch, VectorBatch};
use crate::parallel::try_map_batch;
use crate::solver::{GmresSolver, LinearSolver};
use crate::utils::convergence::STATUS_CONVERGED;
use crate::utils::diagnostics::{DiagnosticsSink, LogSink};
use faer::Mat;
use log::Level;
use std::borrow::Cow;
use std::fmt;

/// Produces a fresh Krylov kernel for each system of dimension `m`.
pub trait KernelFactory: Sync {
    type Kernel: LinearSolver<Mat<f64>, Vec<f64>, Scalar = f64>;
    fn kernel(&self, m: usize) -> Self::Kernel;
}

/// Solver options double as the factory for the default GMRES kernel.
impl KernelFactory for SolverOptions {
    type Kernel = GmresSolver<f64>;

    fn kernel(&self, m: usize) -> GmresSolver<f64> {
        GmresSolver::new(self.restart_for(m), self.rtol, self.max_iters_for(m)).with_atol(self.atol)
    }
}

/// Per-batch solve output, indexed by system.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    pub solutions: Vec<Vec<f64>>,
    /// 0 = converged, otherwise the kernel's failure code
    pub status: Vec<i32>,
    pub iterations: Vec<usize>,
    /// One residual observation per iteration
    pub residuals: Vec<Vec<f64>>,
    pub preconditioned: bool,
}

impl SolveResult {
    pub fn len(&self) -> usize {
        self.status.len()
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_empty()
    }

    pub fn converged(&self, k: usize) -> bool {
        self.status[k] == STATUS_CONVERGED
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary::new(self.preconditioned, &self.status, &self.iterations)
    }
}

/// Aggregate convergence report over a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub preconditioned: bool,
    pub converged: usize,
    pub total: usize,
    pub mean_iterations: f64,
    pub iterations: Vec<usize>,
}

impl BatchSummary {
    fn new(preconditioned: bool, status: &[i32], iterations: &[usize]) -> Self {
        let total = status.len();
        let mean_iterations = if iterations.is_empty() {
            0.0
        } else {
            iterations.iter().sum::<usize>() as f64 / iterations.len() as f64
        };
        Self {
            preconditioned,
            converged: status.iter().filter(|&&s| s == STATUS_CONVERGED).count(),
            total,
            mean_iterations,
            iterations: iterations.to_vec(),
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(80);
        if self.preconditioned {
            writeln!(f, "With preconditioner:")?;
        } else {
            writeln!(f, "Without preconditioner:")?;
        }
        writeln!(f, "{rule}")?;
        writeln!(f, "  Converged: {} out of {}", self.converged, self.total)?;
        writeln!(f, "  Average iterations: {:.2}", self.mean_iterations)?;
        writeln!(f, "{rule}")?;
        write!(f, "  iterations: {:?}", self.iterations)
    }
}

struct SystemOutcome {
    x: Vec<f64>,
    status: i32,
    iterations: usize,
    residuals: Vec<f64>,
}

/// Solves every system of a batch with a monitored Krylov kernel.
pub struct MonitoredSystemSolver<'s, F = SolverOptions> {
    factory: F,
    sink: &'s dyn DiagnosticsSink,
}

impl MonitoredSystemSolver<'static, SolverOptions> {
    /// GMRES configured from `options`, diagnostics to the `log` facade.
    pub fn new(options: SolverOptions) -> Self {
        Self { factory: options, sink: &LogSink }
    }
}

impl Default for MonitoredSystemSolver<'static, SolverOptions> {
    fn default() -> Self {
        Self::new(SolverOptions::default())
    }
}

impl<'s, F: KernelFactory> MonitoredSystemSolver<'s, F> {
    /// Use a custom kernel factory.
    pub fn with_factory<G: KernelFactory>(self, factory: G) -> MonitoredSystemSolver<'s, G> {
        MonitoredSystemSolver { factory, sink: self.sink }
    }

    /// Route diagnostics to `sink`.
    pub fn with_sink<'t>(self, sink: &'t dyn DiagnosticsSink) -> MonitoredSystemSolver<'t, F> {
        MonitoredSystemSolver { factory: self.factory, sink }
    }

    /// Solve `A_k x_k = b_k` for every `k`, optionally left-preconditioned by `P_k`.
    ///
    /// All shapes are validated before any system is touched. A kernel error is
    /// fatal for the batch; non-convergence is only recorded in `status`.
    pub fn solve_batch(
        &self,
        matrices: &MatrixBatch,
        rhs: &VectorBatch,
        preconditioner: Option<&MatrixBatch>,
    ) -> Result<SolveResult, PrecondError> {
        let (n, m) = (matrices.len(), matrices.dim());
        check_shapes(matrices, rhs, preconditioner)?;
        log::debug!(
            "solving batch ({n}, {m}, {m}) {} preconditioner",
            if preconditioner.is_some() { "with" } else { "without" }
        );

        let outcomes = try_map_batch(n, |k| self.solve_system(k, matrices, rhs, preconditioner))?;

        let mut result = SolveResult {
            solutions: Vec::with_capacity(n),
            status: Vec::with_capacity(n),
            iterations: Vec::with_capacity(n),
            residuals: Vec::with_capacity(n),
            preconditioned: preconditioner.is_some(),
        };
        for o in outcomes {
            result.solutions.push(o.x);
            result.status.push(o.status);
            result.iterations.push(o.iterations);
            result.residuals.push(o.residuals);
        }

        for line in result.summary().to_string().lines() {
            self.sink.emit(Level::Info, line);
        }
        Ok(result)
    }

    fn solve_system(
        &self,
        k: usize,
        matrices: &MatrixBatch,
        rhs: &VectorBatch,
        preconditioner: Option<&MatrixBatch>,
    ) -> Result<SystemOutcome, PrecondError> {
        let m = matrices.dim();
        let (a, b): (Cow<'_, Mat<f64>>, Cow<'_, Vec<f64>>) = match preconditioner {
            Some(p) => {
                let pk = &p[k];
                let mut pb = vec![0.0; m];
                pk.matvec(&rhs[k], &mut pb);
                (Cow::Owned(pk * &matrices[k]), Cow::Owned(pb))
            }
            None => (Cow::Borrowed(&matrices[k]), Cow::Borrowed(&rhs[k])),
        };

        let mut kernel = self.factory.kernel(m);
        let mut x = vec![0.0; m];
        let mut residuals = Vec::new();
        let mut iterations = 0usize;
        let stats = kernel
            .solve_observed(&*a, &*b, &mut x, &mut |r| {
                iterations += 1;
                residuals.push(r);
            })
            .map_err(|e| match e {
                PrecondError::Shape(msg) => PrecondError::Shape(format!("system {k}: {msg}")),
                PrecondError::LinearAlgebra(msg) => {
                    PrecondError::LinearAlgebra(format!("system {k}: {msg}"))
                }
                other => other,
            })?;

        Ok(SystemOutcome {
            x,
            status: stats.status,
            iterations,
            residuals,
        })
    }
}

fn check_shapes(
    matrices: &MatrixBatch,
    rhs: &VectorBatch,
    preconditioner: Option<&MatrixBatch>,
) -> Result<(), PrecondError> {
    let (n, m) = (matrices.len(), matrices.dim());
    if rhs.len() != n {
        return Err(PrecondError::shape(format!(
            "{n} matrices but {} right-hand sides",
            rhs.len()
        )));
    }
    if n > 0 && rhs.dim() != m {
        return Err(PrecondError::shape(format!(
            "right-hand sides have length {}, matrices are {m}x{m}",
            rhs.dim()
        )));
    }
    if let Some(p) = preconditioner {
        if p.len() != n {
            return Err(PrecondError::shape(format!(
                "{n} matrices but {} preconditioners",
                p.len()
            )));
        }
        if n > 0 && p.dim() != m {
            return Err(PrecondError::shape(format!(
                "preconditioners are {0}x{0}, matrices are {m}x{m}",
                p.dim()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::diagnostics::MemorySink;

    #[test]
    fn summary_formats_like_a_report() {
        let s = BatchSummary::new(true, &[0, 3, 0], &[1, 3, 2]);
        assert_eq!(s.converged, 2);
        assert_eq!(s.mean_iterations, 2.0);
        let text = s.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "With preconditioner:");
        assert_eq!(lines[2], "  Converged: 2 out of 3");
        assert_eq!(lines[3], "  Average iterations: 2.00");
        assert_eq!(lines[5], "  iterations: [1, 3, 2]");
    }

    #[test]
    fn empty_summary_has_zero_mean() {
        let s = BatchSummary::new(false, &[], &[]);
        assert_eq!(s.mean_iterations, 0.0);
        assert!(s.to_string().starts_with("Without preconditioner:"));
    }

    #[test]
    fn summary_goes_to_the_sink() {
        let a = MatrixBatch::from_row_major(1, 1, &[2.0]).unwrap();
        let b = VectorBatch::new(vec![vec![4.0]]).unwrap();
        let sink = MemorySink::new();
        let result = MonitoredSystemSolver::default().with_sink(&sink).solve_batch(&a, &b, None).unwrap();
        assert!((result.solutions[0][0] - 2.0).abs() < 1e-12);
        let info = sink.lines_at(Level::Info);
        assert_eq!(info.len(), 6);
        assert_eq!(info[2], "  Converged: 1 out of 1");
    }

    #[test]
    fn preconditioner_shape_is_checked() {
        let a = MatrixBatch::zeros(2, 3);
        let b = VectorBatch::from_row_major(2, 3, &[1.0; 6]).unwrap();
        let p = MatrixBatch::zeros(2, 2);
        let err = MonitoredSystemSolver::default()
            .with_sink(&crate::utils::NullSink)
            .solve_batch(&a, &b, Some(&p))
            .unwrap_err();
        assert!(matches!(err, PrecondError::Shape(_)));
    }
}
