//! blockprec: batched block-Jacobi preconditioning with monitored GMRES solves over Faer
//!
//! This crate builds block-diagonal (block-Jacobi) preconditioners for batches of dense
//! symmetric matrices with a known block layout, and solves each system of the batch with a
//! restarted GMRES kernel while recording iteration counts and residual histories.
//! Batch members are processed in parallel when the `rayon` feature is enabled.

pub mod parallel;

pub mod config;
pub mod core;
pub mod error;
pub mod matrix;
pub mod preconditioner;
pub mod solver;
pub mod utils;

// Re-exports for convenience
pub use config::*;
pub use error::*;
pub use matrix::*;
pub use preconditioner::*;
pub use solver::*;

// Re-export the diagnostics sinks and solve stats at the crate root for convenience
pub use utils::convergence::SolveStats;
pub use utils::diagnostics::{DiagnosticsSink, LogSink, MemorySink, NullSink};
