//! Configuration for the builder and the monitored solver.

pub mod options;
pub use options::{BuilderOptions, SolverOptions};
