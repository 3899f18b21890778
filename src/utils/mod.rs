//! Shared utilities: convergence bookkeeping and the diagnostics sink.

pub mod convergence;
pub mod diagnostics;
pub use diagnostics::{DiagnosticsSink, LogSink, MemorySink, NullSink};
