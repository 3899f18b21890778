//! Line-oriented diagnostics sink.
//!
//! The builder reports singular-block fallbacks and the solver reports
//! end-of-batch summaries through a [`DiagnosticsSink`] passed in by the
//! caller. [`LogSink`] forwards to the `log` facade, [`NullSink`] drops
//! everything and [`MemorySink`] keeps the lines for inspection.

use log::Level;
use std::sync::Mutex;

/// Receiver for diagnostic lines. Must be shareable across batch workers.
pub trait DiagnosticsSink: Send + Sync {
    fn emit(&self, level: Level, line: &str);
}

/// Forwards every line to the `log` facade under the `blockprec` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticsSink for LogSink {
    fn emit(&self, level: Level, line: &str) {
        log::log!(target: "blockprec", level, "{line}");
    }
}

/// Discards all diagnostics.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn emit(&self, _level: Level, _line: &str) {}
}

/// Captures diagnostics in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the captured lines.
    pub fn lines(&self) -> Vec<(Level, String)> {
        match self.lines.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Captured lines at exactly `level`.
    pub fn lines_at(&self, level: Level) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, s)| s)
            .collect()
    }
}

impl DiagnosticsSink for MemorySink {
    fn emit(&self, level: Level, line: &str) {
        let mut guard = match self.lines.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push((level, line.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_keeps_order_and_level() {
        let sink = MemorySink::new();
        sink.emit(Level::Warn, "first");
        sink.emit(Level::Info, "second");
        assert_eq!(sink.lines().len(), 2);
        assert_eq!(sink.lines_at(Level::Warn), vec!["first".to_string()]);
        assert_eq!(sink.lines_at(Level::Info), vec!["second".to_string()]);
    }

    #[test]
    fn null_and_log_sinks_accept_lines() {
        NullSink.emit(Level::Info, "dropped");
        LogSink.emit(Level::Debug, "no logger installed, still fine");
    }
}
