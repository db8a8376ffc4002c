//! Operator-facing diagnostics.
//!
//! The pipeline never prints directly. It hands every message to a
//! [`Reporter`], so the binary can route messages through `tracing` while
//! tests record them.

use tracing::Level;

/// Receives the diagnostics of a run.
pub trait Reporter {
    /// Progress and success messages.
    fn info(&mut self, message: &str);
    /// Something was skipped but nothing failed.
    fn warn(&mut self, message: &str);
    /// An operation failed.
    fn error(&mut self, message: &str);
}

/// Forwards diagnostics to the global `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn info(&mut self, message: &str) {
        tracing::info!("{message}");
    }

    fn warn(&mut self, message: &str) {
        tracing::warn!("{message}");
    }

    fn error(&mut self, message: &str) {
        tracing::error!("{message}");
    }
}

/// Keeps every diagnostic in memory, in the order it was reported.
#[derive(Debug, Default, Clone)]
pub struct MemoryReporter {
    entries: Vec<(Level, String)>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[(Level, String)] {
        &self.entries
    }

    /// Messages reported at exactly `level`.
    pub fn messages(&self, level: Level) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.as_str())
            .collect()
    }

    pub fn infos(&self) -> Vec<&str> {
        self.messages(Level::INFO)
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.messages(Level::WARN)
    }

    pub fn errors(&self) -> Vec<&str> {
        self.messages(Level::ERROR)
    }
}

impl Reporter for MemoryReporter {
    fn info(&mut self, message: &str) {
        self.entries.push((Level::INFO, message.to_string()));
    }

    fn warn(&mut self, message: &str) {
        self.entries.push((Level::WARN, message.to_string()));
    }

    fn error(&mut self, message: &str) {
        self.entries.push((Level::ERROR, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_reporter_keeps_order_and_levels() {
        let mut reporter = MemoryReporter::new();
        reporter.info("one");
        reporter.error("two");
        reporter.warn("three");
        reporter.info("four");

        assert_eq!(reporter.entries().len(), 4);
        assert_eq!(reporter.entries()[1], (Level::ERROR, "two".to_string()));
        assert_eq!(reporter.infos(), vec!["one", "four"]);
        assert_eq!(reporter.warnings(), vec!["three"]);
        assert_eq!(reporter.errors(), vec!["two"]);
    }
}
