//! Diagnostic message hook
//!
//! Pipeline stages report skipped stations, extrema and window bounds through
//! a [`DiagnosticSink`]. The default sink forwards to the `log` facade; tests
//! and callers that want to inspect the messages use a [`CollectingSink`].
//!
//! # Example
//!
//! ```
//! use ps_picker::analysis::diagnostics::{CollectingSink, DiagnosticSink};
//!
//! let sink = CollectingSink::new();
//! sink.emit(log::Level::Warn, "station ANTF skipped");
//! assert!(sink.contains("ANTF"));
//! ```

use std::sync::Mutex;

/// Receiver of diagnostic messages
///
/// Stations are picked in parallel, so sinks must be `Sync`.
pub trait DiagnosticSink: Sync {
    /// Record one message
    fn emit(&self, level: log::Level, message: &str);
}

/// Sink forwarding every message to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&self, level: log::Level, message: &str) {
        log::log!(target: "ps_picker", level, "{}", message);
    }
}

/// Sink keeping every message in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    messages: Mutex<Vec<(log::Level, String)>>,
}

impl CollectingSink {
    /// Empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded messages, in emission order
    pub fn messages(&self) -> Vec<(log::Level, String)> {
        match self.messages.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// True if any recorded message contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|(_, m)| m.contains(needle))
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, level: log::Level, message: &str) {
        let mut guard = match self.messages.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push((level, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink_keeps_order() {
        let sink = CollectingSink::new();
        sink.emit(log::Level::Debug, "first");
        sink.emit(log::Level::Warn, "second");
        let messages = sink.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], (log::Level::Debug, "first".to_string()));
        assert_eq!(messages[1].0, log::Level::Warn);
        assert!(!sink.contains("third"));
    }

    #[test]
    fn test_log_sink_does_not_panic_without_logger() {
        LogSink.emit(log::Level::Info, "nobody listens");
    }
}
