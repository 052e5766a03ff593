//! Injected log sink.
//!
//! Orchestration steps report through a [`LogSink`] handed to them instead of
//! calling into a process-wide logger, so a controller can be exercised in
//! isolation and its diagnostics inspected. [`TracingSink`] is the default
//! and forwards every line to `tracing`.

use guestmount_shared::constants::LOG_CATEGORY;
use parking_lot::Mutex;

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(s)
    }
}

/// Destination for diagnostic lines (level + category + message).
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, category: &str, message: &str);

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, LOG_CATEGORY, message);
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, LOG_CATEGORY, message);
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, LOG_CATEGORY, message);
    }
}

/// Forwards log lines to the `tracing` subscriber installed by the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, category: &str, message: &str) {
        match level {
            LogLevel::Trace => tracing::trace!(category = %category, "{}", message),
            LogLevel::Debug => tracing::debug!(category = %category, "{}", message),
            LogLevel::Info => tracing::info!(category = %category, "{}", message),
            LogLevel::Warn => tracing::warn!(category = %category, "{}", message),
            LogLevel::Error => tracing::error!(category = %category, "{}", message),
        }
    }
}

/// A captured log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub category: String,
    pub message: String,
}

/// Keeps every line in memory.
///
/// Useful for tests and for callers that surface mount diagnostics in their
/// own UI.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all lines logged so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Lines at exactly `level`.
    pub fn at_level(&self, level: LogLevel) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level == level)
            .cloned()
            .collect()
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: LogLevel, category: &str, message: &str) {
        self.records.lock().push(LogRecord {
            level,
            category: category.to_string(),
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_records_level_and_category() {
        let sink = MemorySink::new();
        sink.debug("tracing parameters");
        sink.warn("helper missing");

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level, LogLevel::Debug);
        assert_eq!(records[0].category, LOG_CATEGORY);
        assert_eq!(sink.at_level(LogLevel::Warn)[0].message, "helper missing");
    }

    #[test]
    fn tracing_sink_accepts_all_levels_without_subscriber() {
        let sink = TracingSink;
        for level in [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
        ] {
            sink.log(level, "test", "line");
        }
    }
}
