//! Operation logs: the diagnostic trail attached to every verification and
//! submission result.
//!
//! Entries are ordered and never reordered. Resolvers, verifiers and backends
//! append to the same log so that a failure can be explained end to end.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a single log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(s)
    }
}

/// One human-readable diagnostic line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth, used when rendering sub-steps.
    pub indent: u8,
}

/// Ordered sequence of diagnostic entries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationLog {
    entries: Vec<LogEntry>,
}

impl OperationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, level: LogLevel, message: impl Into<String>) {
        self.add_indented(level, message, 0);
    }

    pub fn add_indented(&mut self, level: LogLevel, message: impl Into<String>, indent: u8) {
        self.entries.push(LogEntry {
            level,
            message: message.into(),
            indent,
        });
    }

    /// Append every entry of `other`, preserving order.
    pub fn extend(&mut self, other: OperationLog) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|e| e.level == LogLevel::Error)
    }

    /// The line to show a user when the operation failed: the last error
    /// entry if there is one, otherwise the last entry of any level.
    pub fn summary(&self) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.level == LogLevel::Error)
            .or_else(|| self.entries.last())
            .map(|e| e.message.as_str())
    }
}

impl<'a> IntoIterator for &'a OperationLog {
    type Item = &'a LogEntry;
    type IntoIter = std::slice::Iter<'a, LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for OperationLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            let pad = "  ".repeat(entry.indent as usize);
            writeln!(f, "{pad}[{}] {}", entry.level, entry.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_prefers_last_error() {
        let mut log = OperationLog::new();
        log.add(LogLevel::Info, "fetching");
        log.add(LogLevel::Error, "connection refused");
        log.add(LogLevel::Info, "giving up");
        assert_eq!(log.summary(), Some("connection refused"));
    }

    #[test]
    fn summary_falls_back_to_last_entry() {
        let mut log = OperationLog::new();
        log.add(LogLevel::Info, "fetching");
        log.add(LogLevel::Warn, "token not found");
        assert_eq!(log.summary(), Some("token not found"));
        assert!(!log.has_errors());
    }

    #[test]
    fn empty_log_has_no_summary() {
        assert_eq!(OperationLog::new().summary(), None);
    }

    #[test]
    fn extend_preserves_order() {
        let mut a = OperationLog::new();
        a.add(LogLevel::Info, "one");
        let mut b = OperationLog::new();
        b.add(LogLevel::Info, "two");
        b.add_indented(LogLevel::Debug, "three", 1);
        a.extend(b);
        let messages: Vec<_> = a.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["one", "two", "three"]);
    }

    #[test]
    fn display_indents_nested_entries() {
        let mut log = OperationLog::new();
        log.add(LogLevel::Info, "resolve");
        log.add_indented(LogLevel::Error, "dns lookup failed", 1);
        assert_eq!(log.to_string(), "[info] resolve\n  [error] dns lookup failed\n");
    }

    #[test]
    fn serde_json_roundtrip() {
        let mut log = OperationLog::new();
        log.add(LogLevel::Warn, "w");
        let json = serde_json::to_string(&log).unwrap();
        let back: OperationLog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, log);
    }
}
