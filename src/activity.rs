use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::VecDeque;

/// Most recent request outcome, as shown to the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub ok: bool,
    pub label: String,
}

impl ConnectionStatus {
    pub fn ok(label: impl Into<String>) -> Self {
        Self {
            ok: true,
            label: label.into(),
        }
    }

    pub fn error(label: impl Into<String>) -> Self {
        Self {
            ok: false,
            label: label.into(),
        }
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::ok("Ready")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub message: String,
    pub timestamp: DateTime<Local>,
}

impl LogEntry {
    /// Hour and minute, the way the entry is displayed
    pub fn display_time(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

/// Newest-first event log, unbounded until cleared
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(activity = %message);
        self.entries.push_front(LogEntry {
            message,
            timestamp: Local::now(),
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.message.clone()).collect()
    }
}
