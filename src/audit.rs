//! Audit-trail collaborator.
//!
//! The storage facade reports every committed mutation here and never
//! looks at the outcome. `AuditLogger` keeps entries in memory until a
//! downstream writer drains them.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

/// Buffer size at which `record` reports that a flush is due.
pub const AUDIT_BUFFER_CAPACITY: usize = 256;

/// A single audit log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    /// Operation name, e.g. `delete_county`.
    pub action: String,
    /// Collection the operation targeted.
    pub entity: String,
    pub entity_id: String,
}

/// Receives audit entries. Must not fail or block the caller.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry);
}

/// In-memory audit log buffer.
pub struct AuditLogger {
    buffer: Mutex<Vec<AuditEntry>>,
}

impl AuditLogger {
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(Vec::with_capacity(AUDIT_BUFFER_CAPACITY)),
        }
    }

    /// Buffer an entry. Returns `true` once the buffer reaches the flush
    /// threshold.
    fn push(&self, entry: AuditEntry) -> bool {
        match self.buffer.lock() {
            Ok(mut buf) => {
                buf.push(entry);
                buf.len() >= AUDIT_BUFFER_CAPACITY
            }
            Err(_) => false,
        }
    }

    /// Get all buffered entries (for testing or manual flush).
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.buffer
            .lock()
            .map(|buf| buf.clone())
            .unwrap_or_default()
    }

    /// Drain all buffered entries.
    pub fn drain(&self) -> Vec<AuditEntry> {
        self.buffer
            .lock()
            .map(|mut buf| buf.drain(..).collect())
            .unwrap_or_default()
    }

    /// Current buffer size.
    pub fn buffer_len(&self) -> usize {
        self.buffer.lock().map(|buf| buf.len()).unwrap_or(0)
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditSink for AuditLogger {
    fn record(&self, entry: AuditEntry) {
        if self.push(entry) {
            tracing::debug!(len = self.buffer_len(), "Audit buffer at flush threshold");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(action: &str, entity_id: &str) -> AuditEntry {
        AuditEntry {
            timestamp: Utc::now(),
            action: action.into(),
            entity: "counties".into(),
            entity_id: entity_id.into(),
        }
    }

    #[test]
    fn audit_logger_records_entries() {
        let logger = AuditLogger::new();
        assert_eq!(logger.buffer_len(), 0);

        logger.record(entry("delete_county", "c1"));
        assert_eq!(logger.buffer_len(), 1);

        let entries = logger.entries();
        assert_eq!(entries[0].action, "delete_county");
        assert_eq!(entries[0].entity, "counties");
        assert_eq!(entries[0].entity_id, "c1");
    }

    #[test]
    fn audit_logger_drain_clears_buffer() {
        let logger = AuditLogger::new();
        logger.record(entry("a1", "1"));
        logger.record(entry("a2", "2"));
        assert_eq!(logger.drain().len(), 2);
        assert_eq!(logger.buffer_len(), 0);
    }

    #[test]
    fn push_reports_flush_threshold() {
        let logger = AuditLogger::new();
        let flags: Vec<bool> = (0..AUDIT_BUFFER_CAPACITY)
            .map(|i| logger.push(entry("a", &i.to_string())))
            .collect();
        assert!(!flags[..AUDIT_BUFFER_CAPACITY - 1].iter().any(|f| *f));
        assert!(flags[AUDIT_BUFFER_CAPACITY - 1]);
    }
}
