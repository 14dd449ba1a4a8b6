//! Audit log entry model.
//!
//! Entries are written to the `Logs` tab and never read back.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Timestamp layout written to the audit tab, e.g. `19/10/2026 14:03:59`.
pub const AUDIT_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Action tag stored in the second audit column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Remove,
    Query,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Remove => "REMOVE",
            Self::Query => "QUERY",
        }
    }
}

/// One append-only audit row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: String,
    pub action: AuditAction,
    pub detail: String,
}

impl LogEntry {
    /// Stamps an entry with the current local time.
    pub fn now(action: AuditAction, detail: impl Into<String>) -> Self {
        Self::at(Local::now(), action, detail)
    }

    pub fn at(time: DateTime<Local>, action: AuditAction, detail: impl Into<String>) -> Self {
        Self {
            timestamp: time.format(AUDIT_TIMESTAMP_FORMAT).to_string(),
            action,
            detail: detail.into(),
        }
    }
}
