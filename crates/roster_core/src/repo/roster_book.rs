//! The two-tab roster spreadsheet: students plus audit log.

use crate::model::audit::LogEntry;
use crate::repo::cell::CellValue;
use crate::repo::worksheet::{RepoResult, Worksheet};

/// Title of the students tab for backends that address tabs by name.
pub const STUDENTS_TAB: &str = "Students";
/// Title of the audit tab.
pub const LOGS_TAB: &str = "Logs";

pub const STUDENT_HEADERS: [&str; 4] = ["ID", "Name", "Age", "Grade"];
pub const LOG_HEADERS: [&str; 3] = ["Timestamp", "Action", "Detail"];

/// Students and audit worksheets of one roster.
pub struct RosterBook<W: Worksheet> {
    students: W,
    logs: W,
}

impl<W: Worksheet> RosterBook<W> {
    /// Wraps both tabs, writing header rows into tabs that are still blank.
    pub fn open(students: W, logs: W) -> RepoResult<Self> {
        students.ensure_header(&STUDENT_HEADERS)?;
        logs.ensure_header(&LOG_HEADERS)?;
        Ok(Self { students, logs })
    }

    pub fn students(&self) -> &W {
        &self.students
    }

    pub fn logs(&self) -> &W {
        &self.logs
    }

    /// Appends one `(timestamp, action, detail)` row to the audit tab.
    pub fn append_log(&self, entry: &LogEntry) -> RepoResult<()> {
        self.logs.append_row(&[
            CellValue::text(entry.timestamp.as_str()),
            CellValue::text(entry.action.as_str()),
            CellValue::text(entry.detail.as_str()),
        ])
    }
}
