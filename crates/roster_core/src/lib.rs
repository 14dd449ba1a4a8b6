//! Core domain logic for the student roster.
//! Both front-ends (terminal menu and desktop form) go through this crate.

pub mod config;
pub mod connection;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{BackendKind, RosterConfig};
pub use connection::{ConnectionError, DynRosterBook, RosterBackend};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::audit::{AuditAction, LogEntry};
pub use model::student::{NewStudent, Student, StudentId, StudentValidationError};
pub use repo::cell::CellValue;
pub use repo::memory_sheet::MemoryWorksheet;
pub use repo::roster_book::RosterBook;
pub use repo::sqlite_sheet::SqliteWorksheet;
pub use repo::worksheet::{CellPosition, Record, RepoError, RepoResult, Worksheet};
pub use service::student_service::{
    filter_by_name, Audited, ServiceError, ServiceResult, StudentService,
};
