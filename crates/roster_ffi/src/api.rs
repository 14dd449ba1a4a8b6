//! FFI use-case API for the desktop form.
//!
//! # Responsibility
//! - Expose register/reload/delete/average/search calls to Dart via FRB.
//! - Own the table row cache the form renders.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Calls block until the store answers; there is no background work.
//! - The table cache is rebuilt from the store on every reload.

pub use crate::table::StudentRow;

use crate::table::RosterTable;
use log::warn;
use roster_core::{
    init_logging as init_logging_inner, RosterBackend, RosterConfig, ServiceError,
    StudentService, Worksheet,
};
use std::sync::Mutex;

static BACKEND: Mutex<Option<RosterBackend>> = Mutex::new(None);
static TABLE: Mutex<RosterTable> = Mutex::new(RosterTable::new());

/// Initializes core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Result envelope for register and delete.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterActionResponse {
    pub ok: bool,
    /// Affected student id on success.
    pub student_id: Option<String>,
    /// Dialog text.
    pub message: String,
    /// Table contents after the action.
    pub rows: Vec<StudentRow>,
}

/// Table contents after reload or search.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterTableResponse {
    pub rows: Vec<StudentRow>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RosterAverageResponse {
    pub ok: bool,
    pub average: Option<f64>,
    /// Average formatted with two decimals, or the reason there is none.
    pub message: String,
}

/// Connects to the store configured through `ROSTER_*` variables.
///
/// Returns an empty string on success. A non-empty message is fatal: the
/// form shows it and closes.
#[flutter_rust_bridge::frb(sync)]
pub fn roster_connect() -> String {
    let config = match RosterConfig::from_env() {
        Ok(config) => config,
        Err(err) => return format!("Connection failed: {err}"),
    };
    match RosterBackend::connect(&config) {
        Ok(backend) => match install_backend(backend) {
            Ok(()) => String::new(),
            Err(err) => format!("Connection failed: {err}"),
        },
        Err(err) => format!("Connection failed: {err}"),
    }
}

/// Registers a student from the Name/Age/Grade fields and reloads the table.
#[flutter_rust_bridge::frb(sync)]
pub fn roster_register(name: String, age: String, grade: String) -> RosterActionResponse {
    let outcome = with_service(|service| service.register(&name, &age, &grade));
    let response = match outcome {
        Ok(Ok(created)) => {
            if created.audit_failed() {
                warn!("event=ffi_register module=ffi status=audit_failed");
            }
            RosterActionResponse::success("Saved!", created.value.id)
        }
        Ok(Err(ServiceError::Validation(err))) => {
            RosterActionResponse::failure(format!("Invalid data: {err}"))
        }
        Ok(Err(err)) => RosterActionResponse::failure(format!("Register failed: {err}")),
        Err(err) => RosterActionResponse::failure(err),
    };
    response.with_rows(roster_reload().rows)
}

/// Reloads every row from the store.
///
/// A store failure clears the table and reports the error in `message`.
#[flutter_rust_bridge::frb(sync)]
pub fn roster_reload() -> RosterTableResponse {
    let listed = with_service(|service| service.list().map_err(|err| err.to_string()))
        .and_then(|result| result);

    with_table(|table| match listed {
        Ok(students) => {
            table.reload(students);
            let rows = table.rows();
            RosterTableResponse {
                message: format!("{} student(s).", rows.len()),
                rows,
            }
        }
        Err(err) => {
            table.clear();
            RosterTableResponse {
                rows: Vec::new(),
                message: format!("Reload failed: {err}"),
            }
        }
    })
}

/// Filters the rows currently shown; an empty term reloads from the store.
#[flutter_rust_bridge::frb(sync)]
pub fn roster_search(term: String) -> RosterTableResponse {
    if term.trim().is_empty() {
        return roster_reload();
    }
    with_table(|table| {
        table.retain_matching(&term);
        let rows = table.rows();
        let message = if rows.is_empty() {
            "No results.".to_string()
        } else {
            format!("Found {} result(s).", rows.len())
        };
        RosterTableResponse { rows, message }
    })
}

/// Deletes the selected row by student id and reloads the table.
///
/// Only rows currently displayed can be deleted. Confirmation happens in the
/// form before this call.
#[flutter_rust_bridge::frb(sync)]
pub fn roster_delete(student_id: String) -> RosterActionResponse {
    let displayed = with_table(|table| table.find(&student_id).is_some());
    if !displayed {
        warn!("event=ffi_delete module=ffi status=not_displayed");
        return RosterActionResponse::failure("Select a student first.")
            .with_rows(with_table(|table| table.rows()));
    }

    let outcome = with_service(|service| service.remove(&student_id));
    let response = match outcome {
        Ok(Ok(removed)) => RosterActionResponse::success(
            format!("Removed {}.", removed.value.name),
            removed.value.id,
        ),
        Ok(Err(ServiceError::NotFound(_))) => RosterActionResponse::failure("Not found."),
        Ok(Err(err)) => RosterActionResponse::failure(format!("Delete failed: {err}")),
        Err(err) => RosterActionResponse::failure(err),
    };
    response.with_rows(roster_reload().rows)
}

/// Computes the class average over every parseable grade.
#[flutter_rust_bridge::frb(sync)]
pub fn roster_class_average() -> RosterAverageResponse {
    match with_service(|service| service.class_average()) {
        Ok(Ok(average)) => RosterAverageResponse {
            ok: true,
            average: Some(average.value),
            message: format!("{:.2}", average.value),
        },
        Ok(Err(ServiceError::NoData)) => RosterAverageResponse {
            ok: false,
            average: None,
            message: "No grades recorded.".to_string(),
        },
        Ok(Err(err)) => RosterAverageResponse {
            ok: false,
            average: None,
            message: format!("Average failed: {err}"),
        },
        Err(err) => RosterAverageResponse {
            ok: false,
            average: None,
            message: err,
        },
    }
}

impl RosterActionResponse {
    fn success(message: impl Into<String>, student_id: String) -> Self {
        Self {
            ok: true,
            student_id: Some(student_id),
            message: message.into(),
            rows: Vec::new(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            student_id: None,
            message: message.into(),
            rows: Vec::new(),
        }
    }

    fn with_rows(mut self, rows: Vec<StudentRow>) -> Self {
        self.rows = rows;
        self
    }
}

fn install_backend(backend: RosterBackend) -> Result<(), String> {
    let mut slot = BACKEND
        .lock()
        .map_err(|_| "roster backend lock poisoned".to_string())?;
    *slot = Some(backend);
    Ok(())
}

fn with_service<T>(f: impl FnOnce(&StudentService<Box<dyn Worksheet + '_>>) -> T) -> Result<T, String> {
    let guard = BACKEND
        .lock()
        .map_err(|_| "roster backend lock poisoned".to_string())?;
    let backend = guard
        .as_ref()
        .ok_or_else(|| "roster is not connected".to_string())?;
    let book = backend
        .book()
        .map_err(|err| format!("failed to open roster tabs: {err}"))?;
    let service = StudentService::new(book);
    let value = f(&service);
    Ok(value)
}

fn with_table<T>(f: impl FnOnce(&mut RosterTable) -> T) -> T {
    let mut table = TABLE.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut table)
}
