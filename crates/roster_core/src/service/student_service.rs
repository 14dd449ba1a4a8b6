//! Student use-case service.
//!
//! # Responsibility
//! - Validate and coerce registration input.
//! - Map header-keyed worksheet records to `Student` values.
//! - Write one audit row per CREATE/REMOVE/QUERY.
//!
//! # Invariants
//! - A failed validation never touches the store.
//! - An audit write failure never fails the primary operation; it is
//!   reported through `Audited::audit` and a `warn` event.
//! - Lookups are linear scans over the full listing.

use crate::model::audit::{AuditAction, LogEntry};
use crate::model::student::{normalize_name, NewStudent, Student, StudentValidationError};
use crate::repo::cell::CellValue;
use crate::repo::roster_book::RosterBook;
use crate::repo::worksheet::{Record, RepoError, RepoResult, Worksheet};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    Validation(StudentValidationError),
    NotFound(String),
    /// No record carries a usable grade.
    NoData,
    Store(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid data: {err}"),
            Self::NotFound(key) => write!(f, "student not found: {key}"),
            Self::NoData => write!(f, "no grades recorded"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::NotFound(_) | Self::NoData => None,
        }
    }
}

impl From<StudentValidationError> for ServiceError {
    fn from(value: StudentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

/// Primary result of an operation plus the outcome of its audit write.
#[derive(Debug)]
pub struct Audited<T> {
    pub value: T,
    pub audit: RepoResult<()>,
}

impl<T> Audited<T> {
    pub fn into_value(self) -> T {
        self.value
    }

    pub fn audit_failed(&self) -> bool {
        self.audit.is_err()
    }
}

/// Use-case service over one roster book.
pub struct StudentService<W: Worksheet> {
    book: RosterBook<W>,
}

impl<W: Worksheet> StudentService<W> {
    pub fn new(book: RosterBook<W>) -> Self {
        Self { book }
    }

    pub fn book(&self) -> &RosterBook<W> {
        &self.book
    }

    /// Registers a student from raw form text.
    ///
    /// # Contract
    /// - Name is lowercased; grade accepts `,` or `.` decimals.
    /// - A fresh UUID v4 id is generated; uniqueness is not checked.
    /// - Writes a CREATE audit row `"{name} ({id})"`.
    pub fn register(&self, name: &str, age: &str, grade: &str) -> ServiceResult<Audited<Student>> {
        let input = NewStudent::parse(name, age, grade)?;
        let student = Student::register(input);

        self.book.students().append_row(&[
            CellValue::text(student.id.as_str()),
            CellValue::text(student.name.as_str()),
            CellValue::from(student.age),
            CellValue::from(student.grade),
        ])?;
        info!("event=student_register module=service status=ok");

        let audit = self.audit(
            AuditAction::Create,
            format!("{} ({})", student.name, student.id),
        );
        Ok(Audited {
            value: student,
            audit,
        })
    }

    /// Lists all students in store order.
    pub fn list(&self) -> ServiceResult<Vec<Student>> {
        Ok(self.load()?.into_iter().map(|(_, student)| student).collect())
    }

    /// Case-insensitive substring search over the full listing.
    ///
    /// An empty term returns every student.
    pub fn search(&self, term: &str) -> ServiceResult<Vec<Student>> {
        Ok(filter_by_name(self.list()?, term))
    }

    /// Exact lookup by (lowercased) name.
    pub fn find_by_name(&self, name: &str) -> ServiceResult<Vec<Student>> {
        let wanted = normalize_name(name);
        Ok(self
            .list()?
            .into_iter()
            .filter(|student| student.name == wanted)
            .collect())
    }

    /// Deletes the first row whose ID equals `key`, falling back to the
    /// first row whose name equals the lowercased `key`.
    ///
    /// Writes a REMOVE audit row `"{name} ({id})"`.
    pub fn remove(&self, key: &str) -> ServiceResult<Audited<Student>> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ServiceError::NotFound(String::new()));
        }

        let rows = self.load()?;
        let wanted_name = normalize_name(key);
        let (row, student) = rows
            .iter()
            .find(|(_, student)| student.id == key)
            .or_else(|| rows.iter().find(|(_, student)| student.name == wanted_name))
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(key.to_string()))?;

        self.book.students().delete_row(row)?;
        info!("event=student_remove module=service status=ok row={row}");

        let audit = self.audit(
            AuditAction::Remove,
            format!("{} ({})", student.name, student.id),
        );
        Ok(Audited {
            value: student,
            audit,
        })
    }

    /// Mean grade over every record with a parseable grade.
    ///
    /// # Errors
    /// - `NoData` when no record has a usable grade.
    pub fn class_average(&self) -> ServiceResult<Audited<f64>> {
        let grades = self
            .book
            .students()
            .get_all_records()?
            .iter()
            .filter_map(|record| record.get("Grade").as_decimal())
            .collect::<Vec<_>>();

        let average = mean(&grades).ok_or(ServiceError::NoData)?;
        let audit = self.audit(AuditAction::Query, format!("Average: {average:.2}"));
        Ok(Audited {
            value: average,
            audit,
        })
    }

    fn load(&self) -> RepoResult<Vec<(usize, Student)>> {
        Ok(self
            .book
            .students()
            .get_all_records()?
            .iter()
            .map(|record| (record.row, student_from_record(record)))
            .collect())
    }

    fn audit(&self, action: AuditAction, detail: String) -> RepoResult<()> {
        let result = self.book.append_log(&LogEntry::now(action, detail));
        if let Err(err) = &result {
            warn!(
                "event=audit_append module=service status=error action={} error={err}",
                action.as_str()
            );
        }
        result
    }
}

/// Case-insensitive substring filter over an already loaded set.
pub fn filter_by_name(students: Vec<Student>, term: &str) -> Vec<Student> {
    let term = term.trim();
    if term.is_empty() {
        return students;
    }
    students
        .into_iter()
        .filter(|student| student.name_contains(term))
        .collect()
}

fn student_from_record(record: &Record) -> Student {
    Student {
        id: record.get("ID").to_string(),
        name: record.get("Name").to_string(),
        age: record.get("Age").as_whole(),
        grade: record.get("Grade").as_decimal(),
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::{filter_by_name, mean};
    use crate::model::student::{NewStudent, Student};

    fn named(name: &str) -> Student {
        Student::with_id(name, NewStudent::parse(name, "10", "5").unwrap())
    }

    #[test]
    fn filter_by_name_matches_substrings_case_insensitively() {
        let students = vec![named("ana"), named("Mariana"), named("joao")];
        let names = filter_by_name(students, "ANA")
            .into_iter()
            .map(|student| student.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["ana", "mariana"]);
    }

    #[test]
    fn filter_by_blank_term_keeps_everything() {
        assert_eq!(filter_by_name(vec![named("ana"), named("joao")], "  ").len(), 2);
    }

    #[test]
    fn mean_of_empty_set_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[5.0, 7.5, 10.0]), Some(7.5));
    }
}
