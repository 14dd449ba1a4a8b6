//! Student domain model and input coercion.
//!
//! # Responsibility
//! - Define the canonical student record stored one-per-row.
//! - Convert raw form/menu text into typed fields.
//!
//! # Invariants
//! - `id` is an opaque UUID v4 string generated client-side.
//! - `name` is trimmed and lowercased before storage.
//! - Grade text accepts either `,` or `.` as decimal separator.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque student identifier as stored in the `ID` column.
pub type StudentId = String;

/// One roster row.
///
/// `age` and `grade` are optional because rows can be edited by hand in the
/// backing spreadsheet; a blank or non-numeric cell loads as `None` instead
/// of failing the whole listing. Records created through
/// [`Student::register`] always carry both values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub age: Option<u32>,
    pub grade: Option<f64>,
}

/// Validated registration input.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    pub name: String,
    pub age: u32,
    pub grade: f64,
}

impl NewStudent {
    /// Coerces raw user text into a registration request.
    ///
    /// # Errors
    /// - `EmptyField` when any field is blank after trimming.
    /// - `InvalidAge` / `InvalidGrade` when numeric coercion fails.
    pub fn parse(name: &str, age: &str, grade: &str) -> Result<Self, StudentValidationError> {
        let name = normalize_name(name);
        if name.is_empty() {
            return Err(StudentValidationError::EmptyField("name"));
        }
        if age.trim().is_empty() {
            return Err(StudentValidationError::EmptyField("age"));
        }
        if grade.trim().is_empty() {
            return Err(StudentValidationError::EmptyField("grade"));
        }

        Ok(Self {
            name,
            age: parse_age(age)?,
            grade: parse_grade(grade)?,
        })
    }
}

impl Student {
    /// Creates a record with a freshly generated id.
    pub fn register(input: NewStudent) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), input)
    }

    /// Creates a record with a caller-provided id.
    pub fn with_id(id: impl Into<StudentId>, input: NewStudent) -> Self {
        Self {
            id: id.into(),
            name: input.name,
            age: Some(input.age),
            grade: Some(input.grade),
        }
    }

    /// Case-insensitive substring match on the name.
    pub fn name_contains(&self, term: &str) -> bool {
        self.name.to_lowercase().contains(&term.to_lowercase())
    }
}

/// Trims and lowercases a student name.
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Parses an age as a non-negative integer.
pub fn parse_age(raw: &str) -> Result<u32, StudentValidationError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| StudentValidationError::InvalidAge(raw.trim().to_string()))
}

/// Parses a grade, accepting `7,5` and `7.5` alike.
pub fn parse_grade(raw: &str) -> Result<f64, StudentValidationError> {
    let trimmed = raw.trim();
    match trimmed.replace(',', ".").parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(StudentValidationError::InvalidGrade(trimmed.to_string())),
    }
}

/// Input coercion failures for student registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentValidationError {
    EmptyField(&'static str),
    InvalidAge(String),
    InvalidGrade(String),
}

impl Display for StudentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "{field} must not be empty"),
            Self::InvalidAge(value) => write!(f, "age `{value}` is not a whole number"),
            Self::InvalidGrade(value) => write!(f, "grade `{value}` is not a number"),
        }
    }
}

impl Error for StudentValidationError {}
