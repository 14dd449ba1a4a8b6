//! Worksheet contract shared by every record store backend.
//!
//! # Responsibility
//! - Expose positional append/list/find/update/delete row operations.
//! - Map data rows to header-keyed records.
//!
//! # Invariants
//! - Positions are 1-based; row 1 is the header row.
//! - `get_all_records` never includes the header row.
//! - Missing trailing cells read as `CellValue::Empty`.

use crate::db::DbError;
use crate::repo::cell::{CellValue, EMPTY_CELL};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Record store failure.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    HttpStatus { status: u16, body: String },
    Transport(String),
    InvalidData(String),
    WorksheetNotFound(String),
    SpreadsheetNotFound(String),
    RowOutOfRange { row: usize, row_count: usize },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::HttpStatus { status, body } => {
                write!(f, "store request failed with http status {status}: {body}")
            }
            Self::Transport(message) => write!(f, "store unreachable: {message}"),
            Self::InvalidData(message) => write!(f, "invalid store data: {message}"),
            Self::WorksheetNotFound(title) => write!(f, "worksheet not found: {title}"),
            Self::SpreadsheetNotFound(name) => write!(f, "spreadsheet not found: {name}"),
            Self::RowOutOfRange { row, row_count } => {
                write!(f, "row {row} is out of range (worksheet has {row_count} rows)")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// 1-based cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPosition {
    pub row: usize,
    pub col: usize,
}

/// One data row keyed by header name.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Sheet position of this row (always >= 2).
    pub row: usize,
    fields: BTreeMap<String, CellValue>,
}

impl Record {
    pub fn from_row(row: usize, header: &[String], cells: &[CellValue]) -> Self {
        let fields = header
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .map(|(index, name)| (name.clone(), cells.get(index).cloned().unwrap_or_default()))
            .collect();
        Self { row, fields }
    }

    /// Returns the cell under `column`, or `Empty` when the header is absent.
    pub fn get(&self, column: &str) -> &CellValue {
        self.fields.get(column).unwrap_or(&EMPTY_CELL)
    }
}

/// Positional tabular store, modelled after a single spreadsheet tab.
///
/// Only `title`, `get_all_values`, `append_row`, `update_row` and
/// `delete_row` are backend-specific; lookups are derived from a full read,
/// which is adequate for classroom-sized rosters.
pub trait Worksheet {
    fn title(&self) -> &str;

    /// Reads every row including the header.
    fn get_all_values(&self) -> RepoResult<Vec<Vec<CellValue>>>;

    fn append_row(&self, cells: &[CellValue]) -> RepoResult<()>;

    /// Overwrites the cells of an existing row.
    fn update_row(&self, row: usize, cells: &[CellValue]) -> RepoResult<()>;

    /// Removes a row; later rows move up by one position.
    fn delete_row(&self, row: usize) -> RepoResult<()>;

    /// Returns the header row as text, or an empty list for a blank sheet.
    fn header(&self) -> RepoResult<Vec<String>> {
        let rows = self.get_all_values()?;
        Ok(rows
            .first()
            .map(|cells| header_names(cells))
            .unwrap_or_default())
    }

    fn get_all_records(&self) -> RepoResult<Vec<Record>> {
        let rows = self.get_all_values()?;
        let Some((header_cells, data)) = rows.split_first() else {
            return Ok(Vec::new());
        };
        let header = header_names(header_cells);
        Ok(data
            .iter()
            .enumerate()
            .map(|(index, cells)| Record::from_row(index + 2, &header, cells))
            .collect())
    }

    /// Finds the first cell whose text equals `value`, scanning row-major.
    fn find(&self, value: &str) -> RepoResult<Option<CellPosition>> {
        let rows = self.get_all_values()?;
        for (row_index, cells) in rows.iter().enumerate() {
            for (col_index, cell) in cells.iter().enumerate() {
                if cell.to_string() == value {
                    return Ok(Some(CellPosition {
                        row: row_index + 1,
                        col: col_index + 1,
                    }));
                }
            }
        }
        Ok(None)
    }

    /// Writes `header` as row 1 when the sheet is completely empty.
    fn ensure_header(&self, header: &[&str]) -> RepoResult<()> {
        if self.get_all_values()?.is_empty() {
            let cells = header.iter().map(|name| CellValue::text(*name)).collect::<Vec<_>>();
            self.append_row(&cells)?;
        }
        Ok(())
    }
}

impl<W: Worksheet + ?Sized> Worksheet for &W {
    fn title(&self) -> &str {
        (**self).title()
    }

    fn get_all_values(&self) -> RepoResult<Vec<Vec<CellValue>>> {
        (**self).get_all_values()
    }

    fn append_row(&self, cells: &[CellValue]) -> RepoResult<()> {
        (**self).append_row(cells)
    }

    fn update_row(&self, row: usize, cells: &[CellValue]) -> RepoResult<()> {
        (**self).update_row(row, cells)
    }

    fn delete_row(&self, row: usize) -> RepoResult<()> {
        (**self).delete_row(row)
    }
}

impl<W: Worksheet + ?Sized> Worksheet for Box<W> {
    fn title(&self) -> &str {
        (**self).title()
    }

    fn get_all_values(&self) -> RepoResult<Vec<Vec<CellValue>>> {
        (**self).get_all_values()
    }

    fn append_row(&self, cells: &[CellValue]) -> RepoResult<()> {
        (**self).append_row(cells)
    }

    fn update_row(&self, row: usize, cells: &[CellValue]) -> RepoResult<()> {
        (**self).update_row(row, cells)
    }

    fn delete_row(&self, row: usize) -> RepoResult<()> {
        (**self).delete_row(row)
    }
}

/// Checks a 1-based position against the current row count.
pub(crate) fn check_row(row: usize, row_count: usize) -> RepoResult<()> {
    if row == 0 || row > row_count {
        return Err(RepoError::RowOutOfRange { row, row_count });
    }
    Ok(())
}

fn header_names(cells: &[CellValue]) -> Vec<String> {
    cells.iter().map(|cell| cell.to_string().trim().to_string()).collect()
}
