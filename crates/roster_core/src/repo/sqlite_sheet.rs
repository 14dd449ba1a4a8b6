//! SQLite-backed worksheet.
//!
//! # Responsibility
//! - Persist positional rows for one named tab in a local database file.
//! - Keep SQL details inside the store boundary.
//!
//! # Invariants
//! - Row position is the ordinal of `worksheet_rows.id` within a tab.
//! - Cells are stored as a JSON array of untagged `CellValue`s.

use crate::repo::cell::CellValue;
use crate::repo::worksheet::{RepoError, RepoResult, Worksheet};
use rusqlite::{params, Connection, OptionalExtension};

pub struct SqliteWorksheet<'conn> {
    conn: &'conn Connection,
    title: String,
}

impl<'conn> SqliteWorksheet<'conn> {
    /// Opens the tab named `title`, registering it on first use.
    pub fn try_new(conn: &'conn Connection, title: impl Into<String>) -> RepoResult<Self> {
        let title = title.into();
        conn.execute(
            "INSERT OR IGNORE INTO worksheets (title) VALUES (?1);",
            [title.as_str()],
        )?;
        Ok(Self { conn, title })
    }

    fn row_count(&self) -> RepoResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM worksheet_rows WHERE worksheet = ?1;",
            [self.title.as_str()],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Resolves a 1-based position to the backing row id.
    fn row_id(&self, row: usize) -> RepoResult<i64> {
        let offset = i64::try_from(row.saturating_sub(1))
            .map_err(|_| RepoError::InvalidData(format!("row {row} exceeds sqlite range")))?;
        let id = self
            .conn
            .query_row(
                "SELECT id FROM worksheet_rows
                 WHERE worksheet = ?1
                 ORDER BY id ASC
                 LIMIT 1 OFFSET ?2;",
                params![self.title.as_str(), offset],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        match id {
            Some(id) if row > 0 => Ok(id),
            _ => Err(RepoError::RowOutOfRange {
                row,
                row_count: self.row_count()?,
            }),
        }
    }
}

impl Worksheet for SqliteWorksheet<'_> {
    fn title(&self) -> &str {
        &self.title
    }

    fn get_all_values(&self) -> RepoResult<Vec<Vec<CellValue>>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, cells FROM worksheet_rows
             WHERE worksheet = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([self.title.as_str()])?;
        let mut values = Vec::new();

        while let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            let text: String = row.get(1)?;
            values.push(decode_cells(id, &text)?);
        }

        Ok(values)
    }

    fn append_row(&self, cells: &[CellValue]) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO worksheet_rows (worksheet, cells) VALUES (?1, ?2);",
            params![self.title.as_str(), encode_cells(cells)?],
        )?;
        Ok(())
    }

    fn update_row(&self, row: usize, cells: &[CellValue]) -> RepoResult<()> {
        let id = self.row_id(row)?;
        self.conn.execute(
            "UPDATE worksheet_rows SET cells = ?1 WHERE id = ?2;",
            params![encode_cells(cells)?, id],
        )?;
        Ok(())
    }

    fn delete_row(&self, row: usize) -> RepoResult<()> {
        let id = self.row_id(row)?;
        self.conn
            .execute("DELETE FROM worksheet_rows WHERE id = ?1;", [id])?;
        Ok(())
    }
}

fn encode_cells(cells: &[CellValue]) -> RepoResult<String> {
    serde_json::to_string(cells)
        .map_err(|err| RepoError::InvalidData(format!("failed to encode row cells: {err}")))
}

fn decode_cells(id: i64, text: &str) -> RepoResult<Vec<CellValue>> {
    serde_json::from_str(text).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid cells `{text}` in worksheet_rows.cells (id {id}): {err}"
        ))
    })
}

