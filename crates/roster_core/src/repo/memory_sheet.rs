//! In-process worksheet backend.
//!
//! Used by tests, demos and the `memory` backend; contents live only as long
//! as the value.

use crate::repo::cell::CellValue;
use crate::repo::worksheet::{check_row, RepoResult, Worksheet};
use std::cell::RefCell;

#[derive(Debug, Default)]
pub struct MemoryWorksheet {
    title: String,
    rows: RefCell<Vec<Vec<CellValue>>>,
}

impl MemoryWorksheet {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: RefCell::new(Vec::new()),
        }
    }

    /// Creates a sheet pre-populated with `header` and data `rows`.
    pub fn with_rows(
        title: impl Into<String>,
        header: &[&str],
        rows: Vec<Vec<CellValue>>,
    ) -> Self {
        let sheet = Self::new(title);
        {
            let mut all = sheet.rows.borrow_mut();
            all.push(header.iter().map(|name| CellValue::text(*name)).collect());
            all.extend(rows);
        }
        sheet
    }

    pub fn row_count(&self) -> usize {
        self.rows.borrow().len()
    }
}

impl Worksheet for MemoryWorksheet {
    fn title(&self) -> &str {
        &self.title
    }

    fn get_all_values(&self) -> RepoResult<Vec<Vec<CellValue>>> {
        Ok(self.rows.borrow().clone())
    }

    fn append_row(&self, cells: &[CellValue]) -> RepoResult<()> {
        self.rows.borrow_mut().push(cells.to_vec());
        Ok(())
    }

    fn update_row(&self, row: usize, cells: &[CellValue]) -> RepoResult<()> {
        let mut rows = self.rows.borrow_mut();
        check_row(row, rows.len())?;
        rows[row - 1] = cells.to_vec();
        Ok(())
    }

    fn delete_row(&self, row: usize) -> RepoResult<()> {
        let mut rows = self.rows.borrow_mut();
        check_row(row, rows.len())?;
        rows.remove(row - 1);
        Ok(())
    }
}
