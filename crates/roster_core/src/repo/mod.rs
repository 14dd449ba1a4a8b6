//! Record store adapters.
//!
//! # Responsibility
//! - Define the positional worksheet contract the roster service writes to.
//! - Provide in-memory, SQLite and Google Sheets implementations.
//! - Authorize the Google backend from a service-account key.
//!
//! # Invariants
//! - Row positions are 1-based and row 1 holds the header.
//! - Deleting a row shifts every later row up by one.
//! - Records are mapped to fields by header name, not by column index.

pub mod cell;
pub mod google_auth;
pub mod google_sheet;
pub mod memory_sheet;
pub mod roster_book;
pub mod sqlite_sheet;
#[cfg(test)]
pub(crate) mod test_support;
pub mod worksheet;
