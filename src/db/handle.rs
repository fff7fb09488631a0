//! Database handle trait
//!
//! The one interface every driver implements. Dialect-dependent behaviour
//! hangs off two hooks (`placeholder`, `apply_row_limit`) that default to the
//! handle's [`Dialect`]; everything else is plain execute-and-return.
//!
//! Handles are blocking: every call is a suspension point of the viewer loop.

use crate::db::dialect::Dialect;
use crate::db::metadata::TableMetadata;
use crate::db::types::{CellValue, RowCursor};
use crate::error::DbResult;

/// Driver-independent connection
///
/// `sql` passed to `execute_rows`/`execute` refers to `args[i - 1]` through
/// `placeholder(i)`. Implementations must not rewrite SQL except through
/// `apply_row_limit`.
pub trait DatabaseHandle {
    /// Placeholder and row-limit conventions of this connection
    fn dialect(&self) -> Dialect;

    /// Positional placeholder for argument `i` (1-based)
    fn placeholder(&self, i: usize) -> String {
        self.dialect().placeholder(i)
    }

    /// Add the dialect's row cap when it is safe to do so
    fn apply_row_limit(&self, sql: &str, limit: usize) -> String {
        self.dialect().apply_row_limit(sql, limit)
    }

    /// Run a row-producing statement
    ///
    /// # Errors
    /// Returns `DbError::QueryFailed` if the statement is rejected
    fn execute_rows(&self, sql: &str, args: &[CellValue]) -> DbResult<RowCursor>;

    /// Run a statement and report the number of affected rows
    ///
    /// # Errors
    /// Returns `DbError::QueryFailed` if the statement is rejected
    fn execute(&self, sql: &str, args: &[CellValue]) -> DbResult<u64>;

    /// Describe a table
    ///
    /// # Errors
    /// Returns `DbError::TableNotFound` for unknown tables and
    /// `DbError::MetadataFailed` if introspection itself fails
    fn table_metadata(&self, table: &str) -> DbResult<TableMetadata>;
}
