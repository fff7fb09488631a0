//! Database abstraction layer
//!
//! This module provides a trait-based abstraction over database operations,
//! allowing for multiple database backends and easy testing with the
//! scripted in-memory handle.

pub mod dialect;
pub mod handle;
pub mod memory;
pub mod metadata;
pub mod postgres;
pub mod sqlite;
pub mod types;

use crate::config::connections::Endpoint;
use crate::error::{DbError, DbResult};
use std::rc::Rc;

// Re-export main types
pub use dialect::Dialect;
pub use handle::DatabaseHandle;
pub use metadata::{ForeignKey, TableMetadata};
pub use types::{CellValue, ColumnDef, RowCursor};

/// Open a live handle for a parsed connection endpoint.
///
/// Dialects without a compiled-in driver are still usable for SQL
/// generation but cannot be opened.
pub fn connect(endpoint: &Endpoint) -> DbResult<Rc<dyn DatabaseHandle>> {
    match endpoint.dialect {
        Dialect::Postgres => Ok(Rc::new(postgres::PostgresHandle::connect(endpoint)?)),
        Dialect::Sqlite => Ok(Rc::new(sqlite::SqliteHandle::open(&endpoint.database)?)),
        other => Err(DbError::UnsupportedDriver(other.to_string())),
    }
}
