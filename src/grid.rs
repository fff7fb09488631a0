//! Result grid
//!
//! A materialized result set plus everything needed to change it later:
//! the SQL that produced it, the table it came from and a weak link back to
//! the connection. Rows are fixed once loaded; only cell edits and row
//! deletes patch the grid, so the cursor stays where it was.

use crate::config::SavedQuery;
use crate::db::{CellValue, ColumnDef, DatabaseHandle, Dialect, RowCursor};
use crate::error::{GridError, GridResult};
use crate::sql::{render_display, single_table};
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

/// A single grid value
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub column_name: String,
    pub column_index: usize,
    pub row_index: usize,
    /// Full display text; `NULL` when `raw_value` is `None`
    pub display_value: String,
    /// Value as read from the driver; `None` is SQL NULL
    pub raw_value: Option<CellValue>,
    pub database_type: String,
}

impl Cell {
    pub fn new(column: &ColumnDef, column_index: usize, row_index: usize, value: CellValue) -> Self {
        let mut cell = Self {
            column_name: column.name.clone(),
            column_index,
            row_index,
            display_value: String::new(),
            raw_value: None,
            database_type: column.type_name.clone(),
        };
        cell.set_value(value);
        cell
    }

    /// Replace the value, keeping `display_value` in step
    pub fn set_value(&mut self, value: CellValue) {
        match value {
            CellValue::Null => {
                self.raw_value = None;
                self.display_value = "NULL".to_string();
            }
            value => {
                self.display_value = value.display();
                self.raw_value = Some(value);
            }
        }
    }

    pub fn is_null(&self) -> bool {
        self.raw_value.is_none()
    }
}

/// Cells of one row, in column order
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn from_values(columns: &[ColumnDef], row_index: usize, values: Vec<CellValue>) -> Self {
        let cells = columns
            .iter()
            .zip(values)
            .enumerate()
            .map(|(i, (column, value))| Cell::new(column, i, row_index, value))
            .collect();
        Self { cells }
    }

    pub fn cell(&self, column: usize) -> Option<&Cell> {
        self.cells.get(column)
    }

    fn renumber(&mut self, row_index: usize) {
        for cell in &mut self.cells {
            cell.row_index = row_index;
        }
    }
}

/// What to run to (re)build a grid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridQuery {
    /// SQL as the user wrote it, before any row cap
    pub sql: String,
    pub args: Vec<CellValue>,
    /// Row cap handed to the driver; 0 disables it
    pub row_limit: usize,
    /// Source table when known; detected from the SQL when `None`
    pub table_name: Option<String>,
    pub primary_key: Option<String>,
}

impl GridQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            ..Self::default()
        }
    }

    pub fn from_saved(query: &SavedQuery, row_limit: usize) -> Self {
        Self {
            sql: query.sql.clone(),
            args: Vec::new(),
            row_limit,
            table_name: query.table_name.clone(),
            primary_key: query.primary_key.clone(),
        }
    }

    pub fn with_limit(mut self, row_limit: usize) -> Self {
        self.row_limit = row_limit;
        self
    }

    pub fn with_table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }
}

/// A materialized result set
#[derive(Debug, Clone)]
pub struct ResultGrid {
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Row>,
    /// SQL actually sent, row cap included
    pub source_sql: String,
    /// Last executed statement with literals substituted
    pub display_sql: String,
    /// Empty when the grid is read-only
    pub table_name: String,
    /// Empty when unknown
    pub primary_key: String,
    pub elapsed: Duration,
    pub dialect: Dialect,
    query: GridQuery,
    /// Built from metadata rather than a query; refresh keeps it as is
    fixed: bool,
    handle: Weak<dyn DatabaseHandle>,
}

impl ResultGrid {
    /// Run `query` and materialize every row
    ///
    /// # Errors
    /// `GridError::Database` when the statement fails,
    /// `GridError::FailedToMaterialize` when the cursor breaks part-way
    pub fn load(handle: &Rc<dyn DatabaseHandle>, query: GridQuery) -> GridResult<Self> {
        let started = Instant::now();
        let dialect = handle.dialect();
        let source_sql = handle.apply_row_limit(&query.sql, query.row_limit);
        let cursor = handle.execute_rows(&source_sql, &query.args)?;
        let (columns, rows) = materialize(cursor)?;
        let elapsed = started.elapsed();

        // an explicit empty table keeps the grid read-only across refreshes
        let table_name = match &query.table_name {
            Some(t) => t.trim().to_string(),
            None => single_table(&query.sql).unwrap_or_default(),
        };
        let primary_key = match &query.primary_key {
            Some(pk) if !pk.is_empty() => pk.clone(),
            _ if table_name.is_empty() => String::new(),
            _ => lookup_primary_key(handle.as_ref(), &table_name),
        };

        tracing::debug!(
            rows = rows.len(),
            table = %table_name,
            elapsed_ms = elapsed.as_millis() as u64,
            "loaded grid"
        );
        Ok(Self {
            columns,
            rows,
            display_sql: render_display(&source_sql, &query.args, dialect),
            source_sql,
            table_name,
            primary_key,
            elapsed,
            dialect,
            query,
            fixed: false,
            handle: Rc::downgrade(handle),
        })
    }

    /// A read-only grid over values that did not come from a query
    pub fn from_values(
        handle: &Rc<dyn DatabaseHandle>,
        title: impl Into<String>,
        columns: Vec<ColumnDef>,
        values: Vec<Vec<CellValue>>,
    ) -> Self {
        let title = title.into();
        let rows = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| Row::from_values(&columns, i, v))
            .collect();
        Self {
            columns,
            rows,
            source_sql: title.clone(),
            display_sql: title.clone(),
            table_name: String::new(),
            primary_key: String::new(),
            elapsed: Duration::ZERO,
            dialect: handle.dialect(),
            query: GridQuery::new(title),
            fixed: true,
            handle: Rc::downgrade(handle),
        }
    }

    /// Re-run the original query
    pub fn refresh(&self) -> GridResult<Self> {
        if self.fixed {
            return Ok(self.clone());
        }
        let handle = self.handle().ok_or(GridError::HandleDropped)?;
        let mut query = self.query.clone();
        query.table_name = Some(self.table_name.clone());
        query.primary_key = Some(self.primary_key.clone());
        Self::load(&handle, query)
    }

    /// SQL as the user wrote it
    pub fn original_sql(&self) -> &str {
        &self.query.sql
    }

    pub fn query(&self) -> &GridQuery {
        &self.query
    }

    /// Live connection, if it still exists
    pub fn handle(&self) -> Option<Rc<dyn DatabaseHandle>> {
        self.handle.upgrade()
    }

    /// Cell edits and row deletes need a source table
    pub fn is_mutable(&self) -> bool {
        !self.table_name.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row)?.cell(column)
    }

    /// Patch one cell after a successful update
    pub fn set_cell(&mut self, row: usize, column: usize, value: CellValue) -> bool {
        match self.rows.get_mut(row).and_then(|r| r.cells.get_mut(column)) {
            Some(cell) => {
                cell.set_value(value);
                true
            }
            None => false,
        }
    }

    /// Drop a row after a successful delete, renumbering those below it
    pub fn remove_row(&mut self, row: usize) -> Option<Row> {
        if row >= self.rows.len() {
            return None;
        }
        let removed = self.rows.remove(row);
        for (i, r) in self.rows.iter_mut().enumerate().skip(row) {
            r.renumber(i);
        }
        Some(removed)
    }
}

fn materialize(cursor: RowCursor) -> GridResult<(Vec<ColumnDef>, Vec<Row>)> {
    let columns = cursor.columns().to_vec();
    let mut rows = Vec::new();
    for (i, item) in cursor.enumerate() {
        let mut values = item.map_err(GridError::FailedToMaterialize)?;
        values.resize(columns.len(), CellValue::Null);
        rows.push(Row::from_values(&columns, i, values));
    }
    Ok((columns, rows))
}

fn lookup_primary_key(handle: &dyn DatabaseHandle, table: &str) -> String {
    match handle.table_metadata(table) {
        Ok(meta) => meta.single_primary_key().unwrap_or_default().to_string(),
        Err(e) => {
            tracing::debug!(table, error = %e, "primary key lookup failed");
            String::new()
        }
    }
}
