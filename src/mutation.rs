//! Cell edits, cell clears and row deletes
//!
//! Every mutation is synthesized with a whole-row filter, validated, run
//! through the grid's handle and accepted only if exactly one row changed.
//! On success the grid is patched in place; on any failure it is untouched.

use crate::db::{CellValue, DatabaseHandle, types};
use crate::editor::BlockingEditor;
use crate::error::{EditError, EditResult};
use crate::grid::ResultGrid;
use crate::sql::{self, Statement};
use crate::ui::viewport::Position;
use std::rc::Rc;

/// What a successful call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Updated,
    Cleared,
    Deleted,
    /// Editor output matched the old value; nothing was sent
    Unchanged,
}

impl Mutation {
    pub fn banner(&self) -> &'static str {
        match self {
            Self::Updated => "Updated successfully",
            Self::Cleared => "Cleared cell",
            Self::Deleted => "Deleted 1 row",
            Self::Unchanged => "No changes",
        }
    }
}

/// Mutation access to one grid
pub struct CellEditor<'a> {
    grid: &'a mut ResultGrid,
    handle: Rc<dyn DatabaseHandle>,
}

impl<'a> CellEditor<'a> {
    /// # Errors
    /// `MissingTable` for read-only grids, `NoConnection` once the handle is gone
    pub fn new(grid: &'a mut ResultGrid) -> EditResult<Self> {
        if !grid.is_mutable() {
            return Err(EditError::MissingTable);
        }
        let handle = grid.handle().ok_or(EditError::NoConnection)?;
        Ok(Self { grid, handle })
    }

    /// Open the cell at `pos` in the editor and write back what comes out
    #[tracing::instrument(skip(self, editor), fields(table = %self.grid.table_name))]
    pub fn edit_cell(&mut self, pos: Position, editor: &mut dyn BlockingEditor) -> EditResult<Mutation> {
        let cell = self.grid.cell(pos.row, pos.col).ok_or(EditError::NoCell)?;
        let (initial, extension) = match &cell.raw_value {
            None => (String::new(), "txt"),
            Some(value) if value.is_json_document() => (pretty_json(value), "json"),
            Some(_) => (cell.display_value.clone(), "txt"),
        };

        let edited = editor.edit(&initial, extension)?.ok_or(EditError::Cancelled)?;
        let edited = edited.trim_end();
        if edited == initial.trim_end() {
            return Ok(Mutation::Unchanged);
        }
        self.update(pos, edited)?;
        Ok(Mutation::Updated)
    }

    /// Set the cell at `pos` to NULL
    #[tracing::instrument(skip(self), fields(table = %self.grid.table_name))]
    pub fn clear_cell(&mut self, pos: Position) -> EditResult<Mutation> {
        self.grid.cell(pos.row, pos.col).ok_or(EditError::NoCell)?;
        self.update(pos, "")?;
        Ok(Mutation::Cleared)
    }

    /// Delete grid row `row` from the table
    #[tracing::instrument(skip(self), fields(table = %self.grid.table_name))]
    pub fn delete_row(&mut self, row: usize) -> EditResult<Mutation> {
        let source = self.grid.rows.get(row).ok_or(EditError::NoCell)?;
        let stmt = sql::build_delete(&*self.handle, &self.grid.table_name, source)?;
        self.run(&stmt)?;
        self.grid.remove_row(row);
        Ok(Mutation::Deleted)
    }

    fn update(&mut self, pos: Position, new_value: &str) -> EditResult<()> {
        let source = self.grid.rows.get(pos.row).ok_or(EditError::NoCell)?;
        let stmt = sql::build_update(
            &*self.handle,
            &self.grid.table_name,
            pos.col,
            new_value,
            source,
        )?;
        let previous = source.cell(pos.col).and_then(|c| c.raw_value.clone());
        self.run(&stmt)?;
        self.grid
            .set_cell(pos.row, pos.col, coerce(previous.as_ref(), new_value));
        Ok(())
    }

    /// Validate, execute and insist on exactly one affected row
    fn run(&mut self, stmt: &Statement) -> EditResult<()> {
        let dialect = self.handle.dialect();
        sql::validate(stmt, dialect)?;
        tracing::debug!(sql = %stmt.sql, args = stmt.args.len(), "executing mutation");

        let affected = self.handle.execute(&stmt.sql, &stmt.args).map_err(|e| {
            tracing::warn!(error = %e, "mutation failed");
            e
        })?;
        tracing::info!(affected, "mutation executed");
        if affected != 1 {
            tracing::warn!(affected, sql = %stmt.sql, "row filter did not match exactly one row");
            return Err(EditError::Concurrency { affected });
        }
        self.grid.display_sql = stmt.display(dialect);
        Ok(())
    }
}

fn pretty_json(value: &CellValue) -> String {
    let parsed = match value {
        CellValue::Json(v) => Some(v.clone()),
        CellValue::Text(s) => serde_json::from_str(s).ok(),
        _ => None,
    };
    parsed
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| value.display())
}

/// Local value after an update, keeping the column's kind when the text fits it
fn coerce(previous: Option<&CellValue>, text: &str) -> CellValue {
    if text.is_empty() {
        return CellValue::Null;
    }
    let parsed = match previous {
        Some(CellValue::Integer(_)) => text.parse().ok().map(CellValue::Integer),
        Some(CellValue::Float(_)) => text.parse().ok().map(CellValue::Float),
        Some(CellValue::Boolean(_)) => text.parse().ok().map(CellValue::Boolean),
        Some(CellValue::Json(_)) => serde_json::from_str(text).ok().map(CellValue::Json),
        Some(CellValue::DateTime(_)) => Some(CellValue::DateTime(text.to_string())),
        Some(CellValue::Uuid(_)) => Some(CellValue::Uuid(text.to_string())),
        Some(CellValue::Binary(_)) => Some(CellValue::Binary(types::bytes_from_text(text))),
        _ => None,
    };
    parsed.unwrap_or_else(|| CellValue::Text(text.to_string()))
}
