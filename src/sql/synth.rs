//! Mutation synthesis
//!
//! Builds parameterized `UPDATE` and `DELETE` statements that identify a row
//! by every value observed in it. If anything in the row changed since it was
//! read, the filter matches nothing and the caller sees 0 affected rows.
//!
//! User values only ever travel in `Statement::args`.

use crate::db::{CellValue, DatabaseHandle, Dialect, types};
use crate::error::ValidationError;
use crate::grid::{Cell, Row};
use crate::sql::display::{placeholders, render_display};
use crate::sql::keywords;

/// SQL plus the values its placeholders refer to
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<CellValue>,
}

impl Statement {
    /// Human-readable form with literals substituted
    pub fn display(&self, dialect: Dialect) -> String {
        render_display(&self.sql, &self.args, dialect)
    }
}

/// Where synthesized statements get their placeholders and quoting from
pub trait Syntax {
    fn dialect(&self) -> Dialect;

    /// Positional placeholder for argument `i` (1-based)
    fn placeholder(&self, i: usize) -> String;
}

impl Syntax for Dialect {
    fn dialect(&self) -> Dialect {
        *self
    }

    fn placeholder(&self, i: usize) -> String {
        Dialect::placeholder(self, i)
    }
}

/// A live handle may spell placeholders its own way
impl<T: DatabaseHandle + ?Sized> Syntax for &T {
    fn dialect(&self) -> Dialect {
        DatabaseHandle::dialect(*self)
    }

    fn placeholder(&self, i: usize) -> String {
        DatabaseHandle::placeholder(*self, i)
    }
}

/// Accumulates placeholders in emission order
struct Builder<S> {
    syntax: S,
    args: Vec<CellValue>,
}

impl<S: Syntax> Builder<S> {
    fn new(syntax: S) -> Self {
        Self {
            syntax,
            args: Vec::new(),
        }
    }

    fn bind(&mut self, value: CellValue) -> String {
        self.args.push(value);
        self.syntax.placeholder(self.args.len())
    }

    fn predicate(&mut self, cell: &Cell) -> String {
        let dialect = self.syntax.dialect();
        let column = dialect.quote_identifier(&cell.column_name);
        match &cell.raw_value {
            None => format!("{} IS NULL", column),
            Some(value) => {
                let ph = self.bind(value.clone());
                dialect.equals(&column, &cell.database_type, &ph)
            }
        }
    }

    fn filter<'a>(&mut self, cells: impl Iterator<Item = &'a Cell>) -> String {
        cells
            .map(|c| self.predicate(c))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

/// `UPDATE table SET col = ? WHERE <row filter>` for the cell at `target`.
///
/// An empty `new_value` sets the column to NULL. The filter covers every
/// other cell of `row`; a single-column row is filtered on the target's own
/// observed value.
pub fn build_update<S: Syntax>(
    syntax: S,
    table: &str,
    target: usize,
    new_value: &str,
    row: &Row,
) -> Result<Statement, ValidationError> {
    if row.cells.is_empty() {
        return Err(ValidationError::EmptyRow);
    }
    let cell = row
        .cells
        .get(target)
        .ok_or(ValidationError::TargetNotInRow(target))?;

    let dialect = syntax.dialect();
    let mut b = Builder::new(syntax);
    let column = dialect.quote_identifier(&cell.column_name);
    let assignment = if new_value.is_empty() {
        format!("{} = NULL", column)
    } else {
        let value = match cell.raw_value {
            Some(CellValue::Binary(_)) => CellValue::Binary(types::bytes_from_text(new_value)),
            _ => CellValue::Text(new_value.to_string()),
        };
        let ph = b.bind(value);
        format!("{} = {}", column, dialect.assigned(&cell.database_type, &ph))
    };

    let filter = if row.cells.len() == 1 {
        b.filter(row.cells.iter())
    } else {
        b.filter(row.cells.iter().filter(|c| c.column_index != cell.column_index))
    };

    let sql = if dialect.uses_alter_table_mutations() {
        format!("ALTER TABLE {} UPDATE {} WHERE {}", table, assignment, filter)
    } else {
        format!("UPDATE {} SET {} WHERE {}", table, assignment, filter)
    };
    Ok(Statement { sql, args: b.args })
}

/// `DELETE FROM table WHERE <row filter>` over every cell of `row`
pub fn build_delete<S: Syntax>(syntax: S, table: &str, row: &Row) -> Result<Statement, ValidationError> {
    if row.cells.is_empty() {
        return Err(ValidationError::EmptyRow);
    }
    let dialect = syntax.dialect();
    let mut b = Builder::new(syntax);
    let filter = b.filter(row.cells.iter());
    let sql = if dialect.uses_alter_table_mutations() {
        format!("ALTER TABLE {} DELETE WHERE {}", table, filter)
    } else {
        format!("DELETE FROM {} WHERE {}", table, filter)
    };
    Ok(Statement { sql, args: b.args })
}

/// Structural check run before any mutation reaches the driver
pub fn validate(stmt: &Statement, dialect: Dialect) -> Result<(), ValidationError> {
    let words = keywords::words(&stmt.sql);
    let has = |kw: &str| words.iter().any(|w| w.is(kw));
    let first = words.first().map(|w| w.text.to_ascii_uppercase());

    if dialect.uses_alter_table_mutations() {
        let alter_table = first.as_deref() == Some("ALTER") && words.get(1).is_some_and(|w| w.is("TABLE"));
        if !alter_table {
            return Err(ValidationError::RequiresAlterTable);
        }
    } else if first.as_deref() == Some("UPDATE") && !has("SET") {
        return Err(ValidationError::MissingSet);
    }
    if !has("WHERE") {
        return Err(ValidationError::MissingWhere);
    }

    let found = placeholders(&stmt.sql, dialect);
    let mut indices: Vec<usize> = found.iter().map(|p| p.index).collect();
    indices.sort_unstable();
    let expected: Vec<usize> = (1..=stmt.args.len()).collect();
    if indices != expected {
        return Err(ValidationError::ArgumentMismatch {
            placeholders: found.len(),
            args: stmt.args.len(),
        });
    }
    Ok(())
}
