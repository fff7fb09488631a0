//! Command execution handlers
//!
//! The default [`CommandExecutor`]: `run`, `query`, `save`, `explain`,
//! `info`, `tables` and `explore` against one connection and its saved-query
//! library.

use crate::commands::{CommandExecutor, CommandLine, PromptContext};
use crate::config::{QueryLibrary, SavedQuery, Selector};
use crate::config::library::UNSAVED_ID;
use crate::db::{CellValue, ColumnDef, DatabaseHandle};
use crate::error::{CommandError, CommandResult, ConfigError, DbError};
use crate::grid::{GridQuery, ResultGrid};
use crate::sql::keywords;
use std::rc::{Rc, Weak};

/// First keywords of statements that return rows
const ROW_PRODUCING: [&str; 9] = [
    "SELECT", "WITH", "SHOW", "DESCRIBE", "DESC", "PRAGMA", "EXPLAIN", "VALUES", "TABLE",
];

pub struct ShellExecutor {
    handle: Weak<dyn DatabaseHandle>,
    library: Box<dyn QueryLibrary>,
    row_limit: usize,
}

impl ShellExecutor {
    pub fn new(handle: &Rc<dyn DatabaseHandle>, library: Box<dyn QueryLibrary>, row_limit: usize) -> Self {
        Self {
            handle: Rc::downgrade(handle),
            library,
            row_limit,
        }
    }

    fn handle(&self) -> CommandResult<Rc<dyn DatabaseHandle>> {
        self.handle
            .upgrade()
            .ok_or(CommandError::Database(DbError::NotConnected))
    }

    /// Load `sql` as a grid when it returns rows, otherwise just execute it
    pub fn run(&mut self, sql: &str) -> CommandResult<Option<ResultGrid>> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(CommandError::MissingArgument("run".into()));
        }
        let handle = self.handle()?;
        let returns_rows = keywords::first_keyword(sql)
            .is_some_and(|k| ROW_PRODUCING.contains(&k.as_str()));
        if returns_rows {
            let grid = ResultGrid::load(&handle, GridQuery::new(sql).with_limit(self.row_limit))?;
            return Ok(Some(grid));
        }
        let affected = handle.execute(sql, &[])?;
        tracing::info!(affected, "statement executed");
        Ok(None)
    }

    /// Load a saved query and remember it as the last one run
    pub fn query(&mut self, selector: &str) -> CommandResult<Option<ResultGrid>> {
        if selector.trim().is_empty() {
            return Err(CommandError::MissingArgument("query".into()));
        }
        let selector = Selector::parse(selector);
        let saved = self
            .library
            .find(&selector)
            .ok_or_else(|| ConfigError::QueryNotFound(selector.to_string()))?;
        let handle = self.handle()?;
        let grid = ResultGrid::load(&handle, GridQuery::from_saved(&saved, self.row_limit))?;
        if let Err(e) = self.library.record_last(&saved) {
            tracing::warn!(error = %e, "could not record last query");
        }
        Ok(Some(grid))
    }

    fn save(&mut self, name: &str, context: &PromptContext) -> CommandResult<Option<ResultGrid>> {
        if name.is_empty() {
            return Err(CommandError::MissingArgument("save".into()));
        }
        if context.original_sql.trim().is_empty() {
            return Err(CommandError::ExecutionFailed("No query to save".into()));
        }
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        let saved = self.library.save(SavedQuery {
            name: name.to_string(),
            id: UNSAVED_ID,
            sql: context.original_sql.clone(),
            table_name: non_empty(&context.table_name),
            primary_key: non_empty(&context.primary_key),
        })?;
        tracing::info!(id = saved.id, name = %saved.name, "saved query");
        Ok(None)
    }

    fn explain(&mut self, sql: &str) -> CommandResult<Option<ResultGrid>> {
        if sql.is_empty() {
            return Err(CommandError::MissingArgument("explain".into()));
        }
        let handle = self.handle()?;
        let sql = format!("{} {}", handle.dialect().explain_prefix(), sql);
        Ok(Some(ResultGrid::load(&handle, GridQuery::new(sql))?))
    }

    /// Open every row of `table`, up to the row limit
    fn explore(&mut self, table: &str) -> CommandResult<Option<ResultGrid>> {
        if table.is_empty() {
            return Err(CommandError::MissingArgument("explore".into()));
        }
        self.run(&format!("SELECT * FROM {}", table))
    }

    fn tables(&mut self) -> CommandResult<Option<ResultGrid>> {
        let handle = self.handle()?;
        let query = GridQuery::new(handle.dialect().tables_query()).with_table("");
        Ok(Some(ResultGrid::load(&handle, query)?))
    }

    fn info(&mut self, table: &str, context: &PromptContext) -> CommandResult<Option<ResultGrid>> {
        let table = if table.is_empty() {
            context.table_name.as_str()
        } else {
            table
        };
        if table.is_empty() {
            return Err(CommandError::MissingArgument("info".into()));
        }
        let handle = self.handle()?;
        let meta = handle.table_metadata(table)?;

        let columns = vec![
            ColumnDef::new("column", "text"),
            ColumnDef::new("type", "text"),
            ColumnDef::new("primary_key", "bool"),
            ColumnDef::new("references", "text"),
        ];
        let rows = meta
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let type_name = meta.column_types.get(i).cloned().unwrap_or_default();
                let references = meta
                    .foreign_key_for(name)
                    .map(|fk| CellValue::Text(format!("{}.{}", fk.referenced_table, fk.referenced_column)))
                    .unwrap_or(CellValue::Null);
                vec![
                    CellValue::Text(name.clone()),
                    CellValue::Text(type_name),
                    CellValue::Boolean(meta.primary_keys.contains(name)),
                    references,
                ]
            })
            .collect();
        Ok(Some(ResultGrid::from_values(
            &handle,
            format!("info {}", table),
            columns,
            rows,
        )))
    }
}

impl CommandExecutor for ShellExecutor {
    fn execute(
        &mut self,
        command: &CommandLine,
        context: &PromptContext,
    ) -> CommandResult<Option<ResultGrid>> {
        tracing::debug!(command = %command, "executing command");
        let rest = command.rest.as_str();
        match command.name.as_str() {
            "run" => self.run(rest),
            "query" => self.query(rest),
            "save" => self.save(rest, context),
            "explain" => self.explain(rest),
            "info" => self.info(rest, context),
            "tables" => self.tables(),
            "explore" => self.explore(rest),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}
