//! Scripted in-memory driver
//!
//! Records every statement it receives and answers from a script: queued
//! row sets for `execute_rows`, a fixed affected-row count for `execute`,
//! and optional one-shot failures. Used by the test suite and handy for
//! demos without a server.

use crate::db::dialect::Dialect;
use crate::db::handle::DatabaseHandle;
use crate::db::metadata::TableMetadata;
use crate::db::types::{CellValue, ColumnDef, RowCursor};
use crate::error::{DbError, DbResult};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

/// Which entry point received a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Rows,
    Execute,
}

/// A statement as the driver saw it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    pub kind: StatementKind,
    pub sql: String,
    pub args: Vec<CellValue>,
}

#[derive(Debug, Clone)]
struct ScriptedRows {
    columns: Vec<ColumnDef>,
    rows: Vec<Vec<CellValue>>,
    /// Error yielded after the rows, if any
    broken: Option<String>,
}

pub struct MemoryHandle {
    dialect: Dialect,
    queued: RefCell<VecDeque<ScriptedRows>>,
    fallback: RefCell<Option<ScriptedRows>>,
    affected: Cell<u64>,
    failures: RefCell<VecDeque<String>>,
    metadata: RefCell<HashMap<String, TableMetadata>>,
    log: RefCell<Vec<RecordedStatement>>,
}

impl MemoryHandle {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            queued: RefCell::new(VecDeque::new()),
            fallback: RefCell::new(None),
            affected: Cell::new(1),
            failures: RefCell::new(VecDeque::new()),
            metadata: RefCell::new(HashMap::new()),
            log: RefCell::new(Vec::new()),
        }
    }

    /// Rows returned whenever the queue is empty
    pub fn with_rows(self, columns: Vec<ColumnDef>, rows: Vec<Vec<CellValue>>) -> Self {
        *self.fallback.borrow_mut() = Some(ScriptedRows {
            columns,
            rows,
            broken: None,
        });
        self
    }

    pub fn with_metadata(self, table: &str, metadata: TableMetadata) -> Self {
        self.metadata.borrow_mut().insert(table.to_string(), metadata);
        self
    }

    /// Queue a row set for the next `execute_rows`
    pub fn push_rows(&self, columns: Vec<ColumnDef>, rows: Vec<Vec<CellValue>>) {
        self.queued.borrow_mut().push_back(ScriptedRows {
            columns,
            rows,
            broken: None,
        });
    }

    /// Queue a row set whose cursor fails after yielding `rows`
    pub fn push_broken_rows(
        &self,
        columns: Vec<ColumnDef>,
        rows: Vec<Vec<CellValue>>,
        error: &str,
    ) {
        self.queued.borrow_mut().push_back(ScriptedRows {
            columns,
            rows,
            broken: Some(error.to_string()),
        });
    }

    /// Affected-row count reported by every `execute`
    pub fn set_affected(&self, n: u64) {
        self.affected.set(n);
    }

    /// Make the next call fail with a driver error
    pub fn fail_next(&self, message: &str) {
        self.failures.borrow_mut().push_back(message.to_string());
    }

    /// Everything executed so far, oldest first
    pub fn statements(&self) -> Vec<RecordedStatement> {
        self.log.borrow().clone()
    }

    /// Only the statements sent through `execute`
    pub fn executed(&self) -> Vec<RecordedStatement> {
        self.log
            .borrow()
            .iter()
            .filter(|s| s.kind == StatementKind::Execute)
            .cloned()
            .collect()
    }

    fn record(&self, kind: StatementKind, sql: &str, args: &[CellValue]) -> DbResult<()> {
        self.log.borrow_mut().push(RecordedStatement {
            kind,
            sql: sql.to_string(),
            args: args.to_vec(),
        });
        match self.failures.borrow_mut().pop_front() {
            Some(message) => Err(DbError::QueryFailed(message)),
            None => Ok(()),
        }
    }
}

impl DatabaseHandle for MemoryHandle {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn execute_rows(&self, sql: &str, args: &[CellValue]) -> DbResult<RowCursor> {
        self.record(StatementKind::Rows, sql, args)?;
        let script = self
            .queued
            .borrow_mut()
            .pop_front()
            .or_else(|| self.fallback.borrow().clone())
            .unwrap_or(ScriptedRows {
                columns: Vec::new(),
                rows: Vec::new(),
                broken: None,
            });
        let tail = script
            .broken
            .map(|message| Err(DbError::QueryFailed(message)));
        let rows = script.rows.into_iter().map(Ok).chain(tail);
        Ok(RowCursor::new(script.columns, rows))
    }

    fn execute(&self, sql: &str, args: &[CellValue]) -> DbResult<u64> {
        self.record(StatementKind::Execute, sql, args)?;
        Ok(self.affected.get())
    }

    fn table_metadata(&self, table: &str) -> DbResult<TableMetadata> {
        self.metadata
            .borrow()
            .get(table)
            .cloned()
            .ok_or_else(|| DbError::TableNotFound(table.to_string()))
    }
}
