//! SQLite database handle
//!
//! Backed by rusqlite with the bundled library, so no system SQLite is needed.

use crate::db::dialect::Dialect;
use crate::db::handle::DatabaseHandle;
use crate::db::metadata::{ForeignKey, TableMetadata};
use crate::db::types::{CellValue, ColumnDef, RowCursor};
use crate::error::{DbError, DbResult};
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{Connection, ToSql, params_from_iter};

pub struct SqliteHandle {
    conn: Connection,
}

impl SqliteHandle {
    /// Open a database file, or an in-memory database for `:memory:`
    pub fn open(path: &str) -> DbResult<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        tracing::info!(path, "opened sqlite database");
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Underlying connection, for seeding data outside the handle contract
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn query_metadata(&self, table: &str) -> rusqlite::Result<TableMetadata> {
        let name = unqualified(table);
        let mut meta = TableMetadata::default();

        let mut stmt = self
            .conn
            .prepare("SELECT name, type, pk FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = stmt
            .query_map([&name], |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?, r.get::<_, i64>(2)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut pks: Vec<(i64, String)> = Vec::new();
        for (column, type_name, pk) in columns {
            if pk > 0 {
                pks.push((pk, column.clone()));
            }
            meta.columns.push(column);
            meta.column_types.push(type_name);
        }
        pks.sort();
        meta.primary_keys = pks.into_iter().map(|(_, c)| c).collect();

        let mut stmt = self
            .conn
            .prepare("SELECT \"from\", \"table\", \"to\" FROM pragma_foreign_key_list(?1) ORDER BY id, seq")?;
        meta.foreign_keys = stmt
            .query_map([&name], |r| {
                Ok(ForeignKey {
                    column: r.get(0)?,
                    referenced_table: r.get(1)?,
                    referenced_column: r.get::<_, Option<String>>(2)?.unwrap_or_default(),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(meta)
    }
}

impl DatabaseHandle for SqliteHandle {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute_rows(&self, sql: &str, args: &[CellValue]) -> DbResult<RowCursor> {
        let query_err = |e: rusqlite::Error| DbError::QueryFailed(e.to_string());

        let mut stmt = self.conn.prepare(sql).map_err(query_err)?;
        let mut columns: Vec<ColumnDef> = stmt
            .columns()
            .iter()
            .map(|c| ColumnDef::new(c.name(), c.decl_type().unwrap_or("")))
            .collect();
        let width = columns.len();

        let mut rows = stmt
            .query(params_from_iter(args.iter().map(SqliteArg)))
            .map_err(query_err)?;

        // SQLite steps lazily; a failure part-way is kept as the last item
        let mut fetched: Vec<DbResult<Vec<CellValue>>> = Vec::new();
        loop {
            match rows.next() {
                Ok(Some(row)) => match read_row(row, width) {
                    Ok(values) => fetched.push(Ok(values)),
                    Err(e) => {
                        fetched.push(Err(query_err(e)));
                        break;
                    }
                },
                Ok(None) => break,
                Err(e) => {
                    fetched.push(Err(query_err(e)));
                    break;
                }
            }
        }

        // expression columns have no declared type; name the storage class instead
        if let Some(Ok(first)) = fetched.first() {
            for (col, value) in columns.iter_mut().zip(first) {
                if col.type_name.is_empty() {
                    col.type_name = storage_class(value).to_string();
                }
            }
        }

        Ok(RowCursor::new(columns, fetched.into_iter()))
    }

    fn execute(&self, sql: &str, args: &[CellValue]) -> DbResult<u64> {
        self.conn
            .execute(sql, params_from_iter(args.iter().map(SqliteArg)))
            .map(|n| n as u64)
            .map_err(|e| DbError::QueryFailed(e.to_string()))
    }

    fn table_metadata(&self, table: &str) -> DbResult<TableMetadata> {
        let meta = self
            .query_metadata(table)
            .map_err(|e| DbError::MetadataFailed(e.to_string()))?;
        if meta.columns.is_empty() {
            return Err(DbError::TableNotFound(table.to_string()));
        }
        Ok(meta)
    }
}

fn read_row(row: &rusqlite::Row<'_>, width: usize) -> rusqlite::Result<Vec<CellValue>> {
    (0..width)
        .map(|i| {
            Ok(match row.get_ref(i)? {
                ValueRef::Null => CellValue::Null,
                ValueRef::Integer(n) => CellValue::Integer(n),
                ValueRef::Real(f) => CellValue::Float(f),
                ValueRef::Text(bytes) => CellValue::from_bytes(bytes.to_vec()),
                ValueRef::Blob(bytes) => CellValue::Binary(bytes.to_vec()),
            })
        })
        .collect()
}

fn storage_class(value: &CellValue) -> &'static str {
    match value {
        CellValue::Integer(_) | CellValue::Boolean(_) => "INTEGER",
        CellValue::Float(_) => "REAL",
        CellValue::Binary(_) => "BLOB",
        CellValue::Null => "",
        _ => "TEXT",
    }
}

/// Last segment of a possibly schema-qualified, possibly quoted name
fn unqualified(table: &str) -> String {
    let last = table.rsplit('.').next().unwrap_or(table).trim();
    let unquoted = last
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| last.strip_prefix('`').and_then(|s| s.strip_suffix('`')))
        .or_else(|| last.strip_prefix('[').and_then(|s| s.strip_suffix(']')))
        .unwrap_or(last);
    unquoted.to_string()
}

/// Borrowing adapter from [`CellValue`] to a SQLite parameter
struct SqliteArg<'a>(&'a CellValue);

impl ToSql for SqliteArg<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            CellValue::Null => ToSqlOutput::Owned(Value::Null),
            CellValue::Integer(n) => ToSqlOutput::Owned(Value::Integer(*n)),
            CellValue::Float(f) => ToSqlOutput::Owned(Value::Real(*f)),
            CellValue::Boolean(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            CellValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            CellValue::Binary(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            other => ToSqlOutput::Owned(Value::Text(other.display())),
        })
    }
}
