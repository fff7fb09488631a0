//! Integration tests for PostgresHandle
//!
//! These tests require a PostgreSQL server; each one is skipped when the
//! server cannot be reached. Every test works in its own temporary table.

use crate::common::Viewer;
use crossterm::event::KeyCode;
use querybook::app::StatusLevel;
use querybook::config::{Endpoint, SslMode};
use querybook::db::postgres::PostgresHandle;
use querybook::db::{CellValue, DatabaseHandle, Dialect};
use querybook::grid::{GridQuery, ResultGrid};
use std::rc::Rc;

/// Get test database endpoint
fn test_endpoint() -> Endpoint {
    Endpoint {
        dialect: Dialect::Postgres,
        host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
        port: Some(
            std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
        ),
        database: std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "test_db".to_string()),
        username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "test_user".to_string()),
        password: Some(
            std::env::var("TEST_DB_PASSWORD").unwrap_or_else(|_| "test_password".to_string()),
        ),
        ssl_mode: SslMode::Disable,
    }
}

fn connect() -> Option<Rc<PostgresHandle>> {
    let endpoint = test_endpoint();
    match PostgresHandle::connect(&endpoint) {
        Ok(handle) => Some(Rc::new(handle)),
        Err(e) => {
            eprintln!(
                "Skipping test: Database not available at {}:{} - {}",
                endpoint.host,
                endpoint.port_or_default(),
                e
            );
            None
        }
    }
}

/// Temporary `people` table that lives as long as the session
fn seed(handle: &PostgresHandle) {
    handle
        .execute(
            "CREATE TEMP TABLE people (id serial PRIMARY KEY, name text, age int4, meta jsonb)",
            &[],
        )
        .unwrap();
    handle
        .execute(
            "INSERT INTO people (name, age, meta) VALUES \
             ('Alice', 30, '{\"role\": \"admin\"}'), ('Bob', NULL, NULL)",
            &[],
        )
        .unwrap();
}

#[test]
fn test_execute_simple_query() {
    let Some(handle) = connect() else { return };
    let rows: Vec<_> = handle
        .execute_rows("SELECT 1 as num, 'hello' as msg", &[])
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(rows.len(), 1);
    match &rows[0][0] {
        CellValue::Integer(n) => assert_eq!(*n, 1),
        other => panic!("Expected Integer, got {:?}", other),
    }
    match &rows[0][1] {
        CellValue::Text(s) => assert_eq!(s, "hello"),
        other => panic!("Expected Text, got {:?}", other),
    }
}

#[test]
fn test_metadata_of_temp_table() {
    let Some(handle) = connect() else { return };
    seed(&handle);
    let meta = handle.table_metadata("people").unwrap();
    assert_eq!(meta.columns, vec!["id", "name", "age", "meta"]);
    assert_eq!(meta.single_primary_key(), Some("id"));
    assert!(handle.table_metadata("no_such_table_here").is_err());
}

#[test]
fn test_grid_load_with_row_limit() {
    let Some(handle) = connect() else { return };
    seed(&handle);
    let dyn_handle: Rc<dyn DatabaseHandle> = handle.clone();
    let grid = ResultGrid::load(
        &dyn_handle,
        GridQuery::new("SELECT * FROM people ORDER BY id").with_limit(1),
    )
    .unwrap();
    assert_eq!(grid.row_count(), 1);
    assert_eq!(grid.table_name, "people");
    assert_eq!(grid.primary_key, "id");
    assert!(matches!(grid.cell(0, 3).unwrap().raw_value, Some(CellValue::Json(_))));
}

#[test]
fn test_edit_typed_columns() {
    let Some(handle) = connect() else { return };
    seed(&handle);
    let mut v = Viewer::open(handle.clone(), "SELECT * FROM people ORDER BY id");

    // int4 column: text from the editor is bound as an integer
    v.editor_returns("31");
    v.press(KeyCode::Char('l'));
    v.press(KeyCode::Char('l'));
    v.press(KeyCode::Char('e'));
    assert_eq!(v.banner(), "Updated successfully");

    // jsonb column, opened pretty-printed
    v.editor_returns("{\"role\": \"owner\"}");
    v.press(KeyCode::Char('l'));
    v.press(KeyCode::Char('e'));
    assert_eq!(v.banner(), "Updated successfully");
    assert!(v.editor.borrow().seen()[1].0.contains("\n  \"role\""));

    let rows: Vec<_> = handle
        .execute_rows("SELECT age, meta->>'role' FROM people WHERE name = 'Alice'", &[])
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(rows[0][0], CellValue::Integer(31));
    assert_eq!(rows[0][1], CellValue::Text("owner".into()));
}

#[test]
fn test_delete_row_with_null_cells() {
    let Some(handle) = connect() else { return };
    seed(&handle);
    let mut v = Viewer::open(handle.clone(), "SELECT * FROM people ORDER BY id");

    v.press(KeyCode::Char('G'));
    v.press(KeyCode::Char('d'));
    v.press(KeyCode::Char('r'));
    v.press(KeyCode::Enter);

    assert_eq!(v.banner(), "Deleted 1 row");
    let count: Vec<_> = handle
        .execute_rows("SELECT count(*) FROM people", &[])
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(count[0][0], CellValue::Integer(1));
}

#[test]
fn test_driver_error_is_a_banner() {
    let Some(handle) = connect() else { return };
    seed(&handle);
    let mut v = Viewer::open(handle, "SELECT * FROM people ORDER BY id");

    v.editor_returns("not a number");
    v.press(KeyCode::Char('l'));
    v.press(KeyCode::Char('l'));
    v.press(KeyCode::Char('e'));

    assert_eq!(v.app.status().unwrap().level, StatusLevel::Error);
    assert_eq!(v.cells()[0][2], "30");
}

#[test]
fn test_rows_with_untyped_columns_can_be_mutated() {
    let Some(handle) = connect() else { return };
    handle
        .execute(
            "CREATE TEMP TABLE spans (id int4, span interval, tags int4[], doc json, addr inet)",
            &[],
        )
        .unwrap();
    handle
        .execute(
            "INSERT INTO spans VALUES \
             (1, '1 day', '{1,2}', '{\"a\": 1}', '10.0.0.1'), \
             (2, '2 hours', NULL, '[]', NULL)",
            &[],
        )
        .unwrap();
    let mut v = Viewer::open(handle.clone(), "SELECT * FROM spans ORDER BY id");
    assert_eq!(v.cells()[0][1], "1 day");
    assert_eq!(v.cells()[0][2], "{1,2}");
    // inet renders with its netmask under ::text
    assert_eq!(v.cells()[0][4], "10.0.0.1/32");

    v.editor_returns("3 days");
    v.press(KeyCode::Char('l'));
    v.press(KeyCode::Char('e'));
    assert_eq!(v.banner(), "Updated successfully");

    v.press(KeyCode::Char('d'));
    v.press(KeyCode::Char('r'));
    v.press(KeyCode::Enter);
    assert_eq!(v.banner(), "Deleted 1 row");

    let rows: Vec<_> = handle
        .execute_rows("SELECT id FROM spans", &[])
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(rows, vec![vec![CellValue::Integer(2)]]);
}
