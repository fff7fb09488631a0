//! Viewer against a real in-memory SQLite database

use crate::common::Viewer;
use crossterm::event::KeyCode;
use querybook::app::{Action, Mode, StatusLevel};
use querybook::db::DatabaseHandle;
use querybook::db::sqlite::SqliteHandle;
use std::rc::Rc;

const SQL: &str = "SELECT * FROM users ORDER BY id";

fn seeded() -> Rc<SqliteHandle> {
    let handle = SqliteHandle::open(":memory:").unwrap();
    handle
        .connection()
        .execute_batch(
            "CREATE TABLE teams (id INTEGER PRIMARY KEY, name TEXT);
             CREATE TABLE users (
                 id INTEGER PRIMARY KEY,
                 name TEXT,
                 email TEXT,
                 team_id INTEGER REFERENCES teams(id)
             );
             INSERT INTO teams VALUES (1, 'core');
             INSERT INTO users VALUES
                 (1, 'Alice', 'a@x', 1),
                 (2, 'Bob', 'b@x', NULL),
                 (3, 'Carol', NULL, 1);",
        )
        .unwrap();
    Rc::new(handle)
}

fn column(db: &SqliteHandle, name: &str) -> Vec<Option<String>> {
    let mut stmt = db
        .connection()
        .prepare(&format!("SELECT CAST({} AS TEXT) FROM users ORDER BY id", name))
        .unwrap();
    stmt.query_map([], |r| r.get::<_, Option<String>>(0))
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
}

fn open(db: &Rc<SqliteHandle>) -> Viewer {
    let handle: Rc<dyn DatabaseHandle> = db.clone();
    Viewer::open(handle, SQL)
}

#[test]
fn test_load_detects_table_and_key() {
    let db = seeded();
    let v = open(&db);
    assert_eq!(v.app.grid().table_name, "users");
    assert_eq!(v.app.grid().primary_key, "id");
    assert_eq!(v.app.grid().row_count(), 3);
    assert_eq!(v.cells()[2], vec!["3", "Carol", "NULL", "1"]);
}

#[test]
fn test_edit_is_written_to_database() {
    let db = seeded();
    let mut v = open(&db);
    v.editor_returns("Alicia\n");

    v.press(KeyCode::Char('l'));
    v.press(KeyCode::Char('e'));

    assert_eq!(v.banner(), "Updated successfully");
    assert_eq!(
        column(&db, "name"),
        vec![Some("Alicia".into()), Some("Bob".into()), Some("Carol".into())]
    );
    assert_eq!(v.cells()[0][1], "Alicia");
}

#[test]
fn test_edit_next_to_null_cell() {
    let db = seeded();
    let mut v = open(&db);
    v.editor_returns("carol@x");

    v.press(KeyCode::Char('G'));
    v.press(KeyCode::Char('l'));
    v.press(KeyCode::Char('l'));
    v.press(KeyCode::Char('e'));

    assert_eq!(v.banner(), "Updated successfully");
    assert_eq!(column(&db, "email")[2].as_deref(), Some("carol@x"));
}

#[test]
fn test_stale_row_is_not_overwritten() {
    let db = seeded();
    let mut v = open(&db);
    db.connection()
        .execute("UPDATE users SET email = 'changed@x' WHERE id = 1", [])
        .unwrap();
    v.editor_returns("Alicia");

    v.press(KeyCode::Char('l'));
    v.press(KeyCode::Char('e'));

    assert_eq!(v.app.status().unwrap().level, StatusLevel::Error);
    assert_eq!(column(&db, "name")[0].as_deref(), Some("Alice"));
    assert_eq!(v.cells()[0][1], "Alice");

    v.press(KeyCode::Char('r'));
    assert_eq!(v.cells()[0][2], "changed@x");
    assert_eq!(v.app.viewport().cursor.col, 1);
}

#[test]
fn test_delete_row_is_written_to_database() {
    let db = seeded();
    let mut v = open(&db);

    v.press(KeyCode::Char('j'));
    v.press(KeyCode::Char('d'));
    v.press(KeyCode::Char('r'));
    v.press(KeyCode::Enter);

    assert_eq!(v.banner(), "Deleted 1 row");
    assert_eq!(column(&db, "id"), vec![Some("1".into()), Some("3".into())]);
    assert_eq!(v.app.grid().row_count(), 2);
    assert_eq!(v.app.viewport().cursor.row, 1);
}

#[test]
fn test_clear_cell_writes_null() {
    let db = seeded();
    let mut v = open(&db);

    v.press(KeyCode::Char('$'));
    v.press(KeyCode::Char('d'));
    v.press(KeyCode::Enter);

    assert_eq!(v.banner(), "Cleared cell");
    assert_eq!(column(&db, "team_id")[0], None);
}

#[test]
fn test_prompt_update_refreshes_grid() {
    let db = seeded();
    let mut v = open(&db);

    v.prompt("update set name = 'Zed' where id = 2");

    assert_eq!(column(&db, "name")[1].as_deref(), Some("Zed"));
    assert_eq!(v.cells()[1][1], "Zed");
    assert_eq!(v.app.status().unwrap().level, StatusLevel::Success);
}

#[test]
fn test_unfiltered_delete_asks_first() {
    let db = seeded();
    let mut v = open(&db);

    v.prompt("delete");
    assert!(matches!(v.app.mode(), Mode::Confirm { .. }));
    assert_eq!(column(&db, "id").len(), 3);

    v.press(KeyCode::Enter);
    assert!(column(&db, "id").is_empty());
    assert_eq!(v.app.grid().row_count(), 0);
}

#[test]
fn test_info_lists_columns() {
    let db = seeded();
    let mut v = open(&db);

    v.prompt("info");

    let cells = v.cells();
    assert_eq!(cells.len(), 4);
    assert_eq!(cells[0], vec!["id", "INTEGER", "true", "NULL"]);
    assert_eq!(cells[3], vec!["team_id", "INTEGER", "false", "teams.id"]);
    assert!(!v.app.grid().is_mutable());

    v.press(KeyCode::Char('e'));
    assert_eq!(v.app.status().unwrap().level, StatusLevel::Error);
}

#[test]
fn test_save_then_query_by_name_and_id() {
    let db = seeded();
    let mut v = open(&db);

    v.prompt("save everyone");
    assert_eq!(v.app.status().unwrap().level, StatusLevel::Success);

    v.prompt("select name where id = 1");
    assert_eq!(v.app.grid().column_count(), 1);

    v.prompt("query everyone");
    assert_eq!(v.app.grid().column_count(), 4);
    assert_eq!(v.app.grid().row_count(), 3);

    v.prompt("select name where id = 1");
    v.prompt("query 1");
    assert_eq!(v.app.grid().column_count(), 4);

    v.prompt("query nobody");
    assert_eq!(v.app.status().unwrap().level, StatusLevel::Error);
    assert!(v.banner().contains("nobody"));
}

#[test]
fn test_edit_and_rerun() {
    let db = seeded();
    let mut v = open(&db);
    v.editor_returns("SELECT name FROM users WHERE id = 3");

    let sql = match v.press(KeyCode::Char('E')) {
        Action::Rerun(sql) => sql,
        other => panic!("expected rerun, got {:?}", other),
    };
    assert_eq!(v.editor.borrow().seen()[0].1, "sql");

    v.app.run_sql(&sql).unwrap();
    assert_eq!(v.cells(), vec![vec!["Carol"]]);
    assert_eq!(v.app.grid().table_name, "users");
}

#[test]
fn test_copy_as_sql_inserts() {
    let db = seeded();
    let mut v = open(&db);

    v.press(KeyCode::Char('v'));
    v.press(KeyCode::Char('j'));
    v.press(KeyCode::Char('l'));
    v.press(KeyCode::Char('y'));
    v.press(KeyCode::Char('s'));

    assert_eq!(
        v.clipboard.borrow().last(),
        Some(
            "INSERT INTO users (id, name) VALUES (1, 'Alice');\n\
             INSERT INTO users (id, name) VALUES (2, 'Bob');\n"
        )
    );
}

#[test]
fn test_rows_with_blobs_can_be_edited_and_deleted() {
    let db = SqliteHandle::open(":memory:").unwrap();
    db.connection()
        .execute_batch(
            "CREATE TABLE files (id INTEGER, name TEXT, data BLOB);
             INSERT INTO files VALUES (1, 'greeting', x'68656c6c6f'), (2, 'raw', x'ff00');",
        )
        .unwrap();
    let db = Rc::new(db);
    let handle: Rc<dyn DatabaseHandle> = db.clone();
    let mut v = Viewer::open(handle, "SELECT * FROM files ORDER BY id");
    assert_eq!(v.cells()[0][2], "hello");
    assert_eq!(v.cells()[1][2], "\\xff00");

    // the filter carries the blob as a blob
    v.editor_returns("salutation");
    v.press(KeyCode::Char('l'));
    v.press(KeyCode::Char('e'));
    assert_eq!(v.banner(), "Updated successfully");

    v.editor_returns("world");
    v.press(KeyCode::Char('l'));
    v.press(KeyCode::Char('e'));
    assert_eq!(v.banner(), "Updated successfully");
    let (kind, name): (String, String) = db
        .connection()
        .query_row("SELECT typeof(data), name FROM files WHERE id = 1", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .unwrap();
    assert_eq!((kind.as_str(), name.as_str()), ("blob", "salutation"));

    v.press(KeyCode::Char('d'));
    v.press(KeyCode::Char('r'));
    v.press(KeyCode::Enter);
    assert_eq!(v.banner(), "Deleted 1 row");
    let left: i64 = db
        .connection()
        .query_row("SELECT count(*) FROM files", [], |r| r.get(0))
        .unwrap();
    assert_eq!(left, 1);
    assert_eq!(v.cells()[0][0], "2");
}
