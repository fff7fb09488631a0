//! End-to-end viewer scenarios against the scripted in-memory driver

use crate::common::{Viewer, columns, text, users};
use crossterm::event::KeyCode;
use querybook::app::{Mode, StatusLevel};
use querybook::commands::CommandLine;
use querybook::db::memory::MemoryHandle;
use querybook::db::{CellValue, ColumnDef, Dialect};
use querybook::error::ValidationError;
use querybook::grid::Row;
use querybook::sql::build_delete;
use std::rc::Rc;

#[test]
fn test_edit_cell_end_to_end() {
    let memory = users(Dialect::Postgres);
    let mut v = Viewer::open(memory.clone(), "SELECT * FROM users");
    v.editor_returns("Alicia");

    v.press(KeyCode::Char('l'));
    v.press(KeyCode::Char('e'));

    let executed = memory.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(
        executed[0].sql,
        "UPDATE users SET name = $1 WHERE id = $2 AND email = $3"
    );
    assert_eq!(
        executed[0].args,
        vec![text("Alicia"), CellValue::Integer(1), text("a@x")]
    );
    assert_eq!(v.cells()[0], vec!["1", "Alicia", "a@x"]);
    assert_eq!(v.cells()[1], vec!["2", "Bob", "b@x"]);
    assert_eq!(v.banner(), "Updated successfully");
    assert_eq!(v.app.status().unwrap().level, StatusLevel::Success);
}

#[test]
fn test_concurrency_miss_leaves_grid() {
    let memory = users(Dialect::Postgres);
    memory.set_affected(0);
    let mut v = Viewer::open(memory.clone(), "SELECT * FROM users");
    let before = v.app.grid().rows.clone();
    v.editor_returns("Alicia");

    v.press(KeyCode::Char('l'));
    v.press(KeyCode::Char('e'));

    assert_eq!(v.app.grid().rows, before);
    assert_eq!(v.app.status().unwrap().level, StatusLevel::Error);
    assert!(v.banner().contains("refresh"));
    assert_eq!(v.app.mode(), &Mode::Normal);
}

#[test]
fn test_delete_row_with_all_null_filter() {
    let memory = Rc::new(MemoryHandle::new(Dialect::Sqlite).with_rows(
        vec![ColumnDef::new("id", "INTEGER"), ColumnDef::new("notes", "TEXT")],
        vec![vec![CellValue::Null, CellValue::Null]],
    ));
    let mut v = Viewer::open(memory.clone(), "SELECT * FROM scratch");

    v.press(KeyCode::Char('d'));
    v.press(KeyCode::Char('r'));
    v.press(KeyCode::Enter);

    let executed = memory.executed();
    assert_eq!(
        executed[0].sql,
        "DELETE FROM scratch WHERE id IS NULL AND notes IS NULL"
    );
    assert!(executed[0].args.is_empty());
    assert_eq!(v.app.grid().row_count(), 0);
    assert_eq!(v.banner(), "Deleted 1 row");
}

#[test]
fn test_command_expansion_replaces_grid() {
    let memory = Rc::new(MemoryHandle::new(Dialect::Postgres).with_rows(
        columns(&["id", "total"]),
        vec![
            vec![CellValue::Integer(4), text("10")],
            vec![CellValue::Integer(5), text("12")],
        ],
    ));
    let mut v = Viewer::open(memory.clone(), "SELECT * FROM orders");
    v.press(KeyCode::Char('j'));
    v.press(KeyCode::Char('l'));
    memory.push_rows(
        columns(&["id", "total", "status"]),
        vec![vec![CellValue::Integer(5), text("12"), text("open")]],
    );

    v.prompt("select * where id=5");

    assert_eq!(
        v.commands.borrow().as_slice(),
        &[CommandLine::new("run", "select * FROM orders where id=5")]
    );
    assert_eq!(
        memory.statements().last().unwrap().sql,
        "select * FROM orders where id=5 LIMIT 100"
    );
    assert_eq!(v.app.grid().column_count(), 3);
    assert_eq!(v.app.grid().table_name, "orders");
    assert_eq!(v.app.viewport().cursor.row, 0);
    assert_eq!(v.app.viewport().cursor.col, 0);
    assert_eq!(v.app.mode(), &Mode::Normal);
}

#[test]
fn test_export_json_of_selection() {
    let memory = Rc::new(MemoryHandle::new(Dialect::Postgres).with_rows(
        columns(&["name", "city"]),
        vec![vec![text("Alice"), text("NYC")], vec![text("Bob"), text("LA")]],
    ));
    let mut v = Viewer::open(memory, "SELECT name, city FROM people");

    v.press(KeyCode::Char('v'));
    v.press(KeyCode::Char('G'));
    v.press(KeyCode::Char('$'));
    v.press(KeyCode::Char('y'));
    v.press(KeyCode::Char('j'));

    let copied = v.clipboard.borrow().last().unwrap().to_string();
    let parsed: serde_json::Value = serde_json::from_str(&copied).unwrap();
    assert_eq!(
        parsed,
        serde_json::json!([
            {"name": "Alice", "city": "NYC"},
            {"name": "Bob", "city": "LA"}
        ])
    );
    assert_eq!(v.banner(), "Copied 4 cells as JSON to clipboard");
    assert!(!v.app.viewport().is_visual());
}

#[test]
fn test_delete_from_empty_row_is_rejected() {
    let err = build_delete(Dialect::Postgres, "users", &Row { cells: vec![] }).unwrap_err();
    assert_eq!(err, ValidationError::EmptyRow);
}

#[test]
fn test_empty_result_rejects_mutations() {
    let memory = Rc::new(MemoryHandle::new(Dialect::Postgres).with_rows(columns(&["id", "name"]), vec![]));
    let mut v = Viewer::open(memory.clone(), "SELECT * FROM users");

    for code in [KeyCode::Char('j'), KeyCode::Char('G'), KeyCode::Char('$'), KeyCode::PageDown] {
        v.press(code);
        assert_eq!(v.app.viewport().cursor.row, 0);
        assert_eq!(v.app.viewport().cursor.col, 0);
    }
    v.press(KeyCode::Char('e'));
    assert_eq!(v.app.status().unwrap().level, StatusLevel::Error);
    v.press(KeyCode::Char('d'));
    assert_eq!(v.app.mode(), &Mode::Normal);
    v.press(KeyCode::Char('y'));
    assert_eq!(v.app.mode(), &Mode::Normal);
    assert!(memory.executed().is_empty());
    assert!(v.clipboard.borrow().last().is_none());
}

#[test]
fn test_single_cell_grid_edit_and_delete() {
    let memory = Rc::new(MemoryHandle::new(Dialect::Postgres).with_rows(
        columns(&["label"]),
        vec![vec![text("draft")]],
    ));
    let mut v = Viewer::open(memory.clone(), "SELECT label FROM tags");
    v.editor_returns("final");

    v.press(KeyCode::Char('e'));
    assert_eq!(
        memory.executed()[0].sql,
        "UPDATE tags SET label = $1 WHERE label = $2"
    );
    assert_eq!(memory.executed()[0].args, vec![text("final"), text("draft")]);
    assert_eq!(v.cells(), vec![vec!["final"]]);

    v.press(KeyCode::Char('d'));
    v.press(KeyCode::Char('r'));
    v.press(KeyCode::Enter);
    assert_eq!(memory.executed()[1].sql, "DELETE FROM tags WHERE label = $1");
    assert_eq!(memory.executed()[1].args, vec![text("final")]);
    assert_eq!(v.app.grid().row_count(), 0);
    assert!(v.app.viewport().is_empty());
}

#[test]
fn test_all_null_neighbours_update_one_row() {
    let memory = Rc::new(MemoryHandle::new(Dialect::Postgres).with_rows(
        columns(&["id", "a", "b"]),
        vec![vec![text("x"), CellValue::Null, CellValue::Null]],
    ));
    let mut v = Viewer::open(memory.clone(), "SELECT * FROM t");
    v.editor_returns("y");

    v.press(KeyCode::Char('e'));

    assert_eq!(
        memory.executed()[0].sql,
        "UPDATE t SET id = $1 WHERE a IS NULL AND b IS NULL"
    );
    assert_eq!(memory.executed()[0].args, vec![text("y")]);
    assert_eq!(v.banner(), "Updated successfully");
    assert_eq!(v.cells(), vec![vec!["y", "NULL", "NULL"]]);
}

#[test]
fn test_wide_rows_scroll_to_last_column() {
    let names: Vec<String> = (0..30).map(|i| format!("column_{:02}", i)).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let values = vec![(0..30).map(|i| text(&format!("value_{:02}", i))).collect()];
    let memory = Rc::new(MemoryHandle::new(Dialect::Postgres).with_rows(columns(&refs), values));
    let mut v = Viewer::open(memory, "SELECT * FROM wide");

    v.press(KeyCode::Char('$'));
    let vp = v.app.viewport();
    assert_eq!(vp.cursor.col, 29);
    assert!(vp.offset_x > 0);
    assert!(vp.col_range().contains(&29));

    v.press(KeyCode::Char('0'));
    assert_eq!(v.app.viewport().offset_x, 0);
}

#[test]
fn test_clear_cell_through_delete_mode() {
    let memory = users(Dialect::Sqlite);
    let mut v = Viewer::open(memory.clone(), "SELECT * FROM users");

    v.press(KeyCode::Char('j'));
    v.press(KeyCode::Char('$'));
    v.press(KeyCode::Char('d'));
    v.press(KeyCode::Char('r'));
    v.press(KeyCode::Char('c'));
    v.press(KeyCode::Enter);

    assert_eq!(
        memory.executed()[0].sql,
        "UPDATE users SET email = NULL WHERE id = ? AND name = ?"
    );
    assert_eq!(v.cells()[1], vec!["2", "Bob", "NULL"]);
    assert_eq!(v.banner(), "Cleared cell");
}

#[test]
fn test_escape_and_ctrl_c_leave_delete_mode() {
    let memory = users(Dialect::Postgres);
    let mut v = Viewer::open(memory.clone(), "SELECT * FROM users");

    v.press(KeyCode::Char('d'));
    v.press(KeyCode::Esc);
    assert_eq!(v.app.mode(), &Mode::Normal);

    v.press(KeyCode::Char('d'));
    v.press_ctrl('c');
    assert_eq!(v.app.mode(), &Mode::Normal);
    assert!(memory.executed().is_empty());
}

#[test]
fn test_side_effect_command_refreshes_view() {
    let memory = users(Dialect::Postgres);
    let mut v = Viewer::open(memory.clone(), "SELECT * FROM users");
    memory.push_rows(
        columns(&["id", "name", "email"]),
        vec![vec![CellValue::Integer(2), text("Bob"), text("b@x")]],
    );

    v.prompt("delete where id = 1");

    assert_eq!(memory.executed()[0].sql, "delete FROM users where id = 1");
    assert_eq!(memory.statements().last().unwrap().sql, "SELECT * FROM users");
    assert_eq!(v.app.grid().row_count(), 1);
    assert_eq!(v.app.status().unwrap().level, StatusLevel::Success);
}

#[test]
fn test_failed_command_keeps_grid() {
    let memory = users(Dialect::Postgres);
    let mut v = Viewer::open(memory.clone(), "SELECT * FROM users");
    let before = v.cells();
    memory.fail_next("relation \"nope\" does not exist");

    v.prompt("select * from nope");

    assert_eq!(v.app.status().unwrap().level, StatusLevel::Error);
    assert!(v.banner().contains("does not exist"));
    assert_eq!(v.cells(), before);
    assert_eq!(v.app.mode(), &Mode::Normal);
}

#[test]
fn test_blank_prompt_is_silent() {
    let memory = users(Dialect::Postgres);
    let mut v = Viewer::open(memory.clone(), "SELECT * FROM users");
    v.prompt("   ");
    assert!(v.commands.borrow().is_empty());
    assert!(v.app.status().is_none());
    assert_eq!(v.app.mode(), &Mode::Normal);
}

#[test]
fn test_prompt_escape_cancels() {
    let memory = users(Dialect::Postgres);
    let mut v = Viewer::open(memory, "SELECT * FROM users");
    v.press(KeyCode::Char(';'));
    v.type_text("select");
    assert!(matches!(v.app.mode(), Mode::Prompt(_)));
    v.press(KeyCode::Esc);
    assert_eq!(v.app.mode(), &Mode::Normal);
    assert!(v.commands.borrow().is_empty());
}

#[test]
fn test_copy_failure_is_reported() {
    let memory = users(Dialect::Postgres);
    let mut v = Viewer::open(memory, "SELECT * FROM users");
    *v.clipboard.borrow_mut() = querybook::clipboard::MemoryClipboard::failing("no display");

    v.press(KeyCode::Char('y'));
    v.press(KeyCode::Char('c'));

    assert_eq!(v.app.status().unwrap().level, StatusLevel::Error);
    assert!(v.banner().contains("no display"));
}

#[test]
fn test_sql_export_needs_table() {
    let memory = Rc::new(MemoryHandle::new(Dialect::Postgres).with_rows(
        columns(&["n"]),
        vec![vec![CellValue::Integer(1)]],
    ));
    let mut v = Viewer::open(memory, "SELECT 1 AS n");
    assert!(!v.app.grid().is_mutable());

    v.press(KeyCode::Char('y'));
    v.press(KeyCode::Char('s'));
    assert_eq!(v.app.status().unwrap().level, StatusLevel::Error);

    v.press(KeyCode::Char('y'));
    v.press(KeyCode::Char('t'));
    assert_eq!(v.clipboard.borrow().last(), Some("n\n1\n"));
}
