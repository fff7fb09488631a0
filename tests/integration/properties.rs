//! Invariants checked over a spread of hand-picked inputs

use crate::common::{Viewer, columns, text};
use crossterm::event::KeyCode;
use querybook::db::memory::MemoryHandle;
use querybook::db::{CellValue, Dialect};
use querybook::grid::Row;
use querybook::sql::display::placeholders;
use querybook::sql::{build_delete, build_update, expand, keywords};
use std::rc::Rc;

const DIALECTS: [Dialect; 7] = [
    Dialect::Postgres,
    Dialect::MySql,
    Dialect::Sqlite,
    Dialect::SqlServer,
    Dialect::Oracle,
    Dialect::ClickHouse,
    Dialect::Firebird,
];

fn sample_rows() -> Vec<Row> {
    let cols = columns(&["id", "name", "note", "weird column", "flag"]);
    let values = vec![
        vec![
            CellValue::Integer(1),
            text("Alice"),
            CellValue::Null,
            text("it's"),
            CellValue::Boolean(true),
        ],
        vec![
            CellValue::Null,
            CellValue::Null,
            CellValue::Null,
            CellValue::Null,
            CellValue::Null,
        ],
        vec![
            CellValue::Integer(3),
            text("$1 ? :1 @p1"),
            text("x"),
            text("y"),
            CellValue::Boolean(false),
        ],
    ];
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| Row::from_values(&cols, i, v))
        .collect()
}

/// Number of top-level predicates in the WHERE clause
fn predicate_count(sql: &str) -> usize {
    let where_at = keywords::words(sql)
        .into_iter()
        .find(|w| w.is("WHERE"))
        .map(|w| w.end)
        .unwrap();
    sql[where_at..].split(" AND ").count()
}

#[test]
fn test_placeholders_match_arguments() {
    for dialect in DIALECTS {
        for row in sample_rows() {
            let mut statements = vec![build_delete(dialect, "t", &row).unwrap()];
            for target in 0..row.cells.len() {
                statements.push(build_update(dialect, "t", target, "new", &row).unwrap());
                statements.push(build_update(dialect, "t", target, "", &row).unwrap());
            }
            for stmt in statements {
                let found = placeholders(&stmt.sql, dialect);
                assert_eq!(found.len(), stmt.args.len(), "{:?}: {}", dialect, stmt.sql);
                let mut indices: Vec<usize> = found.iter().map(|p| p.index).collect();
                indices.sort_unstable();
                let expected: Vec<usize> = (1..=stmt.args.len()).collect();
                assert_eq!(indices, expected, "{:?}: {}", dialect, stmt.sql);
            }
        }
    }
}

#[test]
fn test_row_filter_has_one_predicate_per_other_column() {
    for dialect in DIALECTS {
        for row in sample_rows() {
            let width = row.cells.len();
            let delete = build_delete(dialect, "t", &row).unwrap();
            assert_eq!(predicate_count(&delete.sql), width, "{}", delete.sql);
            for target in 0..width {
                let update = build_update(dialect, "t", target, "v", &row).unwrap();
                assert_eq!(predicate_count(&update.sql), width - 1, "{}", update.sql);
                let target_name = dialect.quote_identifier(&row.cells[target].column_name);
                let where_at = update.sql.find(" WHERE ").unwrap();
                let filter = &update.sql[where_at..];
                assert!(
                    !filter.contains(&format!(" {} = ", target_name))
                        && !filter.contains(&format!(" {} IS NULL", target_name)),
                    "{}",
                    update.sql
                );
            }
        }
    }
}

fn three_rows(memory_dialect: Dialect) -> Rc<MemoryHandle> {
    Rc::new(MemoryHandle::new(memory_dialect).with_rows(
        columns(&["id", "name"]),
        vec![
            vec![CellValue::Integer(1), text("a")],
            vec![CellValue::Integer(2), text("b")],
            vec![CellValue::Integer(3), text("c")],
        ],
    ))
}

#[test]
fn test_mutations_only_touch_their_row() {
    for target_row in 0..3 {
        let memory = three_rows(Dialect::Sqlite);
        let mut v = Viewer::open(memory, "SELECT * FROM t");
        for _ in 0..target_row {
            v.press(KeyCode::Char('j'));
        }
        v.press(KeyCode::Char('l'));
        let before = v.cells();

        v.editor_returns("changed");
        v.press(KeyCode::Char('e'));
        let after_edit = v.cells();
        assert_eq!(after_edit.len(), before.len());
        for (i, row) in after_edit.iter().enumerate() {
            if i == target_row {
                assert_eq!(row, &vec![before[i][0].clone(), "changed".to_string()]);
            } else {
                assert_eq!(row, &before[i]);
            }
        }

        v.press(KeyCode::Char('d'));
        v.press(KeyCode::Enter);
        assert_eq!(v.cells().len(), before.len());
        assert_eq!(v.cells()[target_row][1], "NULL");

        v.press(KeyCode::Char('d'));
        v.press(KeyCode::Char('r'));
        v.press(KeyCode::Enter);
        let after_delete = v.cells();
        let mut expected = after_edit.clone();
        expected.remove(target_row);
        for row in &mut expected {
            row.truncate(1);
        }
        let ids: Vec<Vec<String>> = after_delete.iter().map(|r| r[..1].to_vec()).collect();
        assert_eq!(ids, expected);
    }
}

#[test]
fn test_cursor_stays_in_bounds() {
    let keys = [
        KeyCode::Char('j'),
        KeyCode::Char('l'),
        KeyCode::Down,
        KeyCode::Right,
        KeyCode::Char('G'),
        KeyCode::Char('$'),
        KeyCode::PageDown,
        KeyCode::End,
        KeyCode::Char('k'),
        KeyCode::Char('h'),
        KeyCode::Up,
        KeyCode::Left,
        KeyCode::Char('g'),
        KeyCode::Char('0'),
        KeyCode::Char('_'),
        KeyCode::Home,
        KeyCode::PageUp,
    ];
    let memory = three_rows(Dialect::Postgres);
    let mut v = Viewer::open_sized(memory, "SELECT * FROM t", (40, 6));
    // keys.len() is prime, so each stride visits every key in a new order
    for stride in 1..=5 {
        for i in 0..keys.len() {
            let code = keys[(i * stride) % keys.len()];
            v.press(code);
            let cursor = v.app.viewport().cursor;
            assert!(cursor.row < 3, "row {} after {:?}", cursor.row, code);
            assert!(cursor.col < 2, "col {} after {:?}", cursor.col, code);
        }
    }
    v.press_ctrl('d');
    assert!(v.app.viewport().cursor.row < 3);
    v.press_ctrl('u');
    assert_eq!(v.app.viewport().cursor.row, 0);
}

#[test]
fn test_cursor_fixed_on_empty_grid() {
    let memory = Rc::new(MemoryHandle::new(Dialect::Postgres).with_rows(columns(&["a"]), vec![]));
    let mut v = Viewer::open(memory, "SELECT * FROM t");
    for code in [KeyCode::Char('j'), KeyCode::Char('l'), KeyCode::Char('G'), KeyCode::End, KeyCode::PageDown] {
        v.press(code);
        assert_eq!(v.app.viewport().cursor.row, 0);
        assert_eq!(v.app.viewport().cursor.col, 0);
    }
}

/// Read a TSV export back into headers and rows
fn parse_tsv(text: &str) -> (Vec<String>, Vec<Vec<String>>) {
    let mut lines = text.lines().map(|l| l.split('\t').map(str::to_string).collect::<Vec<_>>());
    let headers = lines.next().unwrap_or_default();
    (headers, lines.collect())
}

#[test]
fn test_tsv_copy_reads_back() {
    let memory = Rc::new(MemoryHandle::new(Dialect::Postgres).with_rows(
        columns(&["name", "city"]),
        vec![
            vec![text("Alice"), text("New York")],
            vec![text("Bob"), CellValue::Null],
        ],
    ));
    let mut v = Viewer::open(memory, "SELECT * FROM people");
    v.press(KeyCode::Char('v'));
    v.press(KeyCode::Char('G'));
    v.press(KeyCode::Char('$'));
    v.press(KeyCode::Char('y'));
    v.press(KeyCode::Char('t'));

    let copied = v.clipboard.borrow().last().unwrap().to_string();
    let (headers, rows) = parse_tsv(&copied);
    assert_eq!(headers, vec!["name", "city"]);
    assert_eq!(rows, v.cells());
}

#[test]
fn test_expansion_is_idempotent() {
    let inputs = [
        "select *",
        "select id, name where id = 5",
        "SELECT count(*) GROUP BY kind",
        "select * order by id limit 3",
        "update set a = 1",
        "UPDATE SET a = 'where' WHERE id = 2",
        "delete",
        "delete where id in (1, 2)",
        "insert values (1, 'x')",
        "insert (a, b) values (1, 2)",
        "select * from other where x = 1",
        "with x as (select 1) select * from x",
        "select 'from' as f",
    ];
    for input in inputs {
        let once = expand(input, "orders");
        assert_eq!(expand(&once, "orders"), once, "input: {}", input);
    }
}
