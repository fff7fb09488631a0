//! Shorthand SQL expansion
//!
//! Fills in the current table for statements typed at the prompt:
//!
//! | typed                   | becomes                          |
//! |-------------------------|----------------------------------|
//! | `select * where id=5`   | `select * FROM t where id=5`     |
//! | `update set a=1`        | `update t set a=1`               |
//! | `delete where id=5`     | `delete FROM t where id=5`       |
//! | `insert (a) values (1)` | `insert INTO t (a) values (1)`   |
//!
//! Anything that already has its anchor keyword is returned unchanged, so
//! expanding twice is the same as expanding once.

use crate::sql::keywords::{self, Word};

/// Clauses a missing `FROM` goes in front of
const FROM_FOLLOWERS: [&str; 6] = ["WHERE", "ORDER", "GROUP", "LIMIT", "HAVING", "UNION"];

/// Expand `sql` against `table`. An empty table leaves `sql` untouched.
pub fn expand(sql: &str, table: &str) -> String {
    let table = table.trim();
    if table.is_empty() {
        return sql.to_string();
    }
    let words = keywords::words(sql);
    let Some(first) = words.first() else {
        return sql.to_string();
    };
    let has = |kw: &str| words.iter().any(|w| w.is(kw));

    if first.is("SELECT") && !has("FROM") {
        return insert_from(sql, &words, table);
    }
    if first.is("UPDATE") && words.get(1).is_some_and(|w| w.is("SET")) {
        return format!("{} {} {}", &sql[..first.end], table, &sql[words[1].start..]);
    }
    if first.is("DELETE") && !has("FROM") {
        return insert_after(sql, first, "FROM", table);
    }
    if first.is("INSERT") && !has("INTO") {
        return insert_after(sql, first, "INTO", table);
    }
    sql.to_string()
}

fn insert_from(sql: &str, words: &[Word<'_>], table: &str) -> String {
    let anchor = words
        .iter()
        .skip(1)
        .find(|w| FROM_FOLLOWERS.iter().any(|k| w.is(k)));
    match anchor {
        Some(w) => {
            let (head, tail) = sql.split_at(w.start);
            format!("{} FROM {} {}", head.trim_end(), table, tail)
        }
        None => {
            let stmt = keywords::trim_statement(sql);
            format!("{} FROM {}{}", stmt, table, &sql[stmt.len()..])
        }
    }
}

fn insert_after(sql: &str, word: &Word<'_>, keyword: &str, table: &str) -> String {
    let rest = sql[word.end..].trim_start();
    if rest.is_empty() {
        format!("{} {} {}", &sql[..word.end], keyword, table)
    } else {
        format!("{} {} {} {}", &sql[..word.end], keyword, table, rest)
    }
}
