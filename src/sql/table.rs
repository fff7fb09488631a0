//! Source-table detection
//!
//! Best-effort: a grid is editable only when its query plainly reads one
//! table. Joins, table lists and sub-selects make it read-only.

use crate::sql::keywords::{self, Word};

/// Keywords that end a FROM clause
const CLAUSE_END: [&str; 10] = [
    "WHERE", "GROUP", "ORDER", "LIMIT", "HAVING", "UNION", "OFFSET", "FETCH", "WINDOW", "FOR",
];

/// Table read by a simple `SELECT ... FROM <table> ...`, verbatim as written
pub fn single_table(sql: &str) -> Option<String> {
    let scan = keywords::scan(sql);
    let words = &scan.words;
    if !words.first()?.is("SELECT") {
        return None;
    }
    if words.iter().skip(1).any(|w| w.is("SELECT") || w.is("JOIN")) {
        return None;
    }
    let mut froms = words.iter().enumerate().filter(|(_, w)| w.is("FROM"));
    let (from_idx, from) = froms.next()?;
    if from.depth != 0 || froms.next().is_some() {
        return None;
    }

    let clause_end = words[from_idx + 1..]
        .iter()
        .find(|w| w.depth == 0 && CLAUSE_END.iter().any(|k| w.is(k)))
        .map(|w: &Word<'_>| w.start)
        .unwrap_or(keywords::trim_statement(sql).len());
    let clause = sql.get(from.end..clause_end)?;
    if clause.contains(['(', ',']) {
        return None;
    }
    let table = first_token(clause);
    Some(table.trim_end_matches(';').to_string()).filter(|t| !t.is_empty())
}

/// Leading token of `s`, keeping quoted sections (`"Order Items"`) intact
fn first_token(s: &str) -> &str {
    let s = s.trim_start();
    let mut close = None;
    for (i, c) in s.char_indices() {
        match close {
            Some(q) if c == q => close = None,
            Some(_) => {}
            None if c.is_whitespace() => return &s[..i],
            None => {
                close = match c {
                    '"' => Some('"'),
                    '`' => Some('`'),
                    '[' => Some(']'),
                    _ => None,
                }
            }
        }
    }
    s
}
