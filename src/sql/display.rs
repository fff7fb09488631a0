//! Placeholder scanning and display SQL
//!
//! Executed statements always carry their values out of band. For status
//! lines the placeholders are swapped for literals so the user can read
//! what ran.

use crate::db::{CellValue, Dialect};

/// A placeholder occurrence in SQL text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder {
    pub start: usize,
    pub end: usize,
    /// 1-based argument index
    pub index: usize,
}

/// Find every placeholder of `dialect` outside literals, quoted identifiers
/// and comments. Bare `?` placeholders are numbered in order of appearance;
/// `?NNN` carries its own number.
pub fn placeholders(sql: &str, dialect: Dialect) -> Vec<Placeholder> {
    let bytes = sql.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    let mut sequential = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'\'' | b'"' | b'`' => i = skip_past(bytes, i + 1, b),
            b'[' if dialect == Dialect::SqlServer => i = skip_past(bytes, i + 1, b']'),
            b'-' if bytes.get(i + 1) == Some(&b'-') => i = skip_past(bytes, i + 2, b'\n'),
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = sql[i + 2..].find("*/").map_or(bytes.len(), |p| i + 2 + p + 2);
            }
            b'?' if !dialect.numbered_placeholders() => {
                let digits = bytes[i + 1..].iter().take_while(|c| c.is_ascii_digit()).count();
                let end = i + 1 + digits;
                // `?NNN` names its argument; a bare `?` takes the next one
                let index = match sql[i + 1..end].parse::<usize>() {
                    Ok(n) => {
                        sequential = sequential.max(n);
                        n
                    }
                    Err(_) => {
                        sequential += 1;
                        sequential
                    }
                };
                found.push(Placeholder { start: i, end, index });
                i = end;
            }
            _ => {
                let prefix: &[u8] = match dialect {
                    Dialect::Postgres => b"$",
                    Dialect::Oracle => b":",
                    Dialect::SqlServer => b"@p",
                    _ => b"",
                };
                let digits_at = i + prefix.len();
                let preceded_by_word = i > 0 && is_word_byte(bytes[i - 1]);
                if !prefix.is_empty()
                    && !preceded_by_word
                    && bytes[i..].starts_with(prefix)
                    && bytes.get(digits_at).is_some_and(u8::is_ascii_digit)
                {
                    let end = bytes[digits_at..]
                        .iter()
                        .position(|c| !c.is_ascii_digit())
                        .map_or(bytes.len(), |p| digits_at + p);
                    if let Ok(index) = sql[digits_at..end].parse() {
                        found.push(Placeholder { start: i, end, index });
                    }
                    i = end;
                } else {
                    i += 1;
                }
            }
        }
    }
    found
}

fn skip_past(bytes: &[u8], from: usize, close: u8) -> usize {
    bytes[from.min(bytes.len())..]
        .iter()
        .position(|&c| c == close)
        .map_or(bytes.len(), |p| from + p + 1)
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b':'
}

/// Substitute placeholders with SQL literals. Never execute the result.
pub fn render_display(sql: &str, args: &[CellValue], dialect: Dialect) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut last = 0;
    for ph in placeholders(sql, dialect) {
        let Some(value) = ph.index.checked_sub(1).and_then(|i| args.get(i)) else {
            continue;
        };
        out.push_str(&sql[last..ph.start]);
        out.push_str(&value.sql_literal());
        last = ph.end;
    }
    out.push_str(&sql[last..]);
    out
}
