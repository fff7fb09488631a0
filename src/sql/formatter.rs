//! SQL formatting
//!
//! Formats SQL queries using the sqlformat crate.

use sqlformat::{FormatOptions, Indent, QueryParams, format};

/// Format a SQL query string for editing
///
/// Keywords are upper-cased and clauses put on their own lines.
pub fn format_sql(sql: &str) -> String {
    let options = FormatOptions {
        indent: Indent::Spaces(2),
        uppercase: Some(true),
        lines_between_queries: 1,
        ..Default::default()
    };

    format(sql, &QueryParams::None, &options)
}
