//! Command-line parsing
//!
//! Turns a prompt line into a [`CommandLine`]. Lines that start with a SQL
//! keyword are treated as `run <sql>`; `run` and `query` arguments are
//! expanded against the current table.

use crate::sql::{expand, keywords};
use std::fmt;

/// First words that make a line plain SQL
pub const SQL_KEYWORDS: [&str; 9] = [
    "SELECT", "INSERT", "UPDATE", "DELETE", "WITH", "EXPLAIN", "DESCRIBE", "SHOW", "PRAGMA",
];

/// A sub-command and the rest of its line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Lower-cased sub-command name
    pub name: String,
    /// Everything after the name, trimmed
    pub rest: String,
}

impl CommandLine {
    pub fn new(name: impl Into<String>, rest: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rest: rest.into(),
        }
    }

    /// Whitespace-separated arguments
    pub fn args(&self) -> Vec<&str> {
        self.rest.split_whitespace().collect()
    }

    /// `UPDATE` or `DELETE` with no `WHERE`: affects every row
    pub fn is_unfiltered_mutation(&self) -> bool {
        if self.name != "run" {
            return false;
        }
        let words = keywords::words(&self.rest);
        let mutation = words
            .first()
            .is_some_and(|w| w.is("UPDATE") || w.is("DELETE"));
        mutation && !words.iter().any(|w| w.is("WHERE"))
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rest.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{} {}", self.name, self.rest)
        }
    }
}

/// Parse a prompt line. `None` for a blank line.
///
/// `table` is the current grid's table; empty disables expansion.
pub fn parse_command(input: &str, table: &str) -> Option<CommandLine> {
    let input = input.trim();
    let first = input.split_whitespace().next()?;

    let mut command = if SQL_KEYWORDS.iter().any(|k| first.eq_ignore_ascii_case(k)) {
        CommandLine::new("run", input)
    } else {
        CommandLine::new(first.to_lowercase(), input[first.len()..].trim())
    };
    if !table.is_empty() && matches!(command.name.as_str(), "run" | "query") {
        command.rest = expand(&command.rest, table);
    }
    Some(command)
}
