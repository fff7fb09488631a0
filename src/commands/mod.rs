//! Command parsing and execution
//!
//! One dispatcher serves both the binary's `-e` path and the `;` prompt:
//! a [`CommandExecutor`] takes a parsed [`CommandLine`] and either returns a
//! new grid or runs a side effect.

pub mod handlers;
pub mod parser;

pub use handlers::ShellExecutor;
pub use parser::{CommandLine, SQL_KEYWORDS, parse_command};

use crate::error::CommandResult;
use crate::grid::ResultGrid;

/// What a command may know about the grid it was typed over
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptContext {
    pub table_name: String,
    pub primary_key: String,
    /// SQL that produced the current grid, before the row cap
    pub original_sql: String,
}

impl PromptContext {
    pub fn from_grid(grid: &ResultGrid) -> Self {
        Self {
            table_name: grid.table_name.clone(),
            primary_key: grid.primary_key.clone(),
            original_sql: grid.original_sql().to_string(),
        }
    }
}

pub trait CommandExecutor {
    /// Run `command`. `Some` replaces the current grid; `None` means the
    /// command only had side effects.
    fn execute(
        &mut self,
        command: &CommandLine,
        context: &PromptContext,
    ) -> CommandResult<Option<ResultGrid>>;
}
