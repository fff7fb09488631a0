//! querybook - a keyboard-driven viewer and editor for SQL query results
//!
//! querybook runs a saved (or ad-hoc) query, shows the rows in a full-screen
//! grid and lets you edit cells, delete rows, copy selections in several
//! formats and run follow-up commands without leaving the terminal.
//!
//! # Architecture
//!
//! - [`config`]: the TOML file with settings, connections and saved queries
//! - [`db`]: the blocking [`db::DatabaseHandle`] port, dialects and drivers
//! - [`grid`]: materialized query results
//! - [`sql`]: prompt expansion, mutation synthesis, display rendering
//! - [`mutation`]: cell edits, clears and row deletes against the grid's table
//! - [`export`]: CSV/TSV/JSON/Markdown/HTML/SQL serialization of a selection
//! - [`commands`]: the `;` prompt and `-e` dispatcher
//! - [`app`]: the controller state machine
//! - [`ui`]: viewport, layout and rendering
//! - [`error`]: error types and result aliases
//!
//! # Example
//!
//! ```no_run
//! use querybook::config::ConnectionConfig;
//! use querybook::db;
//! use querybook::grid::{GridQuery, ResultGrid};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConnectionConfig::from_url("sqlite://notes.db")?;
//! let handle = db::connect(&config.endpoint()?)?;
//! let grid = ResultGrid::load(&handle, GridQuery::new("SELECT * FROM notes").with_limit(100))?;
//! println!("{} rows from {}", grid.row_count(), grid.table_name);
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod clipboard;
pub mod commands;
pub mod config;
pub mod db;
pub mod editor;
pub mod error;
pub mod export;
pub mod grid;
pub mod keymap;
pub mod logging;
pub mod mutation;
pub mod sql;
pub mod terminal;
pub mod ui;

pub use error::{CommandError, ConfigError, DbError, EditError, QuerybookError, Result};
