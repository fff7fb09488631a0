//! Error types for querybook
//!
//! This module defines the error hierarchy used throughout the application.
//! We use `thiserror` for library-style errors with clear error chains.
//! Everything except [`QuerybookError`] ends up in a status banner; only the
//! top-level error leaves the viewer loop.

use std::io;

/// Main error type for the querybook application
#[derive(Debug, thiserror::Error)]
pub enum QuerybookError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Terminal/UI errors
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Command parsing errors
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Result grid could not be built
    #[error("{0}")]
    Grid(#[from] GridError),
}

/// Database operation errors
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Failed to establish connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    /// Table metadata lookup failed
    #[error("Metadata lookup failed: {0}")]
    MetadataFailed(String),

    /// Table does not exist (or is not visible to the current user)
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Dialect is known but no live driver is compiled in
    #[error("No driver available for {0}")]
    UnsupportedDriver(String),

    /// Not connected to a database
    #[error("Not connected to database")]
    NotConnected,

    /// Type conversion error
    #[error("Type conversion error: {0}")]
    TypeConversion(String),
}

/// Configuration loading/parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Home directory not found
    #[error("Could not determine home directory")]
    NoHomeDir,

    /// Config file not found
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("Failed to write configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Reading or writing the file failed
    #[error("Configuration I/O failed: {0}")]
    Io(#[from] io::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Connection profile not found
    #[error("Connection profile '{0}' not found")]
    ProfileNotFound(String),

    /// A saved query with this name already exists
    #[error("A saved query named '{0}' already exists")]
    DuplicateQuery(String),

    /// Selector did not match any saved query
    #[error("No saved query matches '{0}'")]
    QueryNotFound(String),
}

/// Command parsing and execution errors
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Unknown command
    #[error("Unknown command: {0}")]
    Unknown(String),

    /// Missing required argument
    #[error("Missing required argument for {0}")]
    MissingArgument(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Command execution failed
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),

    /// Driver error while running a command
    #[error("{0}")]
    Database(#[from] DbError),

    /// Result could not be turned into a grid
    #[error("{0}")]
    Grid(#[from] GridError),

    /// Saved-query library failure
    #[error("{0}")]
    Library(#[from] ConfigError),
}

/// Result grid construction errors
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// Iterating the row cursor failed part-way
    #[error("Failed to materialize results: {0}")]
    FailedToMaterialize(DbError),

    /// The query itself failed
    #[error("{0}")]
    Database(#[from] DbError),

    /// The originating connection is gone
    #[error("Connection is no longer available")]
    HandleDropped,
}

/// Structural problems found in a synthesized mutation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// No cells to build a row filter from
    #[error("Refusing to build a mutation from an empty row")]
    EmptyRow,

    /// Target column is not part of the row
    #[error("Column {0} is not part of the row")]
    TargetNotInRow(usize),

    /// UPDATE without a SET clause
    #[error("UPDATE statement has no SET clause")]
    MissingSet,

    /// UPDATE or DELETE without a WHERE clause
    #[error("Refusing to run a mutation without a WHERE clause")]
    MissingWhere,

    /// ClickHouse mutations must go through ALTER TABLE
    #[error("ClickHouse mutations must use ALTER TABLE")]
    RequiresAlterTable,

    /// Placeholder count does not match argument count
    #[error("Statement has {placeholders} placeholders but {args} arguments")]
    ArgumentMismatch { placeholders: usize, args: usize },
}

/// Cell edit, clear and row delete errors
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    /// Grid is not backed by a single table
    #[error("Editing requires a single-table query")]
    MissingTable,

    /// Database handle has been dropped
    #[error("No live database connection")]
    NoConnection,

    /// Cursor is not on a cell
    #[error("No cell selected")]
    NoCell,

    /// Editor exited without saving
    #[error("Edit cancelled")]
    Cancelled,

    /// Synthesized statement rejected before execution
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Row filter matched zero or several rows
    #[error("Expected 1 row affected but got {affected}; the row may have changed, refresh with r")]
    Concurrency { affected: u64 },

    /// Driver error
    #[error("{0}")]
    Database(#[from] DbError),

    /// External editor could not be run
    #[error("{0}")]
    Editor(#[from] EditorError),
}

/// Clipboard export errors
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// SQL export needs a target table
    #[error("SQL export requires a single-table query")]
    MissingTable,

    /// Nothing to copy
    #[error("Nothing selected")]
    EmptySelection,

    /// Serializing the selection failed
    #[error("Export failed: {0}")]
    Serialize(String),

    /// OS clipboard refused the write
    #[error("{0}")]
    Clipboard(#[from] ClipboardError),
}

/// System clipboard errors
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    /// Clipboard could not be opened at startup
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),

    /// Write was refused
    #[error("Clipboard error: {0}")]
    Write(String),
}

/// External editor errors
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// Temp file handling failed
    #[error("Editor temp file error: {0}")]
    Io(#[from] io::Error),

    /// Editor could not be started
    #[error("Failed to launch editor '{command}': {reason}")]
    Launch { command: String, reason: String },

    /// Editor exited non-zero
    #[error("Editor '{command}' exited with {status}")]
    Failed { command: String, status: String },

    /// Terminal could not be handed over or reacquired
    #[error("Terminal error: {0}")]
    Terminal(String),
}

/// Specialized Result type for querybook operations
pub type Result<T> = std::result::Result<T, QuerybookError>;

/// Specialized Result type for database operations
pub type DbResult<T> = std::result::Result<T, DbError>;

/// Specialized Result type for config operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized Result type for command operations
pub type CommandResult<T> = std::result::Result<T, CommandError>;

/// Specialized Result type for grid construction
pub type GridResult<T> = std::result::Result<T, GridError>;

/// Specialized Result type for cell edits
pub type EditResult<T> = std::result::Result<T, EditError>;
