//! SQL utilities
//!
//! Keyword sniffing, shorthand expansion, single-table detection, mutation
//! synthesis and display rendering. None of this parses SQL properly; it
//! works on words and stays conservative when unsure.

pub mod display;
pub mod expand;
pub mod formatter;
pub mod keywords;
pub mod synth;
pub mod table;

pub use display::render_display;
pub use expand::expand;
pub use formatter::format_sql;
pub use synth::{Statement, Syntax, build_delete, build_update, validate};
pub use table::single_table;
