//! Terminal UI components
//!
//! All UI widgets and rendering logic using ratatui. State lives in
//! [`crate::app::Controller`]; everything here is a pure function of it.

pub mod command_bar;
pub mod layout;
pub mod render;
pub mod results;
pub mod theme;
pub mod viewport;

pub use render::render;
