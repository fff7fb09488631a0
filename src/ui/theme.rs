//! UI theme and styling
//!
//! Defines colors, styles, and visual appearance of the grid viewer.

use crate::app::StatusLevel;
use ratatui::style::{Color, Modifier, Style};

/// Application theme
#[derive(Debug, Clone)]
pub struct Theme {
    // Last executed SQL
    pub title: Style,

    // Results table
    pub results_header: Style,
    pub results_separator: Style,
    pub results_row_even: Style,
    pub results_row_odd: Style,
    pub results_selected: Style,
    pub results_visual: Style,
    pub results_null: Style,
    pub results_empty: Style,
    pub results_footer: Style,

    // Prompt and mode line
    pub command_prompt: Style,
    pub command_input: Style,
    pub mode_line: Style,
    pub mode_danger: Style,

    // Status messages
    pub status_success: Style,
    pub status_error: Style,
    pub status_info: Style,
    pub status_warning: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            title: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::DIM),

            // Results table
            results_header: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            results_separator: Style::default().fg(Color::DarkGray),
            results_row_even: Style::default().fg(Color::White),
            results_row_odd: Style::default().fg(Color::Gray),
            results_selected: Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow),
            results_visual: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan),
            results_null: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            results_empty: Style::default().fg(Color::DarkGray),
            results_footer: Style::default().fg(Color::DarkGray),

            // Prompt and mode line
            command_prompt: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            command_input: Style::default().fg(Color::White),
            mode_line: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            mode_danger: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),

            // Status messages
            status_success: Style::default().fg(Color::Green),
            status_error: Style::default().fg(Color::Red),
            status_info: Style::default().fg(Color::Blue),
            status_warning: Style::default().fg(Color::Yellow),
        }
    }
}

impl Theme {
    /// Banner style for a severity
    pub fn status_style(&self, level: StatusLevel) -> Style {
        match level {
            StatusLevel::Info => self.status_info,
            StatusLevel::Success => self.status_success,
            StatusLevel::Warning => self.status_warning,
            StatusLevel::Error => self.status_error,
        }
    }
}
