//! Top-level render function
//!
//! The viewer is a single full-screen pane; `GridView` lays out the lines.

use crate::app::Controller;
use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph};

/// Render the entire application
pub fn render(frame: &mut Frame, controller: &Controller) {
    let area = frame.area();
    let lines = controller.view().lines(area.width);
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines), area);
}
