//! Result grid renderer
//!
//! Turns grid + viewport + controller state into the lines of one frame:
//!
//! ```text
//! SELECT * FROM users LIMIT 1000             <- last executed SQL
//! id │ name   │ email                        <- header
//! 1  │ Alice  │ a@x                          <- visible rows
//! 0.004s | Row 1/2, Col 1/3 | e edit ... | banner
//! ;select * where id = 5                     <- prompt or mode line
//! ```
//!
//! Nothing here has side effects; `render` in `ui::render` draws the lines.

use crate::app::StatusMessage;
use crate::grid::ResultGrid;
use crate::ui::layout::{SEPARATOR, text_width};
use crate::ui::theme::Theme;
use crate::ui::viewport::Viewport;
use ratatui::prelude::*;
use unicode_truncate::UnicodeTruncateStr;

/// Content of the bottom line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BottomLine<'a> {
    /// Nothing to show
    Empty,
    /// Command bar: text and cursor (in chars)
    Prompt { input: &'a str, cursor: usize },
    /// Mode indicator (`-- VISUAL --`, delete target, confirm question)
    Mode { text: &'a str, danger: bool },
}

/// Everything one frame depends on
pub struct GridView<'a> {
    pub grid: &'a ResultGrid,
    pub viewport: &'a Viewport,
    /// What the user can do from here
    pub hint: &'a str,
    pub status: Option<&'a StatusMessage>,
    pub bottom: BottomLine<'a>,
    pub theme: &'a Theme,
}

impl GridView<'_> {
    /// Lines of a `width` x `height` frame, top to bottom
    pub fn lines(&self, width: u16) -> Vec<Line<'static>> {
        let width = width as usize;
        let theme = self.theme;
        let mut lines = Vec::with_capacity(self.viewport.visible_rows + 4);

        lines.push(Line::from(Span::styled(
            fit(&self.grid.display_sql, width, false),
            theme.title,
        )));

        if self.grid.columns.is_empty() {
            lines.push(Line::from(Span::styled(
                "Statement returned no columns",
                theme.results_empty,
            )));
        } else {
            lines.push(self.header_line());
        }

        let rows = self.viewport.row_range();
        let shown = rows.len();
        for r in rows {
            lines.push(self.data_line(r));
        }
        let mut used = shown;
        if self.grid.rows.is_empty() && !self.grid.columns.is_empty() {
            lines.push(Line::from(Span::styled("(no rows)", theme.results_empty)));
            used += 1;
        }
        let blank = self.viewport.visible_rows.saturating_sub(used);
        lines.extend(std::iter::repeat_n(Line::default(), blank));

        lines.push(self.footer_line(width));
        lines.push(self.bottom_line(width));
        lines
    }

    fn header_line(&self) -> Line<'static> {
        let theme = self.theme;
        let mut spans = Vec::new();
        for (i, c) in self.viewport.col_range().enumerate() {
            if i > 0 {
                spans.push(Span::styled(SEPARATOR, theme.results_separator));
            }
            let name = &self.grid.columns[c].name;
            spans.push(Span::styled(fit(name, self.cell_width(c), true), theme.results_header));
        }
        Line::from(spans)
    }

    fn data_line(&self, r: usize) -> Line<'static> {
        let theme = self.theme;
        let vp = self.viewport;
        let base = if r % 2 == 0 {
            theme.results_row_even
        } else {
            theme.results_row_odd
        };
        let mut spans = Vec::new();
        for (i, c) in vp.col_range().enumerate() {
            if i > 0 {
                spans.push(Span::styled(SEPARATOR, theme.results_separator));
            }
            let Some(cell) = self.grid.cell(r, c) else {
                spans.push(Span::raw(" ".repeat(self.cell_width(c))));
                continue;
            };
            let style = if vp.cursor.row == r && vp.cursor.col == c {
                theme.results_selected
            } else if vp.is_visual() && vp.is_selected(r, c) {
                theme.results_visual
            } else if cell.is_null() {
                theme.results_null
            } else {
                base
            };
            spans.push(Span::styled(fit(&cell.display_value, self.cell_width(c), true), style));
        }
        Line::from(spans)
    }

    /// Width a column renders at; a lone over-wide column is cut to the screen
    fn cell_width(&self, c: usize) -> usize {
        let w = self.viewport.widths().get(c).copied().unwrap_or(1);
        w.min(self.viewport.available_width().max(1))
    }

    fn footer_line(&self, width: usize) -> Line<'static> {
        let text = footer_text(self.grid, self.viewport, self.hint);
        let mut spans = vec![Span::styled(text.clone(), self.theme.results_footer)];
        if let Some(status) = self.status {
            let room = width.saturating_sub(text_width(&text) + 3);
            spans.push(Span::styled(" | ", self.theme.results_footer));
            spans.push(Span::styled(
                fit(&status.message, room, false),
                self.theme.status_style(status.level),
            ));
        }
        Line::from(spans)
    }

    fn bottom_line(&self, width: usize) -> Line<'static> {
        let theme = self.theme;
        match self.bottom {
            BottomLine::Empty => Line::default(),
            BottomLine::Prompt { input, cursor } => {
                let chars: Vec<char> = input.chars().collect();
                let before: String = chars[..cursor.min(chars.len())].iter().collect();
                let at: String = chars.get(cursor).map_or(" ".to_string(), |c| c.to_string());
                let after: String = chars.iter().skip(cursor + 1).collect();
                Line::from(vec![
                    Span::styled(";", theme.command_prompt),
                    Span::styled(sanitize(&before), theme.command_input),
                    Span::styled(sanitize(&at), theme.command_input.add_modifier(Modifier::REVERSED)),
                    Span::styled(sanitize(&after), theme.command_input),
                ])
            }
            BottomLine::Mode { text, danger } => Line::from(Span::styled(
                fit(text, width, false),
                if danger { theme.mode_danger } else { theme.mode_line },
            )),
        }
    }
}

/// `"<elapsed>s | Row r/R, Col c/C | <hint>"`
pub fn footer_text(grid: &ResultGrid, viewport: &Viewport, hint: &str) -> String {
    let (row, col) = if viewport.is_empty() {
        (0, 0)
    } else {
        (viewport.cursor.row + 1, viewport.cursor.col + 1)
    };
    let mut text = format!(
        "{:.3}s | Row {}/{}, Col {}/{}",
        grid.elapsed.as_secs_f64(),
        row,
        grid.row_count(),
        col,
        grid.column_count()
    );
    if !hint.is_empty() {
        text.push_str(" | ");
        text.push_str(hint);
    }
    text
}

/// Control characters would break the one-line-per-row layout
fn sanitize(s: &str) -> String {
    s.chars().map(|c| if c.is_control() { ' ' } else { c }).collect()
}

/// Fit `s` into exactly `width` cells when `pad`, at most `width` otherwise,
/// ending in `…` when cut.
fn fit(s: &str, width: usize, pad: bool) -> String {
    let s = sanitize(s);
    let w = text_width(&s);
    if w <= width {
        return if pad {
            format!("{}{}", s, " ".repeat(width - w))
        } else {
            s
        };
    }
    if width == 0 {
        return String::new();
    }
    let (cut, cut_width) = s.unicode_truncate(width - 1);
    let mut out = format!("{}…", cut);
    if pad {
        out.push_str(&" ".repeat(width - 1 - cut_width));
    }
    out
}
