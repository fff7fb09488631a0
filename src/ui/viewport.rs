//! Viewport over a result grid
//!
//! Cursor, visual selection and scroll offsets. Every update consumes the
//! old state and returns a new one; nothing here touches the grid itself.

use crate::ui::layout::{self, visible_columns};
use std::ops::RangeInclusive;

/// A cell coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Cursor movements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Up,
    Down,
    Left,
    Right,
    FirstRow,
    LastRow,
    FirstColumn,
    LastColumn,
    PageUp,
    PageDown,
}

/// Rectangle covered by the current selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRect {
    pub rows: RangeInclusive<usize>,
    pub cols: RangeInclusive<usize>,
}

impl SelectionRect {
    pub fn cell_count(&self) -> usize {
        self.rows.clone().count() * self.cols.clone().count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    pub cursor: Position,
    /// Visual-mode anchor; `Some` while visual mode is active
    pub anchor: Option<Position>,
    pub offset_x: usize,
    pub offset_y: usize,
    pub visible_rows: usize,
    pub visible_cols: usize,
    widths: Vec<usize>,
    row_count: usize,
    /// Terminal width minus horizontal padding
    available_width: usize,
}

impl Viewport {
    pub fn new(widths: Vec<usize>, row_count: usize, width: u16, height: u16, padding: usize) -> Self {
        Self {
            cursor: Position::default(),
            anchor: None,
            offset_x: 0,
            offset_y: 0,
            visible_rows: layout::visible_rows(height),
            visible_cols: 0,
            widths,
            row_count,
            available_width: (width as usize).saturating_sub(padding),
        }
        .scrolled()
    }

    /// Column widths the viewport was computed with
    pub fn widths(&self) -> &[usize] {
        &self.widths
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0 || self.widths.is_empty()
    }

    pub fn is_visual(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn available_width(&self) -> usize {
        self.available_width
    }

    /// Apply a cursor movement. Empty grids never move.
    pub fn moved(mut self, motion: Motion) -> Self {
        if self.is_empty() {
            return self;
        }
        let last_row = self.row_count - 1;
        let last_col = self.widths.len() - 1;
        let page = self.visible_rows.max(1);
        let Position { row, col } = self.cursor;

        self.cursor = match motion {
            Motion::Up => Position::new(row.saturating_sub(1), col),
            Motion::Down => Position::new((row + 1).min(last_row), col),
            Motion::Left => Position::new(row, col.saturating_sub(1)),
            Motion::Right => Position::new(row, (col + 1).min(last_col)),
            Motion::FirstRow => Position::new(0, col),
            Motion::LastRow => Position::new(last_row, col),
            Motion::FirstColumn => Position::new(row, 0),
            Motion::LastColumn => Position::new(row, last_col),
            Motion::PageUp => Position::new(row.saturating_sub(page), col),
            Motion::PageDown => Position::new((row + page).min(last_row), col),
        };
        self.scrolled()
    }

    /// Enter visual mode anchored at the cursor, or leave it
    pub fn toggled_visual(mut self) -> Self {
        self.anchor = match self.anchor {
            Some(_) => None,
            None if self.is_empty() => None,
            None => Some(self.cursor),
        };
        self
    }

    pub fn without_visual(mut self) -> Self {
        self.anchor = None;
        self
    }

    /// Recompute for a new terminal size
    pub fn resized(mut self, width: u16, height: u16, padding: usize) -> Self {
        self.visible_rows = layout::visible_rows(height);
        self.available_width = (width as usize).saturating_sub(padding);
        self.scrolled()
    }

    /// Recompute after the grid changed shape, clamping the cursor
    pub fn with_grid(mut self, widths: Vec<usize>, row_count: usize) -> Self {
        self.widths = widths;
        self.row_count = row_count;
        if self.is_empty() {
            self.cursor = Position::default();
            self.anchor = None;
            self.offset_x = 0;
            self.offset_y = 0;
        } else {
            self.cursor.row = self.cursor.row.min(row_count - 1);
            self.cursor.col = self.cursor.col.min(self.widths.len() - 1);
            self.anchor = self.anchor.map(|a| {
                Position::new(a.row.min(row_count - 1), a.col.min(self.widths.len() - 1))
            });
        }
        self.scrolled()
    }

    /// Selected rectangle: anchor to cursor in visual mode, else the cursor cell
    pub fn selection(&self) -> Option<SelectionRect> {
        if self.is_empty() {
            return None;
        }
        let a = self.anchor.unwrap_or(self.cursor);
        let c = self.cursor;
        Some(SelectionRect {
            rows: a.row.min(c.row)..=a.row.max(c.row),
            cols: a.col.min(c.col)..=a.col.max(c.col),
        })
    }

    pub fn is_selected(&self, row: usize, col: usize) -> bool {
        self.selection()
            .is_some_and(|s| s.rows.contains(&row) && s.cols.contains(&col))
    }

    /// Data rows on screen, as grid indices
    pub fn row_range(&self) -> std::ops::Range<usize> {
        self.offset_y..(self.offset_y + self.visible_rows).min(self.row_count)
    }

    /// Columns on screen, as grid indices
    pub fn col_range(&self) -> std::ops::Range<usize> {
        self.offset_x..(self.offset_x + self.visible_cols).min(self.widths.len())
    }

    /// Move offsets only as far as needed to keep the cursor on screen
    fn scrolled(mut self) -> Self {
        let Position { row, col } = self.cursor;
        let rows = self.visible_rows.max(1);
        if row < self.offset_y {
            self.offset_y = row;
        } else if row >= self.offset_y + rows {
            self.offset_y = row + 1 - rows;
        }
        self.offset_y = self.offset_y.min(self.row_count.saturating_sub(1));

        if col < self.offset_x {
            self.offset_x = col;
        }
        self.offset_x = self.offset_x.min(self.widths.len().saturating_sub(1));
        loop {
            self.visible_cols = visible_columns(&self.widths, self.offset_x, self.available_width);
            if col < self.offset_x + self.visible_cols || self.offset_x >= col {
                break;
            }
            self.offset_x += 1;
        }
        self
    }
}
