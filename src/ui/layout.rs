//! Grid geometry
//!
//! Column widths and the greedy visible-column computation shared by the
//! viewport and the renderer.

use crate::grid::ResultGrid;
use unicode_width::UnicodeWidthChar;

/// Drawn between adjacent columns
pub const SEPARATOR: &str = " │ ";

/// Display width of [`SEPARATOR`]
pub const SEPARATOR_WIDTH: usize = 3;

/// Lines that are not data rows: title, header, footer, status/prompt
pub const CHROME_LINES: u16 = 4;

/// Per-column width: the widest of header and cells, capped at `cap`, never 0
pub fn column_widths(grid: &ResultGrid, cap: usize) -> Vec<usize> {
    let cap = cap.max(1);
    grid.columns
        .iter()
        .enumerate()
        .map(|(c, column)| {
            let widest_cell = grid
                .rows
                .iter()
                .filter_map(|r| r.cell(c))
                .map(|cell| text_width(&cell.display_value))
                .max()
                .unwrap_or(0);
            text_width(&column.name).max(widest_cell).clamp(1, cap)
        })
        .collect()
}

/// Rendered width of a value on one line (control characters count as one)
pub fn text_width(s: &str) -> usize {
    s.chars().map(|c| c.width().unwrap_or(1)).sum()
}

/// How many columns starting at `offset` fit in `available` cells.
///
/// Each column after the first also pays for a separator. At least one
/// column is always visible when any remain.
pub fn visible_columns(widths: &[usize], offset: usize, available: usize) -> usize {
    let mut used = 0;
    let mut count = 0;
    for &w in widths.iter().skip(offset) {
        let need = if count == 0 { w } else { w + SEPARATOR_WIDTH };
        if count > 0 && used + need > available {
            break;
        }
        used += need;
        count += 1;
    }
    count
}

/// Data rows that fit in a terminal of `height` lines
pub fn visible_rows(height: u16) -> usize {
    height.saturating_sub(CHROME_LINES).max(1) as usize
}
