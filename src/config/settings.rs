//! User settings and preferences
//!
//! The `[settings]` table of `~/.querybook/config.toml`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Absolute upper bound for `max_cell_width`
pub const CELL_WIDTH_CEILING: usize = 120;

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Row cap added to row-producing queries (0 disables)
    #[serde(default = "default_row_limit")]
    pub row_limit: usize,

    /// Widest a grid column may render before truncation
    #[serde(default = "default_max_cell_width")]
    pub max_cell_width: usize,

    /// How long status banners stay up
    #[serde(default = "default_status_timeout_ms")]
    pub status_timeout_ms: u64,

    /// Columns kept free at the right edge of the grid
    #[serde(default = "default_horizontal_padding")]
    pub horizontal_padding: usize,

    /// Re-run the current query on this interval; off when unset or 0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_refresh_secs: Option<u64>,

    /// Event poll interval
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,
}

fn default_row_limit() -> usize {
    1000
}

fn default_max_cell_width() -> usize {
    40
}

fn default_status_timeout_ms() -> u64 {
    2000
}

fn default_horizontal_padding() -> usize {
    2
}

fn default_tick_rate_ms() -> u64 {
    100
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            row_limit: default_row_limit(),
            max_cell_width: default_max_cell_width(),
            status_timeout_ms: default_status_timeout_ms(),
            horizontal_padding: default_horizontal_padding(),
            auto_refresh_secs: None,
            tick_rate_ms: default_tick_rate_ms(),
        }
    }
}

impl Settings {
    /// Column width cap, clamped to `1..=CELL_WIDTH_CEILING`
    pub fn cell_width_cap(&self) -> usize {
        self.max_cell_width.clamp(1, CELL_WIDTH_CEILING)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.status_timeout_ms)
    }

    pub fn auto_refresh(&self) -> Option<Duration> {
        self.auto_refresh_secs
            .filter(|&s| s > 0)
            .map(Duration::from_secs)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(10))
    }
}
