//! Application state and event handling
//!
//! Central state machine: events come in, state updates, actions go out.
//! The controller owns the grid and its viewport; everything that talks to
//! the outside world (editor, clipboard, command executor) is injected.

use crate::clipboard::Clipboard;
use crate::commands::{CommandExecutor, CommandLine, PromptContext, parse_command};
use crate::config::Settings;
use crate::editor::BlockingEditor;
use crate::error::{CommandError, EditError, EditResult, GridError, QuerybookError, Result};
use crate::export::{self, ExportFormat, Selection};
use crate::grid::ResultGrid;
use crate::keymap::{KeyAction, KeyContext, KeyMap};
use crate::mutation::{CellEditor, Mutation};
use crate::sql::format_sql;
use crate::ui::command_bar::{BarEvent, CommandBar};
use crate::ui::layout::column_widths;
use crate::ui::results::{BottomLine, GridView};
use crate::ui::theme::Theme;
use crate::ui::viewport::{Motion, Viewport};
use crossterm::event::KeyEvent;
use std::time::Instant;

/// What `d` is about to remove
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    Cell,
    Row,
}

/// Controller state; exactly one at a time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Visual,
    Delete { target: DeleteTarget },
    /// Waiting for `y`/Enter before running `action`
    Confirm { action: CommandLine, question: String },
    Prompt(CommandBar),
    /// Waiting for the export format after `y`
    Yank,
}

impl Mode {
    fn key_context(&self) -> KeyContext {
        match self {
            Mode::Normal | Mode::Prompt(_) => KeyContext::Normal,
            Mode::Visual => KeyContext::Visual,
            Mode::Delete { .. } => KeyContext::Delete,
            Mode::Confirm { .. } => KeyContext::Confirm,
            Mode::Yank => KeyContext::Yank,
        }
    }
}

/// Status message with severity level and expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub message: String,
    pub level: StatusLevel,
    pub expires_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Application events from the event loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Keyboard input event
    Key(KeyEvent),
    /// Terminal resized to (width, height)
    Resize(u16, u16),
    /// Timer tick
    Tick(Instant),
}

/// What the event loop should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    /// Leave the viewer and run this SQL instead
    Rerun(String),
}

/// Injected collaborators
pub struct Services {
    pub editor: Box<dyn BlockingEditor>,
    pub clipboard: Box<dyn Clipboard>,
    pub executor: Box<dyn CommandExecutor>,
}

/// Main application state
pub struct Controller {
    grid: ResultGrid,
    viewport: Viewport,
    mode: Mode,
    /// Status message to display
    status: Option<StatusMessage>,
    settings: Settings,
    /// Data-driven keybinding configuration
    keymap: KeyMap,
    /// UI theme (created once, reused every frame)
    pub theme: Theme,
    services: Services,
    /// Terminal (width, height)
    size: (u16, u16),
    last_refresh: Instant,
    /// A child process drew over the screen
    full_redraw: bool,
}

impl Controller {
    pub fn new(grid: ResultGrid, settings: Settings, services: Services, size: (u16, u16)) -> Self {
        let viewport = Viewport::new(
            column_widths(&grid, settings.cell_width_cap()),
            grid.row_count(),
            size.0,
            size.1,
            settings.horizontal_padding,
        );
        Self {
            grid,
            viewport,
            mode: Mode::Normal,
            status: None,
            settings,
            keymap: KeyMap::default(),
            theme: Theme::default(),
            services,
            size,
            last_refresh: Instant::now(),
            full_redraw: false,
        }
    }

    pub fn grid(&self) -> &ResultGrid {
        &self.grid
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// Whether the whole screen must be repainted; resets the flag
    pub fn take_full_redraw(&mut self) -> bool {
        std::mem::take(&mut self.full_redraw)
    }

    /// Handle an application event and return resulting action
    ///
    /// # Errors
    /// Only fatal conditions: a grid that breaks while being materialized
    pub fn handle_event(&mut self, event: AppEvent) -> Result<Action> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Resize(width, height) => {
                self.size = (width, height);
                self.viewport = self
                    .viewport
                    .clone()
                    .resized(width, height, self.settings.horizontal_padding);
                Ok(Action::None)
            }
            AppEvent::Tick(now) => self.tick(now),
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>, level: StatusLevel) {
        self.status = Some(StatusMessage {
            message: message.into(),
            level,
            expires_at: Instant::now() + self.settings.status_timeout(),
        });
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<Action> {
        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        if let Mode::Prompt(mut bar) = mode {
            return match bar.handle_key(key) {
                BarEvent::Submit(line) => self.submit_prompt(&line),
                BarEvent::Cancel => Ok(Action::None),
                BarEvent::Edited | BarEvent::Ignored => {
                    self.mode = Mode::Prompt(bar);
                    Ok(Action::None)
                }
            };
        }

        let action = self.keymap.resolve(mode.key_context(), key);
        match mode {
            Mode::Normal => self.normal_key(action),
            Mode::Visual => self.visual_key(action),
            Mode::Delete { target } => self.delete_key(target, action),
            Mode::Confirm { action: pending, .. } => self.confirm_key(&pending, action),
            Mode::Yank => Ok(self.yank_key(action)),
            Mode::Prompt(_) => Ok(Action::None),
        }
    }

    fn normal_key(&mut self, action: Option<KeyAction>) -> Result<Action> {
        let Some(action) = action else {
            return Ok(Action::None);
        };
        if let Some(motion) = motion(action) {
            self.move_cursor(motion);
            return Ok(Action::None);
        }
        match action {
            KeyAction::Quit => return Ok(Action::Quit),
            KeyAction::ToggleVisual if !self.viewport.is_empty() => {
                self.viewport = self.viewport.clone().toggled_visual();
                self.mode = Mode::Visual;
            }
            KeyAction::Yank => self.start_yank(),
            KeyAction::EditCell => self.edit_cell(),
            KeyAction::EnterDelete => {
                if let Err(e) = self.check_mutable() {
                    self.set_status(e.to_string(), StatusLevel::Error);
                } else {
                    self.mode = Mode::Delete {
                        target: DeleteTarget::Cell,
                    };
                }
            }
            KeyAction::OpenPrompt => self.mode = Mode::Prompt(CommandBar::new()),
            KeyAction::Refresh => {
                if self.refresh()? {
                    let n = self.grid.row_count();
                    self.set_status(format!("Refreshed {} rows", n), StatusLevel::Info);
                }
            }
            KeyAction::EditAndRerun => return Ok(self.edit_and_rerun()),
            _ => {}
        }
        Ok(Action::None)
    }

    fn visual_key(&mut self, action: Option<KeyAction>) -> Result<Action> {
        self.mode = Mode::Visual;
        let Some(action) = action else {
            return Ok(Action::None);
        };
        if let Some(motion) = motion(action) {
            self.move_cursor(motion);
            return Ok(Action::None);
        }
        match action {
            KeyAction::Quit => return Ok(Action::Quit),
            KeyAction::ToggleVisual | KeyAction::Dismiss => {
                self.viewport = self.viewport.clone().without_visual();
                self.mode = Mode::Normal;
            }
            KeyAction::Yank => self.start_yank(),
            _ => {}
        }
        Ok(Action::None)
    }

    fn delete_key(&mut self, target: DeleteTarget, action: Option<KeyAction>) -> Result<Action> {
        match action {
            Some(KeyAction::TargetRow) => {
                self.mode = Mode::Delete {
                    target: DeleteTarget::Row,
                }
            }
            Some(KeyAction::TargetCell) => {
                self.mode = Mode::Delete {
                    target: DeleteTarget::Cell,
                }
            }
            Some(KeyAction::Submit) => {
                let pos = self.viewport.cursor;
                let result = CellEditor::new(&mut self.grid).and_then(|mut editor| match target {
                    DeleteTarget::Row => editor.delete_row(pos.row),
                    DeleteTarget::Cell => editor.clear_cell(pos),
                });
                self.after_mutation(result);
            }
            Some(KeyAction::Dismiss) => {}
            _ => self.mode = Mode::Delete { target },
        }
        Ok(Action::None)
    }

    fn confirm_key(&mut self, pending: &CommandLine, action: Option<KeyAction>) -> Result<Action> {
        match action {
            Some(KeyAction::Submit) => self.run_command(pending),
            _ => {
                self.set_status("Cancelled", StatusLevel::Info);
                Ok(Action::None)
            }
        }
    }

    fn yank_key(&mut self, action: Option<KeyAction>) -> Action {
        match action {
            Some(KeyAction::Export(format)) => self.copy_selection(format),
            _ if self.viewport.is_visual() => self.mode = Mode::Visual,
            _ => {}
        }
        Action::None
    }

    fn move_cursor(&mut self, motion: Motion) {
        self.viewport = self.viewport.clone().moved(motion);
    }

    fn start_yank(&mut self) {
        if self.viewport.selection().is_none() {
            self.set_status("Nothing to copy", StatusLevel::Warning);
            self.mode = Mode::Normal;
        } else {
            self.mode = Mode::Yank;
        }
    }

    fn copy_selection(&mut self, format: ExportFormat) {
        let Some(rect) = self.viewport.selection() else {
            return;
        };
        let selection = Selection::from_grid(&self.grid, &rect);
        match export::copy_selection(self.services.clipboard.as_mut(), &selection, format) {
            Ok(banner) => self.set_status(banner, StatusLevel::Success),
            Err(e) => {
                tracing::warn!(error = %e, format = format.label(), "copy failed");
                self.set_status(e.to_string(), StatusLevel::Error);
            }
        }
        self.viewport = self.viewport.clone().without_visual();
        self.mode = Mode::Normal;
    }

    fn check_mutable(&self) -> EditResult<()> {
        if !self.grid.is_mutable() {
            return Err(EditError::MissingTable);
        }
        if self.grid.is_empty() {
            return Err(EditError::NoCell);
        }
        Ok(())
    }

    fn edit_cell(&mut self) {
        if let Err(e) = self.check_mutable() {
            self.set_status(e.to_string(), StatusLevel::Error);
            return;
        }
        let pos = self.viewport.cursor;
        self.full_redraw = true;
        let editor = self.services.editor.as_mut();
        let result = CellEditor::new(&mut self.grid).and_then(|mut cells| cells.edit_cell(pos, editor));
        self.after_mutation(result);
    }

    fn after_mutation(&mut self, result: EditResult<Mutation>) {
        self.mode = Mode::Normal;
        match result {
            Ok(mutation) => {
                self.sync_viewport();
                self.viewport = self.viewport.clone().without_visual();
                let level = if mutation == Mutation::Unchanged {
                    StatusLevel::Info
                } else {
                    StatusLevel::Success
                };
                self.set_status(mutation.banner(), level);
            }
            Err(EditError::Cancelled) => self.set_status("Edit cancelled", StatusLevel::Info),
            Err(e) => self.set_status(e.to_string(), StatusLevel::Error),
        }
    }

    /// Recompute widths and clamp the cursor after the grid changed shape
    fn sync_viewport(&mut self) {
        let widths = column_widths(&self.grid, self.settings.cell_width_cap());
        self.viewport = self
            .viewport
            .clone()
            .with_grid(widths, self.grid.row_count());
    }

    fn replace_grid(&mut self, grid: ResultGrid) {
        self.grid = grid;
        self.viewport = Viewport::new(
            column_widths(&self.grid, self.settings.cell_width_cap()),
            self.grid.row_count(),
            self.size.0,
            self.size.1,
            self.settings.horizontal_padding,
        );
        self.last_refresh = Instant::now();
    }

    /// Re-run the grid's SQL in place. `Ok(false)` when it failed with a banner.
    fn refresh(&mut self) -> Result<bool> {
        match self.grid.refresh() {
            Ok(grid) => {
                self.grid = grid;
                self.sync_viewport();
                self.last_refresh = Instant::now();
                Ok(true)
            }
            Err(GridError::FailedToMaterialize(e)) => {
                Err(QuerybookError::Grid(GridError::FailedToMaterialize(e)))
            }
            Err(e) => {
                tracing::warn!(error = %e, "refresh failed");
                self.set_status(e.to_string(), StatusLevel::Error);
                Ok(false)
            }
        }
    }

    fn submit_prompt(&mut self, line: &str) -> Result<Action> {
        let Some(command) = parse_command(line, &self.grid.table_name) else {
            return Ok(Action::None);
        };
        if command.is_unfiltered_mutation() {
            let question = format!("Run `{}` on every row? (y/Enter to confirm)", command.rest);
            self.mode = Mode::Confirm {
                action: command,
                question,
            };
            return Ok(Action::None);
        }
        self.run_command(&command)
    }

    /// Replace the grid with the result of `sql`, as if typed at the prompt
    pub fn run_sql(&mut self, sql: &str) -> Result<Action> {
        self.run_command(&CommandLine::new("run", sql))
    }

    fn run_command(&mut self, command: &CommandLine) -> Result<Action> {
        let context = PromptContext::from_grid(&self.grid);
        match self.services.executor.execute(command, &context) {
            Ok(Some(grid)) => {
                let n = grid.row_count();
                self.replace_grid(grid);
                self.set_status(format!("{} rows", n), StatusLevel::Success);
            }
            Ok(None) => {
                if self.refresh()? {
                    self.set_status(format!("Done: {}", command.name), StatusLevel::Success);
                }
            }
            Err(CommandError::Grid(GridError::FailedToMaterialize(e))) => {
                return Err(QuerybookError::Grid(GridError::FailedToMaterialize(e)));
            }
            Err(e) => {
                tracing::warn!(error = %e, command = %command, "command failed");
                self.set_status(e.to_string(), StatusLevel::Error);
            }
        }
        Ok(Action::None)
    }

    fn edit_and_rerun(&mut self) -> Action {
        let initial = format_sql(self.grid.original_sql());
        self.full_redraw = true;
        match self.services.editor.edit(&initial, "sql") {
            Ok(Some(sql)) => {
                let sql = sql.trim();
                if sql.is_empty() || sql == initial.trim() {
                    self.set_status("No changes", StatusLevel::Info);
                    Action::None
                } else {
                    Action::Rerun(sql.to_string())
                }
            }
            Ok(None) => {
                self.set_status("Edit cancelled", StatusLevel::Info);
                Action::None
            }
            Err(e) => {
                tracing::warn!(error = %e, "editor failed");
                self.set_status(e.to_string(), StatusLevel::Error);
                Action::None
            }
        }
    }

    fn tick(&mut self, now: Instant) -> Result<Action> {
        if self.status.as_ref().is_some_and(|s| now >= s.expires_at) {
            self.status = None;
        }
        if let Some(interval) = self.settings.auto_refresh()
            && self.mode == Mode::Normal
            && now.saturating_duration_since(self.last_refresh) >= interval
        {
            self.refresh()?;
        }
        Ok(Action::None)
    }

    /// Footer hint for the current mode
    fn hint(&self) -> &'static str {
        match &self.mode {
            Mode::Visual => "y copy | Esc cancel",
            Mode::Yank => "pick a format | Esc cancel",
            Mode::Delete { .. } | Mode::Confirm { .. } => "Enter confirm | Esc cancel",
            Mode::Prompt(_) => "Enter run | Esc cancel",
            Mode::Normal if self.grid.is_empty() => "; command | r refresh | q quit",
            Mode::Normal if self.grid.is_mutable() => "e edit | d delete | y copy | ; command",
            Mode::Normal => "read-only | y copy | ; command",
        }
    }

    /// Everything needed to draw one frame
    pub fn view(&self) -> GridView<'_> {
        let bottom = match &self.mode {
            Mode::Normal => BottomLine::Empty,
            Mode::Visual => BottomLine::Mode {
                text: "-- VISUAL --",
                danger: false,
            },
            Mode::Yank => BottomLine::Mode {
                text: "-- COPY -- c csv | t tsv | j json | m markdown | h html | s sql",
                danger: false,
            },
            Mode::Delete {
                target: DeleteTarget::Cell,
            } => BottomLine::Mode {
                text: "-- CLEAR CELL -- Enter clears, r switches to row",
                danger: true,
            },
            Mode::Delete {
                target: DeleteTarget::Row,
            } => BottomLine::Mode {
                text: "-- DELETE ROW -- Enter deletes, c switches to cell",
                danger: true,
            },
            Mode::Confirm { question, .. } => BottomLine::Mode {
                text: question,
                danger: true,
            },
            Mode::Prompt(bar) => BottomLine::Prompt {
                input: bar.input(),
                cursor: bar.cursor(),
            },
        };
        GridView {
            grid: &self.grid,
            viewport: &self.viewport,
            hint: self.hint(),
            status: self.status.as_ref(),
            bottom,
            theme: &self.theme,
        }
    }
}

fn motion(action: KeyAction) -> Option<Motion> {
    Some(match action {
        KeyAction::MoveUp => Motion::Up,
        KeyAction::MoveDown => Motion::Down,
        KeyAction::MoveLeft => Motion::Left,
        KeyAction::MoveRight => Motion::Right,
        KeyAction::PageUp => Motion::PageUp,
        KeyAction::PageDown => Motion::PageDown,
        KeyAction::FirstRow => Motion::FirstRow,
        KeyAction::LastRow => Motion::LastRow,
        KeyAction::FirstColumn => Motion::FirstColumn,
        KeyAction::LastColumn => Motion::LastColumn,
        _ => return None,
    })
}
