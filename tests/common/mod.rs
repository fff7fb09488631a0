//! Common test utilities and helpers
//!
//! Shared test infrastructure for the integration tests: a controller wired
//! to the scripted in-memory driver, a scripted editor, a memory clipboard
//! and an executor that remembers every command it was handed.

#![allow(dead_code)]

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use querybook::app::{Action, AppEvent, Controller, Services};
use querybook::clipboard::MemoryClipboard;
use querybook::commands::{CommandExecutor, CommandLine, PromptContext, ShellExecutor};
use querybook::config::{InMemoryLibrary, Settings};
use querybook::db::memory::MemoryHandle;
use querybook::db::{CellValue, ColumnDef, DatabaseHandle, Dialect};
use querybook::editor::ScriptedEditor;
use querybook::error::CommandResult;
use querybook::grid::{GridQuery, ResultGrid};
use std::cell::RefCell;
use std::rc::Rc;

/// Commands seen by a [`RecordingExecutor`]
pub type CommandLog = Rc<RefCell<Vec<CommandLine>>>;

/// Forwards to a [`ShellExecutor`] and records what it was asked to run
pub struct RecordingExecutor {
    inner: ShellExecutor,
    log: CommandLog,
}

impl CommandExecutor for RecordingExecutor {
    fn execute(
        &mut self,
        command: &CommandLine,
        context: &PromptContext,
    ) -> CommandResult<Option<ResultGrid>> {
        self.log.borrow_mut().push(command.clone());
        self.inner.execute(command, context)
    }
}

/// A controller plus handles on everything injected into it
pub struct Viewer {
    pub handle: Rc<dyn DatabaseHandle>,
    pub editor: Rc<RefCell<ScriptedEditor>>,
    pub clipboard: Rc<RefCell<MemoryClipboard>>,
    pub commands: CommandLog,
    pub app: Controller,
}

impl Viewer {
    /// Load `sql` through `handle` and open it in an 80x24 terminal
    pub fn open(handle: Rc<dyn DatabaseHandle>, sql: &str) -> Self {
        Self::open_sized(handle, sql, (80, 24))
    }

    pub fn open_sized(handle: Rc<dyn DatabaseHandle>, sql: &str, size: (u16, u16)) -> Self {
        let grid = ResultGrid::load(&handle, GridQuery::new(sql)).unwrap();
        let editor = Rc::new(RefCell::new(ScriptedEditor::new()));
        let clipboard = Rc::new(RefCell::new(MemoryClipboard::default()));
        let commands: CommandLog = Rc::default();
        let executor = RecordingExecutor {
            inner: ShellExecutor::new(&handle, Box::new(InMemoryLibrary::default()), 100),
            log: commands.clone(),
        };
        let services = Services {
            editor: Box::new(editor.clone()),
            clipboard: Box::new(clipboard.clone()),
            executor: Box::new(executor),
        };
        let app = Controller::new(grid, Settings::default(), services, size);
        Self {
            handle,
            editor,
            clipboard,
            commands,
            app,
        }
    }

    pub fn press(&mut self, code: KeyCode) -> Action {
        self.app.handle_event(key(code)).unwrap()
    }

    pub fn press_ctrl(&mut self, c: char) -> Action {
        self.app
            .handle_event(AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)))
            .unwrap()
    }

    /// Press each character of `text` in turn
    pub fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.press(KeyCode::Char(c));
        }
    }

    /// `;`, the line, then Enter
    pub fn prompt(&mut self, line: &str) -> Action {
        self.press(KeyCode::Char(';'));
        self.type_text(line);
        self.press(KeyCode::Enter)
    }

    /// Queue the next editor answer
    pub fn editor_returns(&self, text: &str) {
        self.editor.borrow_mut().push(Some(text.to_string()));
    }

    pub fn banner(&self) -> String {
        self.app
            .status()
            .map(|s| s.message.clone())
            .unwrap_or_default()
    }

    /// Display values of the grid, row by row
    pub fn cells(&self) -> Vec<Vec<String>> {
        self.app
            .grid()
            .rows
            .iter()
            .map(|r| r.cells.iter().map(|c| c.display_value.clone()).collect())
            .collect()
    }
}

pub fn key(code: KeyCode) -> AppEvent {
    AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

pub fn columns(names: &[&str]) -> Vec<ColumnDef> {
    names.iter().map(|n| ColumnDef::new(*n, "text")).collect()
}

/// The `users` table of the edit scenarios: `[id, name, email]`, two rows
pub fn users(dialect: Dialect) -> Rc<MemoryHandle> {
    Rc::new(MemoryHandle::new(dialect).with_rows(
        vec![
            ColumnDef::new("id", "int4"),
            ColumnDef::new("name", "text"),
            ColumnDef::new("email", "text"),
        ],
        vec![
            vec![
                CellValue::Integer(1),
                CellValue::Text("Alice".into()),
                CellValue::Text("a@x".into()),
            ],
            vec![
                CellValue::Integer(2),
                CellValue::Text("Bob".into()),
                CellValue::Text("b@x".into()),
            ],
        ],
    ))
}

pub fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}
