//! External editor
//!
//! [`BlockingEditor`] opens text in an editor and waits for it to exit.
//! `Ok(None)` means the user closed the file without saving.

use crate::error::EditorError;
use crate::terminal;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::rc::Rc;
use std::time::SystemTime;

pub trait BlockingEditor {
    /// Edit `initial` in a file ending in `.{extension}`
    fn edit(&mut self, initial: &str, extension: &str) -> Result<Option<String>, EditorError>;
}

impl<T: BlockingEditor> BlockingEditor for Rc<RefCell<T>> {
    fn edit(&mut self, initial: &str, extension: &str) -> Result<Option<String>, EditorError> {
        self.borrow_mut().edit(initial, extension)
    }
}

/// `$VISUAL`, then `$EDITOR`, then `vi`
pub struct ExternalEditor {
    command: String,
    /// Hand the terminal over while the editor runs
    suspend_terminal: bool,
}

impl ExternalEditor {
    pub fn from_env() -> Self {
        let command = std::env::var("VISUAL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| std::env::var("EDITOR").ok().filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| "vi".to_string());
        Self::new(command)
    }

    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            suspend_terminal: true,
        }
    }

    /// Leave the terminal alone; for running outside the viewer
    pub fn without_terminal(mut self) -> Self {
        self.suspend_terminal = false;
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    fn launch(&self, path: &Path) -> Result<(), EditorError> {
        let mut parts = self.command.split_whitespace();
        let program = parts.next().ok_or_else(|| EditorError::Launch {
            command: self.command.clone(),
            reason: "empty editor command".to_string(),
        })?;
        let status = Command::new(program)
            .args(parts)
            .arg(path)
            .status()
            .map_err(|e| EditorError::Launch {
                command: self.command.clone(),
                reason: e.to_string(),
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(EditorError::Failed {
                command: self.command.clone(),
                status: status.to_string(),
            })
        }
    }
}

impl BlockingEditor for ExternalEditor {
    fn edit(&mut self, initial: &str, extension: &str) -> Result<Option<String>, EditorError> {
        let mut file = tempfile::Builder::new()
            .prefix("querybook-")
            .suffix(&format!(".{}", extension))
            .tempfile()?;
        file.write_all(initial.as_bytes())?;
        file.flush()?;
        let before = modified(file.path())?;

        if self.suspend_terminal {
            terminal::suspend().map_err(|e| EditorError::Terminal(e.to_string()))?;
        }
        let launched = self.launch(file.path());
        if self.suspend_terminal {
            terminal::resume().map_err(|e| EditorError::Terminal(e.to_string()))?;
        }
        launched?;

        let after = modified(file.path())?;
        let content = std::fs::read_to_string(file.path())?;
        if after == before && content == initial {
            tracing::debug!(editor = %self.command, "editor closed without saving");
            return Ok(None);
        }
        Ok(Some(content))
    }
}

fn modified(path: &Path) -> std::io::Result<SystemTime> {
    std::fs::metadata(path)?.modified()
}

/// Editor that replays canned answers and remembers what it was shown
#[derive(Debug, Default)]
pub struct ScriptedEditor {
    answers: VecDeque<Option<String>>,
    seen: Vec<(String, String)>,
}

impl ScriptedEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next edit returns `text`
    pub fn returning(mut self, text: &str) -> Self {
        self.answers.push_back(Some(text.to_string()));
        self
    }

    /// Next edit is closed without saving
    pub fn cancelling(mut self) -> Self {
        self.answers.push_back(None);
        self
    }

    pub fn push(&mut self, answer: Option<String>) {
        self.answers.push_back(answer);
    }

    /// `(initial text, extension)` of every call
    pub fn seen(&self) -> &[(String, String)] {
        &self.seen
    }
}

impl BlockingEditor for ScriptedEditor {
    fn edit(&mut self, initial: &str, extension: &str) -> Result<Option<String>, EditorError> {
        self.seen.push((initial.to_string(), extension.to_string()));
        Ok(self.answers.pop_front().flatten())
    }
}
