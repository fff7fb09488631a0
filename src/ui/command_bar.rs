//! Command bar
//!
//! Single-line input opened with `;`. Owns the text and a cursor measured in
//! characters; the controller decides what a submitted line means.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a key did to the command bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarEvent {
    /// Text or cursor changed
    Edited,
    /// Enter pressed; carries the line
    Submit(String),
    /// Esc / Ctrl+C
    Cancel,
    /// Key has no meaning here
    Ignored,
}

/// Command bar input buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandBar {
    input: String,
    /// Cursor position in chars
    cursor: usize,
}

impl CommandBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: &str) -> Self {
        Self {
            input: text.to_string(),
            cursor: text.chars().count(),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> BarEvent {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => BarEvent::Submit(self.input.clone()),
            KeyCode::Esc => BarEvent::Cancel,
            KeyCode::Char('c') if ctrl => BarEvent::Cancel,
            KeyCode::Char('u') if ctrl => {
                let at = self.byte_index(self.cursor);
                self.input.drain(..at);
                self.cursor = 0;
                BarEvent::Edited
            }
            KeyCode::Char('w') if ctrl => {
                self.delete_word();
                BarEvent::Edited
            }
            KeyCode::Char('a') if ctrl => {
                self.cursor = 0;
                BarEvent::Edited
            }
            KeyCode::Char('e') if ctrl => {
                self.cursor = self.len();
                BarEvent::Edited
            }
            KeyCode::Char(c) if !ctrl => {
                self.insert_char(c);
                BarEvent::Edited
            }
            KeyCode::Backspace => {
                self.delete_char();
                BarEvent::Edited
            }
            KeyCode::Delete => {
                if self.cursor < self.len() {
                    let at = self.byte_index(self.cursor);
                    self.input.remove(at);
                }
                BarEvent::Edited
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                BarEvent::Edited
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(self.len());
                BarEvent::Edited
            }
            KeyCode::Home => {
                self.cursor = 0;
                BarEvent::Edited
            }
            KeyCode::End => {
                self.cursor = self.len();
                BarEvent::Edited
            }
            _ => BarEvent::Ignored,
        }
    }

    /// Insert character at cursor
    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.input.insert(at, c);
        self.cursor += 1;
    }

    /// Delete character before cursor
    pub fn delete_char(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.input.remove(at);
        }
    }

    fn delete_word(&mut self) {
        let chars: Vec<char> = self.input.chars().collect();
        let mut start = self.cursor;
        while start > 0 && chars[start - 1].is_whitespace() {
            start -= 1;
        }
        while start > 0 && !chars[start - 1].is_whitespace() {
            start -= 1;
        }
        let (from, to) = (self.byte_index(start), self.byte_index(self.cursor));
        self.input.drain(from..to);
        self.cursor = start;
    }

    fn len(&self) -> usize {
        self.input.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_index)
            .map_or(self.input.len(), |(i, _)| i)
    }
}
