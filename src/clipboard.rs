//! Clipboard access
//!
//! The controller talks to a [`Clipboard`]; the binary plugs in the system
//! clipboard, tests plug in [`MemoryClipboard`].

use crate::error::ClipboardError;
use std::cell::RefCell;
use std::rc::Rc;

pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Lets a caller keep a handle on a clipboard it gave away
impl<T: Clipboard> Clipboard for Rc<RefCell<T>> {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.borrow_mut().set_text(text)
    }
}

/// OS clipboard via `arboard`
pub struct SystemClipboard {
    /// Kept alive for the whole session; dropping it early loses the
    /// selection on Linux
    inner: Option<arboard::Clipboard>,
    /// Why the clipboard could not be opened, if it could not
    init_error: Option<String>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        match arboard::Clipboard::new() {
            Ok(inner) => Self {
                inner: Some(inner),
                init_error: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "clipboard unavailable");
                Self {
                    inner: None,
                    init_error: Some(e.to_string()),
                }
            }
        }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        match self.inner.as_mut() {
            Some(clipboard) => clipboard.set_text(text).map_err(|e| {
                tracing::warn!(error = %e, "clipboard write failed");
                ClipboardError::Write(e.to_string())
            }),
            None => Err(ClipboardError::Unavailable(
                self.init_error
                    .clone()
                    .unwrap_or_else(|| "unknown reason".to_string()),
            )),
        }
    }
}

/// Clipboard that keeps everything written to it
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Vec<String>,
    failure: Option<String>,
}

impl MemoryClipboard {
    /// A clipboard that refuses every write
    pub fn failing(reason: &str) -> Self {
        Self {
            contents: Vec::new(),
            failure: Some(reason.to_string()),
        }
    }

    pub fn last(&self) -> Option<&str> {
        self.contents.last().map(String::as_str)
    }

    pub fn contents(&self) -> &[String] {
        &self.contents
    }
}

impl Clipboard for MemoryClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if let Some(reason) = &self.failure {
            return Err(ClipboardError::Write(reason.clone()));
        }
        self.contents.push(text.to_string());
        Ok(())
    }
}
