//! Data-driven keybinding configuration
//!
//! All keybindings are defined as data in `KeyMap::default()`, not as match arms
//! scattered across the controller. To add a new binding, add an entry to the
//! appropriate context in `KeyMap::default()` and handle the `KeyAction` in
//! `Controller`. The prompt is not listed here; the command bar reads raw keys.

use crate::export::ExportFormat;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// A key combination (code + modifiers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBind {
    pub fn plain(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(c: char) -> Self {
        Self {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
        }
    }
}

impl From<KeyEvent> for KeyBind {
    /// Shift is dropped from character keys: the character already says
    /// whether it was shifted, and terminals disagree on reporting it.
    fn from(event: KeyEvent) -> Self {
        let modifiers = match event.code {
            KeyCode::Char(_) => event.modifiers - KeyModifiers::SHIFT,
            _ => event.modifiers,
        };
        Self {
            code: event.code,
            modifiers,
        }
    }
}

/// Which set of bindings is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Normal,
    Visual,
    Delete,
    Confirm,
    Yank,
}

/// Semantic key actions: what a key means, not which key it is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,

    // Navigation
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    PageUp,
    PageDown,
    FirstRow,
    LastRow,
    FirstColumn,
    LastColumn,

    // Normal mode
    ToggleVisual,
    Yank,
    EditCell,
    EnterDelete,
    OpenPrompt,
    Refresh,
    EditAndRerun,

    // Delete mode
    TargetRow,
    TargetCell,

    // Yank follow-up
    Export(ExportFormat),

    // Shared by the modal states
    Submit,
    Dismiss,
}

/// Keybinding configuration mapping key combos to semantic actions per context
pub struct KeyMap {
    contexts: HashMap<KeyContext, HashMap<KeyBind, KeyAction>>,
}

impl KeyMap {
    /// Resolve a key event to a semantic action in `context`.
    pub fn resolve(&self, context: KeyContext, key: KeyEvent) -> Option<KeyAction> {
        let bind = KeyBind::from(key);
        self.contexts
            .get(&context)
            .and_then(|m| m.get(&bind))
            .copied()
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        let mut contexts = HashMap::new();

        // ── Normal ───────────────────────────────────────────────
        let mut normal = HashMap::new();
        insert_grid_nav(&mut normal);
        normal.insert(KeyBind::plain(KeyCode::Char('q')), KeyAction::Quit);
        normal.insert(KeyBind::ctrl('c'), KeyAction::Quit);
        normal.insert(KeyBind::plain(KeyCode::Char('v')), KeyAction::ToggleVisual);
        normal.insert(KeyBind::plain(KeyCode::Char('y')), KeyAction::Yank);
        normal.insert(KeyBind::plain(KeyCode::Char('e')), KeyAction::EditCell);
        normal.insert(KeyBind::plain(KeyCode::Char('d')), KeyAction::EnterDelete);
        normal.insert(KeyBind::plain(KeyCode::Char(';')), KeyAction::OpenPrompt);
        normal.insert(KeyBind::plain(KeyCode::Char('r')), KeyAction::Refresh);
        normal.insert(KeyBind::plain(KeyCode::Char('E')), KeyAction::EditAndRerun);
        contexts.insert(KeyContext::Normal, normal);

        // ── Visual ───────────────────────────────────────────────
        let mut visual = HashMap::new();
        insert_grid_nav(&mut visual);
        visual.insert(KeyBind::plain(KeyCode::Char('q')), KeyAction::Quit);
        visual.insert(KeyBind::ctrl('c'), KeyAction::Quit);
        visual.insert(KeyBind::plain(KeyCode::Char('v')), KeyAction::ToggleVisual);
        visual.insert(KeyBind::plain(KeyCode::Char('y')), KeyAction::Yank);
        visual.insert(KeyBind::plain(KeyCode::Esc), KeyAction::Dismiss);
        contexts.insert(KeyContext::Visual, visual);

        // ── Delete ───────────────────────────────────────────────
        let mut delete = HashMap::new();
        delete.insert(KeyBind::plain(KeyCode::Char('r')), KeyAction::TargetRow);
        delete.insert(KeyBind::plain(KeyCode::Char('c')), KeyAction::TargetCell);
        delete.insert(KeyBind::plain(KeyCode::Enter), KeyAction::Submit);
        insert_dismiss(&mut delete);
        contexts.insert(KeyContext::Delete, delete);

        // ── Confirm ──────────────────────────────────────────────
        // Anything unbound here cancels.
        let mut confirm = HashMap::new();
        confirm.insert(KeyBind::plain(KeyCode::Char('y')), KeyAction::Submit);
        confirm.insert(KeyBind::plain(KeyCode::Enter), KeyAction::Submit);
        insert_dismiss(&mut confirm);
        contexts.insert(KeyContext::Confirm, confirm);

        // ── Yank follow-up ───────────────────────────────────────
        let mut yank = HashMap::new();
        for c in ['c', 't', 'j', 'm', 'h', 's'] {
            if let Some(format) = ExportFormat::from_key(c) {
                yank.insert(KeyBind::plain(KeyCode::Char(c)), KeyAction::Export(format));
            }
        }
        insert_dismiss(&mut yank);
        contexts.insert(KeyContext::Yank, yank);

        Self { contexts }
    }
}

fn insert_dismiss(map: &mut HashMap<KeyBind, KeyAction>) {
    map.insert(KeyBind::plain(KeyCode::Esc), KeyAction::Dismiss);
    map.insert(KeyBind::ctrl('c'), KeyAction::Dismiss);
}

/// Arrows + hjkl, row/column jumps and paging
fn insert_grid_nav(map: &mut HashMap<KeyBind, KeyAction>) {
    let plain = [
        (KeyCode::Up, KeyAction::MoveUp),
        (KeyCode::Char('k'), KeyAction::MoveUp),
        (KeyCode::Down, KeyAction::MoveDown),
        (KeyCode::Char('j'), KeyAction::MoveDown),
        (KeyCode::Left, KeyAction::MoveLeft),
        (KeyCode::Char('h'), KeyAction::MoveLeft),
        (KeyCode::Right, KeyAction::MoveRight),
        (KeyCode::Char('l'), KeyAction::MoveRight),
        (KeyCode::Char('g'), KeyAction::FirstRow),
        (KeyCode::Char('G'), KeyAction::LastRow),
        (KeyCode::Char('0'), KeyAction::FirstColumn),
        (KeyCode::Char('_'), KeyAction::FirstColumn),
        (KeyCode::Home, KeyAction::FirstColumn),
        (KeyCode::Char('$'), KeyAction::LastColumn),
        (KeyCode::End, KeyAction::LastColumn),
        (KeyCode::PageUp, KeyAction::PageUp),
        (KeyCode::PageDown, KeyAction::PageDown),
    ];
    for (code, action) in plain {
        map.insert(KeyBind::plain(code), action);
    }
    map.insert(KeyBind::ctrl('u'), KeyAction::PageUp);
    map.insert(KeyBind::ctrl('d'), KeyAction::PageDown);
}
