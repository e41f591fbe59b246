//! Global keyboard shortcuts.
//!
//! Ctrl (or Meta) plus the configured key toggles the chat; Escape closes it
//! while it is open. Every other key is left to the host.

/// A key press as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Key value, e.g. `"i"` or `"Escape"`
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            meta: false,
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Toggle,
    Close,
    Ignore,
}

impl KeyAction {
    /// Whether the host should suppress its default handling of the key.
    pub fn prevents_default(self) -> bool {
        matches!(self, KeyAction::Toggle)
    }
}

/// Map a key press to an action given the configured shortcut key.
pub fn resolve_key(event: &KeyEvent, shortcut: &str, is_open: bool) -> KeyAction {
    if (event.ctrl || event.meta) && event.key == shortcut {
        KeyAction::Toggle
    } else if event.key == "Escape" && is_open {
        KeyAction::Close
    } else {
        KeyAction::Ignore
    }
}
