//! Privacy-preserving input event types.
//!
//! Key events carry the logical key name only for the duration of the
//! callback. Paste and mutation events carry lengths, never text.

use serde::{Deserialize, Serialize};

/// Keys used for editing and navigation. They never count as typing.
pub const EDITING_KEYS: [&str; 13] = [
    "Backspace",
    "Delete",
    "Tab",
    "Enter",
    "Escape",
    "ArrowUp",
    "ArrowDown",
    "ArrowLeft",
    "ArrowRight",
    "Home",
    "End",
    "PageUp",
    "PageDown",
];

/// Modifier flags held while a key event fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub meta: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub shift: bool,
}

impl Modifiers {
    /// True when a chord modifier (ctrl, meta or alt) is held.
    ///
    /// Shift is not a chord modifier: it produces printable characters.
    pub fn is_chord(&self) -> bool {
        self.ctrl || self.meta || self.alt
    }
}

/// A key press or release as delivered by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Logical key name ("a", "A", "Backspace", "Shift", ...)
    pub key: String,
    /// Modifier flags
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Host high-resolution timestamp in milliseconds
    pub timestamp_ms: f64,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, timestamp_ms: f64) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::default(),
            timestamp_ms,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// The typed character, folded to lower case.
    ///
    /// Returns `None` for chords, editing keys and any key name that is not
    /// exactly one printable UTF-16 unit. Astral characters such as emoji
    /// take two units and are ignored, as a browser `key.length` check does.
    pub fn typed_char(&self) -> Option<char> {
        if self.modifiers.is_chord() || EDITING_KEYS.contains(&self.key.as_str()) {
            return None;
        }

        let mut chars = self.key.chars();
        let c = chars.next()?;
        if chars.next().is_some() || c.is_control() || c.len_utf16() != 1 {
            return None;
        }

        Some(c.to_lowercase().next().unwrap_or(c))
    }
}

/// A paste notification. Only the clipboard text length is kept.
///
/// Lengths are UTF-16 units throughout, matching what text widgets report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasteEvent {
    pub text_len: usize,
}

impl PasteEvent {
    pub fn from_text(text: &str) -> Self {
        Self {
            text_len: text.encode_utf16().count(),
        }
    }
}

/// A text-content change observed on the input's subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    /// Text length before the change
    pub old_len: usize,
    /// Text length after the change
    pub new_len: usize,
}

impl MutationRecord {
    /// Number of characters added, zero when the text shrank.
    pub fn added(&self) -> usize {
        self.new_len.saturating_sub(self.old_len)
    }
}

/// Unified event type, used by replay logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    Press(KeyEvent),
    Release(KeyEvent),
    Paste(PasteEvent),
    Mutate(MutationRecord),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_char_lowercases() {
        assert_eq!(KeyEvent::new("T", 0.0).typed_char(), Some('t'));
        assert_eq!(KeyEvent::new("7", 0.0).typed_char(), Some('7'));
        assert_eq!(KeyEvent::new(" ", 0.0).typed_char(), Some(' '));
    }

    #[test]
    fn test_typed_char_rejects_editing_and_named_keys() {
        assert_eq!(KeyEvent::new("Backspace", 0.0).typed_char(), None);
        assert_eq!(KeyEvent::new("ArrowLeft", 0.0).typed_char(), None);
        assert_eq!(KeyEvent::new("Shift", 0.0).typed_char(), None);
        assert_eq!(KeyEvent::new("", 0.0).typed_char(), None);
        assert_eq!(KeyEvent::new("\t", 0.0).typed_char(), None);
    }

    #[test]
    fn test_typed_char_rejects_chords() {
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::default()
        };
        assert_eq!(KeyEvent::new("c", 0.0).with_modifiers(ctrl).typed_char(), None);

        let shift = Modifiers {
            shift: true,
            ..Modifiers::default()
        };
        assert_eq!(KeyEvent::new("C", 0.0).with_modifiers(shift).typed_char(), Some('c'));
    }

    #[test]
    fn test_mutation_added_saturates() {
        let grew = MutationRecord { old_len: 3, new_len: 20 };
        assert_eq!(grew.added(), 17);

        let shrank = MutationRecord { old_len: 20, new_len: 3 };
        assert_eq!(shrank.added(), 0);
    }

    #[test]
    fn test_lengths_use_utf16_units() {
        assert_eq!(KeyEvent::new("é", 0.0).typed_char(), Some('é'));
        assert_eq!(KeyEvent::new("😀", 0.0).typed_char(), None);
        assert_eq!(PasteEvent::from_text("ok 😀").text_len, 5);
    }

    #[test]
    fn test_input_event_json_shape() {
        let event: InputEvent =
            serde_json::from_str(r#"{"type":"press","key":"a","timestamp_ms":12.5}"#).unwrap();
        assert_eq!(event, InputEvent::Press(KeyEvent::new("a", 12.5)));

        let paste: InputEvent = serde_json::from_str(r#"{"type":"paste","text_len":50}"#).unwrap();
        assert_eq!(paste, InputEvent::Paste(PasteEvent { text_len: 50 }));
    }
}
