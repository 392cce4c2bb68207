use flust_plugins::textinput::TextEditingState;

use crate::event::{Key, Modifiers, NamedKey};

const GLFW_MOD_SHIFT: i32 = 0x1;
const GLFW_MOD_CONTROL: i32 = 0x2;
const GLFW_MOD_ALT: i32 = 0x4;
const GLFW_MOD_SUPER: i32 = 0x8;

/// GLFW key number for `key`, the scheme the framework's glfw keymap decodes.
pub fn raw_key(key: &Key) -> Option<u32> {
    let code = match key {
        Key::Named(key) => match key {
            NamedKey::Space => 32,
            NamedKey::Escape => 256,
            NamedKey::Enter => 257,
            NamedKey::Tab => 258,
            NamedKey::Backspace => 259,
            NamedKey::Insert => 260,
            NamedKey::Delete => 261,
            NamedKey::ArrowRight => 262,
            NamedKey::ArrowLeft => 263,
            NamedKey::ArrowDown => 264,
            NamedKey::ArrowUp => 265,
            NamedKey::PageUp => 266,
            NamedKey::PageDown => 267,
            NamedKey::Home => 268,
            NamedKey::End => 269,
            NamedKey::CapsLock => 280,
            NamedKey::Pause => 284,
            NamedKey::F(n @ 1..=25) => 289 + u32::from(*n),
            NamedKey::F(_) => return None,
            NamedKey::Shift => 340,
            NamedKey::Control => 341,
            NamedKey::Alt => 342,
            NamedKey::Super => 343,
        },
        Key::Character(text) => {
            let mut chars = text.chars();
            let (Some(ch), None) = (chars.next(), chars.next()) else {
                return None;
            };
            match ch.to_ascii_uppercase() {
                ch @ ('A'..='Z' | '0'..='9') => ch as u32,
                '\'' | ',' | '-' | '.' | '/' | ';' | '=' | '[' | '\\' | ']' | '`' => ch as u32,
                _ => return None,
            }
        }
        Key::Unidentified => return None,
    };
    Some(code)
}

pub fn raw_modifiers(modifiers: Modifiers) -> i32 {
    let mut raw = 0;
    if modifiers.shift {
        raw |= GLFW_MOD_SHIFT;
    }
    if modifiers.ctrl {
        raw |= GLFW_MOD_CONTROL;
    }
    if modifiers.alt {
        raw |= GLFW_MOD_ALT;
    }
    if modifiers.logo {
        raw |= GLFW_MOD_SUPER;
    }
    raw
}

/// Editing command a key press maps to while a text field has focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextEdit {
    Insert(String),
    Backspace,
    Delete,
    Left { select: bool, word: bool },
    Right { select: bool, word: bool },
    Home { select: bool },
    End { select: bool },
    SelectAll,
    Copy,
    Cut,
    Paste,
    Enter,
}

pub fn text_edit(key: &Key, text: Option<&str>, modifiers: Modifiers) -> Option<TextEdit> {
    let select = modifiers.shift;
    let word = modifiers.ctrl;
    let edit = match key {
        Key::Named(NamedKey::Backspace) => TextEdit::Backspace,
        Key::Named(NamedKey::Delete) => TextEdit::Delete,
        Key::Named(NamedKey::ArrowLeft) => TextEdit::Left { select, word },
        Key::Named(NamedKey::ArrowRight) => TextEdit::Right { select, word },
        Key::Named(NamedKey::Home) => TextEdit::Home { select },
        Key::Named(NamedKey::End) => TextEdit::End { select },
        Key::Named(NamedKey::Enter) => TextEdit::Enter,
        Key::Character(ch) if modifiers.ctrl => match ch.to_lowercase().as_str() {
            "a" => TextEdit::SelectAll,
            "c" => TextEdit::Copy,
            "x" => TextEdit::Cut,
            "v" => TextEdit::Paste,
            _ => return None,
        },
        _ => {
            let text = text.filter(|t| !t.is_empty() && !t.chars().any(char::is_control))?;
            TextEdit::Insert(text.to_owned())
        }
    };
    Some(edit)
}

impl TextEdit {
    /// Applies the edits that only touch the editing state. Clipboard and
    /// enter handling need the application and are left to the caller.
    pub fn apply(&self, state: &mut TextEditingState) -> bool {
        match self {
            Self::Insert(text) => state.add_characters(text),
            Self::Backspace => state.backspace(),
            Self::Delete => state.delete(),
            Self::Left { select, word: false } => state.move_left(*select),
            Self::Left { select, word: true } => state.move_word_left(*select),
            Self::Right { select, word: false } => state.move_right(*select),
            Self::Right { select, word: true } => state.move_word_right(*select),
            Self::Home { select } => state.move_to_beginning(*select),
            Self::End { select } => state.move_to_end(*select),
            Self::SelectAll => state.select_all(),
            Self::Copy | Self::Cut | Self::Paste | Self::Enter => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character(s: &str) -> Key {
        Key::Character(s.to_owned())
    }

    #[test]
    fn glfw_codes() {
        assert_eq!(raw_key(&character("a")), Some(65));
        assert_eq!(raw_key(&character("Z")), Some(90));
        assert_eq!(raw_key(&character("7")), Some(55));
        assert_eq!(raw_key(&character(";")), Some(59));
        assert_eq!(raw_key(&character("é")), None);
        assert_eq!(raw_key(&character("ab")), None);
        assert_eq!(raw_key(&Key::Named(NamedKey::Enter)), Some(257));
        assert_eq!(raw_key(&Key::Named(NamedKey::F(1))), Some(290));
        assert_eq!(raw_key(&Key::Named(NamedKey::F(25))), Some(314));
        assert_eq!(raw_key(&Key::Named(NamedKey::F(26))), None);
        assert_eq!(raw_key(&Key::Unidentified), None);
    }

    #[test]
    fn modifier_bits() {
        let modifiers = Modifiers {
            shift: true,
            alt: true,
            ..Default::default()
        };
        assert_eq!(raw_modifiers(modifiers), 0x5);
        assert_eq!(raw_modifiers(Modifiers::default()), 0);
    }

    #[test]
    fn key_presses_to_edits() {
        let none = Modifiers::default();
        let ctrl = Modifiers {
            ctrl: true,
            ..Default::default()
        };
        let shift = Modifiers {
            shift: true,
            ..Default::default()
        };

        assert_eq!(
            text_edit(&character("a"), Some("A"), shift),
            Some(TextEdit::Insert("A".into()))
        );
        assert_eq!(text_edit(&character("c"), Some("c"), ctrl), Some(TextEdit::Copy));
        assert_eq!(
            text_edit(&Key::Named(NamedKey::ArrowLeft), None, shift),
            Some(TextEdit::Left {
                select: true,
                word: false
            })
        );
        assert_eq!(text_edit(&Key::Named(NamedKey::Escape), Some("\u{1b}"), none), None);
        assert_eq!(text_edit(&Key::Named(NamedKey::Shift), None, shift), None);
    }

    #[test]
    fn edits_apply_to_state() {
        let mut state = TextEditingState::new("hello world");
        assert!(TextEdit::Left {
            select: true,
            word: true
        }
        .apply(&mut state));
        assert_eq!(state.selected_text(), "world");
        assert!(TextEdit::Insert("there".into()).apply(&mut state));
        assert_eq!(state.text, "hello there");
        assert!(!TextEdit::Paste.apply(&mut state));
    }
}
