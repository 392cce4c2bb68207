use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::utils::{
    byte_to_utf16, next_char_boundary, next_word_boundary, prev_char_boundary,
    prev_word_boundary, utf16_to_byte,
};

const AFFINITY_DOWNSTREAM: &str = "TextAffinity.downstream";

/// Text field contents as exchanged with the framework. Offsets are UTF-16
/// code units.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TextEditingState {
    pub text: String,
    pub selection_base: i64,
    pub selection_extent: i64,
    #[serde(default = "default_affinity")]
    pub selection_affinity: String,
    #[serde(default)]
    pub selection_is_directional: bool,
    #[serde(default = "no_composing")]
    pub composing_base: i64,
    #[serde(default = "no_composing")]
    pub composing_extent: i64,
}

fn default_affinity() -> String {
    AFFINITY_DOWNSTREAM.to_owned()
}

fn no_composing() -> i64 {
    -1
}

impl Default for TextEditingState {
    fn default() -> Self {
        Self::new("")
    }
}

impl TextEditingState {
    /// State holding `text` with the cursor at its end.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let end = byte_to_utf16(&text, text.len());
        Self {
            text,
            selection_base: end,
            selection_extent: end,
            selection_affinity: default_affinity(),
            selection_is_directional: false,
            composing_base: -1,
            composing_extent: -1,
        }
    }

    fn base(&self) -> usize {
        utf16_to_byte(&self.text, self.selection_base)
    }

    fn extent(&self) -> usize {
        utf16_to_byte(&self.text, self.selection_extent)
    }

    fn set_selection(&mut self, base: usize, extent: usize) {
        self.selection_base = byte_to_utf16(&self.text, base);
        self.selection_extent = byte_to_utf16(&self.text, extent);
        self.selection_affinity = default_affinity();
        self.composing_base = -1;
        self.composing_extent = -1;
    }

    fn set_cursor(&mut self, offset: usize) {
        self.set_selection(offset, offset);
    }

    /// Selected byte range, start before end.
    pub fn selection(&self) -> Range<usize> {
        let (base, extent) = (self.base(), self.extent());
        base.min(extent)..base.max(extent)
    }

    pub fn is_collapsed(&self) -> bool {
        self.selection_base == self.selection_extent
    }

    pub fn selected_text(&self) -> &str {
        &self.text[self.selection()]
    }

    /// Removes the selection. Returns false when nothing was selected.
    pub fn delete_selected(&mut self) -> bool {
        let range = self.selection();
        if range.is_empty() {
            return false;
        }
        let start = range.start;
        self.text.replace_range(range, "");
        self.set_cursor(start);
        true
    }

    /// Removes and returns the selected text.
    pub fn cut(&mut self) -> Option<String> {
        let selected = self.selected_text().to_owned();
        self.delete_selected().then_some(selected)
    }

    /// Replaces the selection with `chars`.
    pub fn add_characters(&mut self, chars: &str) {
        let range = self.selection();
        let cursor = range.start + chars.len();
        self.text.replace_range(range, chars);
        self.set_cursor(cursor);
    }

    pub fn backspace(&mut self) {
        if self.delete_selected() {
            return;
        }
        let end = self.extent();
        if end == 0 {
            return;
        }
        let start = prev_char_boundary(&self.text, end);
        self.text.replace_range(start..end, "");
        self.set_cursor(start);
    }

    pub fn delete(&mut self) {
        if self.delete_selected() {
            return;
        }
        let start = self.extent();
        let end = next_char_boundary(&self.text, start);
        self.text.replace_range(start..end, "");
        self.set_cursor(start);
    }

    fn move_to(&mut self, offset: usize, select: bool) {
        if select {
            let base = self.base();
            self.set_selection(base, offset);
        } else {
            self.set_cursor(offset);
        }
    }

    pub fn move_left(&mut self, select: bool) {
        if !select && !self.is_collapsed() {
            let start = self.selection().start;
            return self.set_cursor(start);
        }
        let offset = prev_char_boundary(&self.text, self.extent());
        self.move_to(offset, select);
    }

    pub fn move_right(&mut self, select: bool) {
        if !select && !self.is_collapsed() {
            let end = self.selection().end;
            return self.set_cursor(end);
        }
        let offset = next_char_boundary(&self.text, self.extent());
        self.move_to(offset, select);
    }

    pub fn move_word_left(&mut self, select: bool) {
        let offset = prev_word_boundary(&self.text, self.extent());
        self.move_to(offset, select);
    }

    pub fn move_word_right(&mut self, select: bool) {
        let offset = next_word_boundary(&self.text, self.extent());
        self.move_to(offset, select);
    }

    pub fn move_to_beginning(&mut self, select: bool) {
        self.move_to(0, select);
    }

    pub fn move_to_end(&mut self, select: bool) {
        let end = self.text.len();
        self.move_to(end, select);
    }

    pub fn select_all(&mut self) {
        let end = self.text.len();
        self.set_selection(0, end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(text: &str, base: i64, extent: i64) -> TextEditingState {
        TextEditingState {
            selection_base: base,
            selection_extent: extent,
            ..TextEditingState::new(text)
        }
    }

    #[test]
    fn typing_replaces_selection() {
        let mut s = state("hello world", 6, 11);
        s.add_characters("rust");
        assert_eq!(s.text, "hello rust");
        assert_eq!((s.selection_base, s.selection_extent), (10, 10));

        s.add_characters("\n");
        assert_eq!(s.text, "hello rust\n");
    }

    #[test]
    fn backspace_and_delete() {
        let mut s = state("ab😀c", 4, 4);
        s.backspace();
        assert_eq!(s.text, "abc");
        assert_eq!(s.selection_extent, 2);

        s.delete();
        assert_eq!(s.text, "ab");
        s.delete();
        assert_eq!(s.text, "ab");

        let mut s = state("abc", 0, 0);
        s.backspace();
        assert_eq!(s.text, "abc");

        let mut s = state("abcdef", 1, 4);
        s.backspace();
        assert_eq!(s.text, "aef");
        assert_eq!(s.selection_base, 1);
    }

    #[test]
    fn cursor_movement_and_selection() {
        let mut s = state("abc", 1, 1);
        s.move_right(true);
        s.move_right(true);
        assert_eq!((s.selection_base, s.selection_extent), (1, 3));
        assert_eq!(s.selected_text(), "bc");

        s.move_left(false);
        assert_eq!((s.selection_base, s.selection_extent), (1, 1));

        s.move_to_end(true);
        assert_eq!(s.selected_text(), "bc");
        s.move_to_beginning(false);
        assert_eq!((s.selection_base, s.selection_extent), (0, 0));
        s.move_left(false);
        assert_eq!(s.selection_extent, 0);
    }

    #[test]
    fn word_movement() {
        let mut s = TextEditingState::new("one two three");
        s.move_word_left(false);
        assert_eq!(s.selection_extent, 8);
        s.move_word_left(true);
        assert_eq!(s.selected_text(), "two ");
        s.move_word_right(false);
        assert_eq!(s.selection_extent, 7);
    }

    #[test]
    fn select_all_and_cut() {
        let mut s = TextEditingState::new("copy me");
        assert_eq!(s.cut(), None);
        s.select_all();
        assert_eq!(s.selected_text(), "copy me");
        assert_eq!(s.cut().as_deref(), Some("copy me"));
        assert_eq!(s.text, "");
        assert!(s.is_collapsed());
    }

    #[test]
    fn framework_json_shape() {
        let s: TextEditingState = serde_json::from_str(
            r#"{"text":"hi","selectionBase":1,"selectionExtent":2,"selectionAffinity":"TextAffinity.upstream","selectionIsDirectional":false,"composingBase":-1,"composingExtent":-1}"#,
        )
        .unwrap();
        assert_eq!(s.selected_text(), "i");
        assert_eq!(s.selection_affinity, "TextAffinity.upstream");

        let partial: TextEditingState =
            serde_json::from_str(r#"{"text":"x","selectionBase":0,"selectionExtent":0}"#).unwrap();
        assert_eq!(partial.composing_base, -1);

        let json = serde_json::to_value(&TextEditingState::new("ok")).unwrap();
        assert_eq!(json["selectionBase"], 2);
        assert_eq!(json["composingExtent"], -1);
    }
}
