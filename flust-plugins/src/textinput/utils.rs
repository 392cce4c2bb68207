//! Offset helpers. The framework counts text positions in UTF-16 code units,
//! Rust strings are indexed by UTF-8 byte.

/// Byte offset of the UTF-16 position `offset`, clamped to the text.
pub(crate) fn utf16_to_byte(text: &str, offset: i64) -> usize {
    if offset <= 0 {
        return 0;
    }
    let mut units = 0;
    for (index, ch) in text.char_indices() {
        if units >= offset {
            return index;
        }
        units += ch.len_utf16() as i64;
    }
    text.len()
}

pub(crate) fn byte_to_utf16(text: &str, offset: usize) -> i64 {
    text[..offset.min(text.len())]
        .chars()
        .map(|ch| ch.len_utf16() as i64)
        .sum()
}

pub(crate) fn prev_char_boundary(text: &str, offset: usize) -> usize {
    text[..offset]
        .char_indices()
        .next_back()
        .map_or(0, |(index, _)| index)
}

pub(crate) fn next_char_boundary(text: &str, offset: usize) -> usize {
    text[offset..]
        .chars()
        .next()
        .map_or(text.len(), |ch| offset + ch.len_utf8())
}

/// Start of the word before `offset`, skipping whitespace first.
pub(crate) fn prev_word_boundary(text: &str, offset: usize) -> usize {
    let mut chars = text[..offset].char_indices().rev().peekable();
    while chars.next_if(|(_, ch)| ch.is_whitespace()).is_some() {}
    let mut start = chars.peek().map_or(0, |(index, _)| *index);
    while let Some((index, _)) = chars.next_if(|(_, ch)| !ch.is_whitespace()) {
        start = index;
    }
    start
}

/// End of the word after `offset`, skipping whitespace first.
pub(crate) fn next_word_boundary(text: &str, offset: usize) -> usize {
    let rest = &text[offset..];
    let mut chars = rest.char_indices().peekable();
    while chars.next_if(|(_, ch)| ch.is_whitespace()).is_some() {}
    while chars.next_if(|(_, ch)| !ch.is_whitespace()).is_some() {}
    chars.peek().map_or(text.len(), |(index, _)| offset + index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf16_offsets() {
        let text = "a😀b";
        assert_eq!(utf16_to_byte(text, 0), 0);
        assert_eq!(utf16_to_byte(text, 1), 1);
        assert_eq!(utf16_to_byte(text, 3), 5);
        assert_eq!(utf16_to_byte(text, 4), 6);
        assert_eq!(utf16_to_byte(text, 99), 6);
        assert_eq!(utf16_to_byte(text, -1), 0);

        assert_eq!(byte_to_utf16(text, 5), 3);
        assert_eq!(byte_to_utf16(text, 6), 4);
    }

    #[test]
    fn char_boundaries() {
        let text = "aé";
        assert_eq!(next_char_boundary(text, 1), 3);
        assert_eq!(prev_char_boundary(text, 3), 1);
        assert_eq!(prev_char_boundary(text, 0), 0);
        assert_eq!(next_char_boundary(text, 3), 3);
    }

    #[test]
    fn word_boundaries() {
        let text = "hello  big world";
        assert_eq!(prev_word_boundary(text, text.len()), 11);
        assert_eq!(prev_word_boundary(text, 11), 7);
        assert_eq!(prev_word_boundary(text, 3), 0);
        assert_eq!(next_word_boundary(text, 0), 5);
        assert_eq!(next_word_boundary(text, 5), 10);
        assert_eq!(next_word_boundary(text, 11), text.len());
    }
}
