//! UTF-16 helpers.
//!
//! Every logical offset in this crate is measured in UTF-16 code units, the
//! unit the DOM uses for text node offsets and `Range` boundaries.

pub(crate) fn utf16_len(s: &str) -> u32 {
    s.encode_utf16().count() as u32
}

pub(crate) fn utf16_to_byte_idx(s: &str, pos_utf16: u32) -> usize {
    if pos_utf16 == 0 {
        return 0;
    }
    let mut acc: u32 = 0;
    for (i, ch) in s.char_indices() {
        let w = ch.len_utf16() as u32;
        if acc + w > pos_utf16 {
            return i;
        }
        acc += w;
        if acc == pos_utf16 {
            return i + ch.len_utf8();
        }
    }
    s.len()
}

pub(crate) fn byte_idx_to_utf16(s: &str, byte_idx: usize) -> u32 {
    s[..byte_idx.min(s.len())].encode_utf16().count() as u32
}

/// Slice `s` by UTF-16 offsets. Offsets past the end are clamped.
pub(crate) fn slice_utf16(s: &str, start: u32, end: u32) -> &str {
    let a = utf16_to_byte_idx(s, start);
    let b = utf16_to_byte_idx(s, end.max(start));
    &s[a..b]
}

/// Characters allowed in an `@query`.
pub(crate) fn is_word_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf16_byte_conversion_ascii() {
        let s = "Hi @bo";
        assert_eq!(utf16_to_byte_idx(s, 3), 3);
        assert_eq!(byte_idx_to_utf16(s, 6), 6);
        assert_eq!(utf16_to_byte_idx(s, 99), s.len());
    }

    #[test]
    fn test_utf16_byte_conversion_astral() {
        // U+1F600 is two UTF-16 units and four UTF-8 bytes.
        let s = "a\u{1F600}b";
        assert_eq!(utf16_len(s), 4);
        assert_eq!(utf16_to_byte_idx(s, 3), 5);
        assert_eq!(byte_idx_to_utf16(s, 5), 3);
        // Offsets that split a surrogate pair snap to the start of the char.
        assert_eq!(utf16_to_byte_idx(s, 2), 1);
    }

    #[test]
    fn test_slice_utf16() {
        assert_eq!(slice_utf16("Hi @bo", 3, 6), "@bo");
        assert_eq!(slice_utf16("Hi", 1, 10), "i");
        assert_eq!(slice_utf16("Hi", 2, 1), "");
    }

    #[test]
    fn test_word_chars() {
        assert!(is_word_char('a'));
        assert!(is_word_char('_'));
        assert!(is_word_char('é'));
        assert!(!is_word_char(' '));
        assert!(!is_word_char('@'));
        assert!(!is_word_char('-'));
    }
}
