use crate::text::{byte_idx_to_utf16, is_word_char, slice_utf16, utf16_to_byte_idx};
use std::ops::Range;

/// An unterminated `@query` immediately before the caret.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriggerSpan {
    /// Offset of the `@`.
    pub start: u32,
    /// Offset just past the last query character (the caret).
    pub end: u32,
    pub query: String,
}

impl TriggerSpan {
    /// Whether `content` still holds `@query` at this span.
    pub fn matches(&self, content: &str) -> bool {
        let text = slice_utf16(content, self.start, self.end);
        text.strip_prefix('@') == Some(self.query.as_str())
    }
}

/// Find the `@query` ending at `caret`.
///
/// The query is one or more word characters with no whitespace between it and
/// the `@`.
pub fn detect(content: &str, caret: u32) -> Option<TriggerSpan> {
    detect_excluding(content, caret, &[])
}

/// Like [`detect`], but an `@` inside a committed token never starts a span.
pub fn detect_excluding(content: &str, caret: u32, committed: &[Range<u32>]) -> Option<TriggerSpan> {
    let end_byte = utf16_to_byte_idx(content, caret);
    let before = &content[..end_byte];

    let query_start = before
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_word_char(*c))
        .last()
        .map(|(i, _)| i)?;

    let at_byte = query_start.checked_sub(1)?;
    if before.as_bytes()[at_byte] != b'@' {
        return None;
    }

    let start = byte_idx_to_utf16(content, at_byte);
    let end = byte_idx_to_utf16(content, end_byte);
    if committed.iter().any(|r| r.start <= start && start < r.end) {
        return None;
    }

    Some(TriggerSpan {
        start,
        end,
        query: before[query_start..].to_string(),
    })
}
