//! Grapheme-indexed text helpers.
//!
//! Caret locations and ranges in the composer count extended grapheme
//! clusters, so an emoji or a letter with combining marks moves as one unit.

use unicode_segmentation::UnicodeSegmentation;

/// Half-open range of graphemes, `location..location + length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextRange {
    pub location: usize,
    pub length: usize,
}

impl TextRange {
    #[must_use]
    pub const fn new(location: usize, length: usize) -> Self {
        Self { location, length }
    }

    #[must_use]
    pub const fn end(&self) -> usize {
        self.location + self.length
    }

    /// Returns whether the range lies inside a buffer of `len` graphemes.
    #[must_use]
    pub const fn fits(&self, len: usize) -> bool {
        self.end() <= len
    }
}

pub fn grapheme_len(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Byte offset of the grapheme at `index`; `index == len` maps to `text.len()`.
pub fn byte_offset(text: &str, index: usize) -> Option<usize> {
    let mut count = 0;
    for (offset, _) in text.grapheme_indices(true) {
        if count == index {
            return Some(offset);
        }
        count += 1;
    }
    (count == index).then_some(text.len())
}

/// Substring covering `range`, or `None` when the range is out of bounds.
pub fn slice(text: &str, range: TextRange) -> Option<&str> {
    let start = byte_offset(text, range.location)?;
    let end = byte_offset(text, range.end())?;
    text.get(start..end)
}

/// Returns `text` with `range` replaced by `replacement`.
pub fn replace_range(text: &str, range: TextRange, replacement: &str) -> Option<String> {
    let start = byte_offset(text, range.location)?;
    let end = byte_offset(text, range.end())?;
    let mut out = String::with_capacity(text.len() - (end - start) + replacement.len());
    out.push_str(&text[..start]);
    out.push_str(replacement);
    out.push_str(&text[end..]);
    Some(out)
}

pub(crate) fn is_whitespace(grapheme: &str) -> bool {
    !grapheme.is_empty() && grapheme.chars().all(char::is_whitespace)
}

pub(crate) fn is_newline(grapheme: &str) -> bool {
    grapheme.chars().any(|ch| {
        matches!(
            ch,
            '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}'
        )
    })
}
