//! Text cursor abstraction used by document search.
//!
//! Hosts expose their documents through [`TextCursor`], a range over the
//! document that can be collapsed, expanded to a paragraph and moved by
//! paragraphs or characters. Offsets are in characters.
//!
//! [`ParagraphBuffer`] implements the trait over an in-memory string, with
//! paragraphs separated by `\n`. Each paragraph's text includes its
//! terminating newline, as host paragraph ranges usually do.

use std::fmt;
use std::ops::Range;

/// Direction of a paragraph step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards the end of the document.
    Forward,
    /// Towards the start of the document.
    Backward,
}

impl Direction {
    /// `+1` or `-1`.
    pub const fn sign(self) -> isize {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => f.write_str("forward"),
            Self::Backward => f.write_str("backward"),
        }
    }
}

/// A movable range over a document.
pub trait TextCursor {
    /// Collapse the range to its start.
    fn collapse(&mut self);

    /// Expand the range to the paragraph containing its start.
    fn expand_to_paragraph(&mut self);

    /// Collapse, then move the start to the first character of the adjacent
    /// paragraph in `direction`.
    ///
    /// Returns the number of paragraphs moved: 0 at a document boundary,
    /// in which case the cursor does not move.
    fn move_by_paragraph(&mut self, direction: Direction) -> usize;

    /// Collapse, then move by `count` characters. Returns the distance moved.
    fn move_by_characters(&mut self, count: isize) -> isize;

    /// Move only the end of the range by `count` characters. Returns the
    /// distance moved.
    fn move_end_by_characters(&mut self, count: isize) -> isize;

    /// Text covered by the range.
    fn text(&self) -> String;

    /// Make the range the active selection.
    fn commit(&mut self);
}

/// In-memory document with a cursor and a committed selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphBuffer {
    chars: Vec<char>,
    paragraphs: Vec<Range<usize>>,
    range: Range<usize>,
    selection: Option<Range<usize>>,
}

impl ParagraphBuffer {
    /// Document with the cursor at its start.
    pub fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let mut paragraphs = Vec::new();
        let mut start = 0;
        for (i, c) in chars.iter().enumerate() {
            if *c == '\n' {
                paragraphs.push(start..i + 1);
                start = i + 1;
            }
        }
        if start < chars.len() || paragraphs.is_empty() {
            paragraphs.push(start..chars.len());
        }
        Self {
            chars,
            paragraphs,
            range: 0..0,
            selection: None,
        }
    }

    /// Document with the cursor collapsed at character `caret`.
    pub fn with_caret(text: &str, caret: usize) -> Self {
        let mut buffer = Self::new(text);
        let caret = caret.min(buffer.chars.len());
        buffer.range = caret..caret;
        buffer
    }

    /// Number of paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Current cursor range.
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Range committed by the last [`TextCursor::commit`].
    pub fn selection(&self) -> Option<Range<usize>> {
        self.selection.clone()
    }

    /// Text of the committed selection.
    pub fn selected_text(&self) -> Option<String> {
        self.selection
            .as_ref()
            .map(|range| self.chars[range.clone()].iter().collect())
    }

    /// Index of the paragraph containing character `pos`.
    pub fn paragraph_at(&self, pos: usize) -> usize {
        self.paragraphs
            .partition_point(|p| p.end <= pos)
            .min(self.paragraphs.len() - 1)
    }

    fn clamp_offset(&self, pos: isize) -> usize {
        usize::try_from(pos).unwrap_or(0).min(self.chars.len())
    }
}

#[allow(clippy::cast_possible_wrap)]
impl TextCursor for ParagraphBuffer {
    fn collapse(&mut self) {
        self.range.end = self.range.start;
    }

    fn expand_to_paragraph(&mut self) {
        let index = self.paragraph_at(self.range.start);
        self.range = self.paragraphs[index].clone();
    }

    fn move_by_paragraph(&mut self, direction: Direction) -> usize {
        let index = self.paragraph_at(self.range.start);
        let target = index
            .checked_add_signed(direction.sign())
            .filter(|t| *t < self.paragraphs.len());
        let Some(target) = target else {
            self.collapse();
            return 0;
        };
        let start = self.paragraphs[target].start;
        self.range = start..start;
        1
    }

    fn move_by_characters(&mut self, count: isize) -> isize {
        let from = self.range.start;
        let to = self.clamp_offset(from as isize + count);
        self.range = to..to;
        to as isize - from as isize
    }

    fn move_end_by_characters(&mut self, count: isize) -> isize {
        let from = self.range.end;
        let to = self.clamp_offset(from as isize + count).max(self.range.start);
        self.range.end = to;
        to as isize - from as isize
    }

    fn text(&self) -> String {
        self.chars[self.range.clone()].iter().collect()
    }

    fn commit(&mut self) {
        self.selection = Some(self.range.clone());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_split_keeps_newlines() {
        let mut buffer = ParagraphBuffer::new("one\ntwo\nthree");
        assert_eq!(buffer.paragraph_count(), 3);

        buffer.expand_to_paragraph();
        assert_eq!(buffer.text(), "one\n");

        assert_eq!(buffer.move_by_paragraph(Direction::Forward), 1);
        buffer.expand_to_paragraph();
        assert_eq!(buffer.text(), "two\n");

        assert_eq!(buffer.move_by_paragraph(Direction::Forward), 1);
        buffer.expand_to_paragraph();
        assert_eq!(buffer.text(), "three");
    }

    #[test]
    fn test_boundaries_report_zero() {
        let mut buffer = ParagraphBuffer::with_caret("first\nlast\n", 7);
        assert_eq!(buffer.paragraph_at(7), 1);
        assert_eq!(buffer.move_by_paragraph(Direction::Forward), 0);
        assert_eq!(buffer.range(), 7..7);

        assert_eq!(buffer.move_by_paragraph(Direction::Backward), 1);
        assert_eq!(buffer.move_by_paragraph(Direction::Backward), 0);
        assert_eq!(buffer.range(), 0..0);
    }

    #[test]
    fn test_empty_document_has_one_paragraph() {
        let mut buffer = ParagraphBuffer::new("");
        assert_eq!(buffer.paragraph_count(), 1);
        buffer.expand_to_paragraph();
        assert_eq!(buffer.text(), "");
        assert_eq!(buffer.move_by_paragraph(Direction::Forward), 0);
        assert_eq!(buffer.move_by_paragraph(Direction::Backward), 0);
    }

    #[test]
    fn test_character_moves_clamp_and_commit() {
        // Given: A paragraph with multi-byte characters
        let mut buffer = ParagraphBuffer::new("héllo wörld\n");
        buffer.expand_to_paragraph();

        // When: Narrowing to "wörld"
        buffer.collapse();
        assert_eq!(buffer.move_by_characters(6), 6);
        assert_eq!(buffer.move_end_by_characters(5), 5);
        buffer.commit();

        // Then: The selection covers the characters
        assert_eq!(buffer.selected_text().unwrap(), "wörld");
        assert_eq!(buffer.selection(), Some(6..11));

        assert_eq!(buffer.move_by_characters(-100), -6);
        assert_eq!(buffer.move_end_by_characters(100), 12);
        assert_eq!(buffer.move_end_by_characters(-100), -12);
    }

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Forward.sign(), 1);
        assert_eq!(Direction::Backward.sign(), -1);
        assert_eq!(Direction::Backward.to_string(), "backward");
    }
}
