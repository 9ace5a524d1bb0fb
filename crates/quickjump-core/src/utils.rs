//! Utility functions for safe string offset handling.
//!
//! Regex matches report UTF-8 byte offsets, while host cursors move by
//! characters. The conversion does not panic on offsets that fall inside a
//! multi-byte character.

/// Convert a byte offset into a character offset.
///
/// Offsets past the end clamp to the character count; an offset inside a
/// multi-byte character counts that character.
///
/// # Examples
/// ```
/// use quickjump_core::utils::byte_to_char_offset;
///
/// let text = "héllo";
/// assert_eq!(byte_to_char_offset(text, 3), 2);
/// assert_eq!(byte_to_char_offset(text, 100), 5);
/// ```
pub fn byte_to_char_offset(s: &str, byte_offset: usize) -> usize {
    s.char_indices()
        .take_while(|(i, _)| *i < byte_offset)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_offsets_are_identity() {
        let text = "the catalog store";
        for i in 0..=text.len() {
            assert_eq!(byte_to_char_offset(text, i), i);
        }
    }

    #[test]
    fn test_multibyte_offsets() {
        let text = "Hello 世界!";
        // "世" starts at byte 6, "界" at byte 9, "!" at byte 12
        assert_eq!(byte_to_char_offset(text, 6), 6);
        assert_eq!(byte_to_char_offset(text, 9), 7);
        assert_eq!(byte_to_char_offset(text, 12), 8);
    }

    #[test]
    fn test_offset_inside_character() {
        let text = "é";
        assert_eq!(byte_to_char_offset(text, 1), 1);
        assert_eq!(byte_to_char_offset(text, 0), 0);
    }
}
