//! Character-level cursor over formula source.
//!
//! The scanner works directly on chars rather than a token stream: the
//! operator vocabulary is runtime-mutable, so tokens cannot be classified
//! ahead of the grammar lookup the parser performs.

/// Whitespace chars the scanner skips between tokens.
const WHITESPACE: [char; 4] = [' ', '\t', '\n', '\r'];

/// A cursor over source text tracking the current byte position.
#[derive(Clone, Debug)]
pub struct Cursor<'src> {
    src: &'src str,
    pos: usize,
}

impl<'src> Cursor<'src> {
    /// Create a cursor at the start of `src`.
    pub fn new(src: &'src str) -> Self {
        Cursor { src, pos: 0 }
    }

    /// Current byte offset.
    #[inline]
    pub fn pos(&self) -> u32 {
        self.pos as u32
    }

    /// Whole source text.
    #[inline]
    pub fn source(&self) -> &'src str {
        self.src
    }

    /// Check if the cursor has consumed all input.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// Peek the current char without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    /// Peek the char at a byte offset past the current position.
    #[inline]
    pub fn peek_at(&self, byte_offset: usize) -> Option<char> {
        self.src.get(self.pos + byte_offset..)?.chars().next()
    }

    /// Consume and return the current char.
    #[inline]
    pub fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Consume the current char if it equals `expected`.
    #[inline]
    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    /// Up to `n` chars starting at the current position, as a slice.
    pub fn peek_chars(&self, n: usize) -> &'src str {
        let rest = &self.src[self.pos..];
        match rest.char_indices().nth(n) {
            Some((end, _)) => &rest[..end],
            None => rest,
        }
    }

    /// Advance past a slice previously returned by [`Cursor::peek_chars`].
    #[inline]
    pub fn advance_str(&mut self, s: &str) {
        self.pos += s.len();
    }

    /// Skip whitespace (space, tab, newline, carriage return).
    pub fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if WHITESPACE.contains(&ch) {
                self.pos += ch.len_utf8();
            } else {
                break;
            }
        }
    }

    /// Slice of the source between two byte offsets.
    #[inline]
    pub fn slice(&self, start: u32, end: u32) -> &'src str {
        &self.src[start as usize..end as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_and_pos() {
        let mut c = Cursor::new("ab");
        assert_eq!(c.bump(), Some('a'));
        assert_eq!(c.pos(), 1);
        assert_eq!(c.bump(), Some('b'));
        assert_eq!(c.bump(), None);
        assert!(c.is_eof());
    }

    #[test]
    fn skip_whitespace_all_four() {
        let mut c = Cursor::new(" \t\n\rx");
        c.skip_whitespace();
        assert_eq!(c.peek(), Some('x'));
    }

    #[test]
    fn peek_chars_clamps_at_eof() {
        let c = Cursor::new("ab");
        assert_eq!(c.peek_chars(3), "ab");
        assert_eq!(c.peek_chars(1), "a");
        assert_eq!(c.peek_chars(0), "");
    }

    #[test]
    fn multibyte_chars() {
        let mut c = Cursor::new("λx");
        assert_eq!(c.peek_chars(1), "λ");
        assert_eq!(c.bump(), Some('λ'));
        assert_eq!(c.pos(), 2);
        assert_eq!(c.peek(), Some('x'));
    }

    #[test]
    fn peek_at_multibyte_boundary() {
        let c = Cursor::new("λx");
        // offset inside the two-byte char is not a boundary
        assert_eq!(c.peek_at(1), None);
        assert_eq!(c.peek_at(2), Some('x'));
    }
}
