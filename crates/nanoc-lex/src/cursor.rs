//! A minimal byte cursor over ASCII source text.
//!
//! The source language has no string or character literals, so the cursor
//! only ever needs to reason about single ASCII bytes — no UTF-8 decoding.

pub struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    pub fn peek_at(&self, offset: usize) -> u8 {
        *self.bytes.get(self.pos + offset).unwrap_or(&0)
    }

    pub fn advance(&mut self) -> u8 {
        let b = self.peek();
        self.pos += 1;
        b
    }

    /// A short printable snippet starting at `start`, used for diagnostics.
    pub fn snippet(&self, start: usize) -> String {
        let end = (start + 16).min(self.bytes.len());
        String::from_utf8_lossy(&self.bytes[start..end]).into_owned()
    }

    /// The exact source text of the byte range `[start, end)`.
    pub fn text(&self, start: usize, end: usize) -> &'a str {
        std::str::from_utf8(&self.bytes[start..end]).expect("ASCII source is valid UTF-8")
    }
}
