//! Line and token scanning for text-based protocols.
//!
//! Scanning is done with pure functions that take an immutable buffer (or
//! line slice) plus an offset and return `(length, next)` style results.
//! No cursor is shared between calls, so a caller can never drift out of
//! sync with the underlying bytes.

use crate::buffer::Tvb;
use crate::error::BufferError;

/// A line inside a buffer, excluding its terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    /// Absolute offset of the first byte of the line.
    pub offset: usize,
    /// Length of the line without the terminator.
    pub length: usize,
    /// Absolute offset of the following line (or the buffer length).
    pub next_offset: usize,
}

impl Line {
    /// Scan the line that starts at `offset`.
    pub fn at(tvb: &Tvb, offset: usize) -> Result<Self, BufferError> {
        let (length, next_offset) = tvb.find_line_end(offset)?;
        Ok(Self {
            offset,
            length,
            next_offset,
        })
    }

    /// Absolute offset one past the last byte of the line text.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Line text without its terminator.
    pub fn bytes<'a>(&self, tvb: &'a Tvb) -> Result<&'a [u8], BufferError> {
        tvb.read(self.offset, self.length)
    }

    /// Line length including its terminator.
    pub fn total_length(&self) -> usize {
        self.next_offset - self.offset
    }

    /// Iterate over the space-delimited tokens of this line.
    pub fn tokens<'a>(&self, tvb: &'a Tvb) -> Result<Tokens<'a>, BufferError> {
        Ok(Tokens {
            line: self.bytes(tvb)?,
            base: self.offset,
            cursor: 0,
        })
    }
}

/// A space-delimited token, positioned relative to some base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Offset of the first token byte.
    pub offset: usize,
    /// Token length; zero means the line holds no more tokens.
    pub length: usize,
    /// Offset where scanning for the next token should resume.
    pub next_offset: usize,
}

impl Token {
    /// Check whether this is the end-of-line marker.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Shift a line-relative token to absolute buffer offsets.
    fn rebase(self, base: usize) -> Self {
        Self {
            offset: base + self.offset,
            length: self.length,
            next_offset: base + self.next_offset,
        }
    }
}

/// Tokens are separated by spaces only; a tab is part of a token.
#[inline]
fn is_separator(b: u8) -> bool {
    b == b' '
}

/// Scan the first token of `line`.
///
/// Leading spaces are skipped, then the token runs to the next space or
/// the end of the line. `next_offset` points past any spaces that follow
/// the token. At end of input the token has
/// length zero and both offsets equal `line.len()`.
pub fn get_token(line: &[u8]) -> Token {
    let start = line
        .iter()
        .position(|&b| !is_separator(b))
        .unwrap_or(line.len());
    let end = line[start..]
        .iter()
        .position(|&b| is_separator(b))
        .map_or(line.len(), |pos| start + pos);
    let next = line[end..]
        .iter()
        .position(|&b| !is_separator(b))
        .map_or(line.len(), |pos| end + pos);

    Token {
        offset: start,
        length: end - start,
        next_offset: next,
    }
}

/// Prefix comparison used for record-type keywords.
///
/// Case-sensitive; the token must be at least as long as the literal.
pub fn token_matches(token: &[u8], literal: &[u8]) -> bool {
    token.starts_with(literal)
}

/// Strip one sentinel byte from each end of a delimited value.
///
/// `\x01name\x01` becomes `name`; values shorter than two bytes collapse
/// to the empty slice.
pub fn trim_sentinels(value: &[u8]) -> &[u8] {
    if value.len() < 2 {
        &[]
    } else {
        &value[1..value.len() - 1]
    }
}

/// Iterator over the lines of a buffer.
#[derive(Debug, Clone)]
pub struct Lines<'a> {
    tvb: &'a Tvb,
    offset: usize,
}

/// Iterate over every line of `tvb`, from the start of the buffer.
pub fn lines(tvb: &Tvb) -> Lines<'_> {
    Lines { tvb, offset: 0 }
}

impl Iterator for Lines<'_> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        // find_line_end only fails past the end, which is our stop condition.
        let line = Line::at(self.tvb, self.offset).ok()?;
        self.offset = line.next_offset;
        Some(line)
    }
}

/// Iterator over the tokens of one line, yielding absolute offsets.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    line: &'a [u8],
    base: usize,
    cursor: usize,
}

impl<'a> Tokens<'a> {
    /// Take the next token, or the zero-length end marker.
    ///
    /// Unlike [`Iterator::next`], this reports end of line as a token so
    /// callers can attach it to a position.
    pub fn next_token(&mut self) -> (Token, &'a [u8]) {
        let rest = &self.line[self.cursor..];
        let token = get_token(rest).rebase(self.cursor);
        self.cursor = token.next_offset;
        let bytes = &self.line[token.offset..token.offset + token.length];
        (token.rebase(self.base), bytes)
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = (Token, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let (token, bytes) = self.next_token();
        if token.is_empty() {
            None
        } else {
            Some((token, bytes))
        }
    }
}
