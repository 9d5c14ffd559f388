//! Bounded packet buffer.
//!
//! [`Tvb`] is an immutable, cheaply clonable view over captured bytes.
//! Every read is range-checked and reports [`BufferError::OutOfBounds`]
//! instead of touching memory past the end of the buffer, so a malformed
//! length in a protocol can never turn into an out-of-bounds read.

mod text;

use bytes::Bytes;

use crate::error::BufferError;

pub use text::format_text;

/// Line terminator bytes recognized by [`Tvb::find_line_end`].
const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Immutable bounds-checked byte source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tvb {
    data: Bytes,
}

impl Tvb {
    /// Create a buffer over the given bytes.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// Create a buffer over a static byte string (handy for tests).
    pub const fn from_static(data: &'static [u8]) -> Self {
        Self {
            data: Bytes::from_static(data),
        }
    }

    /// Total captured length.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check whether `offset` addresses a byte inside the buffer.
    #[inline]
    pub fn offset_exists(&self, offset: usize) -> bool {
        offset < self.data.len()
    }

    /// Validate that `offset..offset + length` lies inside the buffer.
    pub fn ensure_range(&self, offset: usize, length: usize) -> Result<(), BufferError> {
        match offset.checked_add(length) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(BufferError::OutOfBounds {
                offset,
                length,
                available: self.data.len(),
            }),
        }
    }

    /// Borrow `length` bytes starting at `offset`.
    ///
    /// All higher-level accessors route through here.
    pub fn read(&self, offset: usize, length: usize) -> Result<&[u8], BufferError> {
        self.ensure_range(offset, length)?;
        Ok(&self.data[offset..offset + length])
    }

    /// Borrow everything from `offset` to the end of the buffer.
    pub fn read_remaining(&self, offset: usize) -> Result<&[u8], BufferError> {
        let length = self.remaining(offset)?;
        self.read(offset, length)
    }

    /// Zero-copy handle to `length` bytes starting at `offset`.
    pub fn bytes(&self, offset: usize, length: usize) -> Result<Bytes, BufferError> {
        self.ensure_range(offset, length)?;
        Ok(self.data.slice(offset..offset + length))
    }

    /// Read one byte.
    pub fn get_u8(&self, offset: usize) -> Result<u8, BufferError> {
        self.read(offset, 1).map(|b| b[0])
    }

    /// Bytes left from `offset` to the end; `offset == len` yields zero.
    pub fn remaining(&self, offset: usize) -> Result<usize, BufferError> {
        self.data
            .len()
            .checked_sub(offset)
            .ok_or(BufferError::OutOfBounds {
                offset,
                length: 0,
                available: self.data.len(),
            })
    }

    /// Find the end of the line starting at `offset`.
    ///
    /// Returns `(line_length, next_offset)`: the line length excludes the
    /// terminator (CR, LF or CRLF) and `next_offset` is where the following
    /// line begins. A final unterminated run is a line that ends at the end
    /// of the buffer. Fails if `offset` is not inside the buffer.
    pub fn find_line_end(&self, offset: usize) -> Result<(usize, usize), BufferError> {
        if !self.offset_exists(offset) {
            return Err(BufferError::OutOfBounds {
                offset,
                length: 1,
                available: self.data.len(),
            });
        }

        let rest = &self.data[offset..];
        match rest.iter().position(|&b| b == CR || b == LF) {
            None => Ok((rest.len(), self.data.len())),
            Some(eol) => {
                let terminator = if rest[eol] == CR && rest.get(eol + 1) == Some(&LF) {
                    2
                } else {
                    1
                };
                Ok((eol, offset + eol + terminator))
            }
        }
    }

    /// Render `length` bytes at `offset` as display-safe text.
    ///
    /// Never fails: a range that overruns the buffer is clipped to what
    /// is available.
    pub fn format_text(&self, offset: usize, length: usize) -> String {
        let start = offset.min(self.data.len());
        let end = start.saturating_add(length).min(self.data.len());
        format_text(&self.data[start..end])
    }

    /// Borrow the whole buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for Tvb {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<Bytes> for Tvb {
    fn from(data: Bytes) -> Self {
        Self { data }
    }
}

impl From<&'static [u8]> for Tvb {
    fn from(data: &'static [u8]) -> Self {
        Self::from_static(data)
    }
}
