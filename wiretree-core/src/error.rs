//! Error types for wiretree-core.
//!
//! This module provides structured error types for all wiretree-core operations:
//!
//! - [`BufferError`] - Out-of-bounds access on a [`Tvb`](crate::buffer::Tvb)
//! - [`TreeError`] - Rejected field-tree insertions
//! - [`RegistryError`] - Conflicts detected while registering dissectors
//! - [`DissectError`] - How a dissector reports that it did not finish normally
//! - [`SoftError`] - A field whose bytes do not decode into its semantic type
//!
//! All errors implement `std::error::Error` and can be converted to `anyhow::Error`.

use thiserror::Error;

use crate::protocol::TransportKey;

/// Errors raised by bounded buffer reads.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// The requested range does not fit inside the buffer
    #[error("offset {offset} length {length} exceeds buffer of {available} bytes")]
    OutOfBounds {
        offset: usize,
        length: usize,
        available: usize,
    },
}

/// Errors raised when an item cannot be added to a field tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Item range falls outside the dissected buffer
    #[error("{abbrev}: range {offset}+{length} exceeds buffer of {available} bytes")]
    OutOfBounds {
        abbrev: &'static str,
        offset: usize,
        length: usize,
        available: usize,
    },

    /// Only generated fields may have an empty byte range
    #[error("{abbrev}: zero-length range at offset {offset} on a non-generated field")]
    EmptyRange { abbrev: &'static str, offset: usize },

    /// Handle does not refer to an item of this tree
    #[error("unknown tree item {0}")]
    UnknownItem(usize),
}

/// Errors raised while building a [`Registry`](crate::protocol::Registry).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The same protocol claimed the same transport key twice
    #[error("{protocol}: already registered on {key}")]
    Conflict {
        protocol: &'static str,
        key: TransportKey,
    },

    /// Two different dissectors share one protocol identifier
    #[error("protocol {protocol} registered by two different dissectors")]
    DuplicateProtocol { protocol: &'static str },

    /// A header field abbreviation is declared twice
    #[error("header field {abbrev} declared more than once")]
    DuplicateField { abbrev: &'static str },

    /// An expert info abbreviation is declared twice
    #[error("expert info {abbrev} declared more than once")]
    DuplicateExpertInfo { abbrev: &'static str },
}

/// Outcome of a dissector that did not complete normally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DissectError {
    /// The buffer is not this protocol; the dispatcher tries the next candidate
    #[error("dissector declined the packet")]
    Declined,

    /// The buffer claimed to be this protocol but could not be decoded
    #[error("malformed packet: {0}")]
    Malformed(String),
}

impl From<BufferError> for DissectError {
    fn from(err: BufferError) -> Self {
        DissectError::Malformed(err.to_string())
    }
}

impl From<TreeError> for DissectError {
    fn from(err: TreeError) -> Self {
        DissectError::Malformed(err.to_string())
    }
}

/// A recognized field whose wire bytes do not decode into their semantic type.
///
/// Soft errors never abort dissection: the caller inserts a placeholder
/// field and attaches an expert note.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SoftError {
    /// Text is not an unsigned decimal number
    #[error("not an unsigned decimal number: {0:?}")]
    NotANumber(String),

    /// Number is outside the representable range
    #[error("value {0} is out of range")]
    OutOfRange(u64),
}
