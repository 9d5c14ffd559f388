//! Decoded field values.
//!
//! Values own their data. Byte values are [`Bytes`] handles into the packet
//! buffer, so keeping them around does not copy the payload.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use compact_str::CompactString;

use crate::error::SoftError;

/// Display format for absolute times.
pub const ABSOLUTE_TIME_FORMAT: &str = "%b %e, %Y %H:%M:%S UTC";

/// Decoded value of a tree item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Boolean value
    Bool(bool),
    /// Unsigned integer
    UInt64(u64),
    /// Display string (already escaped for display)
    String(CompactString),
    /// Zero-copy byte range of the packet
    Bytes(Bytes),
    /// Absolute time; `None` when the wire text could not be decoded
    AbsoluteTime(Option<DateTime<Utc>>),
    /// No value (protocol items and text labels)
    None,
}

impl FieldValue {
    /// Create a string value.
    pub fn string(value: impl Into<CompactString>) -> Self {
        FieldValue::String(value.into())
    }

    /// Check if this item carries no value.
    pub fn is_none(&self) -> bool {
        matches!(self, FieldValue::None)
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as u64.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::UInt64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as str reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Try to get as bytes reference.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Try to get as a decoded time.
    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::AbsoluteTime(t) => *t,
            _ => None,
        }
    }

    /// Default display text for this value.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Bool(true) => "True".to_string(),
            FieldValue::Bool(false) => "False".to_string(),
            FieldValue::UInt64(v) => v.to_string(),
            FieldValue::String(s) => s.to_string(),
            FieldValue::Bytes(b) => hex::encode(b),
            FieldValue::AbsoluteTime(Some(t)) => format_absolute_time(t),
            FieldValue::AbsoluteTime(None) | FieldValue::None => String::new(),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// Render a time the way absolute-time fields are displayed.
pub fn format_absolute_time(t: &DateTime<Utc>) -> String {
    t.format(ABSOLUTE_TIME_FORMAT).to_string()
}

/// Decode an unsigned decimal number.
///
/// The whole text must be ASCII digits: no sign, no surrounding
/// whitespace, no trailing garbage.
pub fn parse_u64(text: &[u8]) -> Result<u64, SoftError> {
    let not_a_number = || SoftError::NotANumber(String::from_utf8_lossy(text).into_owned());

    if text.is_empty() || !text.iter().all(u8::is_ascii_digit) {
        return Err(not_a_number());
    }
    text.iter().try_fold(0u64, |acc, &d| {
        acc.checked_mul(10)
            .and_then(|acc| acc.checked_add(u64::from(d - b'0')))
            .ok_or_else(not_a_number)
    })
}

/// Decode seconds since the Unix epoch from decimal text.
pub fn parse_epoch_seconds(text: &[u8]) -> Result<DateTime<Utc>, SoftError> {
    let secs = parse_u64(text)?;
    let signed = i64::try_from(secs).map_err(|_| SoftError::OutOfRange(secs))?;
    DateTime::<Utc>::from_timestamp(signed, 0).ok_or(SoftError::OutOfRange(secs))
}
