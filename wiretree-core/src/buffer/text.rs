//! Display-safe rendering of raw packet bytes.

use std::fmt::Write;

/// Escape raw bytes for display.
///
/// Printable ASCII passes through unchanged; the usual C control escapes
/// (`\a \b \f \n \r \t \v`) and a doubled backslash are used where they
/// apply; everything else becomes `\xNN`.
pub fn format_text(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            0x20..=0x7e => out.push(b as char),
            0x07 => out.push_str("\\a"),
            0x08 => out.push_str("\\b"),
            0x0c => out.push_str("\\f"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x0b => out.push_str("\\v"),
            _ => {
                // Writing to a String cannot fail.
                let _ = write!(out, "\\x{b:02x}");
            }
        }
    }
    out
}
