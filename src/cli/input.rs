//! Payload loading.
//!
//! Each input is one packet payload, read either as raw bytes or as hex
//! text (whitespace and an optional `0x` prefix per group are ignored).

use std::io::Read;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;

/// Errors raised while loading payloads.
#[derive(Error, Debug)]
pub enum InputError {
    /// Reading the file or stdin failed
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Hex text that does not decode
    #[error("invalid hex input: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Path that selects stdin.
pub const STDIN: &str = "-";

/// Display name of an input.
pub fn input_name(path: &Path) -> String {
    if path.as_os_str() == STDIN {
        "<stdin>".to_string()
    } else {
        path.display().to_string()
    }
}

/// Read one payload from a file or stdin.
pub fn read_payload(path: &Path, hex: bool) -> Result<Bytes, InputError> {
    let io_err = |source| InputError::Io {
        path: path.to_path_buf(),
        source,
    };

    let raw = if path.as_os_str() == STDIN {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf).map_err(io_err)?;
        buf
    } else {
        std::fs::read(path).map_err(io_err)?
    };

    if hex {
        decode_hex(&String::from_utf8_lossy(&raw)).map(Bytes::from)
    } else {
        Ok(Bytes::from(raw))
    }
}

/// Decode hex text into bytes.
///
/// Groups are separated by whitespace; digit positions in errors count
/// from the first digit with separators and prefixes removed.
pub fn decode_hex(text: &str) -> Result<Vec<u8>, InputError> {
    let digits: String = text
        .split_whitespace()
        .map(|word| {
            word.strip_prefix("0x")
                .or_else(|| word.strip_prefix("0X"))
                .unwrap_or(word)
        })
        .collect();
    Ok(hex::decode(digits)?)
}
