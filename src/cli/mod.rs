//! Command-line interface module.
//!
//! This module handles:
//! - Argument parsing via clap
//! - Payload loading (raw or hex, files or stdin)
//! - Output formatting (text tree, JSON)

mod args;
mod input;
mod output;

pub use args::{Args, TransportArg, DEFAULT_CLIENT_PORT};
pub use input::{decode_hex, input_name, read_payload, InputError, STDIN};
pub use output::{children_json, OutputFormat, OutputFormatter};
