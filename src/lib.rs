//! wiretree - Dissect protocol payloads into field trees.
//!
//! This library holds the command-line front end of the `wiretree` binary.
//! The dissection engine itself lives in [`wiretree_core`].
//!
//! # Example
//!
//! ```no_run
//! use wiretree::cli::{read_payload, OutputFormat, OutputFormatter};
//! use wiretree_core::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let registry = default_registry()?;
//!     let payload = read_payload("payload.bin".as_ref(), false)?;
//!     let mut ctx = PacketContext::tcp(2501, 40000);
//!     let dissection = registry.dispatch_ports(&Tvb::new(payload), &mut ctx);
//!     let formatter = OutputFormatter::new(OutputFormat::Text);
//!     formatter.write("payload.bin", &dissection, &mut std::io::stdout())?;
//!     Ok(())
//! }
//! ```

pub mod cli;

pub use wiretree_core;
