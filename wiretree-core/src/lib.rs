//! # wiretree-core
//!
//! Engine for dissecting captured protocol payloads into field trees.
//!
//! A dissection takes an opaque byte buffer plus a little transport
//! metadata and produces a tree of typed, labeled fields, each tied to the
//! byte range it was decoded from. Malformed or truncated input never
//! aborts the host: reads are bounds-checked, undecodable values become
//! placeholder fields with expert notes attached, and a dissector that
//! fails part way keeps the tree it built so far.
//!
//! ## Quick Start
//!
//! ```rust
//! use wiretree_core::prelude::*;
//!
//! // Create a registry with all built-in dissectors
//! let registry = default_registry().unwrap();
//!
//! // A response from a Kismet server
//! let tvb = Tvb::from_static(b"*TIME: 1199999999\n");
//! let mut ctx = PacketContext::tcp(2501, 40000);
//!
//! let dissection = registry.dispatch_ports(&tvb, &mut ctx);
//! assert_eq!(dissection.columns.protocol, "kismet");
//! print!("{}", dissection.tree.to_text());
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                        wiretree-core                                |
//! +---------------------------------------------------------------------+
//! |  buffer/     - Tvb bounded buffer, display-text escaping            |
//! |  tokenize    - Line and token scanning for text protocols           |
//! |  schema/     - HeaderField, FieldKind (field registration)          |
//! |  tree/       - FieldTree arena, FieldValue, text rendering          |
//! |  expert      - ExpertInfo, severity-tagged notes                    |
//! |  protocol/   - Dissector trait, Registry, built-in dissectors       |
//! |  config      - Registration-time preferences                        |
//! |  error       - Error types                                          |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Concurrency
//!
//! A [`Registry`](protocol::Registry) is built once and is immutable
//! afterwards. It is `Send + Sync`, so any number of threads may dispatch
//! through a shared reference. Each dispatch allocates its own
//! [`FieldTree`](tree::FieldTree); nothing is carried between packets.
//!
//! ## Supported Protocols
//!
//! | Protocol | Transport |
//! |----------|-----------|
//! | Kismet client/server | TCP 2501 (configurable) |
//! | Data | fallback |

pub mod buffer;
pub mod config;
pub mod error;
pub mod expert;
pub mod prelude;
pub mod protocol;
pub mod schema;
pub mod tokenize;
pub mod tree;

// Re-export commonly used types at crate root for convenience
pub use buffer::{format_text, Tvb};
pub use config::Preferences;
pub use error::{BufferError, DissectError, RegistryError, SoftError, TreeError};
pub use expert::{ExpertGroup, ExpertInfo, ExpertNote, Severity};
pub use protocol::{
    default_registry, registry_with_preferences, Columns, Dissection, Dissector, PacketContext,
    Registry, RegistryBuilder, Transport, TransportKey,
};
pub use schema::{FieldKind, HeaderField};
pub use tokenize::{get_token, lines, token_matches, trim_sentinels, Line, Token};
pub use tree::{ByteRange, FieldTree, FieldValue, Item, ItemId, ItemKind};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
