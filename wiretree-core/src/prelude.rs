//! Convenient re-exports for common usage.
//!
//! This module provides a curated set of the most commonly used types
//! from wiretree-core, allowing you to import them with a single `use` statement.
//!
//! # Example
//!
//! ```rust
//! use wiretree_core::prelude::*;
//!
//! // Create a registry with all built-in dissectors
//! let registry = default_registry().unwrap();
//! assert!(registry.field("kismet.time").is_some());
//! ```

// Buffer and scanning
pub use crate::buffer::Tvb;
pub use crate::tokenize::{lines, Line, Token};

// Field registration
pub use crate::expert::{ExpertGroup, ExpertInfo, Severity};
pub use crate::schema::{FieldKind, HeaderField};

// Tree types
pub use crate::tree::{FieldTree, FieldValue, ItemId};

// Dissector types
pub use crate::config::Preferences;
pub use crate::protocol::{
    default_registry, registry_with_preferences, Dissection, Dissector, PacketContext, Registry,
    RegistryBuilder, Transport, TransportKey,
};

// Error types
pub use crate::error::{DissectError, RegistryError};
