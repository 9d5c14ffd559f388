//! Dissector framework.
//!
//! This module provides:
//! - [`Dissector`] trait for implementing protocol dissectors
//! - [`RegistryBuilder`] and [`Registry`] for registering and dispatching them
//! - [`PacketContext`] with the per-packet metadata and summary columns
//! - Built-in dissectors
//!
//! ## Built-in Dissectors
//!
//! | Protocol | Registered on | Notes |
//! |----------|---------------|-------|
//! | `kismet` | `tcp.port == 2501` | Kismet client/server text protocol |
//! | `data` | (fallback) | Raw bytes nobody else claimed |
//!
//! ## Example
//!
//! ```rust
//! use wiretree_core::buffer::Tvb;
//! use wiretree_core::protocol::{default_registry, PacketContext};
//!
//! let registry = default_registry().unwrap();
//! let tvb = Tvb::from_static(b"*TIME: 1199999999\n");
//! let mut ctx = PacketContext::tcp(2501, 40000);
//!
//! let dissection = registry.dispatch_ports(&tvb, &mut ctx);
//! assert_eq!(dissection.protocol, "kismet");
//! assert_eq!(dissection.consumed, tvb.len());
//! ```

mod context;
mod data;
mod kismet;
mod registry;

// Test utilities (only compiled for tests)
#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;

pub use context::{Columns, PacketContext, Transport, TransportKey};
pub use data::DataDissector;
pub use kismet::{classify, looks_like_text, KismetDissector, MessageKind, KISMET_TCP_PORT};
pub use registry::{Dissection, Dissector, Registry, RegistryBuilder};

use crate::config::Preferences;
use crate::error::RegistryError;

/// Header fields and expert infos of the built-in dissectors.
pub mod fields {
    pub use super::data::{HF_DATA, HF_DATA_LEN, HF_DATA_PROTO};
    pub use super::kismet::{
        EI_FIELD_MISSING, EI_TIME_INVALID, HF_BUILD_REVISION, HF_EXTENDED_VERSION_STRING,
        HF_KISMET, HF_REQUEST, HF_RESPONSE, HF_SERVER_NAME, HF_START_TIME, HF_TIME,
        HF_UNKNOWN_FIELD, HF_VERSION,
    };
}

/// Create a registry with all built-in dissectors on their default ports.
pub fn default_registry() -> Result<Registry, RegistryError> {
    registry_with_preferences(&Preferences::default())
}

/// Create a registry with all built-in dissectors, honoring `prefs`.
pub fn registry_with_preferences(prefs: &Preferences) -> Result<Registry, RegistryError> {
    let mut builder = Registry::builder();
    builder.register(
        TransportKey::tcp(prefs.kismet_tcp_port),
        Arc::new(KismetDissector),
    )?;
    Ok(builder.build())
}
