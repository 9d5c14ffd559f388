//! Header field descriptor.

use super::FieldKind;

/// Static description of one field a dissector can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderField {
    /// Display name (e.g., "Server name")
    pub name: &'static str,

    /// Protocol-qualified identifier (e.g., "kismet.server_name")
    pub abbrev: &'static str,

    /// Semantic type
    pub kind: FieldKind,

    /// Optional description for documentation
    pub description: Option<&'static str>,
}

impl HeaderField {
    /// Create a new field descriptor.
    pub const fn new(name: &'static str, abbrev: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            abbrev,
            kind,
            description: None,
        }
    }

    /// Add a description to the field.
    pub const fn with_description(mut self, desc: &'static str) -> Self {
        self.description = Some(desc);
        self
    }

    /// Protocol part of the abbreviation (text before the first dot).
    pub fn protocol(&self) -> &'static str {
        match self.abbrev.split_once('.') {
            Some((proto, _)) => proto,
            None => self.abbrev,
        }
    }
}
