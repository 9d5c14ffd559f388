//! Expert info: severity-tagged diagnostics attached to tree items.
//!
//! Dissectors register [`ExpertInfo`] descriptors alongside their header
//! fields. During dissection, notes are attached to items through
//! [`FieldTree::add_expert`](crate::tree::FieldTree::add_expert) or
//! [`FieldTree::attach_note`](crate::tree::FieldTree::attach_note). A note
//! never changes the decoded value of the item it annotates and never stops
//! dissection.

use compact_str::CompactString;

use crate::tree::ItemId;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What area a diagnostic concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpertGroup {
    /// Packet violates the rules of its protocol
    Protocol,
    /// Packet could not be decoded as far as expected
    Malformed,
}

impl ExpertGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpertGroup::Protocol => "Protocol",
            ExpertGroup::Malformed => "Malformed",
        }
    }
}

impl std::fmt::Display for ExpertGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of one diagnostic a dissector can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpertInfo {
    /// Protocol-qualified identifier (e.g., "kismet.time.invalid")
    pub abbrev: &'static str,
    pub group: ExpertGroup,
    pub severity: Severity,
    /// Default message
    pub summary: &'static str,
}

impl ExpertInfo {
    pub const fn new(
        abbrev: &'static str,
        group: ExpertGroup,
        severity: Severity,
        summary: &'static str,
    ) -> Self {
        Self {
            abbrev,
            group,
            severity,
            summary,
        }
    }
}

/// Raised by the dispatcher when a dissector fails part way through.
pub static EI_MALFORMED: ExpertInfo = ExpertInfo::new(
    "wiretree.malformed",
    ExpertGroup::Malformed,
    Severity::Error,
    "Malformed packet",
);

/// A diagnostic attached to one tree item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpertNote {
    /// Item the note is attached to.
    pub item: ItemId,
    pub severity: Severity,
    pub group: ExpertGroup,
    /// Identifier of the registered [`ExpertInfo`], if the note came from one.
    pub abbrev: Option<&'static str>,
    pub message: CompactString,
}

impl std::fmt::Display for ExpertNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[Expert Info ({}/{}): {}]",
            self.severity, self.group, self.message
        )
    }
}
