//! Dissector registry and dispatcher.
//!
//! Registration happens once, through a [`RegistryBuilder`]. Sealing the
//! builder with [`RegistryBuilder::build`] yields an immutable [`Registry`]
//! that can be shared between threads and used for any number of
//! concurrent dispatches.

use std::collections::BTreeMap;
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::buffer::Tvb;
use crate::error::{DissectError, RegistryError};
use crate::expert::{ExpertInfo, EI_MALFORMED};
use crate::schema::HeaderField;
use crate::tree::{FieldTree, ItemId};

use super::{Columns, DataDissector, PacketContext, TransportKey};

/// Core trait all protocol dissectors must implement.
pub trait Dissector: Send + Sync {
    /// Unique identifier for this protocol (e.g., "kismet").
    fn protocol_id(&self) -> &'static str;

    /// Human-readable display name.
    fn display_name(&self) -> &'static str {
        self.protocol_id()
    }

    /// Header fields this dissector can add to a tree.
    fn fields(&self) -> &'static [&'static HeaderField];

    /// Expert infos this dissector can raise.
    fn expert_infos(&self) -> &'static [&'static ExpertInfo] {
        &[]
    }

    /// Try to dissect `tvb`, adding items beneath `parent`.
    ///
    /// Returns the number of bytes consumed. `Ok(0)` and
    /// [`DissectError::Declined`] both mean "not this protocol"; the
    /// dispatcher then moves on to the next candidate.
    fn try_dissect(
        &self,
        tvb: &Tvb,
        ctx: &mut PacketContext,
        tree: &mut FieldTree,
        parent: ItemId,
    ) -> Result<usize, DissectError>;
}

/// Result of a dispatch that some dissector accepted.
#[derive(Debug, Clone)]
pub struct Dissection {
    /// Protocol that accepted the packet.
    pub protocol: &'static str,
    /// Bytes consumed, never more than the buffer length.
    pub consumed: usize,
    pub tree: FieldTree,
    pub columns: Columns,
}

type Candidates = SmallVec<[Arc<dyn Dissector>; 2]>;

/// Mutable registration phase of a [`Registry`].
pub struct RegistryBuilder {
    protocols: Vec<Arc<dyn Dissector>>,
    table: BTreeMap<TransportKey, Candidates>,
    fields: BTreeMap<&'static str, &'static HeaderField>,
    experts: BTreeMap<&'static str, &'static ExpertInfo>,
    fallback: Arc<dyn Dissector>,
}

impl RegistryBuilder {
    /// Create a builder that knows only the generic data dissector.
    pub fn new() -> Self {
        let fallback: Arc<dyn Dissector> = Arc::new(DataDissector);
        let mut builder = Self {
            protocols: Vec::new(),
            table: BTreeMap::new(),
            fields: BTreeMap::new(),
            experts: BTreeMap::new(),
            fallback: Arc::clone(&fallback),
        };
        builder.experts.insert(EI_MALFORMED.abbrev, &EI_MALFORMED);
        // The data dissector's abbrevs are its own and cannot collide yet.
        let _ = builder.register_protocol(fallback);
        builder
    }

    /// Declare a protocol, its header fields and expert infos.
    ///
    /// Registering the same dissector instance again is a no-op.
    pub fn register_protocol(
        &mut self,
        dissector: Arc<dyn Dissector>,
    ) -> Result<(), RegistryError> {
        let protocol = dissector.protocol_id();
        if let Some(existing) = self.protocol(protocol) {
            if Arc::ptr_eq(existing, &dissector) {
                return Ok(());
            }
            return Err(RegistryError::DuplicateProtocol { protocol });
        }

        let fields = dissector.fields();
        for (i, hf) in fields.iter().enumerate() {
            if self.fields.contains_key(hf.abbrev)
                || fields[..i].iter().any(|other| other.abbrev == hf.abbrev)
            {
                return Err(RegistryError::DuplicateField { abbrev: hf.abbrev });
            }
        }
        let experts = dissector.expert_infos();
        for (i, ei) in experts.iter().enumerate() {
            if self.experts.contains_key(ei.abbrev)
                || experts[..i].iter().any(|other| other.abbrev == ei.abbrev)
            {
                return Err(RegistryError::DuplicateExpertInfo { abbrev: ei.abbrev });
            }
        }

        self.fields.extend(fields.iter().map(|hf| (hf.abbrev, *hf)));
        self.experts.extend(experts.iter().map(|ei| (ei.abbrev, *ei)));
        debug!(protocol, fields = fields.len(), "registered protocol");
        self.protocols.push(dissector);
        Ok(())
    }

    /// Register `dissector` as a candidate for `key`.
    ///
    /// Candidates for one key are tried in registration order. Claiming a
    /// key the same protocol already holds is a [`RegistryError::Conflict`].
    pub fn register(
        &mut self,
        key: TransportKey,
        dissector: Arc<dyn Dissector>,
    ) -> Result<(), RegistryError> {
        let protocol = dissector.protocol_id();
        self.register_protocol(Arc::clone(&dissector))?;

        let candidates = self.table.entry(key).or_default();
        if candidates.iter().any(|d| d.protocol_id() == protocol) {
            warn!(protocol, key = %key, "duplicate dissector registration");
            return Err(RegistryError::Conflict { protocol, key });
        }
        candidates.push(dissector);
        debug!(protocol, key = %key, "registered dissector");
        Ok(())
    }

    fn protocol(&self, protocol: &str) -> Option<&Arc<dyn Dissector>> {
        self.protocols.iter().find(|d| d.protocol_id() == protocol)
    }

    /// Seal the registry; no further registration is possible.
    pub fn build(self) -> Registry {
        Registry {
            protocols: self.protocols,
            table: self.table,
            fields: self.fields,
            experts: self.experts,
            fallback: self.fallback,
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of running one candidate.
enum Attempt {
    Accepted(usize, FieldTree),
    Declined,
}

/// Sealed, read-only dissector table.
pub struct Registry {
    protocols: Vec<Arc<dyn Dissector>>,
    table: BTreeMap<TransportKey, Candidates>,
    fields: BTreeMap<&'static str, &'static HeaderField>,
    experts: BTreeMap<&'static str, &'static ExpertInfo>,
    fallback: Arc<dyn Dissector>,
}

impl Registry {
    /// Start a new registration phase.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Dispatch `tvb` to the dissectors registered for `key`.
    ///
    /// Returns `None` if the key is unknown or every candidate declined.
    pub fn dispatch(
        &self,
        key: TransportKey,
        tvb: &Tvb,
        ctx: &mut PacketContext,
    ) -> Option<Dissection> {
        let Some(candidates) = self.table.get(&key) else {
            debug!(key = %key, "no dissector registered");
            return None;
        };

        for dissector in candidates {
            ctx.match_port = key.port;
            if let Attempt::Accepted(consumed, tree) = self.attempt(dissector.as_ref(), tvb, ctx) {
                debug!(
                    protocol = dissector.protocol_id(),
                    key = %key,
                    consumed,
                    "dissector accepted"
                );
                return Some(Dissection {
                    protocol: dissector.protocol_id(),
                    consumed,
                    tree,
                    columns: ctx.columns.clone(),
                });
            }
            debug!(protocol = dissector.protocol_id(), key = %key, "dissector declined");
        }
        None
    }

    /// Dispatch on the context's port pair, then fall back to raw data.
    ///
    /// The lower port is tried first, then the higher one. If nothing
    /// accepts, the generic data dissector takes the whole buffer.
    pub fn dispatch_ports(&self, tvb: &Tvb, ctx: &mut PacketContext) -> Dissection {
        let low = ctx.src_port.min(ctx.dst_port);
        let high = ctx.src_port.max(ctx.dst_port);

        let mut ports: SmallVec<[u16; 2]> = SmallVec::new();
        ports.push(low);
        if high != low {
            ports.push(high);
        }

        for port in ports {
            let key = TransportKey::new(ctx.transport, port);
            if let Some(dissection) = self.dispatch(key, tvb, ctx) {
                return dissection;
            }
        }

        debug!(len = tvb.len(), "falling back to data dissector");
        ctx.match_port = ctx.dst_port;
        let (consumed, tree) = match self.attempt(self.fallback.as_ref(), tvb, ctx) {
            Attempt::Accepted(consumed, tree) => (consumed, tree),
            Attempt::Declined => (0, FieldTree::new(tvb)),
        };
        Dissection {
            protocol: self.fallback.protocol_id(),
            consumed,
            tree,
            columns: ctx.columns.clone(),
        }
    }

    /// Run one candidate against a fresh tree.
    fn attempt(&self, dissector: &dyn Dissector, tvb: &Tvb, ctx: &mut PacketContext) -> Attempt {
        ctx.columns.clear();
        let mut tree = FieldTree::new(tvb);
        match dissector.try_dissect(tvb, ctx, &mut tree, ItemId::ROOT) {
            Ok(0) | Err(DissectError::Declined) => {
                ctx.columns.clear();
                Attempt::Declined
            }
            Ok(consumed) if consumed > tvb.len() => {
                warn!(
                    protocol = dissector.protocol_id(),
                    consumed,
                    len = tvb.len(),
                    "dissector consumed past end of buffer, clamping"
                );
                Attempt::Accepted(tvb.len(), tree)
            }
            Ok(consumed) => Attempt::Accepted(consumed, tree),
            Err(DissectError::Malformed(reason)) => {
                debug!(protocol = dissector.protocol_id(), %reason, "malformed packet");
                tree.add_expert_message(
                    ItemId::ROOT,
                    &EI_MALFORMED,
                    format!("{}: {reason}", EI_MALFORMED.summary),
                );
                if ctx.columns.protocol.is_empty() {
                    ctx.columns.set_protocol(dissector.protocol_id());
                }
                Attempt::Accepted(tvb.len(), tree)
            }
        }
    }

    /// Candidates registered for `key`, in registration order.
    pub fn lookup(&self, key: TransportKey) -> impl Iterator<Item = &dyn Dissector> {
        self.table
            .get(&key)
            .map(|c| c.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|d| d.as_ref())
    }

    /// Every `(key, protocol)` registration, ordered by key.
    pub fn registrations(&self) -> impl Iterator<Item = (TransportKey, &dyn Dissector)> {
        self.table
            .iter()
            .flat_map(|(key, candidates)| candidates.iter().map(move |d| (*key, d.as_ref())))
    }

    /// All declared protocols, in registration order.
    pub fn protocols(&self) -> impl Iterator<Item = &dyn Dissector> {
        self.protocols.iter().map(|d| d.as_ref())
    }

    /// Look up a protocol by identifier.
    pub fn protocol(&self, protocol: &str) -> Option<&dyn Dissector> {
        self.protocols()
            .find(|d| d.protocol_id() == protocol)
    }

    /// The header field catalogue, ordered by abbreviation.
    pub fn fields(&self) -> impl Iterator<Item = &'static HeaderField> + '_ {
        self.fields.values().copied()
    }

    /// Look up a header field by abbreviation.
    pub fn field(&self, abbrev: &str) -> Option<&'static HeaderField> {
        self.fields.get(abbrev).copied()
    }

    /// The expert info catalogue, ordered by abbreviation.
    pub fn expert_infos(&self) -> impl Iterator<Item = &'static ExpertInfo> + '_ {
        self.experts.values().copied()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field(
                "protocols",
                &self.protocols.iter().map(|d| d.protocol_id()).collect::<Vec<_>>(),
            )
            .field("keys", &self.table.keys().collect::<Vec<_>>())
            .field("fields", &self.fields.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldKind;
    use crate::tree::FieldValue;

    static HF_ECHO: HeaderField = HeaderField::new("Echo", "echo", FieldKind::Protocol);
    static HF_ECHO_BODY: HeaderField = HeaderField::new("Body", "echo.body", FieldKind::String);
    static ECHO_FIELDS: &[&HeaderField] = &[&HF_ECHO, &HF_ECHO_BODY];

    /// Accepts buffers starting with its marker byte.
    struct Echo {
        id: &'static str,
        marker: u8,
    }

    impl Dissector for Echo {
        fn protocol_id(&self) -> &'static str {
            self.id
        }

        fn fields(&self) -> &'static [&'static HeaderField] {
            if self.id == "echo" {
                ECHO_FIELDS
            } else {
                &[]
            }
        }

        fn try_dissect(
            &self,
            tvb: &Tvb,
            ctx: &mut PacketContext,
            tree: &mut FieldTree,
            parent: ItemId,
        ) -> Result<usize, DissectError> {
            if tvb.get_u8(0).ok() != Some(self.marker) {
                return Err(DissectError::Declined);
            }
            ctx.columns.set_protocol(self.id);
            let item = tree.add_protocol(parent, &HF_ECHO, 0, tvb.len(), String::new())?;
            tree.add_field(item, &HF_ECHO_BODY, 0, tvb.len(), FieldValue::string(self.id))?;
            Ok(tvb.len())
        }
    }

    /// Declines by returning zero, but scribbles on the tree first.
    struct Scribbler;

    impl Dissector for Scribbler {
        fn protocol_id(&self) -> &'static str {
            "scribbler"
        }

        fn fields(&self) -> &'static [&'static HeaderField] {
            &[]
        }

        fn try_dissect(
            &self,
            tvb: &Tvb,
            ctx: &mut PacketContext,
            tree: &mut FieldTree,
            parent: ItemId,
        ) -> Result<usize, DissectError> {
            ctx.columns.set_protocol("scribbler");
            tree.add_subtree(parent, 0, tvb.len(), "junk".into())?;
            Ok(0)
        }
    }

    /// Adds one item, then gives up.
    struct Broken;

    impl Dissector for Broken {
        fn protocol_id(&self) -> &'static str {
            "broken"
        }

        fn fields(&self) -> &'static [&'static HeaderField] {
            &[]
        }

        fn try_dissect(
            &self,
            tvb: &Tvb,
            _ctx: &mut PacketContext,
            tree: &mut FieldTree,
            parent: ItemId,
        ) -> Result<usize, DissectError> {
            tree.add_subtree(parent, 0, 1, "partial".into())?;
            tvb.read(0, tvb.len() + 1)?;
            Ok(tvb.len())
        }
    }

    /// Claims more bytes than it was given.
    struct Greedy;

    impl Dissector for Greedy {
        fn protocol_id(&self) -> &'static str {
            "greedy"
        }

        fn fields(&self) -> &'static [&'static HeaderField] {
            &[]
        }

        fn try_dissect(
            &self,
            tvb: &Tvb,
            _ctx: &mut PacketContext,
            _tree: &mut FieldTree,
            _parent: ItemId,
        ) -> Result<usize, DissectError> {
            Ok(tvb.len() * 2)
        }
    }

    fn echo(id: &'static str, marker: u8) -> Arc<dyn Dissector> {
        Arc::new(Echo { id, marker })
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut builder = Registry::builder();
        let d = echo("echo", b'e');
        builder
            .register(TransportKey::tcp(7), Arc::clone(&d))
            .unwrap();
        let err = builder.register(TransportKey::tcp(7), d).unwrap_err();
        assert_eq!(
            err,
            RegistryError::Conflict {
                protocol: "echo",
                key: TransportKey::tcp(7)
            }
        );
    }

    #[test]
    fn test_same_dissector_on_two_keys() {
        let mut builder = Registry::builder();
        let d = echo("echo", b'e');
        builder
            .register(TransportKey::tcp(7), Arc::clone(&d))
            .unwrap();
        builder.register(TransportKey::udp(7), d).unwrap();
        let registry = builder.build();
        assert_eq!(registry.registrations().count(), 2);
        assert_eq!(registry.protocols().filter(|d| d.protocol_id() == "echo").count(), 1);
    }

    #[test]
    fn test_duplicate_protocol_rejected() {
        let mut builder = Registry::builder();
        builder
            .register(TransportKey::tcp(7), echo("echo", b'e'))
            .unwrap();
        let err = builder
            .register(TransportKey::tcp(8), echo("echo", b'x'))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateProtocol { protocol: "echo" });
    }

    #[test]
    fn test_unknown_key_returns_none() {
        let registry = Registry::builder().build();
        let tvb = Tvb::from_static(b"hello");
        let mut ctx = PacketContext::tcp(1, 2);
        assert!(registry.dispatch(TransportKey::tcp(2), &tvb, &mut ctx).is_none());
    }

    #[test]
    fn test_candidates_tried_in_order() {
        let mut builder = Registry::builder();
        builder
            .register(TransportKey::tcp(7), Arc::new(Scribbler))
            .unwrap();
        builder
            .register(TransportKey::tcp(7), echo("echo", b'e'))
            .unwrap();
        builder
            .register(TransportKey::tcp(7), echo("other", b'e'))
            .unwrap();
        let registry = builder.build();

        let tvb = Tvb::from_static(b"echo me");
        let mut ctx = PacketContext::tcp(1000, 7);
        let dissection = registry
            .dispatch(TransportKey::tcp(7), &tvb, &mut ctx)
            .unwrap();
        assert_eq!(dissection.protocol, "echo");
        assert_eq!(dissection.consumed, 7);
        assert_eq!(dissection.columns.protocol, "echo");
        // The scribbler's items must not leak into the accepted tree.
        assert_eq!(dissection.tree.len(), 2);
        assert!(dissection.tree.items().all(|(_, item)| item.display != "junk"));
    }

    #[test]
    fn test_all_declined() {
        let mut builder = Registry::builder();
        builder
            .register(TransportKey::tcp(7), echo("echo", b'e'))
            .unwrap();
        let registry = builder.build();

        let tvb = Tvb::from_static(b"nope");
        let mut ctx = PacketContext::tcp(1000, 7);
        assert!(registry.dispatch(TransportKey::tcp(7), &tvb, &mut ctx).is_none());
        assert!(ctx.columns.protocol.is_empty());
    }

    #[test]
    fn test_dispatch_ports_lower_first() {
        let mut builder = Registry::builder();
        builder
            .register(TransportKey::tcp(9000), echo("high", b'e'))
            .unwrap();
        builder
            .register(TransportKey::tcp(80), echo("echo", b'e'))
            .unwrap();
        let registry = builder.build();

        let tvb = Tvb::from_static(b"echo");
        let mut ctx = PacketContext::tcp(9000, 80);
        let dissection = registry.dispatch_ports(&tvb, &mut ctx);
        assert_eq!(dissection.protocol, "echo");
        assert_eq!(ctx.match_port, 80);
    }

    #[test]
    fn test_dispatch_ports_falls_back_to_data() {
        let registry = Registry::builder().build();
        let tvb = Tvb::from_static(b"\x00\x01\x02");
        let mut ctx = PacketContext::udp(5, 6);
        let dissection = registry.dispatch_ports(&tvb, &mut ctx);
        assert_eq!(dissection.protocol, "data");
        assert_eq!(dissection.consumed, 3);
        assert_eq!(dissection.columns.protocol, "data");
        let (_, data) = dissection.tree.find("data.data").unwrap();
        assert_eq!(data.display, "000102");
    }

    #[test]
    fn test_malformed_keeps_partial_tree() {
        let mut builder = Registry::builder();
        builder
            .register(TransportKey::tcp(7), Arc::new(Broken))
            .unwrap();
        let registry = builder.build();

        let tvb = Tvb::from_static(b"abc");
        let mut ctx = PacketContext::tcp(1000, 7);
        let dissection = registry
            .dispatch(TransportKey::tcp(7), &tvb, &mut ctx)
            .unwrap();
        assert_eq!(dissection.consumed, 3);
        assert_eq!(dissection.tree.len(), 1);
        let notes: Vec<_> = dissection.tree.notes_for(ItemId::ROOT).collect();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].abbrev, Some("wiretree.malformed"));
        assert_eq!(dissection.columns.protocol, "broken");
    }

    #[test]
    fn test_consumed_is_clamped() {
        let mut builder = Registry::builder();
        builder
            .register(TransportKey::udp(7), Arc::new(Greedy))
            .unwrap();
        let registry = builder.build();

        let tvb = Tvb::from_static(b"abcd");
        let mut ctx = PacketContext::udp(1000, 7);
        let dissection = registry
            .dispatch(TransportKey::udp(7), &tvb, &mut ctx)
            .unwrap();
        assert_eq!(dissection.consumed, 4);
    }

    #[test]
    fn test_field_catalogue() {
        let mut builder = Registry::builder();
        builder
            .register(TransportKey::tcp(7), echo("echo", b'e'))
            .unwrap();
        let registry = builder.build();
        assert_eq!(registry.field("echo.body").map(|hf| hf.name), Some("Body"));
        assert!(registry.field("data.data").is_some());
        assert!(registry.field("nope").is_none());
        assert!(registry
            .expert_infos()
            .any(|ei| ei.abbrev == "wiretree.malformed"));
    }

    #[test]
    fn test_registry_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }
}
