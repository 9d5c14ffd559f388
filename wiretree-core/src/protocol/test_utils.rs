//! Test utilities for dissectors.
//!
//! Provides builders for constructing test payloads and contexts and
//! helper functions for inspecting the resulting trees.

use crate::buffer::Tvb;
use crate::error::DissectError;
use crate::tree::{FieldTree, ItemId};

use super::{Dissector, PacketContext, KISMET_TCP_PORT};

/// Ephemeral port used by the client side of test conversations.
pub const CLIENT_PORT: u16 = 40000;

/// Context for a packet sent by a client to the Kismet server.
pub fn request_ctx() -> PacketContext {
    let mut ctx = PacketContext::tcp(CLIENT_PORT, KISMET_TCP_PORT);
    ctx.match_port = KISMET_TCP_PORT;
    ctx
}

/// Context for a packet sent by the Kismet server to a client.
pub fn response_ctx() -> PacketContext {
    let mut ctx = PacketContext::tcp(KISMET_TCP_PORT, CLIENT_PORT);
    ctx.match_port = KISMET_TCP_PORT;
    ctx
}

/// Builder for line-oriented Kismet payloads.
#[derive(Debug, Clone)]
pub struct KismetBuilder {
    lines: Vec<Vec<u8>>,
    terminator: &'static [u8],
    terminate_last: bool,
}

impl Default for KismetBuilder {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            terminator: b"\n",
            terminate_last: true,
        }
    }
}

impl KismetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(mut self, line: impl AsRef<[u8]>) -> Self {
        self.lines.push(line.as_ref().to_vec());
        self
    }

    /// Append a `*KISMET:` header record.
    pub fn kismet(
        self,
        version: &str,
        start_time: &str,
        server_name: &str,
        build_revision: &str,
        unknown: &str,
        extended: &str,
    ) -> Self {
        self.line(format!(
            "*KISMET: {version} {start_time} \x01{server_name}\x01 \
             {build_revision} {unknown} {extended}"
        ))
    }

    /// Append a `*TIME:` record.
    pub fn time(self, value: &str) -> Self {
        self.line(format!("*TIME: {value}"))
    }

    pub fn crlf(mut self) -> Self {
        self.terminator = b"\r\n";
        self
    }

    /// Leave the final line without a terminator.
    pub fn unterminated(mut self) -> Self {
        self.terminate_last = false;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        let count = self.lines.len();
        for (i, line) in self.lines.into_iter().enumerate() {
            out.extend_from_slice(&line);
            if self.terminate_last || i + 1 < count {
                out.extend_from_slice(self.terminator);
            }
        }
        out
    }

    pub fn tvb(self) -> Tvb {
        Tvb::new(self.build())
    }
}

/// Run one dissector against a fresh tree.
pub fn dissect(
    dissector: &dyn Dissector,
    tvb: &Tvb,
    ctx: &mut PacketContext,
) -> (Result<usize, DissectError>, FieldTree) {
    let mut tree = FieldTree::new(tvb);
    let result = dissector.try_dissect(tvb, ctx, &mut tree, ItemId::ROOT);
    (result, tree)
}

/// Display values of every item for `abbrev`, in tree order.
pub fn displays(tree: &FieldTree, abbrev: &str) -> Vec<String> {
    tree.find_all(abbrev)
        .map(|(_, item)| item.display.clone())
        .collect()
}

/// Field abbreviations beneath `id`, in insertion order.
pub fn child_abbrevs(tree: &FieldTree, id: ItemId) -> Vec<&'static str> {
    tree.children(id)
        .filter_map(|(_, item)| item.abbrev())
        .collect()
}

/// Assert that a dissector declined and left the tree untouched.
pub fn assert_declined(result: &Result<usize, DissectError>, tree: &FieldTree) {
    assert!(
        matches!(result, Ok(0) | Err(DissectError::Declined)),
        "expected decline, got {result:?}"
    );
    assert!(tree.is_empty(), "declined dissection added {} items", tree.len());
}
