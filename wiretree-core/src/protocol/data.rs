//! Generic data dissector.
//!
//! Shows bytes no protocol claimed as a single raw field. Also used by
//! other dissectors for payloads they do not decode.

use crate::buffer::Tvb;
use crate::error::DissectError;
use crate::schema::{FieldKind, HeaderField};
use crate::tree::{FieldTree, FieldValue, ItemId};

use super::{Dissector, PacketContext};

pub static HF_DATA_PROTO: HeaderField = HeaderField::new("Data", "data", FieldKind::Protocol);
pub static HF_DATA: HeaderField = HeaderField::new("Data", "data.data", FieldKind::Bytes);
pub static HF_DATA_LEN: HeaderField =
    HeaderField::new("Length", "data.len", FieldKind::Integer)
        .with_description("Number of payload bytes");

static FIELDS: &[&HeaderField] = &[&HF_DATA_PROTO, &HF_DATA, &HF_DATA_LEN];

/// Raw bytes dissector.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataDissector;

impl DataDissector {
    /// Add the whole buffer as raw data beneath `parent`.
    ///
    /// Returns the number of bytes shown; an empty buffer adds nothing.
    pub fn dissect_payload(
        tvb: &Tvb,
        tree: &mut FieldTree,
        parent: ItemId,
    ) -> Result<usize, DissectError> {
        let len = tvb.len();
        if len == 0 {
            return Ok(0);
        }

        let label = format!("Data ({len} bytes)");
        let item = tree.add_protocol(parent, &HF_DATA_PROTO, 0, len, label)?;
        tree.add_field(item, &HF_DATA, 0, len, FieldValue::Bytes(tvb.bytes(0, len)?))?;
        tree.add_generated(item, &HF_DATA_LEN, FieldValue::UInt64(len as u64))?;
        Ok(len)
    }
}

impl Dissector for DataDissector {
    fn protocol_id(&self) -> &'static str {
        "data"
    }

    fn display_name(&self) -> &'static str {
        "Data"
    }

    fn fields(&self) -> &'static [&'static HeaderField] {
        FIELDS
    }

    fn try_dissect(
        &self,
        tvb: &Tvb,
        ctx: &mut PacketContext,
        tree: &mut FieldTree,
        parent: ItemId,
    ) -> Result<usize, DissectError> {
        if ctx.columns.protocol.is_empty() {
            ctx.columns.set_protocol(self.protocol_id());
        }
        Self::dissect_payload(tvb, tree, parent)
    }
}
