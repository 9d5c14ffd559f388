//! Fuzz target for the Kismet dissector.
//!
//! This target exercises the text-protocol path end to end:
//! - First-line sniffing and request/response/continuation classification
//! - Line scanning with CR, LF and CRLF terminators
//! - `*KISMET` and `*TIME` record extraction, including truncated records
//!
//! Every accepted payload must be consumed in full and every tree item
//! must lie inside the buffer.

#![no_main]

use libfuzzer_sys::fuzz_target;
use wiretree_core::buffer::Tvb;
use wiretree_core::protocol::{Dissector, KismetDissector, PacketContext, KISMET_TCP_PORT};
use wiretree_core::tree::{FieldTree, ItemId};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // Use first byte to select the direction
    let to_server = data[0] & 1 == 0;
    let tvb = Tvb::new(data[1..].to_vec());

    let mut ctx = if to_server {
        PacketContext::tcp(40000, KISMET_TCP_PORT)
    } else {
        PacketContext::tcp(KISMET_TCP_PORT, 40000)
    };
    ctx.match_port = KISMET_TCP_PORT;

    let mut tree = FieldTree::new(&tvb);
    if let Ok(consumed) = KismetDissector.try_dissect(&tvb, &mut ctx, &mut tree, ItemId::ROOT) {
        assert!(consumed == 0 || consumed == tvb.len());
    }
    for (_, item) in tree.items() {
        assert!(item.range.end() <= tvb.len());
    }
});
