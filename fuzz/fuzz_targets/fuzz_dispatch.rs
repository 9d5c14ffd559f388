//! Fuzz target for registry dispatch.
//!
//! Drives arbitrary payloads and port pairs through the default registry,
//! covering dissector selection, the data fallback and malformed-packet
//! recovery.

#![no_main]

use libfuzzer_sys::fuzz_target;
use wiretree_core::buffer::Tvb;
use wiretree_core::protocol::{default_registry, PacketContext, Transport};

fuzz_target!(|data: &[u8]| {
    if data.len() < 5 {
        return;
    }

    let Ok(registry) = default_registry() else {
        return;
    };

    // First five bytes select transport and ports
    let transport = if data[0] & 1 == 0 { Transport::Tcp } else { Transport::Udp };
    let src_port = u16::from_be_bytes([data[1], data[2]]);
    let dst_port = u16::from_be_bytes([data[3], data[4]]);
    let tvb = Tvb::new(data[5..].to_vec());

    let mut ctx = PacketContext::new(transport, src_port, dst_port);
    let dissection = registry.dispatch_ports(&tvb, &mut ctx);
    assert!(dissection.consumed <= tvb.len());

    let _ = dissection.tree.to_text();
});
