//! End-to-end dissection through the default registry.

use std::sync::Arc;

use wiretree_core::prelude::*;
use wiretree_core::protocol::KismetDissector;
use wiretree_core::{get_token, RegistryError};

const KISMET_HEADER: &[u8] =
    b"*KISMET: 2007.10.R1 1199999999 \x01myserver\x01 2007.10.R1 X Y\n";

fn response_ctx() -> PacketContext {
    PacketContext::tcp(2501, 40000)
}

fn request_ctx() -> PacketContext {
    PacketContext::tcp(40000, 2501)
}

fn dispatch(registry: &Registry, payload: &'static [u8], ctx: &mut PacketContext) -> Dissection {
    registry.dispatch_ports(&Tvb::from_static(payload), ctx)
}

fn field_display(dissection: &Dissection, abbrev: &str) -> Option<String> {
    dissection
        .tree
        .find(abbrev)
        .map(|(_, item)| item.display.clone())
}

#[test]
fn test_short_buffers_fall_through_to_data() {
    let registry = default_registry().unwrap();
    let payloads: [&'static [u8]; 4] = [b"*", b"*TIME", b"*TIME: ", b"*KISMET"];
    for payload in payloads {
        let tvb = Tvb::from_static(payload);
        let mut ctx = response_ctx();
        assert!(registry
            .dispatch(TransportKey::tcp(2501), &tvb, &mut ctx)
            .is_none());

        let dissection = registry.dispatch_ports(&tvb, &mut ctx);
        assert_eq!(dissection.protocol, "data");
        assert!(dissection.tree.find("kismet").is_none());
    }
}

#[test]
fn test_non_text_declines_for_every_position() {
    let registry = default_registry().unwrap();
    let mut checked = 0;
    for byte in (0u8..32).chain(129..=255) {
        for pos in 0..8 {
            let mut payload = b"*TIME: 1199999999\n".to_vec();
            payload[pos] = byte;
            let tvb = Tvb::new(payload);
            let mut ctx = response_ctx();
            assert!(
                registry
                    .dispatch(TransportKey::tcp(2501), &tvb, &mut ctx)
                    .is_none(),
                "byte {byte:#04x} at {pos} was accepted"
            );
            checked += 1;
        }
    }
    assert_eq!(checked, (32 + 127) * 8);
}

#[test]
fn test_byte_128_passes() {
    let registry = default_registry().unwrap();
    let mut ctx = response_ctx();
    let dissection = dispatch(&registry, b"*\x80\x80\x80\x80\x80\x80\x80 tail\n", &mut ctx);
    assert_eq!(dissection.protocol, "kismet");
}

#[test]
fn test_kismet_header_record() {
    let registry = default_registry().unwrap();
    let mut ctx = response_ctx();
    let dissection = dispatch(&registry, KISMET_HEADER, &mut ctx);

    assert_eq!(dissection.protocol, "kismet");
    assert_eq!(dissection.consumed, KISMET_HEADER.len());
    assert_eq!(field_display(&dissection, "kismet.server_name").as_deref(), Some("myserver"));

    let order: Vec<&str> = dissection
        .tree
        .items()
        .filter_map(|(_, item)| item.abbrev())
        .filter(|abbrev| abbrev.starts_with("kismet."))
        .collect();
    assert_eq!(
        order,
        vec![
            "kismet.response",
            "kismet.version",
            "kismet.start_time",
            "kismet.server_name",
            "kismet.build_revision",
            "kismet.unknown_field",
            "kismet.extended_version_string",
        ]
    );
}

#[test]
fn test_time_records() {
    let registry = default_registry().unwrap();

    let mut ctx = response_ctx();
    let bad = dispatch(&registry, b"*TIME: notanumber\n", &mut ctx);
    let (id, _) = bad.tree.find("kismet.time").unwrap();
    assert_eq!(field_display(&bad, "kismet.time").as_deref(), Some(""));
    let notes: Vec<_> = bad.tree.notes_for(id).collect();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].severity, Severity::Warning);

    let mut ctx = response_ctx();
    let good = dispatch(&registry, b"*TIME: 1199999999\n", &mut ctx);
    assert_eq!(
        field_display(&good, "kismet.time").as_deref(),
        Some("Jan 10, 2008 21:19:59 UTC")
    );
    assert!(good.tree.notes().is_empty());
    assert_eq!(good.columns.info, "Response: *TIME: 1199999999");
}

#[test]
fn test_continuation_is_raw_data() {
    let registry = default_registry().unwrap();
    let payload: &'static [u8] = b"some continuation data...\n";
    let mut ctx = response_ctx();
    let dissection = dispatch(&registry, payload, &mut ctx);

    assert_eq!(dissection.protocol, "kismet");
    assert_eq!(dissection.consumed, payload.len());
    assert_eq!(dissection.columns.info, "Continuation");

    let raw: Vec<_> = dissection.tree.find_all("data.data").collect();
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].1.range.offset, 0);
    assert_eq!(raw[0].1.range.length, payload.len());
}

#[test]
fn test_request_direction() {
    let registry = default_registry().unwrap();
    let mut ctx = request_ctx();
    let dissection = dispatch(&registry, b"!1 ENABLE TIME *\n", &mut ctx);
    let (_, flag) = dissection.tree.find("kismet.request").unwrap();
    assert!(flag.generated);
    assert!(dissection.tree.find("kismet.response").is_none());
    assert_eq!(dissection.columns.info, "Request: !1 ENABLE TIME *");
}

#[test]
fn test_dissection_is_idempotent() {
    let registry = default_registry().unwrap();
    let payloads: [&'static [u8]; 4] = [
        KISMET_HEADER,
        b"*TIME: notanumber\n*TIME: 1199999999\r\n",
        b"some continuation data...\n",
        b"\x00\x01binary",
    ];
    for payload in payloads {
        let first = dispatch(&registry, payload, &mut response_ctx());
        let second = dispatch(&registry, payload, &mut response_ctx());
        assert_eq!(first.protocol, second.protocol);
        assert_eq!(first.consumed, second.consumed);
        assert_eq!(first.tree, second.tree);
        assert_eq!(first.tree.to_text(), second.tree.to_text());
    }
}

#[test]
fn test_tokens_cover_at_most_the_line() {
    // Every line shape built from these pieces must tokenize to exhaustion.
    let pieces: [&[u8]; 5] = [b"", b" ", b"\t", b"tok", b"\x01x\x01"];
    for a in pieces {
        for b in pieces {
            for c in pieces {
                let line = [a, b, c, b, a].concat();
                let mut cursor = 0;
                loop {
                    let token = get_token(&line[cursor..]);
                    assert!(cursor + token.next_offset <= line.len());
                    if token.length == 0 {
                        break;
                    }
                    cursor += token.next_offset;
                }
            }
        }
    }
}

#[test]
fn test_duplicate_registration_is_a_startup_error() {
    let mut builder = Registry::builder();
    let kismet: Arc<dyn Dissector> = Arc::new(KismetDissector);
    builder
        .register(TransportKey::tcp(2501), Arc::clone(&kismet))
        .unwrap();
    assert!(matches!(
        builder.register(TransportKey::tcp(2501), kismet),
        Err(RegistryError::Conflict { protocol: "kismet", .. })
    ));
}

#[test]
fn test_unregistered_key_has_no_match() {
    let registry = default_registry().unwrap();
    let tvb = Tvb::from_static(KISMET_HEADER);
    let mut ctx = PacketContext::tcp(2502, 40000);
    assert!(registry
        .dispatch(TransportKey::tcp(2502), &tvb, &mut ctx)
        .is_none());
    assert!(registry
        .dispatch(TransportKey::udp(2501), &tvb, &mut ctx)
        .is_none());
}

#[test]
fn test_configured_port() {
    let prefs = Preferences::default().with_kismet_tcp_port(3501);
    let registry = registry_with_preferences(&prefs).unwrap();

    let mut ctx = PacketContext::tcp(3501, 40000);
    assert_eq!(dispatch(&registry, KISMET_HEADER, &mut ctx).protocol, "kismet");

    let mut ctx = response_ctx();
    assert_eq!(dispatch(&registry, KISMET_HEADER, &mut ctx).protocol, "data");
}

#[test]
fn test_concurrent_dispatch_shares_registry() {
    let registry = default_registry().unwrap();
    let expected = dispatch(&registry, KISMET_HEADER, &mut response_ctx()).tree;

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    (0..50)
                        .map(|_| dispatch(&registry, KISMET_HEADER, &mut response_ctx()).tree)
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in handles {
            for tree in handle.join().unwrap() {
                assert_eq!(tree, expected);
            }
        }
    });
}

#[test]
fn test_render_text() {
    let registry = default_registry().unwrap();
    let dissection = dispatch(&registry, b"*TIME: notanumber\n", &mut response_ctx());
    let expected = concat!(
        "Kismet Client/Server Protocol\n",
        "    [Response: True]\n",
        "    *TIME: notanumber\n",
        "        Time: \n",
        "            [Expert Info (Warning/Protocol): Invalid time]\n",
    );
    assert_eq!(dissection.tree.to_text(), expected);
}
