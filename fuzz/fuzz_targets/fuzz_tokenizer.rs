//! Fuzz target for line and token scanning.
//!
//! Lines must tile the buffer without gaps, and tokens must stay inside
//! their line, never overlap and always make progress.

#![no_main]

use libfuzzer_sys::fuzz_target;
use wiretree_core::buffer::Tvb;
use wiretree_core::tokenize::lines;

fuzz_target!(|data: &[u8]| {
    let tvb = Tvb::new(data.to_vec());

    let mut expected_offset = 0;
    for line in lines(&tvb) {
        assert_eq!(line.offset, expected_offset);
        assert!(line.next_offset > line.offset);
        assert!(line.next_offset >= line.end());
        expected_offset = line.next_offset;

        let Ok(tokens) = line.tokens(&tvb) else {
            panic!("line {line:?} outside buffer");
        };
        let mut previous_end = line.offset;
        for (token, bytes) in tokens {
            assert!(token.offset >= previous_end);
            assert!(token.offset + token.length <= line.end());
            assert_eq!(bytes.len(), token.length);
            previous_end = token.offset + token.length;
        }
    }
    assert_eq!(expected_offset, tvb.len());
});
