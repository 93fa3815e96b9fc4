//! Arbitrary bytes from the forwarder socket must never panic the decoder,
//! and whatever decodes must survive a re-encode.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ndncc_proto::{Packet, tlv::element_len};

fuzz_target!(|data: &[u8]| {
    // Framing must agree with the decoder about where an element ends.
    if let Some(len) = element_len(data) {
        assert!(len <= data.len());
    }

    if let Ok(packet) = Packet::decode(data) {
        let wire = packet.encode();
        let again = Packet::decode(&wire).expect("re-encoded packet decodes");
        assert_eq!(again, packet);
    }
});
