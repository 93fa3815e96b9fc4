//! Notification content and the symbolic rendering of its codes.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ndncc_core::face_event_record;
use ndncc_proto::decode_face_event;

fuzz_target!(|data: &[u8]| {
    if let Ok(event) = decode_face_event(data) {
        let record = face_event_record(&event);
        assert_eq!(record.len(), 8);
        assert_eq!(record["face_id"], event.face_id.to_string());
    }
});
