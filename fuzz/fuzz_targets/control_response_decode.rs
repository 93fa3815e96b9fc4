//! Control response content is untrusted.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ndncc_core::control_response_record;
use ndncc_proto::decode_control_response;

fuzz_target!(|data: &[u8]| {
    if let Ok(response) = decode_control_response(data) {
        let record = control_response_record(&response);
        assert_eq!(record.len(), 2);

        let again = decode_control_response(&response.encode()).expect("re-encoded response");
        assert_eq!(again.status_code, response.status_code);
        assert_eq!(again.status_text, response.status_text);
    }
});
