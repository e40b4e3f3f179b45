//! Fuzz target: `TelemetryFrame` JSON deserialisation
//!
//! The dashboard echoes telemetry frames back through test tooling, so the
//! frame type must tolerate arbitrary JSON input without panicking.
//!
//! cargo fuzz run fuzz_telemetry_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use roomctl::bus::codec::TelemetryFrame;

fuzz_target!(|data: &[u8]| {
    if let Ok(frame) = serde_json::from_slice::<TelemetryFrame>(data) {
        // Re-encoding anything that parsed must succeed and stay compact.
        let json = frame.encode();
        assert!(!json.is_empty());
    }
});
