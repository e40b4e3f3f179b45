//! Fuzz target: `codec::decode_command` / `codec::is_stop_all`
//!
//! Drives arbitrary byte sequences into the inbound-command decoders and
//! asserts that they never panic, and that anything that does decode
//! carries a usable (finite-checkable) value and a routable target.
//!
//! cargo fuzz run fuzz_command_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use roomctl::bus::codec::{decode_command, is_stop_all, FanTarget};

fuzz_target!(|data: &[u8]| {
    if let Ok(cmd) = decode_command(data) {
        // A decoded command must route cleanly: known targets map to a
        // channel, unknown ones to the defined no-op.
        match cmd.target {
            FanTarget::Unknown => assert!(cmd.target.channel().is_none()),
            _ => assert!(cmd.target.channel().is_some()),
        }
        // JSON numbers are always finite; the clamp downstream relies on it.
        assert!(cmd.value.is_finite());
    }

    // The emergency decoder is a plain predicate — must never panic.
    let _ = is_stop_all(data);
});
