//! Fuzz target: `ControlCommand::decode`
//!
//! Drives arbitrary control frames into the decoder and asserts that it
//! never panics and that every accepted frame reports its own opcode.
//!
//! cargo fuzz run fuzz_control_decoder

#![no_main]

use ladybug::app::commands::ControlCommand;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(cmd) = ControlCommand::decode(data) {
        assert_eq!(cmd.opcode(), data[0], "opcode must survive decoding");
        if let ControlCommand::SetDeviceName(name) = cmd {
            assert!(!name.is_empty() && name.len() <= 24);
        }
    }
});
