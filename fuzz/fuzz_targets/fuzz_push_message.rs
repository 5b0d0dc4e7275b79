//! Fuzz target: push message parsing
//!
//! cargo fuzz run fuzz_push_message

#![no_main]

use libfuzzer_sys::fuzz_target;
use lullabuddy::wire::PushMessage;

fuzz_target!(|data: &[u8]| {
    if let Ok(message) = PushMessage::parse(data) {
        if let Some(envelope) = message.to_envelope() {
            assert!(envelope.id.is_none(), "push envelope carried an id");
            assert!(!envelope.kind.is_empty());
        }
    }
});
