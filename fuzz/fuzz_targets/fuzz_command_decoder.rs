//! Fuzz target: `wire::decode_response`
//!
//! Arbitrary status + body bytes must never panic, and every decoded
//! command must carry a non-empty kind.
//!
//! cargo fuzz run fuzz_command_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use lullabuddy::app::commands::FetchOutcome;
use lullabuddy::classify::classify;
use lullabuddy::wire::decode_response;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, body)) = data.split_first() else {
        return;
    };
    let status = match selector % 3 {
        0 => 200,
        1 => 204,
        _ => u16::from(selector),
    };

    if let Ok(FetchOutcome::Command(envelope)) = decode_response(status, body) {
        assert!(!envelope.kind.is_empty(), "decoded command without kind");
        let _ = classify(&envelope.kind);
    }
});
