//! Fuzz target: inbound MQTT message → `AppCommand::parse`
//!
//! Splits the input into a topic and a payload, builds a `LinkEvent`
//! the way the MQTT callback does and parses the payload.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Oversized topics or payloads are refused, never truncated
//! - Only the exact reset keyword (modulo whitespace) parses
//!
//! cargo fuzz run fuzz_command_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use tanklevel::app::commands::{AppCommand, RESET_REFILL_COUNTER};
use tanklevel::app::events::{LinkEvent, MAX_PAYLOAD_LEN, MAX_TOPIC_LEN};

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let mid = usize::from(split).min(rest.len());
    let (topic, payload) = rest.split_at(mid);
    let topic = String::from_utf8_lossy(topic);

    match LinkEvent::message(&topic, payload) {
        Some(LinkEvent::Message { topic: t, payload: p }) => {
            assert!(t.len() <= MAX_TOPIC_LEN);
            assert!(p.len() <= MAX_PAYLOAD_LEN);
            assert_eq!(p.as_slice(), payload);
        }
        Some(other) => panic!("message() produced {other:?}"),
        None => assert!(topic.len() > MAX_TOPIC_LEN || payload.len() > MAX_PAYLOAD_LEN),
    }

    if let Ok(AppCommand::ResetRefillCounter) = AppCommand::parse(payload) {
        let text = core::str::from_utf8(payload).expect("parsed payload is UTF-8");
        assert_eq!(text.trim(), RESET_REFILL_COUNTER);
    }
});
