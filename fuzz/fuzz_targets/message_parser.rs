//! Fuzz target for line parsing
//!
//! Feeds arbitrary input to the parser, the tag decoder and the outbound
//! sanitizer; none of them may panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::str;

fuzz_target!(|data: &[u8]| {
    // Only fuzz valid UTF-8 strings to focus on protocol-level issues
    if let Ok(input) = str::from_utf8(data) {
        if input.is_empty() || input.len() > 8191 {
            return;
        }

        if let Ok(msg) = input.parse::<volpesbot::Message>() {
            // A parsed line always has a command.
            assert!(!msg.command.is_empty());
            let _ = msg.tag("badges");
            let _ = msg.tag_map().len();
            let _ = volpesbot::auth::Sender::from_message(&msg, "owner").role();
        }

        let _ = volpesbot::line::sanitize(input);
    }
});
