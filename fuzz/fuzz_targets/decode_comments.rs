#![no_main]

use chrono::{TimeZone, Utc};
use flowboard_core::codec::{decode_comments, encode_comments};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(blob) = std::str::from_utf8(data) else {
        return;
    };
    let Some(at) = Utc.timestamp_opt(0, 0).single() else {
        return;
    };
    let comments = decode_comments(blob, at);
    // Re-encoding is stable up to the content trim applied on decode.
    let again = decode_comments(&encode_comments(&comments), at);
    assert_eq!(comments.len(), again.len());
    for (first, second) in comments.iter().zip(&again) {
        assert_eq!(first.author, second.author);
        assert_eq!(first.content.trim(), second.content);
    }
});
