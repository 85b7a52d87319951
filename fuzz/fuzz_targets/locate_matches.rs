#![no_main]

use flowboard_core::query::{highlight, locate_matches};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (String, String)| {
    let (text, query) = input;
    for span in locate_matches(&text, &query) {
        assert!(span.start < span.end);
        assert!(text.is_char_boundary(span.start));
        assert!(text.is_char_boundary(span.end));
    }
    let rebuilt: String = highlight(&text, &query)
        .iter()
        .map(|segment| segment.text)
        .collect();
    assert_eq!(rebuilt, text);
});
