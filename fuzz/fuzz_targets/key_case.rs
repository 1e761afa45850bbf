#![no_main]

use libfuzzer_sys::fuzz_target;
use tapejson::snake_to_camel;

// Conversion is idempotent and keeps leading and trailing underscores.
fuzz_target!(|data: &[u8]| {
    let Ok(key) = std::str::from_utf8(data) else {
        return;
    };
    let once = snake_to_camel(key);
    assert_eq!(snake_to_camel(&once), once);

    let leading = key.len() - key.trim_start_matches('_').len();
    let trailing = key.len() - key.trim_end_matches('_').len();
    assert!(once.starts_with(&key[..leading]));
    assert!(once.ends_with(&key[key.len() - trailing..]));
    if key.trim_matches('_').is_empty() {
        assert_eq!(once, key);
    }
});
