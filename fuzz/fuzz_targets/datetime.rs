#![no_main]

use libfuzzer_sys::fuzz_target;
use toml_stream::Datetime;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(dt) = text.parse::<Datetime>() else {
        return;
    };
    // The canonical rendering must re-parse to the same value.
    let out = dt.to_string().parse::<Datetime>().unwrap();
    assert_eq!(dt.date(), out.date());
    assert_eq!(dt.time(), out.time());
    assert_eq!(dt.offset(), out.offset());
});
