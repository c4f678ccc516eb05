#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let arena = toml_stream::Arena::new();
    let mut result = toml_stream::parse(data, &arena);
    std::hint::black_box(&mut result);
});
