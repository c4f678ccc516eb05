#![no_main]

use libfuzzer_sys::fuzz_target;
use toml_stream::{Scanner, Token};

fuzz_target!(|data: &[u8]| {
    let mut scanner = Scanner::new(data);
    loop {
        match scanner.next() {
            Ok(Token::EndOfDocument) | Err(_) => break,
            Ok(token) => {
                std::hint::black_box(&token);
            }
        }
    }
});
