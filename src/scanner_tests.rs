use super::*;
use super::Token::*;
use crate::error::ErrorKind;
use crate::parser::{Allocate, Options};

fn tokens(input: &str) -> Vec<Token<'_>> {
    let mut scanner = Scanner::new(input.as_bytes());
    let mut out = Vec::new();
    loop {
        match scanner.next() {
            Ok(Token::EndOfDocument) => {
                out.push(Token::EndOfDocument);
                return out;
            }
            Ok(token) => out.push(token),
            Err(err) => panic!("scan failed for {input:?}: {err}"),
        }
    }
}

fn scan_err(input: &str) -> crate::Error {
    let mut scanner = Scanner::new(input.as_bytes());
    for _ in 0..10_000 {
        match scanner.next() {
            Ok(Token::EndOfDocument) => panic!("expected an error for {input:?}"),
            Ok(_) => {}
            Err(err) => return err,
        }
    }
    unreachable!("scanner did not terminate for {input:?}");
}

fn alloc_tokens<'a>(input: &'a str, arena: &'a crate::Arena, options: &Options) -> Vec<Token<'a>> {
    let mut scanner = Scanner::new(input.as_bytes());
    let mut out = Vec::new();
    loop {
        match scanner.next_alloc(arena, options) {
            Ok(Token::EndOfDocument) => {
                out.push(Token::EndOfDocument);
                return out;
            }
            Ok(token) => out.push(token),
            Err(err) => panic!("scan failed for {input:?}: {err}"),
        }
    }
}

#[test]
fn assignment_token_stream() {
    assert_eq!(
        tokens("x = 1\n"),
        vec![KeyBegin, Key("x"), ValueBegin, Int("1"), EndOfDocument]
    );

    // Dotted keys: each continuation segment is introduced by KeyBegin.
    assert_eq!(
        tokens("a.b.c = \"hi\"\n"),
        vec![
            KeyBegin,
            Key("a"),
            KeyBegin,
            Key("b"),
            KeyBegin,
            Key("c"),
            ValueBegin,
            String("hi"),
            EndOfDocument
        ]
    );

    // No trailing newline: end of input terminates the statement.
    assert_eq!(
        tokens("x = true"),
        vec![KeyBegin, Key("x"), ValueBegin, True, EndOfDocument]
    );
    assert_eq!(
        tokens("x = false"),
        vec![KeyBegin, Key("x"), ValueBegin, False, EndOfDocument]
    );
}

#[test]
fn header_token_streams() {
    assert_eq!(
        tokens("[a.b]\n"),
        vec![TableKeyBegin, Key("a"), KeyBegin, Key("b"), TableBegin, EndOfDocument]
    );
    assert_eq!(
        tokens("[[tool]]\n"),
        vec![ArrayTableKeyBegin, Key("tool"), TableBegin, EndOfDocument]
    );
    // Whitespace around segments and dots is insignificant.
    assert_eq!(
        tokens("[ a . \"b.c\" ]\n"),
        vec![TableKeyBegin, Key("a"), KeyBegin, Key("b.c"), TableBegin, EndOfDocument]
    );
}

#[test]
fn array_and_inline_table_token_streams() {
    assert_eq!(
        tokens("a = [1, 2]\n"),
        vec![
            KeyBegin,
            Key("a"),
            ValueBegin,
            ArrayBegin,
            Int("1"),
            Int("2"),
            ArrayEnd,
            EndOfDocument
        ]
    );
    assert_eq!(
        tokens("p = {x = 1, y = 2}"),
        vec![
            KeyBegin,
            Key("p"),
            ValueBegin,
            InlineTableBegin,
            KeyBegin,
            Key("x"),
            ValueBegin,
            Int("1"),
            KeyBegin,
            Key("y"),
            ValueBegin,
            Int("2"),
            InlineTableEnd,
            EndOfDocument
        ]
    );
    assert_eq!(
        tokens("n = [[1], []]"),
        vec![
            KeyBegin,
            Key("n"),
            ValueBegin,
            ArrayBegin,
            ArrayBegin,
            Int("1"),
            ArrayEnd,
            ArrayBegin,
            ArrayEnd,
            ArrayEnd,
            EndOfDocument
        ]
    );
}

#[test]
fn string_fragments_around_escapes() {
    // One partial per raw span, one escaped token per decoded byte, then a
    // final token with the last span. é is two bytes of UTF-8.
    assert_eq!(
        tokens("s = \"a\\u00e9b\"\n"),
        vec![
            KeyBegin,
            Key("s"),
            ValueBegin,
            PartialString("a"),
            PartialStringEscaped(0xC3),
            PartialStringEscaped(0xA9),
            String("b"),
            EndOfDocument
        ]
    );

    // A single-byte escape produces one escaped token.
    assert_eq!(
        tokens("s = \"x\\ty\"\n"),
        vec![
            KeyBegin,
            Key("s"),
            ValueBegin,
            PartialString("x"),
            PartialStringEscaped(b'\t'),
            String("y"),
            EndOfDocument
        ]
    );

    // Escape first: no leading raw span to flush.
    assert_eq!(
        tokens("s = \"\\nrest\"\n"),
        vec![
            KeyBegin,
            Key("s"),
            ValueBegin,
            PartialStringEscaped(b'\n'),
            String("rest"),
            EndOfDocument
        ]
    );

    // Escaped quoted keys fragment the same way.
    assert_eq!(
        tokens("\"k\\\"ey\" = 1\n"),
        vec![
            KeyBegin,
            PartialKey("k"),
            PartialKeyEscaped(b'"'),
            Key("ey"),
            ValueBegin,
            Int("1"),
            EndOfDocument
        ]
    );
}

#[test]
fn plain_strings_are_single_tokens() {
    assert_eq!(
        tokens("s = \"hello world\"\n"),
        vec![KeyBegin, Key("s"), ValueBegin, String("hello world"), EndOfDocument]
    );
    assert_eq!(
        tokens("s = ''\n"),
        vec![KeyBegin, Key("s"), ValueBegin, String(""), EndOfDocument]
    );
    assert_eq!(
        tokens("s = \"\"\n"),
        vec![KeyBegin, Key("s"), ValueBegin, String(""), EndOfDocument]
    );
    // Literal strings take no escapes; the backslash is content.
    assert_eq!(
        tokens("s = 'no\\escape'\n"),
        vec![KeyBegin, Key("s"), ValueBegin, String("no\\escape"), EndOfDocument]
    );
    // Empty quoted key.
    assert_eq!(
        tokens("\"\" = 1\n"),
        vec![KeyBegin, Key(""), ValueBegin, Int("1"), EndOfDocument]
    );
}

#[test]
fn multiline_strings() {
    // The newline right after the opening delimiter is trimmed.
    assert_eq!(
        tokens("s = \"\"\"\nhello\nworld\"\"\"\n"),
        vec![KeyBegin, Key("s"), ValueBegin, String("hello\nworld"), EndOfDocument]
    );
    assert_eq!(
        tokens("s = '''\nhello'''\n"),
        vec![KeyBegin, Key("s"), ValueBegin, String("hello"), EndOfDocument]
    );
    // One and two quotes inside are content.
    assert_eq!(
        tokens("s = \"\"\"a\"b\"\"c\"\"\"\n"),
        vec![KeyBegin, Key("s"), ValueBegin, String("a\"b\"\"c"), EndOfDocument]
    );
}

#[test]
fn multiline_close_with_four_and_five_quotes() {
    // """" closes with one quote of trailing content, """"" with two.
    assert_eq!(
        tokens("s = \"\"\"x\"\"\"\"\n"),
        vec![KeyBegin, Key("s"), ValueBegin, String("x\""), EndOfDocument]
    );
    assert_eq!(
        tokens("s = \"\"\"x\"\"\"\"\"\n"),
        vec![KeyBegin, Key("s"), ValueBegin, String("x\"\""), EndOfDocument]
    );
    // Six consecutive quotes in the close run cannot be parsed.
    let err = scan_err("s = \"\"\"x\"\"\"\"\"\"\n");
    assert!(matches!(err.kind, ErrorKind::Syntax(_)));

    // Six quotes total: open + close of the empty multi-line string.
    assert_eq!(
        tokens("s = \"\"\"\"\"\"\n"),
        vec![KeyBegin, Key("s"), ValueBegin, String(""), EndOfDocument]
    );

    // Same rules for the literal flavor.
    assert_eq!(
        tokens("s = '''x''''\n"),
        vec![KeyBegin, Key("s"), ValueBegin, String("x'"), EndOfDocument]
    );
}

#[test]
fn line_continuation_trims_whitespace() {
    let arena = crate::Arena::new();
    let options = Options::default();
    let toks = alloc_tokens("s = \"\"\"x\\\n     y\"\"\"\n", &arena, &options);
    assert_eq!(
        toks,
        vec![KeyBegin, Key("s"), ValueBegin, AllocatedString("xy"), EndOfDocument]
    );

    // Backslash, trailing spaces, then the newline: still a continuation.
    let toks = alloc_tokens("s = \"\"\"x\\   \n  \n  y\"\"\"\n", &arena, &options);
    assert_eq!(
        toks,
        vec![KeyBegin, Key("s"), ValueBegin, AllocatedString("xy"), EndOfDocument]
    );

    // Backslash + spaces followed by content is an invalid escape.
    let err = scan_err("s = \"\"\"x\\   y\"\"\"\n");
    assert!(matches!(err.kind, ErrorKind::Syntax(_)));
}

#[cfg(not(windows))]
#[test]
fn crlf_normalizes_inside_multiline_strings() {
    // \r\n becomes \n, which forces fragmentation.
    assert_eq!(
        tokens("s = \"\"\"a\r\nb\"\"\"\n"),
        vec![
            KeyBegin,
            Key("s"),
            ValueBegin,
            PartialString("a"),
            PartialStringEscaped(b'\n'),
            String("b"),
            EndOfDocument
        ]
    );
    // A bare \n is already normalized and stays in the raw span.
    assert_eq!(
        tokens("s = '''a\nb'''\n"),
        vec![KeyBegin, Key("s"), ValueBegin, String("a\nb"), EndOfDocument]
    );
}

#[test]
fn carriage_return_rules() {
    // \r without \n is always an error.
    assert!(matches!(
        scan_err("s = \"\"\"a\rb\"\"\"\n").kind,
        ErrorKind::Syntax(_)
    ));
    assert!(matches!(
        scan_err("s = '''a\rb'''\n").kind,
        ErrorKind::Syntax(_)
    ));
    assert!(matches!(scan_err("a = 1\rb = 2\n").kind, ErrorKind::Syntax(_)));
    // \r\n is accepted as a statement terminator.
    assert_eq!(
        tokens("a = 1\r\nb = 2\r\n"),
        vec![
            KeyBegin,
            Key("a"),
            ValueBegin,
            Int("1"),
            KeyBegin,
            Key("b"),
            ValueBegin,
            Int("2"),
            EndOfDocument
        ]
    );
}

#[test]
fn single_line_strings_reject_newlines_and_controls() {
    assert!(matches!(
        scan_err("s = \"a\nb\"\n").kind,
        ErrorKind::Syntax(_)
    ));
    assert!(matches!(
        scan_err("s = 'a\nb'\n").kind,
        ErrorKind::Syntax(_)
    ));
    assert!(matches!(
        scan_err("s = \"a\u{1}b\"\n").kind,
        ErrorKind::Syntax(_)
    ));
    // Tab is the one permitted control character.
    assert_eq!(
        tokens("s = \"a\tb\"\n"),
        vec![KeyBegin, Key("s"), ValueBegin, String("a\tb"), EndOfDocument]
    );
}

#[test]
fn escape_error_kinds() {
    assert!(matches!(
        scan_err("s = \"\\z\"\n").kind,
        ErrorKind::Syntax(_)
    ));
    assert!(matches!(
        scan_err("s = \"\\ud800\"\n").kind,
        ErrorKind::CannotEncodeSurrogateHalf(0xD800)
    ));
    assert!(matches!(
        scan_err("s = \"\\U00110000\"\n").kind,
        ErrorKind::CodepointTooLarge(0x110000)
    ));
    assert!(matches!(
        scan_err("s = \"\\uZZZZ\"\n").kind,
        ErrorKind::Syntax(_)
    ));
    // Truncated escapes are end-of-input failures.
    assert!(matches!(
        scan_err("s = \"\\u00").kind,
        ErrorKind::UnexpectedEndOfInput
    ));
}

#[test]
fn multiline_keys_are_rejected() {
    assert!(matches!(
        scan_err("\"\"\"k\"\"\" = 1\n").kind,
        ErrorKind::Syntax(_)
    ));
    assert!(matches!(
        scan_err("'''k''' = 1\n").kind,
        ErrorKind::Syntax(_)
    ));
}

#[test]
fn utf8_validation_accepts_well_formed_sequences() {
    // 2-, 3-, and 4-byte sequences in strings, keys, and comments.
    assert_eq!(
        tokens("s = \"caf\u{e9} \u{4e2d}\u{6587} \u{1F600}\"\n"),
        vec![
            KeyBegin,
            Key("s"),
            ValueBegin,
            String("café 中文 😀"),
            EndOfDocument
        ]
    );
    assert_eq!(
        tokens("\"ключ\" = 1 # смысл\n"),
        vec![KeyBegin, Key("ключ"), ValueBegin, Int("1"), EndOfDocument]
    );
    // Boundary codepoints: U+07FF, U+0800, U+FFFF, U+10000, U+10FFFF.
    let input = "s = \"\u{7FF}\u{800}\u{FFFF}\u{10000}\u{10FFFF}\"\n";
    assert_eq!(
        tokens(input),
        vec![
            KeyBegin,
            Key("s"),
            ValueBegin,
            String("\u{7FF}\u{800}\u{FFFF}\u{10000}\u{10FFFF}"),
            EndOfDocument
        ]
    );
}

#[test]
fn utf8_validation_rejects_malformed_sequences() {
    fn err_for(bytes: &[u8]) -> crate::Error {
        let mut scanner = Scanner::new(bytes);
        for _ in 0..100 {
            match scanner.next() {
                Ok(Token::EndOfDocument) => panic!("expected error for {bytes:?}"),
                Ok(_) => {}
                Err(err) => return err,
            }
        }
        unreachable!()
    }

    let cases: &[&[u8]] = &[
        b"s = \"\x80\"\n",             // stray continuation
        b"s = \"\xC0\xAF\"\n",         // overlong lead C0
        b"s = \"\xC1\x80\"\n",         // overlong lead C1
        b"s = \"\xC2\x20\"\n",         // bad continuation
        b"s = \"\xE0\x80\x80\"\n",     // overlong 3-byte
        b"s = \"\xED\xA0\x80\"\n",     // encoded surrogate
        b"s = \"\xF0\x80\x80\x80\"\n", // overlong 4-byte
        b"s = \"\xF4\x90\x80\x80\"\n", // beyond U+10FFFF
        b"s = \"\xF5\x80\x80\x80\"\n", // invalid lead
        b"s = \"\xFF\"\n",             // invalid lead
        b"# comment \xE2\x28\xA1\n",   // bad continuation in a comment
    ];
    for case in cases {
        let err = err_for(case);
        assert!(
            matches!(err.kind, ErrorKind::Syntax(_)),
            "wrong kind {:?} for {case:?}",
            err.kind
        );
    }

    // Truncated sequence at end of input.
    let err = err_for(b"s = \"\xE2\x82");
    assert!(matches!(err.kind, ErrorKind::UnexpectedEndOfInput));
}

#[test]
fn number_classification() {
    assert_eq!(
        tokens("a = 0\n"),
        vec![KeyBegin, Key("a"), ValueBegin, Int("0"), EndOfDocument]
    );
    assert_eq!(
        tokens("a = -17\n"),
        vec![KeyBegin, Key("a"), ValueBegin, Int("-17"), EndOfDocument]
    );
    assert_eq!(
        tokens("a = 0xDEAD_BEEF\n"),
        vec![KeyBegin, Key("a"), ValueBegin, Int("0xDEAD_BEEF"), EndOfDocument]
    );
    assert_eq!(
        tokens("a = 0.5\n"),
        vec![KeyBegin, Key("a"), ValueBegin, Float("0.5"), EndOfDocument]
    );
    assert_eq!(
        tokens("a = 5e+22\n"),
        vec![KeyBegin, Key("a"), ValueBegin, Float("5e+22"), EndOfDocument]
    );
    // A negative exponent is not a date shape.
    assert_eq!(
        tokens("a = 123e-45\n"),
        vec![KeyBegin, Key("a"), ValueBegin, Float("123e-45"), EndOfDocument]
    );
    assert_eq!(
        tokens("a = -inf\n"),
        vec![KeyBegin, Key("a"), ValueBegin, Float("-inf"), EndOfDocument]
    );
    assert_eq!(
        tokens("a = nan\n"),
        vec![KeyBegin, Key("a"), ValueBegin, Float("nan"), EndOfDocument]
    );
    assert_eq!(
        tokens("a = 1979-05-27T07:32:00Z\n"),
        vec![
            KeyBegin,
            Key("a"),
            ValueBegin,
            Datetime("1979-05-27T07:32:00Z"),
            EndOfDocument
        ]
    );
    assert_eq!(
        tokens("a = 07:32:00\n"),
        vec![KeyBegin, Key("a"), ValueBegin, Datetime("07:32:00"), EndOfDocument]
    );
    // A space may join a date to its time part.
    assert_eq!(
        tokens("a = 1979-05-27 07:32:00\n"),
        vec![
            KeyBegin,
            Key("a"),
            ValueBegin,
            Datetime("1979-05-27 07:32:00"),
            EndOfDocument
        ]
    );
    // ...but only when a digit follows the space.
    assert_eq!(
        tokens("a = 1979-05-27 # released\n"),
        vec![KeyBegin, Key("a"), ValueBegin, Datetime("1979-05-27"), EndOfDocument]
    );
}

#[test]
fn number_boundary_errors() {
    // No leading zeros.
    assert!(matches!(scan_err("a = 01\n").kind, ErrorKind::Syntax(_)));
    assert!(matches!(scan_err("a = 00.5\n").kind, ErrorKind::Syntax(_)));
    // Signs are forbidden on based integers.
    assert!(matches!(scan_err("a = +0x1\n").kind, ErrorKind::Syntax(_)));
    assert!(matches!(scan_err("a = -0o7\n").kind, ErrorKind::Syntax(_)));
    // A lone sign or word is not a value.
    assert!(matches!(scan_err("a = +\n").kind, ErrorKind::Syntax(_)));
    assert!(matches!(scan_err("a = infinity\n").kind, ErrorKind::Syntax(_)));
    assert!(matches!(scan_err("a = tru\n").kind, ErrorKind::Syntax(_)));
}

#[test]
fn comments() {
    assert_eq!(
        tokens("# top\na = 1 # inline\n# trailing"),
        vec![KeyBegin, Key("a"), ValueBegin, Int("1"), EndOfDocument]
    );
    // Control characters other than tab are not allowed in comments.
    assert!(matches!(
        scan_err("# bad \u{0} comment\n").kind,
        ErrorKind::Syntax(_)
    ));
    // Comments are fine between array elements.
    assert_eq!(
        tokens("a = [ # first\n1, # second\n2,\n]\n"),
        vec![
            KeyBegin,
            Key("a"),
            ValueBegin,
            ArrayBegin,
            Int("1"),
            Int("2"),
            ArrayEnd,
            EndOfDocument
        ]
    );
}

#[test]
fn inline_table_discipline() {
    // No newlines inside inline tables.
    assert!(matches!(
        scan_err("p = {x = 1,\ny = 2}\n").kind,
        ErrorKind::Syntax(_)
    ));
    // No comments either.
    assert!(matches!(
        scan_err("p = {x = 1 # huh\n}\n").kind,
        ErrorKind::Syntax(_)
    ));
    // No trailing comma.
    assert!(matches!(
        scan_err("p = {x = 1,}\n").kind,
        ErrorKind::Syntax(_)
    ));
    // Empty inline table is fine.
    assert_eq!(
        tokens("p = {}\n"),
        vec![KeyBegin, Key("p"), ValueBegin, InlineTableBegin, InlineTableEnd, EndOfDocument]
    );
    // Arrays allow trailing commas and newlines.
    assert_eq!(
        tokens("a = [\n1,\n2,\n]\n"),
        vec![
            KeyBegin,
            Key("a"),
            ValueBegin,
            ArrayBegin,
            Int("1"),
            Int("2"),
            ArrayEnd,
            EndOfDocument
        ]
    );
}

#[test]
fn truncation_yields_unexpected_end_of_input() {
    for input in [
        "a = \"unterminated",
        "a = '''never closed",
        "a = [1, 2",
        "p = {x = 1",
        "[table",
        "[[name]",
        "a",
        "a.",
        "a = ",
    ] {
        let err = scan_err(input);
        assert!(
            matches!(err.kind, ErrorKind::UnexpectedEndOfInput),
            "wrong kind {:?} for {input:?}",
            err.kind
        );
    }
}

#[test]
fn statement_level_errors() {
    assert!(matches!(scan_err("= 1\n").kind, ErrorKind::Syntax(_)));
    assert!(matches!(scan_err("a == 1\n").kind, ErrorKind::Syntax(_)));
    assert!(matches!(scan_err("a = 1 b = 2\n").kind, ErrorKind::Syntax(_)));
    assert!(matches!(scan_err("[a] b = 1\n").kind, ErrorKind::Syntax(_)));
    assert!(matches!(scan_err("[a\n]\n").kind, ErrorKind::Syntax(_)));
    assert!(matches!(scan_err("[[a]\n").kind, ErrorKind::Syntax(_)));
    // A BOM is not stripped by the scanner.
    let mut scanner = Scanner::new(b"\xEF\xBB\xBFa = 1\n");
    let _ = scanner.next().unwrap(); // KeyBegin is emitted eagerly
    assert!(scanner.next().is_err());
}

#[test]
fn position_tracking() {
    let err = scan_err("a = 1\nb = \n");
    assert_eq!(err.position.line, 2);

    let err = scan_err("ok = true\nalso = true\nbad = \u{1}\n");
    assert_eq!(err.position.line, 3);
    assert_eq!(err.position.column, 7);

    let mut scanner = Scanner::new(b"a = 1\nb = 2\n");
    loop {
        match scanner.next().unwrap() {
            Token::EndOfDocument => break,
            _ => {}
        }
    }
    assert_eq!(scanner.position().line, 3);
    assert_eq!(scanner.position().offset, 12);
}

#[test]
fn end_of_document_is_sticky() {
    let mut scanner = Scanner::new(b"");
    assert_eq!(scanner.next().unwrap(), Token::EndOfDocument);
    assert_eq!(scanner.next().unwrap(), Token::EndOfDocument);
}

#[test]
fn next_alloc_borrows_when_possible() {
    let arena = crate::Arena::new();
    let options = Options::default();
    let input = "s = \"plain\"\nk = \"es\\tc\"\n";
    let toks = alloc_tokens(input, &arena, &options);
    assert_eq!(
        toks,
        vec![
            KeyBegin,
            Key("s"),
            ValueBegin,
            String("plain"),
            KeyBegin,
            Key("k"),
            ValueBegin,
            AllocatedString("es\tc"),
            EndOfDocument
        ]
    );

    // The borrowed scalar points into the input buffer.
    let Token::String(plain) = toks[3] else {
        panic!()
    };
    let start = input.as_ptr() as usize;
    let ptr = plain.as_ptr() as usize;
    assert!(ptr >= start && ptr < start + input.len());
}

#[test]
fn next_alloc_always_copies() {
    let arena = crate::Arena::new();
    let options = Options {
        allocate: Allocate::Always,
        ..Options::default()
    };
    let input = "s = \"plain\"\n";
    let toks = alloc_tokens(input, &arena, &options);
    let Token::AllocatedString(text) = toks[3] else {
        panic!("expected an allocated string, got {:?}", toks[3]);
    };
    assert_eq!(text, "plain");
    let start = input.as_ptr() as usize;
    let ptr = text.as_ptr() as usize;
    assert!(ptr < start || ptr >= start + input.len());
}

#[test]
fn max_value_len_is_enforced() {
    let arena = crate::Arena::new();
    let options = Options {
        max_value_len: Some(4),
        ..Options::default()
    };

    let mut scanner = Scanner::new(b"s = \"abcdefgh\"\n");
    let err = loop {
        match scanner.next_alloc(&arena, &options) {
            Ok(Token::EndOfDocument) => panic!("expected ValueTooLong"),
            Ok(_) => {}
            Err(err) => break err,
        }
    };
    assert!(matches!(err.kind, ErrorKind::ValueTooLong(4)));

    // Coalesced fragments count their decoded length.
    let mut scanner = Scanner::new(b"s = \"ab\\tcdefgh\"\n");
    let err = loop {
        match scanner.next_alloc(&arena, &options) {
            Ok(Token::EndOfDocument) => panic!("expected ValueTooLong"),
            Ok(_) => {}
            Err(err) => break err,
        }
    };
    assert!(matches!(err.kind, ErrorKind::ValueTooLong(4)));

    // Values at the limit pass.
    let mut scanner = Scanner::new(b"s = \"abcd\"\n");
    loop {
        match scanner.next_alloc(&arena, &options) {
            Ok(Token::EndOfDocument) => break,
            Ok(_) => {}
            Err(err) => panic!("unexpected error: {err}"),
        }
    }
}
