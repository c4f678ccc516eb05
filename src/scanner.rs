#![allow(unsafe_code)]

//! The lexical scanner: a single-pass state machine over a complete byte
//! buffer.
//!
//! [`Scanner::next`] emits raw [`Token`]s, including *partial* fragments:
//! string and key content is produced as zero-copy slices of the input,
//! broken wherever an escape sequence or newline normalization interrupts
//! the raw bytes. [`Scanner::next_alloc`] is the allocating accessor that
//! coalesces a fragment run into one borrowed or arena-owned value.
//!
//! The scanner enforces every lexical rule (character classes, quoting,
//! UTF-8 well-formedness, escape syntax, whitespace and newline discipline)
//! but knows nothing about duplicate keys or table structure; those checks
//! belong to the tree builder.

#[cfg(test)]
#[path = "./scanner_tests.rs"]
mod tests;

use crate::arena::Arena;
use crate::error::{Error, ErrorKind, Position};
use crate::parser::{Allocate, Options};
use smallvec::SmallVec;

/// Newline convention used when normalizing line endings inside multi-line
/// strings.
#[cfg(windows)]
const NEWLINE: &[u8] = b"\r\n";
#[cfg(not(windows))]
const NEWLINE: &[u8] = b"\n";

/// A token produced by the [`Scanner`].
///
/// Structural tokens carry no content. Contentful tokens borrow from the
/// input; `Allocated*` tokens (produced only by [`Scanner::next_alloc`])
/// borrow from the [`Arena`]. `Partial*` tokens are fragments of a single
/// string or key, terminated by a final `String`/`Key` token carrying the
/// last raw span.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'de> {
    /// Start of a key segment in an assignment or inline table.
    KeyBegin,
    /// Start of a `[table]` header key list.
    TableKeyBegin,
    /// Start of a `[[array-of-tables]]` header key list.
    ArrayTableKeyBegin,
    /// Closes a header key list; the table body follows.
    TableBegin,
    /// Closes an assignment key list; the value follows.
    ValueBegin,
    /// `[` opening an inline array value.
    ArrayBegin,
    /// `]` closing an inline array value.
    ArrayEnd,
    /// `{` opening an inline table value.
    InlineTableBegin,
    /// `}` closing an inline table value.
    InlineTableEnd,
    /// The literal `true`.
    True,
    /// The literal `false`.
    False,
    /// The input is structurally complete and fully consumed.
    EndOfDocument,

    /// Final (or only) raw span of a key.
    Key(&'de str),
    /// A raw key fragment; more fragments follow.
    PartialKey(&'de str),
    /// One decoded escape byte of a key; more fragments follow.
    PartialKeyEscaped(u8),
    /// A coalesced, arena-owned key (from [`Scanner::next_alloc`]).
    AllocatedKey(&'de str),

    /// Final (or only) raw span of a string value.
    String(&'de str),
    /// A raw string fragment; more fragments follow.
    PartialString(&'de str),
    /// One decoded escape byte of a string; more fragments follow.
    PartialStringEscaped(u8),
    /// A coalesced, arena-owned string (from [`Scanner::next_alloc`]).
    AllocatedString(&'de str),

    /// An integer lexeme, conversion deferred to the consumer.
    Int(&'de str),
    /// A float lexeme, conversion deferred to the consumer.
    Float(&'de str),
    /// A date-time lexeme, conversion deferred to the consumer.
    Datetime(&'de str),
}

/// What opened the current nesting level. Post-value transitions consult the
/// top of the mode stack to validate `,`, `]`, `}`, newlines, and comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Array,
    InlineTable,
}

/// Position of the key currently being scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyDest {
    /// Left-hand side of an assignment (statement or inline table).
    Assign,
    /// Inside a `[table]` header.
    Table,
    /// Inside a `[[array-of-tables]]` header.
    ArrayTable,
}

/// Whether a string is a key or a value; decides the token flavor and the
/// state entered after the closing delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StrDest {
    Value,
    Key(KeyDest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    Basic,
    MultiBasic,
    Literal,
    MultiLiteral,
}

impl Flavor {
    #[inline]
    fn delim(self) -> u8 {
        match self {
            Self::Basic | Self::MultiBasic => b'"',
            Self::Literal | Self::MultiLiteral => b'\'',
        }
    }

    #[inline]
    fn multiline(self) -> bool {
        matches!(self, Self::MultiBasic | Self::MultiLiteral)
    }

    #[inline]
    fn basic(self) -> bool {
        matches!(self, Self::Basic | Self::MultiBasic)
    }
}

/// Principal scanner state, persisted between [`Scanner::next`] calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// At a statement boundary: key, header, comment, blank line, or EOF.
    Statement,
    /// Expecting a key segment.
    Key(KeyDest),
    /// After a key segment: `.`, `=`, or the closing bracket(s).
    AfterKey(KeyDest),
    /// After `=`: expecting a value on the same line.
    Value,
    /// Inside a string; fragments may still be pending.
    InString { flavor: Flavor, dest: StrDest },
    /// After a complete value; dispatch on the mode stack.
    PostValue,
    /// Inside an array, expecting a value or `]`.
    ArrayElement,
    /// Inside an inline table, expecting a key (or `}` when `first`).
    InlineKey { first: bool },
    /// After a header's closing bracket: only trivia until end of line.
    AfterHeader,
    /// `EndOfDocument` was emitted; repeats forever.
    End,
}

/// A streaming TOML scanner over a complete input slice.
pub struct Scanner<'de> {
    input: &'de [u8],
    cursor: usize,
    /// Start of the raw span that the next contentful token will carry.
    value_start: usize,
    state: State,
    modes: SmallVec<[Mode; 8]>,

    // Decoded escape bytes not yet emitted, drained one per next() call.
    pending: [u8; 4],
    pending_len: u8,
    pending_next: u8,

    // Diagnostics, updated on every consumed newline.
    line: u32,
    line_start: usize,
}

impl<'de> Scanner<'de> {
    /// Creates a scanner over a complete input buffer.
    pub fn new(input: &'de [u8]) -> Self {
        Scanner {
            input,
            cursor: 0,
            value_start: 0,
            state: State::Statement,
            modes: SmallVec::new(),
            pending: [0; 4],
            pending_len: 0,
            pending_next: 0,
            line: 1,
            line_start: 0,
        }
    }

    /// The current source position (line and column are 1-based).
    pub fn position(&self) -> Position {
        self.position_at(self.cursor)
    }

    fn position_at(&self, offset: usize) -> Position {
        let column = if offset >= self.line_start {
            (offset - self.line_start) as u32 + 1
        } else {
            1
        };
        Position {
            line: self.line,
            column,
            offset,
        }
    }

    #[cold]
    fn error_here(&self, kind: ErrorKind) -> Error {
        Error::new(kind, self.position())
    }

    #[cold]
    fn error_at(&self, offset: usize, kind: ErrorKind) -> Error {
        Error::new(kind, self.position_at(offset))
    }

    /// Get a `&str` slice of the input.
    ///
    /// SAFETY: callers must only slice regions already validated as UTF-8
    /// (ASCII lexemes, or string content the validator has walked).
    fn slice(&self, start: usize, end: usize) -> &'de str {
        #[cfg(not(debug_assertions))]
        // Safety: see above; every call site slices validated bytes.
        unsafe {
            std::str::from_utf8_unchecked(&self.input[start..end])
        }
        #[cfg(debug_assertions)]
        match std::str::from_utf8(&self.input[start..end]) {
            Ok(text) => text,
            Err(err) => panic!("sliced unvalidated bytes at {start}..{end}: {err}"),
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.input.get(self.cursor).copied()
    }

    #[inline]
    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.cursor + offset).copied()
    }

    #[inline]
    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    #[inline]
    fn bump_line(&mut self) {
        self.line += 1;
        self.line_start = self.cursor;
    }

    fn skip_ws(&mut self) {
        while let Some(b' ' | b'\t') = self.peek() {
            self.cursor += 1;
        }
    }

    /// Consume `\n` or `\r\n`, updating diagnostics. A bare `\r` is left in
    /// place for the caller to reject.
    fn eat_newline(&mut self) -> bool {
        match self.peek() {
            Some(b'\n') => {
                self.cursor += 1;
                self.bump_line();
                true
            }
            Some(b'\r') if self.peek_at(1) == Some(b'\n') => {
                self.cursor += 2;
                self.bump_line();
                true
            }
            _ => false,
        }
    }

    /// Returns the next raw token.
    ///
    /// The token stream of a well-formed document always terminates in
    /// [`Token::EndOfDocument`], which then repeats on further calls.
    pub fn next(&mut self) -> Result<Token<'de>, Error> {
        // Drain decoded escape bytes first, one token per byte.
        if self.pending_next < self.pending_len {
            let byte = self.pending[self.pending_next as usize];
            self.pending_next += 1;
            let in_key = matches!(
                self.state,
                State::InString {
                    dest: StrDest::Key(_),
                    ..
                }
            );
            return Ok(if in_key {
                Token::PartialKeyEscaped(byte)
            } else {
                Token::PartialStringEscaped(byte)
            });
        }

        loop {
            match self.state {
                State::Statement => {
                    self.skip_ws();
                    match self.peek() {
                        None => {
                            self.state = State::End;
                            return Ok(Token::EndOfDocument);
                        }
                        Some(b'#') => {
                            self.cursor += 1;
                            self.scan_comment()?;
                        }
                        Some(b'\n' | b'\r') => {
                            if !self.eat_newline() {
                                return Err(self
                                    .error_here(ErrorKind::Syntax("bare carriage return")));
                            }
                        }
                        Some(b'[') => {
                            self.cursor += 1;
                            return Ok(if self.eat(b'[') {
                                self.state = State::Key(KeyDest::ArrayTable);
                                Token::ArrayTableKeyBegin
                            } else {
                                self.state = State::Key(KeyDest::Table);
                                Token::TableKeyBegin
                            });
                        }
                        Some(_) => {
                            self.state = State::Key(KeyDest::Assign);
                            return Ok(Token::KeyBegin);
                        }
                    }
                }

                State::Key(dest) => {
                    self.skip_ws();
                    match self.peek() {
                        None => return Err(self.error_here(ErrorKind::UnexpectedEndOfInput)),
                        Some(b) if is_keylike_byte(b) => {
                            let start = self.cursor;
                            while let Some(b) = self.peek() {
                                if !is_keylike_byte(b) {
                                    break;
                                }
                                self.cursor += 1;
                            }
                            self.state = State::AfterKey(dest);
                            return Ok(Token::Key(self.slice(start, self.cursor)));
                        }
                        Some(q @ (b'"' | b'\'')) => {
                            return self.open_string(q, StrDest::Key(dest));
                        }
                        Some(_) => {
                            return Err(self.error_here(ErrorKind::Syntax("expected a key")));
                        }
                    }
                }

                State::AfterKey(dest) => {
                    self.skip_ws();
                    match self.peek() {
                        None => return Err(self.error_here(ErrorKind::UnexpectedEndOfInput)),
                        Some(b'.') => {
                            self.cursor += 1;
                            self.state = State::Key(dest);
                            return Ok(Token::KeyBegin);
                        }
                        Some(b'=') if dest == KeyDest::Assign => {
                            self.cursor += 1;
                            self.state = State::Value;
                            return Ok(Token::ValueBegin);
                        }
                        Some(b']') if dest == KeyDest::Table => {
                            self.cursor += 1;
                            self.state = State::AfterHeader;
                            return Ok(Token::TableBegin);
                        }
                        Some(b']') if dest == KeyDest::ArrayTable => {
                            self.cursor += 1;
                            if !self.eat(b']') {
                                return Err(match self.peek() {
                                    None => self.error_here(ErrorKind::UnexpectedEndOfInput),
                                    Some(_) => self.error_here(ErrorKind::Syntax(
                                        "expected `]]` to close the array-of-tables header",
                                    )),
                                });
                            }
                            self.state = State::AfterHeader;
                            return Ok(Token::TableBegin);
                        }
                        Some(_) => {
                            return Err(self.error_here(match dest {
                                KeyDest::Assign => {
                                    ErrorKind::Syntax("expected `.` or `=` after key")
                                }
                                _ => ErrorKind::Syntax("expected `.` or `]` after key"),
                            }));
                        }
                    }
                }

                State::Value => {
                    self.skip_ws();
                    return self.scan_value_start();
                }

                State::InString { .. } => return self.scan_string_content(),

                State::PostValue => match self.modes.last().copied() {
                    None => {
                        self.skip_ws();
                        match self.peek() {
                            None => self.state = State::Statement,
                            Some(b'#') => {
                                self.cursor += 1;
                                self.scan_comment()?;
                            }
                            Some(b'\n' | b'\r') => {
                                if !self.eat_newline() {
                                    return Err(self
                                        .error_here(ErrorKind::Syntax("bare carriage return")));
                                }
                                self.state = State::Statement;
                            }
                            Some(_) => {
                                return Err(self.error_here(ErrorKind::Syntax(
                                    "expected a newline or comment after value",
                                )));
                            }
                        }
                    }
                    Some(Mode::Array) => {
                        self.skip_array_trivia()?;
                        match self.peek() {
                            None => {
                                return Err(self.error_here(ErrorKind::UnexpectedEndOfInput));
                            }
                            Some(b',') => {
                                self.cursor += 1;
                                self.state = State::ArrayElement;
                            }
                            Some(b']') => {
                                self.cursor += 1;
                                self.modes.pop();
                                self.state = State::PostValue;
                                return Ok(Token::ArrayEnd);
                            }
                            Some(_) => {
                                return Err(self
                                    .error_here(ErrorKind::Syntax("expected `,` or `]` in array")));
                            }
                        }
                    }
                    Some(Mode::InlineTable) => {
                        self.skip_ws();
                        match self.peek() {
                            None => {
                                return Err(self.error_here(ErrorKind::UnexpectedEndOfInput));
                            }
                            Some(b',') => {
                                self.cursor += 1;
                                self.state = State::InlineKey { first: false };
                            }
                            Some(b'}') => {
                                self.cursor += 1;
                                self.modes.pop();
                                self.state = State::PostValue;
                                return Ok(Token::InlineTableEnd);
                            }
                            Some(b'\n' | b'\r') => {
                                return Err(self
                                    .error_here(ErrorKind::Syntax("newline in inline table")));
                            }
                            Some(b'#') => {
                                return Err(self
                                    .error_here(ErrorKind::Syntax("comment in inline table")));
                            }
                            Some(_) => {
                                return Err(self.error_here(ErrorKind::Syntax(
                                    "expected `,` or `}` in inline table",
                                )));
                            }
                        }
                    }
                },

                State::ArrayElement => {
                    self.skip_array_trivia()?;
                    match self.peek() {
                        None => return Err(self.error_here(ErrorKind::UnexpectedEndOfInput)),
                        Some(b']') => {
                            self.cursor += 1;
                            self.modes.pop();
                            self.state = State::PostValue;
                            return Ok(Token::ArrayEnd);
                        }
                        Some(_) => return self.scan_value_start(),
                    }
                }

                State::InlineKey { first } => {
                    self.skip_ws();
                    match self.peek() {
                        None => return Err(self.error_here(ErrorKind::UnexpectedEndOfInput)),
                        Some(b'}') if first => {
                            self.cursor += 1;
                            self.modes.pop();
                            self.state = State::PostValue;
                            return Ok(Token::InlineTableEnd);
                        }
                        Some(b'}') => {
                            return Err(self
                                .error_here(ErrorKind::Syntax("trailing comma in inline table")));
                        }
                        Some(b'\n' | b'\r') => {
                            return Err(self.error_here(ErrorKind::Syntax(
                                "newline in inline table",
                            )));
                        }
                        Some(b'#') => {
                            return Err(self
                                .error_here(ErrorKind::Syntax("comment in inline table")));
                        }
                        Some(_) => {
                            self.state = State::Key(KeyDest::Assign);
                            return Ok(Token::KeyBegin);
                        }
                    }
                }

                State::AfterHeader => {
                    self.skip_ws();
                    match self.peek() {
                        None => self.state = State::Statement,
                        Some(b'#') => {
                            self.cursor += 1;
                            self.scan_comment()?;
                        }
                        Some(b'\n' | b'\r') => {
                            if !self.eat_newline() {
                                return Err(self
                                    .error_here(ErrorKind::Syntax("bare carriage return")));
                            }
                            self.state = State::Statement;
                        }
                        Some(_) => {
                            return Err(self.error_here(ErrorKind::Syntax(
                                "expected a newline after table header",
                            )));
                        }
                    }
                }

                State::End => return Ok(Token::EndOfDocument),
            }
        }
    }

    /// The allocating accessor: like [`next`](Self::next), but fragment runs
    /// are coalesced into a single token.
    ///
    /// A string or key that consists of exactly one raw span is returned
    /// borrowed (or copied into the arena under [`Allocate::Always`]);
    /// fragmented content is assembled in the arena and returned as an
    /// `Allocated*` token. Enforces `max_value_len` on every contentful
    /// token.
    pub fn next_alloc(
        &mut self,
        arena: &'de Arena,
        options: &Options,
    ) -> Result<Token<'de>, Error> {
        let max = options.max_value_len.unwrap_or(self.input.len());
        let token = self.next()?;
        match token {
            Token::Key(text) => {
                self.check_len(text.len(), max)?;
                Ok(match options.allocate {
                    Allocate::IfNeeded => Token::Key(text),
                    Allocate::Always => Token::AllocatedKey(arena.alloc_str(text)),
                })
            }
            Token::String(text) => {
                self.check_len(text.len(), max)?;
                Ok(match options.allocate {
                    Allocate::IfNeeded => Token::String(text),
                    Allocate::Always => Token::AllocatedString(arena.alloc_str(text)),
                })
            }
            Token::Int(text) | Token::Float(text) | Token::Datetime(text) => {
                self.check_len(text.len(), max)?;
                Ok(token)
            }
            Token::PartialKey(..)
            | Token::PartialKeyEscaped(..)
            | Token::PartialString(..)
            | Token::PartialStringEscaped(..) => self.coalesce(arena, token, max),
            _ => Ok(token),
        }
    }

    fn check_len(&self, len: usize, max: usize) -> Result<(), Error> {
        if len > max {
            Err(self.error_here(ErrorKind::ValueTooLong(max)))
        } else {
            Ok(())
        }
    }

    /// Assemble a fragment run into one arena-owned token.
    fn coalesce(
        &mut self,
        arena: &'de Arena,
        first: Token<'de>,
        max: usize,
    ) -> Result<Token<'de>, Error> {
        // Safety: the scanner performs no arena writes between fragments, so
        // this scratch is the only one live until it commits below.
        let mut scratch = unsafe { arena.scratch() };
        let mut token = first;
        loop {
            match token {
                Token::PartialKey(text) | Token::PartialString(text) => {
                    scratch.extend(text.as_bytes());
                }
                Token::PartialKeyEscaped(byte) | Token::PartialStringEscaped(byte) => {
                    scratch.push(byte);
                }
                Token::Key(text) | Token::String(text) => {
                    scratch.extend(text.as_bytes());
                    self.check_len(scratch.len(), max)?;
                    let is_key = matches!(token, Token::Key(..));
                    let bytes = scratch.commit();
                    // Safety: raw spans are scanner-validated UTF-8 and
                    // escape bytes are emitted in encoding order, so the
                    // concatenation is valid UTF-8.
                    let text = unsafe { std::str::from_utf8_unchecked(bytes) };
                    return Ok(if is_key {
                        Token::AllocatedKey(text)
                    } else {
                        Token::AllocatedString(text)
                    });
                }
                // A fragment run is always terminated by Key/String before
                // any other token can appear.
                _ => unreachable!("fragment run interrupted by {token:?}"),
            }
            self.check_len(scratch.len(), max)?;
            token = self.next()?;
        }
    }

    /// Dispatch at the first byte of a value. Whitespace has been skipped.
    fn scan_value_start(&mut self) -> Result<Token<'de>, Error> {
        let Some(b) = self.peek() else {
            return Err(self.error_here(ErrorKind::UnexpectedEndOfInput));
        };
        match b {
            b'"' | b'\'' => self.open_string(b, StrDest::Value),
            b'[' => {
                self.cursor += 1;
                self.modes.push(Mode::Array);
                self.state = State::ArrayElement;
                Ok(Token::ArrayBegin)
            }
            b'{' => {
                self.cursor += 1;
                self.modes.push(Mode::InlineTable);
                self.state = State::InlineKey { first: true };
                Ok(Token::InlineTableBegin)
            }
            b't' => {
                if self.input[self.cursor..].starts_with(b"true") {
                    self.cursor += 4;
                    self.state = State::PostValue;
                    Ok(Token::True)
                } else {
                    Err(self.error_here(ErrorKind::Syntax("expected the literal `true`")))
                }
            }
            b'f' => {
                if self.input[self.cursor..].starts_with(b"false") {
                    self.cursor += 5;
                    self.state = State::PostValue;
                    Ok(Token::False)
                } else {
                    Err(self.error_here(ErrorKind::Syntax("expected the literal `false`")))
                }
            }
            b'0'..=b'9' | b'+' | b'-' | b'i' | b'n' => self.scan_number(),
            _ => Err(self.error_here(ErrorKind::Syntax("expected a value"))),
        }
    }

    /// Consume the opening delimiter(s) of a string and scan the first
    /// content token. `delim` is `"` or `'`; the cursor is at the delimiter.
    fn open_string(&mut self, delim: u8, dest: StrDest) -> Result<Token<'de>, Error> {
        let basic = delim == b'"';
        let open = self.cursor;
        self.cursor += 1;
        if self.eat(delim) {
            if self.eat(delim) {
                if matches!(dest, StrDest::Key(_)) {
                    return Err(self.error_at(
                        open,
                        ErrorKind::Syntax("multi-line strings are not allowed for keys"),
                    ));
                }
                // A newline straight after the opening delimiter is trimmed.
                self.eat_newline();
                self.state = State::InString {
                    flavor: if basic {
                        Flavor::MultiBasic
                    } else {
                        Flavor::MultiLiteral
                    },
                    dest,
                };
                self.value_start = self.cursor;
                return self.scan_string_content();
            }
            // Two delimiters: the empty string.
            return Ok(self.finish_string("", dest));
        }
        self.state = State::InString {
            flavor: if basic { Flavor::Basic } else { Flavor::Literal },
            dest,
        };
        self.value_start = self.cursor;
        self.scan_string_content()
    }

    /// Emit the final token of a string and restore the surrounding state.
    fn finish_string(&mut self, text: &'de str, dest: StrDest) -> Token<'de> {
        match dest {
            StrDest::Value => {
                self.state = State::PostValue;
                Token::String(text)
            }
            StrDest::Key(kd) => {
                self.state = State::AfterKey(kd);
                Token::Key(text)
            }
        }
    }

    #[inline]
    fn partial(&self, text: &'de str, dest: StrDest) -> Token<'de> {
        match dest {
            StrDest::Value => Token::PartialString(text),
            StrDest::Key(_) => Token::PartialKey(text),
        }
    }

    /// Stash decoded bytes and emit the first of them.
    fn queue_pending(&mut self, bytes: &[u8], dest: StrDest) -> Token<'de> {
        debug_assert!(!bytes.is_empty() && bytes.len() <= 4);
        self.pending[..bytes.len()].copy_from_slice(bytes);
        self.pending_len = bytes.len() as u8;
        self.pending_next = 1;
        match dest {
            StrDest::Value => Token::PartialStringEscaped(bytes[0]),
            StrDest::Key(_) => Token::PartialKeyEscaped(bytes[0]),
        }
    }

    /// Scan string content from the cursor, returning exactly one token.
    fn scan_string_content(&mut self) -> Result<Token<'de>, Error> {
        let State::InString { flavor, dest } = self.state else {
            unreachable!("scan_string_content outside a string");
        };
        let delim = flavor.delim();
        let multiline = flavor.multiline();
        let basic = flavor.basic();

        loop {
            self.skip_plain(delim);
            let i = self.cursor;
            let Some(&b) = self.input.get(i) else {
                return Err(self.error_here(ErrorKind::UnexpectedEndOfInput));
            };
            match b {
                d if d == delim => {
                    if !multiline {
                        let text = self.slice(self.value_start, i);
                        self.cursor = i + 1;
                        return Ok(self.finish_string(text, dest));
                    }
                    // TOML permits up to five delimiters in the close run:
                    // the last three terminate, the rest are content.
                    let mut n = 1usize;
                    while n < 6 && self.input.get(i + n) == Some(&delim) {
                        n += 1;
                    }
                    if n < 3 {
                        self.cursor = i + n;
                        continue;
                    }
                    if n == 6 {
                        return Err(self.error_at(
                            i,
                            ErrorKind::Syntax("too many quotes closing a multi-line string"),
                        ));
                    }
                    let extras = n - 3;
                    let text = self.slice(self.value_start, i + extras);
                    self.cursor = i + n;
                    return Ok(self.finish_string(text, dest));
                }
                b'\\' if basic => {
                    if i > self.value_start {
                        let text = self.slice(self.value_start, i);
                        self.value_start = i;
                        return Ok(self.partial(text, dest));
                    }
                    self.cursor = i + 1;
                    match self.scan_escape(multiline)? {
                        Some((buf, len)) => {
                            self.value_start = self.cursor;
                            return Ok(self.queue_pending(&buf[..len as usize], dest));
                        }
                        // Line continuation: trimmed, nothing to emit.
                        None => self.value_start = self.cursor,
                    }
                }
                b'\n' => {
                    if !multiline {
                        return Err(self.error_at(i, ErrorKind::Syntax("newline in string")));
                    }
                    if NEWLINE.len() == 1 {
                        // The source byte already matches the convention;
                        // keep it in the raw span.
                        self.cursor = i + 1;
                        self.bump_line();
                        continue;
                    }
                    if i > self.value_start {
                        let text = self.slice(self.value_start, i);
                        self.value_start = i;
                        return Ok(self.partial(text, dest));
                    }
                    self.cursor = i + 1;
                    self.bump_line();
                    self.value_start = self.cursor;
                    return Ok(self.queue_pending(NEWLINE, dest));
                }
                b'\r' => {
                    if !multiline {
                        return Err(
                            self.error_at(i, ErrorKind::Syntax("carriage return in string"))
                        );
                    }
                    if self.input.get(i + 1) != Some(&b'\n') {
                        return Err(self.error_at(i, ErrorKind::Syntax("bare carriage return")));
                    }
                    if i > self.value_start {
                        let text = self.slice(self.value_start, i);
                        self.value_start = i;
                        return Ok(self.partial(text, dest));
                    }
                    self.cursor = i + 2;
                    self.bump_line();
                    self.value_start = self.cursor;
                    return Ok(self.queue_pending(NEWLINE, dest));
                }
                // Tab and backslash-in-literal are benign stops of the fast
                // scan; both are plain content.
                0x09 | 0x20..=0x7E => self.cursor = i + 1,
                0x80.. => self.validate_utf8()?,
                _ => {
                    return Err(self.error_at(i, ErrorKind::Syntax("control character in string")));
                }
            }
        }
    }

    /// Decode one backslash escape. The cursor is just past the backslash.
    /// Returns the decoded UTF-8 bytes, or `None` for a line continuation.
    fn scan_escape(&mut self, multiline: bool) -> Result<Option<([u8; 4], u8)>, Error> {
        let Some(&b) = self.input.get(self.cursor) else {
            return Err(self.error_here(ErrorKind::UnexpectedEndOfInput));
        };
        self.cursor += 1;
        let ch: char = match b {
            b'"' => return Ok(Some(single(b'"'))),
            b'\\' => return Ok(Some(single(b'\\'))),
            b'b' => return Ok(Some(single(0x08))),
            b'f' => return Ok(Some(single(0x0C))),
            b'n' => return Ok(Some(single(b'\n'))),
            b'r' => return Ok(Some(single(b'\r'))),
            b't' => return Ok(Some(single(b'\t'))),
            b'u' => self.scan_unicode_escape(4)?,
            b'U' => self.scan_unicode_escape(8)?,
            b' ' | b'\t' | b'\n' | b'\r' if multiline => {
                self.scan_line_continuation(b)?;
                return Ok(None);
            }
            _ => {
                self.cursor -= 1;
                return Err(self.error_here(ErrorKind::Syntax("invalid escape sequence")));
            }
        };
        let mut buf = [0u8; 4];
        let len = ch.encode_utf8(&mut buf).len() as u8;
        Ok(Some((buf, len)))
    }

    /// Decode `\uXXXX` / `\UXXXXXXXX`. The cursor is at the first hex digit.
    fn scan_unicode_escape(&mut self, digits: usize) -> Result<char, Error> {
        let escape_start = self.cursor;
        let mut value: u32 = 0;
        for _ in 0..digits {
            let Some(&byte) = self.input.get(self.cursor) else {
                return Err(self.error_here(ErrorKind::UnexpectedEndOfInput));
            };
            let digit = match byte {
                b'0'..=b'9' => byte - b'0',
                b'a'..=b'f' => byte - b'a' + 10,
                b'A'..=b'F' => byte - b'A' + 10,
                _ => {
                    return Err(
                        self.error_here(ErrorKind::Syntax("invalid hex digit in unicode escape"))
                    );
                }
            };
            value = (value << 4) | digit as u32;
            self.cursor += 1;
        }
        if value > 0x10FFFF {
            return Err(self.error_at(escape_start, ErrorKind::CodepointTooLarge(value)));
        }
        if (0xD800..=0xDFFF).contains(&value) {
            return Err(self.error_at(escape_start, ErrorKind::CannotEncodeSurrogateHalf(value)));
        }
        match char::from_u32(value) {
            Some(ch) => Ok(ch),
            None => Err(self.error_at(escape_start, ErrorKind::CodepointTooLarge(value))),
        }
    }

    /// `\` at end of line: trim the newline and all following whitespace.
    /// `first` is the byte after the backslash (space, tab, `\n`, or `\r`).
    fn scan_line_continuation(&mut self, first: u8) -> Result<(), Error> {
        match first {
            b'\n' => self.bump_line(),
            b'\r' => {
                if self.eat(b'\n') {
                    self.bump_line();
                } else {
                    return Err(
                        self.error_at(self.cursor - 1, ErrorKind::Syntax("bare carriage return"))
                    );
                }
            }
            _ => {
                // Whitespace after the backslash is only legal when a line
                // ending follows before any content.
                loop {
                    match self.peek() {
                        Some(b' ' | b'\t') => self.cursor += 1,
                        Some(b'\n' | b'\r') => {
                            if !self.eat_newline() {
                                return Err(self
                                    .error_here(ErrorKind::Syntax("bare carriage return")));
                            }
                            break;
                        }
                        Some(_) => {
                            return Err(
                                self.error_here(ErrorKind::Syntax("invalid escape sequence"))
                            );
                        }
                        None => return Err(self.error_here(ErrorKind::UnexpectedEndOfInput)),
                    }
                }
            }
        }
        loop {
            match self.peek() {
                Some(b' ' | b'\t') => self.cursor += 1,
                Some(b'\n' | b'\r') => {
                    if !self.eat_newline() {
                        return Err(self.error_here(ErrorKind::Syntax("bare carriage return")));
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Advance the cursor past bytes that need no special handling inside a
    /// string. Uses SWAR (SIMD-within-a-register) to scan 8 bytes at a time.
    ///
    /// Stops at the first byte that is:
    ///   * a control character (< 0x20) — tab (0x09) is a benign false positive
    ///   * DEL (0x7F) or any byte >= 0x80 (validated separately)
    ///   * the string delimiter (`"` or `'`)
    ///   * a backslash — benign false positive for literal strings
    ///   * past the end of input
    fn skip_plain(&mut self, delim: u8) {
        // Quick bail-out for EOF or an immediately-interesting byte.
        let Some(&b) = self.input.get(self.cursor) else {
            return;
        };
        if b == delim || b == b'\\' || b >= 0x7F || (b < 0x20 && b != 0x09) {
            return;
        }
        self.cursor += 1;

        let base = self.cursor;
        let rest = &self.input[base..];

        type Chunk = u64;
        const STEP: usize = std::mem::size_of::<Chunk>();
        const ONE: Chunk = Chunk::MAX / 255; // 0x0101_0101_0101_0101
        const HIGH: Chunk = ONE << 7; // 0x8080_8080_8080_8080

        let fill_delim = ONE * Chunk::from(delim);
        let fill_bslash = ONE * Chunk::from(b'\\');
        let fill_del = ONE * 0x7F;

        let chunks = rest.chunks_exact(STEP);
        let remainder_len = chunks.remainder().len();

        for (i, chunk) in chunks.enumerate() {
            let v = Chunk::from_le_bytes(chunk.try_into().unwrap());

            let has_ctrl = v.wrapping_sub(ONE * 0x20) & !v;
            let eq_delim = (v ^ fill_delim).wrapping_sub(ONE) & !(v ^ fill_delim);
            let eq_bslash = (v ^ fill_bslash).wrapping_sub(ONE) & !(v ^ fill_bslash);
            let eq_del = (v ^ fill_del).wrapping_sub(ONE) & !(v ^ fill_del);

            // `v` itself flags bytes with the top bit set (>= 0x80), which
            // must stop the scan for UTF-8 validation.
            let masked = (has_ctrl | eq_delim | eq_bslash | eq_del | v) & HIGH;
            if masked != 0 {
                self.cursor = base + i * STEP + masked.trailing_zeros() as usize / 8;
                return;
            }
        }

        self.cursor = self.input.len() - remainder_len;
        self.skip_plain_slow(delim);
    }

    #[cold]
    #[inline(never)]
    fn skip_plain_slow(&mut self, delim: u8) {
        while let Some(&b) = self.input.get(self.cursor) {
            if b == delim || b == b'\\' || b >= 0x7F || (b < 0x20 && b != 0x09) {
                return;
            }
            self.cursor += 1;
        }
    }

    /// Validate one multi-byte UTF-8 sequence starting at the cursor and
    /// advance past it. Implements the RFC 3629 byte-range table:
    /// `C2..DF` 2-byte; `E0 A0..BF`, `E1..EC/EE..EF 80..BF`, `ED 80..9F`
    /// 3-byte; `F0 90..BF`, `F1..F3 80..BF`, `F4 80..8F` 4-byte.
    fn validate_utf8(&mut self) -> Result<(), Error> {
        let start = self.cursor;
        let lead = self.input[start];
        let (len, lo, hi): (usize, u8, u8) = match lead {
            0xC2..=0xDF => (2, 0x80, 0xBF),
            0xE0 => (3, 0xA0, 0xBF),
            0xE1..=0xEC | 0xEE..=0xEF => (3, 0x80, 0xBF),
            0xED => (3, 0x80, 0x9F),
            0xF0 => (4, 0x90, 0xBF),
            0xF1..=0xF3 => (4, 0x80, 0xBF),
            0xF4 => (4, 0x80, 0x8F),
            // 80..BF (stray continuation), C0/C1 (overlong), F5..FF
            _ => return Err(self.error_at(start, ErrorKind::Syntax("invalid utf-8 byte"))),
        };
        for k in 1..len {
            let Some(&b) = self.input.get(start + k) else {
                self.cursor = self.input.len();
                return Err(self.error_here(ErrorKind::UnexpectedEndOfInput));
            };
            let (lo, hi) = if k == 1 { (lo, hi) } else { (0x80, 0xBF) };
            if !(lo..=hi).contains(&b) {
                return Err(
                    self.error_at(start + k, ErrorKind::Syntax("invalid utf-8 continuation byte"))
                );
            }
        }
        self.cursor = start + len;
        Ok(())
    }

    /// Consume a comment body. The `#` has been consumed; the terminating
    /// newline (or EOF) is left for the caller.
    fn scan_comment(&mut self) -> Result<(), Error> {
        loop {
            match self.peek() {
                None | Some(b'\n') => return Ok(()),
                Some(b'\r') => {
                    if self.peek_at(1) == Some(b'\n') {
                        return Ok(());
                    }
                    return Err(self.error_here(ErrorKind::Syntax("bare carriage return")));
                }
                Some(0x09 | 0x20..=0x7E) => self.cursor += 1,
                Some(0x80..) => self.validate_utf8()?,
                Some(_) => {
                    return Err(self.error_here(ErrorKind::Syntax("control character in comment")));
                }
            }
        }
    }

    /// Whitespace, newlines, and comments — the trivia legal between array
    /// elements.
    fn skip_array_trivia(&mut self) -> Result<(), Error> {
        loop {
            match self.peek() {
                Some(b' ' | b'\t') => self.cursor += 1,
                Some(b'\n') => {
                    self.cursor += 1;
                    self.bump_line();
                }
                Some(b'\r') if self.peek_at(1) == Some(b'\n') => {
                    self.cursor += 2;
                    self.bump_line();
                }
                Some(b'#') => {
                    self.cursor += 1;
                    self.scan_comment()?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// Scan a number or date-time lexeme and classify it from structural
    /// hints. Conversion is left to the consumer; the token carries the raw
    /// lexeme.
    fn scan_number(&mut self) -> Result<Token<'de>, Error> {
        let start = self.cursor;
        let signed = matches!(self.peek(), Some(b'+' | b'-'));
        if signed {
            self.cursor += 1;
        }

        // inf / nan, optionally signed.
        if let Some(b'i' | b'n') = self.peek() {
            let word_start = self.cursor;
            while let Some(b) = self.peek() {
                if !is_keylike_byte(b) {
                    break;
                }
                self.cursor += 1;
            }
            let word = &self.input[word_start..self.cursor];
            if word == b"inf" || word == b"nan" {
                self.state = State::PostValue;
                return Ok(Token::Float(self.slice(start, self.cursor)));
            }
            return Err(self.error_at(start, ErrorKind::Syntax("expected a value")));
        }

        if !matches!(self.peek(), Some(b'0'..=b'9')) {
            return Err(self.error_at(start, ErrorKind::Syntax("expected a value")));
        }

        loop {
            match self.peek() {
                Some(b)
                    if b.is_ascii_alphanumeric()
                        || matches!(b, b'_' | b'.' | b':' | b'-' | b'+') =>
                {
                    self.cursor += 1;
                }
                // `YYYY-MM-DD HH:MM` joins date and time with one space.
                Some(b' ')
                    if !signed
                        && self.cursor - start == 10
                        && self.input[start + 4] == b'-'
                        && self.input[start + 7] == b'-'
                        && self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) =>
                {
                    self.cursor += 1;
                }
                _ => break,
            }
        }

        let body = &self.input[start + signed as usize..self.cursor];
        let text = self.slice(start, self.cursor);

        // Shape hints in priority order: date-times cannot be signed, base
        // prefixes cannot be signed, then floats, then plain integers.
        // `HH:` opens a local time, `YYYY-MM-` a date; anything else with a
        // dash (e.g. `123e-45`) falls through to the numeric paths.
        let is_datetime = matches!(body, [_, _, b':', _, _, ..])
            || matches!(body, [_, _, _, _, b'-', _, _, b'-', ..]);
        if !signed && is_datetime {
            self.state = State::PostValue;
            return Ok(Token::Datetime(text));
        }
        if let [b'0', b'x' | b'o' | b'b', ..] = body {
            if signed {
                return Err(self.error_at(
                    start,
                    ErrorKind::Syntax("signs are not allowed on based integers"),
                ));
            }
            self.state = State::PostValue;
            return Ok(Token::Int(text));
        }
        if let [b'0', b'0'..=b'9', ..] = body {
            return Err(self.error_at(start, ErrorKind::Syntax("leading zeros are not allowed")));
        }
        self.state = State::PostValue;
        if body
            .iter()
            .any(|&b| matches!(b, b'.' | b'e' | b'E'))
        {
            Ok(Token::Float(text))
        } else {
            Ok(Token::Int(text))
        }
    }
}

#[inline]
fn single(b: u8) -> ([u8; 4], u8) {
    ([b, 0, 0, 0], 1)
}

#[inline]
pub(crate) fn is_keylike_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}
