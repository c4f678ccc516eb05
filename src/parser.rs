#![allow(unsafe_code)]

//! The tree builder: drives the [`Scanner`], resolves dotted key paths
//! against the declaration registry, decodes scalar lexemes, and assembles
//! the root [`Table`].
//!
//! The builder never re-examines input bytes — lexical rules live in the
//! scanner — and the scanner never consults the registry. Structural rules
//! (duplicate keys, implicit-table promotion, array-of-tables append,
//! inline-table sealing) are enforced entirely here.

#[cfg(test)]
#[path = "./parser_tests.rs"]
mod tests;

use crate::arena::Arena;
use crate::error::{Error, ErrorKind};
use crate::registry::{DeclKind, Registry, ScopeId};
use crate::scanner::{Scanner, Token};
use crate::table::Table;
use crate::time::Datetime;
use crate::value::Value;

/// Bound on nested arrays and inline tables, protecting the call stack on
/// adversarial input.
const MAX_NESTING_DEPTH: i16 = 128;

/// Borrow-or-copy policy for parsed strings and keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Allocate {
    /// Borrow from the input when the content needed no decoding.
    #[default]
    IfNeeded,
    /// Copy every string and key into the arena; the resulting tree never
    /// references the input buffer.
    Always,
}

/// Options accepted by [`parse_with_options`].
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Upper bound on the byte length of any single string, key, or number
    /// lexeme. Exceeding it fails the parse with
    /// [`ErrorKind::ValueTooLong`]. `None` means the input length.
    pub max_value_len: Option<usize>,
    /// See [`Allocate`].
    pub allocate: Allocate,
}

/// Parses a TOML document with default [`Options`].
///
/// The returned table borrows from both the input and the [`Arena`], so
/// both must outlive it. The arena owns every decoded string; plain strings
/// borrow directly from the input.
///
/// ```
/// let arena = toml_stream::Arena::new();
/// let root = toml_stream::parse(b"title = \"example\"", &arena)?;
/// assert_eq!(root.at("title").as_str(), Some("example"));
/// # Ok::<(), toml_stream::Error>(())
/// ```
pub fn parse<'de>(input: &'de [u8], arena: &'de Arena) -> Result<Table<'de>, Error> {
    parse_with_options(input, &Options::default(), arena)
}

/// Parses a TOML document.
pub fn parse_with_options<'de>(
    input: &'de [u8],
    options: &Options,
    arena: &'de Arena,
) -> Result<Table<'de>, Error> {
    let mut root = Table::new();
    let mut builder = Builder::new(input, options.clone(), arena);
    builder.parse_document(&mut root)?;
    Ok(root)
}

/// The current insertion context: the table the active statements resolve
/// against, and the registry scope naming its children.
struct Ctx<'b, 'de> {
    table: &'b mut Table<'de>,
    scope: ScopeId,
}

pub(crate) struct Builder<'de> {
    scanner: Scanner<'de>,
    arena: &'de Arena,
    options: Options,
    pub(crate) registry: Registry<'de>,
}

impl<'de> Builder<'de> {
    pub(crate) fn new(input: &'de [u8], options: Options, arena: &'de Arena) -> Self {
        Builder {
            scanner: Scanner::new(input),
            arena,
            options,
            registry: Registry::new(),
        }
    }

    /// Next token with fragments coalesced; see [`Scanner::next_alloc`].
    fn next(&mut self) -> Result<Token<'de>, Error> {
        self.scanner.next_alloc(self.arena, &self.options)
    }

    #[cold]
    fn err(&self, kind: ErrorKind) -> Error {
        Error::new(kind, self.scanner.position())
    }

    #[cold]
    fn duplicate(&self, key: &str) -> Error {
        self.err(ErrorKind::DuplicateKey(key.into()))
    }

    pub(crate) fn parse_document(&mut self, root: &mut Table<'de>) -> Result<(), Error> {
        let mut ctx = Ctx {
            table: &mut *root,
            scope: ScopeId::ROOT,
        };

        loop {
            match self.next()? {
                Token::KeyBegin => self.key_value_statement(&mut ctx)?,
                Token::TableKeyBegin => ctx = self.header(&mut *root, false)?,
                Token::ArrayTableKeyBegin => ctx = self.header(&mut *root, true)?,
                Token::EndOfDocument => return Ok(()),
                _ => return Err(self.err(ErrorKind::UnexpectedToken("a key or table header"))),
            }
        }
    }

    /// One `key = value` statement into the current context.
    fn key_value_statement(&mut self, ctx: &mut Ctx<'_, 'de>) -> Result<(), Error> {
        let mut table: &mut Table<'de> = &mut *ctx.table;
        let mut scope = ctx.scope;
        let mut key = self.key_segment()?;

        loop {
            match self.next()? {
                Token::KeyBegin => {
                    let (next_table, next_scope) = self.descend_dotted(table, scope, key)?;
                    table = next_table;
                    scope = next_scope;
                    key = self.key_segment()?;
                }
                Token::ValueBegin => break,
                _ => return Err(self.err(ErrorKind::UnexpectedToken("`.` or `=` after a key"))),
            }
        }

        let value = self.parse_value(MAX_NESTING_DEPTH)?;
        self.declare_leaf(scope, key, &value)?;
        table.push(key, value);
        Ok(())
    }

    /// Reads one key segment, already coalesced by the allocating accessor.
    fn key_segment(&mut self) -> Result<&'de str, Error> {
        match self.next()? {
            Token::Key(name) | Token::AllocatedKey(name) => Ok(name),
            _ => Err(self.err(ErrorKind::UnexpectedToken("a key"))),
        }
    }

    /// Registers a leaf assignment under `scope`, rejecting duplicates.
    fn declare_leaf(
        &mut self,
        scope: ScopeId,
        key: &'de str,
        value: &Value<'de>,
    ) -> Result<(), Error> {
        if self.registry.get(scope, key).is_some() {
            return Err(self.duplicate(key));
        }
        let kind = match value {
            Value::String(..) => DeclKind::String,
            Value::Integer(..) => DeclKind::Integer,
            Value::Float(..) => DeclKind::Float,
            Value::Boolean(..) => DeclKind::Boolean,
            Value::Datetime(..) => DeclKind::Datetime,
            Value::Array(..) => DeclKind::Array,
            // A table produced by value parsing is always an inline table.
            Value::Table(..) => DeclKind::InlineTable,
        };
        self.registry.insert_leaf(scope, key, kind);
        Ok(())
    }

    /// Navigate one intermediate segment of a dotted key. Missing segments
    /// materialize implicit super-tables; existing ones must be implicit —
    /// an explicitly headed table, a sealed inline value, or a leaf cannot
    /// be extended by a dotted key.
    fn descend_dotted<'t>(
        &mut self,
        table: &'t mut Table<'de>,
        scope: ScopeId,
        key: &'de str,
    ) -> Result<(&'t mut Table<'de>, ScopeId), Error> {
        match self.registry.get(scope, key) {
            None => {
                let child = self.registry.insert_table(scope, key, DeclKind::ImplicitTable);
                table.push(key, Value::Table(Table::new()));
                match table.last_value_mut() {
                    Some(Value::Table(subtable)) => Ok((subtable, child)),
                    // The entry was pushed one line up.
                    _ => unreachable!("dotted segment not a table"),
                }
            }
            Some(decl) if decl.kind == DeclKind::ImplicitTable => match table.get_mut(key) {
                Some(Value::Table(subtable)) => Ok((subtable, decl.scope)),
                // Implicit registry entries always mirror a table in the tree.
                _ => unreachable!("implicit table diverged from the tree"),
            },
            Some(_) => Err(self.duplicate(key)),
        }
    }

    /// Navigate one intermediate segment of a `[a.b.c]` / `[[a.b.c]]`
    /// header. Tables and implicit tables are entered directly; an array of
    /// tables is entered at its last element.
    fn descend_header<'t>(
        &mut self,
        table: &'t mut Table<'de>,
        scope: ScopeId,
        key: &'de str,
    ) -> Result<(&'t mut Table<'de>, ScopeId), Error> {
        match self.registry.get(scope, key) {
            None => {
                let child = self.registry.insert_table(scope, key, DeclKind::ImplicitTable);
                table.push(key, Value::Table(Table::new()));
                match table.last_value_mut() {
                    Some(Value::Table(subtable)) => Ok((subtable, child)),
                    _ => unreachable!("header segment not a table"),
                }
            }
            Some(decl) => match decl.kind {
                DeclKind::ImplicitTable | DeclKind::Table => match table.get_mut(key) {
                    Some(Value::Table(subtable)) => Ok((subtable, decl.scope)),
                    _ => unreachable!("table declaration diverged from the tree"),
                },
                DeclKind::ArrayTable => match table.get_mut(key) {
                    Some(Value::Array(items)) => match items.last_mut() {
                        Some(Value::Table(entry)) => Ok((entry, decl.scope)),
                        // Entries are appended as tables, and arrays of
                        // tables are created non-empty.
                        _ => unreachable!("array of tables without a table entry"),
                    },
                    _ => unreachable!("array-of-tables declaration diverged from the tree"),
                },
                _ => Err(self.duplicate(key)),
            },
        }
    }

    /// Final segment of a `[a.b.c]` header: open a fresh table or promote
    /// an implicit one.
    fn open_table<'t>(
        &mut self,
        table: &'t mut Table<'de>,
        scope: ScopeId,
        key: &'de str,
    ) -> Result<Ctx<'t, 'de>, Error> {
        match self.registry.get(scope, key) {
            None => {
                let child = self.registry.insert_table(scope, key, DeclKind::Table);
                table.push(key, Value::Table(Table::new()));
                match table.last_value_mut() {
                    Some(Value::Table(subtable)) => Ok(Ctx {
                        table: subtable,
                        scope: child,
                    }),
                    _ => unreachable!("header target not a table"),
                }
            }
            Some(decl) if decl.kind == DeclKind::ImplicitTable => {
                // One-shot promotion; a second [x] header will find
                // DeclKind::Table and fail above.
                self.registry.promote(scope, key, DeclKind::Table);
                match table.get_mut(key) {
                    Some(Value::Table(subtable)) => Ok(Ctx {
                        table: subtable,
                        scope: decl.scope,
                    }),
                    _ => unreachable!("implicit table diverged from the tree"),
                }
            }
            Some(_) => Err(self.duplicate(key)),
        }
    }

    /// Final segment of a `[[a.b.c]]` header: create the array of tables or
    /// append a fresh entry. Each entry gets a fresh registry scope, so
    /// duplicate detection restarts per entry.
    fn open_array_table<'t>(
        &mut self,
        table: &'t mut Table<'de>,
        scope: ScopeId,
        key: &'de str,
    ) -> Result<Ctx<'t, 'de>, Error> {
        match self.registry.get(scope, key) {
            None => {
                let entry_scope = self.registry.insert_table(scope, key, DeclKind::ArrayTable);
                table.push(key, Value::Array(vec![Value::Table(Table::new())]));
                match table.last_value_mut() {
                    Some(Value::Array(items)) => match items.last_mut() {
                        Some(Value::Table(entry)) => Ok(Ctx {
                            table: entry,
                            scope: entry_scope,
                        }),
                        _ => unreachable!("fresh array of tables has a table entry"),
                    },
                    _ => unreachable!("array-of-tables target not an array"),
                }
            }
            Some(decl) if decl.kind == DeclKind::ArrayTable => {
                let entry_scope = self.registry.fresh_scope();
                self.registry.set_scope(scope, key, entry_scope);
                match table.get_mut(key) {
                    Some(Value::Array(items)) => {
                        items.push(Value::Table(Table::new()));
                        match items.last_mut() {
                            Some(Value::Table(entry)) => Ok(Ctx {
                                table: entry,
                                scope: entry_scope,
                            }),
                            _ => unreachable!("just appended a table entry"),
                        }
                    }
                    _ => unreachable!("array-of-tables declaration diverged from the tree"),
                }
            }
            Some(_) => Err(self.duplicate(key)),
        }
    }

    /// Process a table or array-of-tables header and return the context the
    /// following statements insert into. Headers always resolve from the
    /// document root.
    fn header<'b>(
        &mut self,
        root: &'b mut Table<'de>,
        is_array: bool,
    ) -> Result<Ctx<'b, 'de>, Error> {
        let mut table: &'b mut Table<'de> = root;
        let mut scope = ScopeId::ROOT;
        let mut key = self.key_segment()?;

        loop {
            match self.next()? {
                Token::KeyBegin => {
                    let (next_table, next_scope) = self.descend_header(table, scope, key)?;
                    table = next_table;
                    scope = next_scope;
                    key = self.key_segment()?;
                }
                Token::TableBegin => break,
                _ => {
                    return Err(self.err(ErrorKind::UnexpectedToken("`.` or `]` in a table header")));
                }
            }
        }

        if is_array {
            self.open_array_table(table, scope, key)
        } else {
            self.open_table(table, scope, key)
        }
    }

    fn parse_value(&mut self, depth: i16) -> Result<Value<'de>, Error> {
        let token = self.next()?;
        self.value_from(token, depth)
    }

    fn value_from(&mut self, token: Token<'de>, depth: i16) -> Result<Value<'de>, Error> {
        if depth < 0 {
            return Err(self.err(ErrorKind::OutOfMemory));
        }
        match token {
            Token::String(text) | Token::AllocatedString(text) => Ok(Value::String(text)),
            Token::True => Ok(Value::Boolean(true)),
            Token::False => Ok(Value::Boolean(false)),
            Token::Int(text) => self.decode_integer(text),
            Token::Float(text) => self.decode_float(text),
            Token::Datetime(text) => match Datetime::from_lexeme(text.as_bytes()) {
                Some(datetime) => Ok(Value::Datetime(datetime)),
                None => Err(self.err(ErrorKind::InvalidCharacter("date-time"))),
            },
            Token::ArrayBegin => {
                let mut items = Vec::new();
                loop {
                    match self.next()? {
                        Token::ArrayEnd => return Ok(Value::Array(items)),
                        element => items.push(self.value_from(element, depth - 1)?),
                    }
                }
            }
            Token::InlineTableBegin => self.inline_table(depth - 1),
            _ => Err(self.err(ErrorKind::UnexpectedToken("a value"))),
        }
    }

    /// Parse `{ k = v, ... }`. The table's namespace is a fresh scope:
    /// duplicates inside are caught, and nothing leaks into the enclosing
    /// registry — the table is sealed once built.
    fn inline_table(&mut self, depth: i16) -> Result<Value<'de>, Error> {
        if depth < 0 {
            return Err(self.err(ErrorKind::OutOfMemory));
        }
        let scope = self.registry.fresh_scope();
        let mut table = Table::new();
        loop {
            match self.next()? {
                Token::InlineTableEnd => return Ok(Value::Table(table)),
                Token::KeyBegin => {
                    let mut target: &mut Table<'de> = &mut table;
                    let mut target_scope = scope;
                    let mut key = self.key_segment()?;
                    loop {
                        match self.next()? {
                            Token::KeyBegin => {
                                let (next_table, next_scope) =
                                    self.descend_dotted(target, target_scope, key)?;
                                target = next_table;
                                target_scope = next_scope;
                                key = self.key_segment()?;
                            }
                            Token::ValueBegin => break,
                            _ => {
                                return Err(
                                    self.err(ErrorKind::UnexpectedToken("`.` or `=` after a key"))
                                );
                            }
                        }
                    }
                    let value = self.parse_value(depth)?;
                    self.declare_leaf(target_scope, key, &value)?;
                    target.push(key, value);
                }
                _ => return Err(self.err(ErrorKind::UnexpectedToken("a key or `}`"))),
            }
        }
    }

    #[cold]
    fn invalid_int(&self) -> Error {
        self.err(ErrorKind::InvalidCharacter("integer"))
    }

    #[cold]
    fn invalid_float(&self) -> Error {
        self.err(ErrorKind::InvalidCharacter("float"))
    }

    /// Decode an integer lexeme: optional sign, `0x`/`0o`/`0b` prefixes,
    /// underscores between digits, 64-bit signed range.
    fn decode_integer(&self, text: &'de str) -> Result<Value<'de>, Error> {
        let bytes = text.as_bytes();
        let (negative, body) = match bytes {
            [b'-', rest @ ..] => (true, rest),
            [b'+', rest @ ..] => (false, rest),
            _ => (false, bytes),
        };

        if let [b'0', base @ (b'x' | b'o' | b'b'), digits @ ..] = body {
            return self.decode_based_integer(*base, digits);
        }

        let mut acc: u64 = 0;
        let mut prev_underscore = false;
        let mut has_digit = false;
        let mut leading_zero = false;
        for &b in body {
            if b == b'_' {
                if !has_digit || prev_underscore {
                    return Err(self.invalid_int());
                }
                prev_underscore = true;
                continue;
            }
            if !b.is_ascii_digit() {
                return Err(self.invalid_int());
            }
            if leading_zero {
                return Err(self.invalid_int());
            }
            if !has_digit && b == b'0' {
                leading_zero = true;
            }
            has_digit = true;
            prev_underscore = false;
            let digit = (b - b'0') as u64;
            acc = match acc.checked_mul(10).and_then(|a| a.checked_add(digit)) {
                Some(v) => v,
                None => return Err(self.err(ErrorKind::Overflow)),
            };
        }
        if !has_digit || prev_underscore {
            return Err(self.invalid_int());
        }

        let max = if negative {
            (i64::MAX as u64) + 1
        } else {
            i64::MAX as u64
        };
        if acc > max {
            return Err(self.err(ErrorKind::Overflow));
        }
        let value = if negative {
            (acc as i64).wrapping_neg()
        } else {
            acc as i64
        };
        Ok(Value::Integer(value))
    }

    /// Decode the digits of a `0x`/`0o`/`0b` integer.
    fn decode_based_integer(&self, base: u8, digits: &[u8]) -> Result<Value<'de>, Error> {
        let bits: u32 = match base {
            b'x' => 4,
            b'o' => 3,
            _ => 1,
        };
        if digits.is_empty() {
            return Err(self.invalid_int());
        }
        let mut acc: u64 = 0;
        let mut prev_underscore = false;
        let mut has_digit = false;
        for &b in digits {
            if b == b'_' {
                if !has_digit || prev_underscore {
                    return Err(self.invalid_int());
                }
                prev_underscore = true;
                continue;
            }
            let digit = match base {
                b'x' => match b {
                    b'0'..=b'9' => b - b'0',
                    b'a'..=b'f' => b - b'a' + 10,
                    b'A'..=b'F' => b - b'A' + 10,
                    _ => return Err(self.invalid_int()),
                },
                b'o' => match b {
                    b'0'..=b'7' => b - b'0',
                    _ => return Err(self.invalid_int()),
                },
                _ => match b {
                    b'0' | b'1' => b - b'0',
                    _ => return Err(self.invalid_int()),
                },
            };
            has_digit = true;
            prev_underscore = false;
            if acc >> (64 - bits) != 0 {
                return Err(self.err(ErrorKind::Overflow));
            }
            acc = (acc << bits) | digit as u64;
        }
        if !has_digit || prev_underscore {
            return Err(self.invalid_int());
        }
        if acc > i64::MAX as u64 {
            return Err(self.err(ErrorKind::Overflow));
        }
        Ok(Value::Integer(acc as i64))
    }

    /// Decode a float lexeme: the six `inf`/`nan` spellings, or an IEEE 754
    /// literal with underscores stripped. The digits are staged in an arena
    /// scratch that is never committed, so the space is reused afterwards.
    fn decode_float(&self, text: &'de str) -> Result<Value<'de>, Error> {
        match text {
            "inf" | "+inf" => return Ok(Value::Float(f64::INFINITY)),
            "-inf" => return Ok(Value::Float(f64::NEG_INFINITY)),
            "nan" | "+nan" => return Ok(Value::Float(f64::NAN)),
            "-nan" => return Ok(Value::Float(-f64::NAN)),
            _ => {}
        }

        // Safety: no other scratch is live; this one is dropped without
        // committing, leaving the arena untouched.
        let mut scratch = unsafe { self.arena.scratch() };

        let mut rest = text.as_bytes();
        if let [sign @ (b'+' | b'-'), tail @ ..] = rest {
            scratch.push(*sign);
            rest = tail;
        }
        // No leading zeros in the integer part (00.5, 0_0.5).
        if let [b'0', b'0'..=b'9' | b'_', ..] = rest {
            return Err(self.invalid_float());
        }

        let mut seen_dot = false;
        let mut seen_exp = false;
        let mut prev: u8 = 0;
        for (idx, &b) in rest.iter().enumerate() {
            match b {
                b'0'..=b'9' => scratch.push(b),
                b'_' => {
                    let next_digit = matches!(rest.get(idx + 1), Some(d) if d.is_ascii_digit());
                    if !prev.is_ascii_digit() || !next_digit {
                        return Err(self.invalid_float());
                    }
                }
                b'.' => {
                    let next_digit = matches!(rest.get(idx + 1), Some(d) if d.is_ascii_digit());
                    if seen_dot || seen_exp || !prev.is_ascii_digit() || !next_digit {
                        return Err(self.invalid_float());
                    }
                    seen_dot = true;
                    scratch.push(b'.');
                }
                b'e' | b'E' => {
                    if seen_exp || !prev.is_ascii_digit() {
                        return Err(self.invalid_float());
                    }
                    seen_exp = true;
                    scratch.push(b);
                }
                b'+' | b'-' => {
                    if !matches!(prev, b'e' | b'E') {
                        return Err(self.invalid_float());
                    }
                    scratch.push(b);
                }
                _ => return Err(self.invalid_float()),
            }
            prev = b;
        }
        if !prev.is_ascii_digit() {
            return Err(self.invalid_float());
        }

        // Safety: the scratch holds only ASCII digits, signs, dots and
        // exponent markers pushed above.
        let digits = unsafe { std::str::from_utf8_unchecked(scratch.as_bytes()) };
        let value: f64 = match digits.parse() {
            Ok(value) => value,
            Err(_) => return Err(self.invalid_float()),
        };
        if value.is_finite() {
            Ok(Value::Float(value))
        } else {
            // A syntactically valid literal whose magnitude exceeds f64.
            Err(self.err(ErrorKind::Overflow))
        }
    }
}
