//! Error and source-position types.

use std::fmt::{self, Debug, Display};

/// A location in the source document.
///
/// Maintained by the [`Scanner`](crate::Scanner) and attached to every
/// [`Error`] so callers can format messages without re-scanning the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Line number (1-based).
    pub line: u32,
    /// Column number (1-based, in bytes from the start of the line).
    pub column: u32,
    /// Byte offset from the start of the input (0-based).
    pub offset: usize,
}

impl Position {
    /// The position of the first byte of the input.
    #[inline]
    pub const fn start() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Error that can occur while parsing TOML.
#[derive(Debug, Clone)]
pub struct Error {
    /// The error kind.
    pub kind: ErrorKind,
    /// Where the failure was detected.
    pub position: Position,
}

impl Error {
    #[inline]
    pub(crate) fn new(kind: ErrorKind, position: Position) -> Self {
        Self { kind, position }
    }
}

impl std::error::Error for Error {}

/// The failure classes reported by the scanner and the tree builder.
///
/// The taxonomy is flat: each failure maps to exactly one kind.
#[derive(Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A lexical or structural violation not covered by a more specific kind.
    /// Carries a short description of what the scanner expected.
    Syntax(&'static str),

    /// The input is well-formed so far but ends in the middle of a token.
    UnexpectedEndOfInput,

    /// The token sequence is grammatically wrong at a structural decision
    /// point. Carries a description of the expected token class.
    UnexpectedToken(&'static str),

    /// The declaration registry forbids the new entry.
    DuplicateKey(Box<str>),

    /// A single string, key, or number lexeme exceeded `max_value_len`.
    /// Carries the configured limit.
    ValueTooLong(usize),

    /// A numeric or date-time lexeme failed its type-specific decoding.
    /// Carries the name of the type that rejected it.
    InvalidCharacter(&'static str),

    /// An integer or float literal is out of range for its 64-bit target.
    Overflow,

    /// A `\U` escape names a value beyond U+10FFFF.
    CodepointTooLarge(u32),

    /// A `\u`/`\U` escape names a UTF-16 surrogate half.
    CannotEncodeSurrogateHalf(u32),

    /// A resource limit was exhausted while building the tree.
    OutOfMemory,
}

impl ErrorKind {
    /// Short machine-readable identifier for the kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Syntax(..) => "syntax",
            Self::UnexpectedEndOfInput => "unexpected-end-of-input",
            Self::UnexpectedToken(..) => "unexpected-token",
            Self::DuplicateKey(..) => "duplicate-key",
            Self::ValueTooLong(..) => "value-too-long",
            Self::InvalidCharacter(..) => "invalid-character",
            Self::Overflow => "overflow",
            Self::CodepointTooLarge(..) => "codepoint-too-large",
            Self::CannotEncodeSurrogateHalf(..) => "cannot-encode-surrogate-half",
            Self::OutOfMemory => "out-of-memory",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(what) => {
                f.write_str("syntax error: ")?;
                f.write_str(what)
            }
            Self::UnexpectedEndOfInput => f.write_str("unexpected end of input"),
            Self::UnexpectedToken(expected) => {
                f.write_str("expected ")?;
                f.write_str(expected)
            }
            Self::DuplicateKey(key) => {
                f.write_str("duplicate key: `")?;
                f.write_str(key)?;
                f.write_str("`")
            }
            Self::ValueTooLong(limit) => {
                write!(f, "value exceeds the configured limit of {limit} bytes")
            }
            Self::InvalidCharacter(what) => {
                f.write_str("invalid ")?;
                f.write_str(what)?;
                f.write_str(" literal")
            }
            Self::Overflow => f.write_str("number is out of range"),
            Self::CodepointTooLarge(value) => {
                write!(f, "escape value `{value:#x}` is not a unicode codepoint")
            }
            Self::CannotEncodeSurrogateHalf(value) => {
                write!(f, "escape value `{value:#x}` is a surrogate half")
            }
            Self::OutOfMemory => f.write_str("out of memory"),
        }
    }
}

impl Debug for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.position)
    }
}

#[cfg(feature = "reporting")]
impl Error {
    /// Converts this [`Error`] into a [`codespan_reporting::diagnostic::Diagnostic`].
    pub fn to_diagnostic<FileId: Copy + PartialEq>(
        &self,
        fid: FileId,
    ) -> codespan_reporting::diagnostic::Diagnostic<FileId> {
        use codespan_reporting::diagnostic::{Diagnostic, Label};

        let at = self.position.offset..self.position.offset + 1;
        Diagnostic::error()
            .with_code(self.kind.code())
            .with_message(self.kind.to_string())
            .with_labels(vec![Label::primary(fid, at)])
    }
}

#[cfg(test)]
#[path = "./error_tests.rs"]
mod tests;
