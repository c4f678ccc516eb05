//! A streaming TOML 1.0 parser built from two tightly coupled halves: a
//! byte-level [`Scanner`] that emits a token stream, and a tree builder that
//! assembles those tokens into a [`Table`] while enforcing TOML's
//! structural rules.
//!
//! Strings are zero-copy where possible, borrowing directly from the input;
//! escape sequences and fragmented content are decoded into a
//! caller-supplied [`Arena`].
//!
//! # Quick start
//!
//! Use [`parse`] with the input bytes and an [`Arena`] to get the root
//! table.
//! ```
//! # fn main() -> Result<(), toml_stream::Error> {
//! let arena = toml_stream::Arena::new();
//! let root = toml_stream::parse(b"key = 'value'", &arena)?;
//! assert_eq!(root.at("key").as_str(), Some("value"));
//! # Ok(())
//! # }
//! ```
//!
//! Traverse the tree with null-coalescing lookups, which return a
//! [`MaybeValue`] instead of panicking on missing keys:
//! ```
//! # let arena = toml_stream::Arena::new();
//! # let root = toml_stream::parse(b"", &arena).unwrap();
//! let name: Option<&str> = root.at("name").as_str();
//! let number: Option<i64> = root.at("numbers").index(50).as_integer();
//! ```
//!
//! Or match on [`Value`] directly:
//! ```
//! # use toml_stream::Value;
//! # let arena = toml_stream::Arena::new();
//! # let root = toml_stream::parse(b"item = 0", &arena).unwrap();
//! match root.get("item").unwrap() {
//!     Value::String(s) => {}
//!     Value::Integer(i) => {}
//!     Value::Float(f) => {}
//!     Value::Boolean(b) => {}
//!     Value::Datetime(dt) => {}
//!     Value::Array(items) => {}
//!     Value::Table(table) => {}
//! }
//! ```
//!
//! # Memory model
//!
//! All decoded bytes of one parse live in the [`Arena`]; plain scalars
//! borrow from the input slice. Both must outlive the returned tree, and
//! dropping the arena releases the whole parse at once. Pass
//! [`Allocate::Always`](Options) to copy every scalar into the arena so the
//! tree never references the input buffer.
//!
//! # Token streaming
//!
//! The [`Scanner`] is public for consumers that want the raw [`Token`]
//! stream — including partial string fragments — without building a tree:
//! ```
//! # fn main() -> Result<(), toml_stream::Error> {
//! use toml_stream::{Scanner, Token};
//!
//! let mut scanner = Scanner::new(b"x = 1\n");
//! loop {
//!     match scanner.next()? {
//!         Token::EndOfDocument => break,
//!         token => println!("{token:?}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod arena;
mod error;
mod parser;
mod registry;
mod scanner;
mod table;
mod time;
mod value;

pub use arena::Arena;
pub use error::{Error, ErrorKind, Position};
pub use parser::{Allocate, Options, parse, parse_with_options};
pub use scanner::{Scanner, Token};
pub use table::Table;
pub use time::{Date, Datetime, Offset, ParseDatetimeError, Time};
pub use value::{MaybeValue, Value};

#[cfg(feature = "serde")]
pub mod impl_serde;
