//! The [`Value`] tagged union and the null-coalescing lookup wrapper.

use crate::table::Table;
use crate::time::Datetime;
use std::fmt;

#[cfg(test)]
#[path = "./value_tests.rs"]
mod tests;

/// A parsed TOML value.
///
/// Strings borrow from the input when they contain no escapes and no
/// fragmentation, and from the parse [`Arena`](crate::Arena) otherwise;
/// either way they live for `'de`.
#[derive(PartialEq)]
pub enum Value<'de> {
    /// A string.
    String(&'de str),
    /// A 64-bit signed integer.
    Integer(i64),
    /// A 64-bit IEEE 754 float.
    Float(f64),
    /// A boolean.
    Boolean(bool),
    /// A date, time, or date-time.
    Datetime(Datetime),
    /// An ordered sequence of values. May be heterogeneous.
    Array(Vec<Value<'de>>),
    /// An insertion-ordered table.
    Table(Table<'de>),
}

impl<'de> Value<'de> {
    /// Gets the type of the value as a string.
    pub fn type_str(&self) -> &'static str {
        match self {
            Self::String(..) => "string",
            Self::Integer(..) => "integer",
            Self::Float(..) => "float",
            Self::Boolean(..) => "boolean",
            Self::Datetime(..) => "date-time",
            Self::Array(..) => "array",
            Self::Table(..) => "table",
        }
    }

    /// Returns the borrowed string if this is a string value.
    #[inline]
    pub fn as_str(&self) -> Option<&'de str> {
        match self {
            Self::String(s) => Some(*s),
            _ => None,
        }
    }

    /// Returns an `i64` if this is an integer value.
    #[inline]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns an `f64` if this is a float value.
    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns a `bool` if this is a boolean value.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the [`Datetime`] if this is a date-time value.
    #[inline]
    pub fn as_datetime(&self) -> Option<Datetime> {
        match self {
            Self::Datetime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Returns the element slice if this is an array value.
    #[inline]
    pub fn as_array(&self) -> Option<&[Value<'de>]> {
        match self {
            Self::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Returns the table if this is a table value.
    #[inline]
    pub fn as_table(&self) -> Option<&Table<'de>> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Returns a mutable array reference.
    #[inline]
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value<'de>>> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns a mutable table reference.
    #[inline]
    pub fn as_table_mut(&mut self) -> Option<&mut Table<'de>> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Null-coalescing table lookup; see [`Table::at`].
    #[inline]
    pub fn at<'a>(&'a self, name: &str) -> MaybeValue<'a, 'de> {
        MaybeValue::new(self.as_table().and_then(|t| t.get(name)))
    }

    /// Null-coalescing array index.
    #[inline]
    pub fn index<'a>(&'a self, idx: usize) -> MaybeValue<'a, 'de> {
        MaybeValue::new(self.as_array().and_then(|items| items.get(idx)))
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => s.fmt(f),
            Self::Integer(i) => i.fmt(f),
            Self::Float(v) => v.fmt(f),
            Self::Boolean(b) => b.fmt(f),
            Self::Datetime(dt) => dt.fmt(f),
            Self::Array(items) => f.debug_list().entries(items).finish(),
            Self::Table(table) => table.fmt(f),
        }
    }
}

/// A possibly-missing reference to a [`Value`].
///
/// Every lookup on a `MaybeValue` is null-coalescing: chaining through a
/// missing key, a wrong type, or an out-of-bounds index yields another
/// `None`-like `MaybeValue` instead of panicking.
///
/// ```
/// let arena = toml_stream::Arena::new();
/// let root = toml_stream::parse(b"[[bin]]\nname = 'app'", &arena)?;
/// assert_eq!(root.at("bin").index(0).at("name").as_str(), Some("app"));
/// assert_eq!(root.at("bin").index(7).at("name").as_str(), None);
/// # Ok::<(), toml_stream::Error>(())
/// ```
#[derive(Clone, Copy)]
pub struct MaybeValue<'a, 'de> {
    inner: Option<&'a Value<'de>>,
}

impl<'a, 'de> MaybeValue<'a, 'de> {
    #[inline]
    pub(crate) fn new(inner: Option<&'a Value<'de>>) -> Self {
        Self { inner }
    }

    /// The underlying value, if present.
    #[inline]
    pub fn value(self) -> Option<&'a Value<'de>> {
        self.inner
    }

    /// Looks up `name` if this is a present table value.
    #[inline]
    pub fn at(self, name: &str) -> Self {
        Self::new(
            self.inner
                .and_then(|v| v.as_table())
                .and_then(|t| t.get(name)),
        )
    }

    /// Indexes into a present array value.
    #[inline]
    pub fn index(self, idx: usize) -> Self {
        Self::new(
            self.inner
                .and_then(|v| v.as_array())
                .and_then(|items| items.get(idx)),
        )
    }

    /// String accessor, `None` when missing or a different type.
    #[inline]
    pub fn as_str(self) -> Option<&'de str> {
        self.inner.and_then(|v| v.as_str())
    }

    /// Integer accessor, `None` when missing or a different type.
    #[inline]
    pub fn as_integer(self) -> Option<i64> {
        self.inner.and_then(|v| v.as_integer())
    }

    /// Float accessor, `None` when missing or a different type.
    #[inline]
    pub fn as_float(self) -> Option<f64> {
        self.inner.and_then(|v| v.as_float())
    }

    /// Boolean accessor, `None` when missing or a different type.
    #[inline]
    pub fn as_bool(self) -> Option<bool> {
        self.inner.and_then(|v| v.as_bool())
    }

    /// Date-time accessor, `None` when missing or a different type.
    #[inline]
    pub fn as_datetime(self) -> Option<Datetime> {
        self.inner.and_then(|v| v.as_datetime())
    }

    /// Table accessor, `None` when missing or a different type.
    #[inline]
    pub fn as_table(self) -> Option<&'a Table<'de>> {
        self.inner.and_then(|v| v.as_table())
    }

    /// Array accessor, `None` when missing or a different type.
    #[inline]
    pub fn as_array(self) -> Option<&'a [Value<'de>]> {
        self.inner.and_then(|v| v.as_array())
    }
}

impl fmt::Debug for MaybeValue<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner {
            Some(value) => value.fmt(f),
            None => f.write_str("<missing>"),
        }
    }
}
