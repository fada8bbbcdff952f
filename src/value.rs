//! Borrowed BSON values.

use crate::{
    DateTime,
    array::Array,
    document::Document,
    oid::ObjectId,
    spec::{BinarySubtype, ElementType},
};

/// A BSON value referencing raw bytes stored elsewhere.
///
/// Instances are produced by decoding an element of a [`Document`] and are
/// accepted by the append methods of the builders; any type with a
/// `From`/`Into` conversion to `ValueRef` can be appended directly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ValueRef<'a> {
    /// 64-bit binary floating point
    Double(f64),
    /// UTF-8 string
    String(&'a str),
    /// Embedded document
    Document(&'a Document),
    /// Array
    Array(&'a Array),
    /// Binary data
    Binary(BinaryRef<'a>),
    /// Deprecated. Undefined (value)
    Undefined,
    /// [ObjectId](http://dochub.mongodb.org/core/objectids)
    ObjectId(ObjectId),
    /// Boolean value
    Boolean(bool),
    /// UTC datetime
    DateTime(DateTime),
    /// Null value
    Null,
    /// Regular expression
    RegularExpression(RegexRef<'a>),
    /// Deprecated. DBPointer
    DbPointer(DbPointerRef<'a>),
    /// JavaScript code
    JavaScriptCode(&'a str),
    /// Deprecated. Symbol
    Symbol(&'a str),
    /// Deprecated. JavaScript code with scope
    JavaScriptCodeWithScope(CodeWithScopeRef<'a>),
    /// 32-bit signed integer
    Int32(i32),
    /// Timestamp
    Timestamp(Timestamp),
    /// 64-bit signed integer
    Int64(i64),
    /// Min key
    MinKey,
    /// Max key
    MaxKey,
}

impl<'a> ValueRef<'a> {
    /// The element type of this value.
    pub fn element_type(&self) -> ElementType {
        match self {
            ValueRef::Double(..) => ElementType::Double,
            ValueRef::String(..) => ElementType::String,
            ValueRef::Document(..) => ElementType::EmbeddedDocument,
            ValueRef::Array(..) => ElementType::Array,
            ValueRef::Binary(..) => ElementType::Binary,
            ValueRef::Undefined => ElementType::Undefined,
            ValueRef::ObjectId(..) => ElementType::ObjectId,
            ValueRef::Boolean(..) => ElementType::Boolean,
            ValueRef::DateTime(..) => ElementType::DateTime,
            ValueRef::Null => ElementType::Null,
            ValueRef::RegularExpression(..) => ElementType::RegularExpression,
            ValueRef::DbPointer(..) => ElementType::DbPointer,
            ValueRef::JavaScriptCode(..) => ElementType::JavaScriptCode,
            ValueRef::Symbol(..) => ElementType::Symbol,
            ValueRef::JavaScriptCodeWithScope(..) => ElementType::JavaScriptCodeWithScope,
            ValueRef::Int32(..) => ElementType::Int32,
            ValueRef::Timestamp(..) => ElementType::Timestamp,
            ValueRef::Int64(..) => ElementType::Int64,
            ValueRef::MinKey => ElementType::MinKey,
            ValueRef::MaxKey => ElementType::MaxKey,
        }
    }

    /// Gets the f64 that's referenced or returns [`None`] if the value isn't
    /// a double.
    pub fn as_f64(self) -> Option<f64> {
        match self {
            ValueRef::Double(d) => Some(d),
            _ => None,
        }
    }

    /// Gets the &str that's referenced or returns [`None`] if the value isn't
    /// a string.
    pub fn as_str(self) -> Option<&'a str> {
        match self {
            ValueRef::String(s) => Some(s),
            _ => None,
        }
    }

    /// Gets the document that's referenced or returns [`None`] if the value
    /// isn't an embedded document.
    pub fn as_document(self) -> Option<&'a Document> {
        match self {
            ValueRef::Document(d) => Some(d),
            _ => None,
        }
    }

    /// Gets the array that's referenced or returns [`None`] if the value
    /// isn't an array.
    pub fn as_array(self) -> Option<&'a Array> {
        match self {
            ValueRef::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Gets the binary value that's referenced or returns [`None`] if the
    /// value isn't binary data.
    pub fn as_binary(self) -> Option<BinaryRef<'a>> {
        match self {
            ValueRef::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Gets the ObjectId that's referenced or returns [`None`] if the value
    /// isn't an ObjectId.
    pub fn as_object_id(self) -> Option<ObjectId> {
        match self {
            ValueRef::ObjectId(oid) => Some(oid),
            _ => None,
        }
    }

    /// Gets the bool that's referenced or returns [`None`] if the value isn't
    /// a boolean.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            ValueRef::Boolean(b) => Some(b),
            _ => None,
        }
    }

    /// Gets the DateTime that's referenced or returns [`None`] if the value
    /// isn't a datetime.
    pub fn as_datetime(self) -> Option<DateTime> {
        match self {
            ValueRef::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Returns `Some(())` if the value is null and [`None`] otherwise.
    pub fn as_null(self) -> Option<()> {
        match self {
            ValueRef::Null => Some(()),
            _ => None,
        }
    }

    /// Gets the regex that's referenced or returns [`None`] if the value
    /// isn't a regex.
    pub fn as_regex(self) -> Option<RegexRef<'a>> {
        match self {
            ValueRef::RegularExpression(re) => Some(re),
            _ => None,
        }
    }

    /// Gets the JavaScript code that's referenced or returns [`None`] if the
    /// value isn't code.
    pub fn as_javascript(self) -> Option<&'a str> {
        match self {
            ValueRef::JavaScriptCode(s) => Some(s),
            _ => None,
        }
    }

    /// Gets the symbol that's referenced or returns [`None`] if the value
    /// isn't a symbol.
    pub fn as_symbol(self) -> Option<&'a str> {
        match self {
            ValueRef::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Gets the code-with-scope value that's referenced or returns [`None`]
    /// if the value isn't code with scope.
    pub fn as_javascript_with_scope(self) -> Option<CodeWithScopeRef<'a>> {
        match self {
            ValueRef::JavaScriptCodeWithScope(cws) => Some(cws),
            _ => None,
        }
    }

    /// Gets the i32 that's referenced or returns [`None`] if the value isn't
    /// an int32.
    pub fn as_i32(self) -> Option<i32> {
        match self {
            ValueRef::Int32(i) => Some(i),
            _ => None,
        }
    }

    /// Gets the timestamp that's referenced or returns [`None`] if the value
    /// isn't a timestamp.
    pub fn as_timestamp(self) -> Option<Timestamp> {
        match self {
            ValueRef::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    /// Gets the i64 that's referenced or returns [`None`] if the value isn't
    /// an int64.
    pub fn as_i64(self) -> Option<i64> {
        match self {
            ValueRef::Int64(i) => Some(i),
            _ => None,
        }
    }
}

/// A BSON binary value referencing raw bytes stored elsewhere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BinaryRef<'a> {
    /// The subtype of the binary value.
    pub subtype: BinarySubtype,

    /// The binary bytes.
    pub bytes: &'a [u8],
}

/// A BSON regex referencing strings stored elsewhere.
///
/// Both halves are stored on the wire as cstrings, so neither may contain
/// an interior NUL byte; appending a regex that does fails.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegexRef<'a> {
    /// The regex pattern to match.
    pub pattern: &'a str,

    /// The options for the regex.
    pub options: &'a str,
}

/// A BSON DBPointer value referencing raw bytes stored elsewhere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DbPointerRef<'a> {
    /// The namespace of the pointer.
    pub namespace: &'a str,

    /// The id of the pointer.
    pub id: ObjectId,
}

/// A BSON "code with scope" value referencing raw bytes stored elsewhere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CodeWithScopeRef<'a> {
    /// The JavaScript code.
    pub code: &'a str,

    /// The scope document containing variable bindings.
    pub scope: &'a Document,
}

/// A BSON timestamp: an internal MongoDB type, not a general-purpose time.
///
/// Encoded as a 64-bit value whose high 32 bits are the seconds and whose
/// low 32 bits are the increment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    /// The number of seconds since the Unix epoch.
    pub time: u32,

    /// An incrementing value to order events within a given second.
    pub increment: u32,
}

impl Timestamp {
    pub(crate) fn to_le_bytes(self) -> [u8; 8] {
        (((self.time as u64) << 32) | (self.increment as u64)).to_le_bytes()
    }

    pub(crate) fn from_le_i64(value: i64) -> Self {
        let value = value as u64;
        Timestamp {
            time: (value >> 32) as u32,
            increment: (value & 0xFFFF_FFFF) as u32,
        }
    }
}

impl<'a> From<f64> for ValueRef<'a> {
    fn from(value: f64) -> Self {
        ValueRef::Double(value)
    }
}

impl<'a> From<&'a str> for ValueRef<'a> {
    fn from(value: &'a str) -> Self {
        ValueRef::String(value)
    }
}

impl<'a> From<&'a String> for ValueRef<'a> {
    fn from(value: &'a String) -> Self {
        ValueRef::String(value.as_str())
    }
}

impl<'a> From<bool> for ValueRef<'a> {
    fn from(value: bool) -> Self {
        ValueRef::Boolean(value)
    }
}

impl<'a> From<i32> for ValueRef<'a> {
    fn from(value: i32) -> Self {
        ValueRef::Int32(value)
    }
}

impl<'a> From<i64> for ValueRef<'a> {
    fn from(value: i64) -> Self {
        ValueRef::Int64(value)
    }
}

impl<'a> From<ObjectId> for ValueRef<'a> {
    fn from(value: ObjectId) -> Self {
        ValueRef::ObjectId(value)
    }
}

impl<'a> From<DateTime> for ValueRef<'a> {
    fn from(value: DateTime) -> Self {
        ValueRef::DateTime(value)
    }
}

impl<'a> From<Timestamp> for ValueRef<'a> {
    fn from(value: Timestamp) -> Self {
        ValueRef::Timestamp(value)
    }
}

impl<'a> From<BinaryRef<'a>> for ValueRef<'a> {
    fn from(value: BinaryRef<'a>) -> Self {
        ValueRef::Binary(value)
    }
}

impl<'a> From<RegexRef<'a>> for ValueRef<'a> {
    fn from(value: RegexRef<'a>) -> Self {
        ValueRef::RegularExpression(value)
    }
}

impl<'a> From<DbPointerRef<'a>> for ValueRef<'a> {
    fn from(value: DbPointerRef<'a>) -> Self {
        ValueRef::DbPointer(value)
    }
}

impl<'a> From<CodeWithScopeRef<'a>> for ValueRef<'a> {
    fn from(value: CodeWithScopeRef<'a>) -> Self {
        ValueRef::JavaScriptCodeWithScope(value)
    }
}

impl<'a> From<&'a Document> for ValueRef<'a> {
    fn from(value: &'a Document) -> Self {
        ValueRef::Document(value)
    }
}

impl<'a> From<&'a crate::DocumentBuf> for ValueRef<'a> {
    fn from(value: &'a crate::DocumentBuf) -> Self {
        ValueRef::Document(value)
    }
}

impl<'a> From<&'a Array> for ValueRef<'a> {
    fn from(value: &'a Array) -> Self {
        ValueRef::Array(value)
    }
}

impl<'a> From<&'a crate::ArrayBuf> for ValueRef<'a> {
    fn from(value: &'a crate::ArrayBuf) -> Self {
        ValueRef::Array(value)
    }
}

/// `None` appends a null element, matching the classic C API where a null
/// string argument produced a null value.
impl<'a, T: Into<ValueRef<'a>>> From<Option<T>> for ValueRef<'a> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => ValueRef::Null,
        }
    }
}
