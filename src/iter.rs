//! Streaming iteration over the elements of a document.

use crate::{
    DateTime,
    array::Array,
    document::Document,
    error::{Error, Result},
    oid::ObjectId,
    spec::{BinarySubtype, ElementType, MIN_DOCUMENT_SIZE},
    utf8::try_to_str,
    value::{BinaryRef, CodeWithScopeRef, DbPointerRef, RegexRef, Timestamp, ValueRef},
};

// 4 total + 4 code length + 1 code NUL + 5 empty scope document
const MIN_CODE_WITH_SCOPE_SIZE: usize = 14;

pub(crate) fn i32_from_slice(data: &[u8]) -> Result<i32> {
    let bytes: [u8; 4] = data
        .get(..4)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| Error::malformed_bytes("expected 4 bytes"))?;
    Ok(i32::from_le_bytes(bytes))
}

pub(crate) fn i64_from_slice(data: &[u8]) -> Result<i64> {
    let bytes: [u8; 8] = data
        .get(..8)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| Error::malformed_bytes("expected 8 bytes"))?;
    Ok(i64::from_le_bytes(bytes))
}

pub(crate) fn f64_from_slice(data: &[u8]) -> Result<f64> {
    let bytes: [u8; 8] = data
        .get(..8)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| Error::malformed_bytes("expected 8 bytes"))?;
    Ok(f64::from_le_bytes(bytes))
}

/// An iterator over the elements of a document.
///
/// Yields `Result<Element>`; once an element fails to decode, the byte
/// offset of the offending element is recorded and all further calls to
/// [`next`](Iterator::next) return `None`.
pub struct Elements<'a> {
    doc: &'a Document,
    offset: usize,
    valid: bool,
    error_offset: Option<usize>,
}

impl<'a> Elements<'a> {
    pub(crate) fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            offset: 4,
            valid: true,
            error_offset: None,
        }
    }

    /// The byte offset of the element that stopped iteration, if any.
    pub fn error_offset(&self) -> Option<usize> {
        self.error_offset
    }

    fn fail(&mut self, start: usize, error: Error) -> Error {
        self.valid = false;
        self.error_offset = Some(start);
        error.with_offset(start)
    }

    fn verify_enough_bytes(&self, start: usize, num_bytes: usize) -> Result<()> {
        let end = start
            .checked_add(num_bytes)
            .ok_or_else(|| Error::malformed_bytes("length overflows"))?;
        if self.doc.as_bytes().get(start..end).is_none() {
            return Err(Error::malformed_bytes(format!(
                "length {} exceeds remaining length of buffer",
                num_bytes
            )));
        }
        Ok(())
    }

    /// Size of a length-prefixed, NUL-terminated string value (utf8, code,
    /// symbol) starting at `offset`.
    fn string_size(&self, offset: usize) -> Result<usize> {
        let data = self.doc.as_bytes();
        let stored = i32_from_slice(&data[offset.min(data.len())..])?;
        if stored < 1 {
            return Err(Error::malformed_bytes(format!(
                "string length {} too small",
                stored
            )));
        }
        let size = 4 + stored as usize;
        self.verify_enough_bytes(offset, size)?;
        if data[offset + size - 1] != 0 {
            return Err(Error::malformed_bytes("string not NUL terminated"));
        }
        Ok(size)
    }

    /// Size of an embedded document or array starting at `offset`.
    fn document_size(&self, offset: usize) -> Result<usize> {
        let data = self.doc.as_bytes();
        self.verify_enough_bytes(offset, MIN_DOCUMENT_SIZE)?;
        let size = i32_from_slice(&data[offset..])?;
        if size < MIN_DOCUMENT_SIZE as i32 {
            return Err(Error::malformed_bytes(format!(
                "embedded document too small: {} bytes",
                size
            )));
        }
        let size = size as usize;
        self.verify_enough_bytes(offset, size)?;
        if data[offset + size - 1] != 0 {
            return Err(Error::malformed_bytes(
                "embedded document not NUL terminated",
            ));
        }
        Ok(size)
    }

    /// Position of the NUL ending the cstring that starts at `offset`.
    fn cstr_end(&self, offset: usize) -> Result<usize> {
        let data = self.doc.as_bytes();
        data[offset.min(data.len())..]
            .iter()
            .position(|&b| b == 0)
            .map(|rel| offset + rel)
            .ok_or_else(|| Error::malformed_bytes("cstring missing NUL terminator"))
    }
}

impl<'a> Iterator for Elements<'a> {
    type Item = Result<Element<'a>>;

    fn next(&mut self) -> Option<Result<Element<'a>>> {
        if !self.valid {
            return None;
        }
        let data = self.doc.as_bytes();
        let start = self.offset;
        if start == data.len() - 1 {
            if data[start] == 0 {
                // end of document marker
                return None;
            }
            return Some(Err(self.fail(
                start,
                Error::malformed_bytes("document not NUL terminated"),
            )));
        }
        if start >= data.len() {
            return Some(Err(self.fail(
                start,
                Error::malformed_bytes("iteration overflowed document"),
            )));
        }

        let kind = match ElementType::from(data[start]) {
            Some(kind) => kind,
            None => {
                let error = Error::malformed_bytes(format!("invalid tag: {:#04x}", data[start]));
                return Some(Err(self.fail(start, error)));
            }
        };

        let key_end = match self.cstr_end(start + 1) {
            Ok(end) => end,
            Err(error) => return Some(Err(self.fail(start, error))),
        };
        let key = &data[start + 1..key_end];
        let value_offset = key_end + 1;

        let size = match self.value_size(kind, value_offset) {
            Ok(size) => size,
            Err(error) => return Some(Err(self.fail(start, error))),
        };

        self.offset = value_offset + size;
        Some(Ok(Element {
            doc: self.doc,
            kind,
            key,
            offset: start,
            value_offset,
            size,
        }))
    }
}

impl<'a> Elements<'a> {
    fn value_size(&self, kind: ElementType, offset: usize) -> Result<usize> {
        let data = self.doc.as_bytes();
        let size = match kind {
            ElementType::Boolean => 1,
            ElementType::Int32 => 4,
            ElementType::Int64 => 8,
            ElementType::Double => 8,
            ElementType::DateTime => 8,
            ElementType::Timestamp => 8,
            ElementType::ObjectId => 12,
            ElementType::Null => 0,
            ElementType::Undefined => 0,
            ElementType::MinKey => 0,
            ElementType::MaxKey => 0,
            ElementType::String => self.string_size(offset)?,
            ElementType::JavaScriptCode => self.string_size(offset)?,
            ElementType::Symbol => self.string_size(offset)?,
            ElementType::EmbeddedDocument => self.document_size(offset)?,
            ElementType::Array => self.document_size(offset)?,
            ElementType::Binary => {
                self.verify_enough_bytes(offset, 4 + 1)?;
                let stored = i32_from_slice(&data[offset..])?;
                if stored < 0 {
                    return Err(Error::malformed_bytes("binary length negative"));
                }
                4 + 1 + stored as usize
            }
            ElementType::RegularExpression => {
                let pattern_end = self.cstr_end(offset)?;
                let options_end = self.cstr_end(pattern_end + 1)?;
                options_end + 1 - offset
            }
            ElementType::DbPointer => self.string_size(offset)? + 12,
            ElementType::JavaScriptCodeWithScope => {
                self.verify_enough_bytes(offset, MIN_CODE_WITH_SCOPE_SIZE)?;
                let stored = i32_from_slice(&data[offset..])?;
                if stored < MIN_CODE_WITH_SCOPE_SIZE as i32 {
                    return Err(Error::malformed_bytes(format!(
                        "code with scope length {} too small",
                        stored
                    )));
                }
                stored as usize
            }
        };
        self.verify_enough_bytes(offset, size)?;
        Ok(size)
    }
}

/// A single element of a document: its type tag, key, and an undecoded view
/// of its value bytes.
///
/// The key is exposed both raw ([`key_bytes`](Self::key_bytes)) and checked
/// ([`key`](Self::key)) because a structurally well-formed document may
/// still carry keys that are not valid UTF-8; whether that is acceptable is
/// a validation policy, not an iteration error.
#[derive(Clone, Copy)]
pub struct Element<'a> {
    doc: &'a Document,
    kind: ElementType,
    key: &'a [u8],
    offset: usize,
    value_offset: usize,
    size: usize,
}

impl<'a> Element<'a> {
    /// The element's type tag.
    pub fn element_type(&self) -> ElementType {
        self.kind
    }

    /// The element's key as raw bytes, without the trailing NUL.
    pub fn key_bytes(&self) -> &'a [u8] {
        self.key
    }

    /// The element's key as UTF-8.
    pub fn key(&self) -> Result<&'a str> {
        try_to_str(self.key)
    }

    /// Byte offset of the element's type tag within the document.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Byte offset of the element's value within the document.
    pub fn value_offset(&self) -> usize {
        self.value_offset
    }

    /// The size in bytes of the element's value.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The raw bytes of the element's value.
    pub fn value_bytes(&self) -> &'a [u8] {
        &self.doc.as_bytes()[self.value_offset..self.value_offset + self.size]
    }

    /// The content bytes of a string-like value (utf8, code, symbol),
    /// without the length prefix or trailing NUL. Panics if the element is
    /// not string-like; only called on matching tags.
    pub(crate) fn string_value_bytes(&self) -> &'a [u8] {
        let value = self.value_bytes();
        &value[4..value.len() - 1]
    }

    /// The two cstring halves (pattern, options) of a regex value.
    pub(crate) fn regex_value_bytes(&self) -> (&'a [u8], &'a [u8]) {
        let value = self.value_bytes();
        let pattern_end = value
            .iter()
            .position(|&b| b == 0)
            .expect("regex pattern NUL verified during iteration");
        let pattern = &value[..pattern_end];
        let rest = &value[pattern_end + 1..];
        let options_end = rest
            .iter()
            .position(|&b| b == 0)
            .expect("regex options NUL verified during iteration");
        (pattern, &rest[..options_end])
    }

    /// The subtype and content bytes of a binary value.
    pub(crate) fn binary_value_parts(&self) -> (BinarySubtype, &'a [u8]) {
        let value = self.value_bytes();
        (BinarySubtype::from(value[4]), &value[5..])
    }

    /// The namespace bytes and id of a DBPointer value.
    pub(crate) fn db_pointer_value_parts(&self) -> Result<(&'a [u8], ObjectId)> {
        let value = self.value_bytes();
        let namespace = &value[4..value.len() - 12 - 1];
        let id = oid_from_slice(&value[value.len() - 12..])?;
        Ok((namespace, id))
    }

    /// The code bytes and scope document of a code-with-scope value.
    pub(crate) fn code_with_scope_value_parts(&self) -> Result<(&'a [u8], &'a Document)> {
        let value = self.value_bytes();
        let code_len = i32_from_slice(&value[4..])?;
        if code_len < 1 {
            return Err(self.malformed(format!("code length {} too small", code_len)));
        }
        let code_len = code_len as usize;
        let scope_start = 4 + 4 + code_len;
        if scope_start + MIN_DOCUMENT_SIZE > value.len() {
            return Err(self.malformed("code length leaves no room for scope"));
        }
        if value[scope_start - 1] != 0 {
            return Err(self.malformed("code not NUL terminated"));
        }
        let code = &value[8..scope_start - 1];
        let scope = Document::from_bytes(&value[scope_start..])
            .map_err(|e| e.with_offset(self.offset))?;
        Ok((code, scope))
    }

    /// Decodes the element's value.
    pub fn value(&self) -> Result<ValueRef<'a>> {
        Ok(match self.kind {
            ElementType::Null => ValueRef::Null,
            ElementType::Undefined => ValueRef::Undefined,
            ElementType::MinKey => ValueRef::MinKey,
            ElementType::MaxKey => ValueRef::MaxKey,
            ElementType::Double => ValueRef::Double(f64_from_slice(self.value_bytes())?),
            ElementType::Int32 => ValueRef::Int32(i32_from_slice(self.value_bytes())?),
            ElementType::Int64 => ValueRef::Int64(i64_from_slice(self.value_bytes())?),
            ElementType::Boolean => {
                let byte = self.value_bytes()[0];
                match byte {
                    0 => ValueRef::Boolean(false),
                    1 => ValueRef::Boolean(true),
                    _ => return Err(self.malformed(format!("invalid boolean byte {}", byte))),
                }
            }
            ElementType::DateTime => {
                ValueRef::DateTime(DateTime::from_millis(i64_from_slice(self.value_bytes())?))
            }
            ElementType::Timestamp => {
                ValueRef::Timestamp(Timestamp::from_le_i64(i64_from_slice(self.value_bytes())?))
            }
            ElementType::ObjectId => ValueRef::ObjectId(oid_from_slice(self.value_bytes())?),
            ElementType::String => ValueRef::String(self.read_str()?),
            ElementType::JavaScriptCode => ValueRef::JavaScriptCode(self.read_str()?),
            ElementType::Symbol => ValueRef::Symbol(self.read_str()?),
            ElementType::EmbeddedDocument => {
                ValueRef::Document(Document::from_bytes(self.value_bytes())?)
            }
            ElementType::Array => {
                ValueRef::Array(Array::from_document(Document::from_bytes(self.value_bytes())?))
            }
            ElementType::Binary => {
                let (subtype, bytes) = self.binary_value_parts();
                ValueRef::Binary(BinaryRef { subtype, bytes })
            }
            ElementType::RegularExpression => {
                let (pattern, options) = self.regex_value_bytes();
                ValueRef::RegularExpression(RegexRef {
                    pattern: try_to_str(pattern).map_err(|e| self.with_key(e))?,
                    options: try_to_str(options).map_err(|e| self.with_key(e))?,
                })
            }
            ElementType::DbPointer => {
                let (namespace, id) = self.db_pointer_value_parts()?;
                ValueRef::DbPointer(DbPointerRef {
                    namespace: try_to_str(namespace).map_err(|e| self.with_key(e))?,
                    id,
                })
            }
            ElementType::JavaScriptCodeWithScope => {
                let (code, scope) = self.code_with_scope_value_parts()?;
                ValueRef::JavaScriptCodeWithScope(CodeWithScopeRef {
                    code: try_to_str(code).map_err(|e| self.with_key(e))?,
                    scope,
                })
            }
        })
    }

    fn read_str(&self) -> Result<&'a str> {
        try_to_str(self.string_value_bytes()).map_err(|e| self.with_key(e))
    }

    fn malformed(&self, message: impl ToString) -> Error {
        let error = Error::malformed_bytes(message).with_offset(self.offset);
        self.with_key(error)
    }

    fn with_key(&self, error: Error) -> Error {
        match std::str::from_utf8(self.key) {
            Ok(key) => error.with_key(key),
            Err(_) => error,
        }
    }
}

fn oid_from_slice(data: &[u8]) -> Result<ObjectId> {
    let bytes: [u8; 12] = data
        .get(..12)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| Error::malformed_bytes("expected 12 bytes"))?;
    Ok(ObjectId::from_bytes(bytes))
}

/// An iterator over the document's entries, resolving each element to its
/// key and decoded value.
pub struct Iter<'a> {
    inner: Elements<'a>,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(doc: &'a Document) -> Self {
        Iter {
            inner: Elements::new(doc),
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = Result<(&'a str, ValueRef<'a>)>;

    fn next(&mut self) -> Option<Result<(&'a str, ValueRef<'a>)>> {
        match self.inner.next() {
            Some(Ok(element)) => {
                let key = match element.key() {
                    Ok(key) => key,
                    Err(e) => return Some(Err(e)),
                };
                match element.value() {
                    Ok(value) => Some(Ok((key, value))),
                    Err(e) => Some(Err(e)),
                }
            }
            Some(Err(e)) => Some(Err(e)),
            None => None,
        }
    }
}
