//! The borrowed document view type.

use std::cmp::Ordering;

use crate::{
    DateTime,
    array::Array,
    document_buf::DocumentBuf,
    error::{Error, Result},
    iter::{Element, Elements, Iter, i32_from_slice},
    json,
    oid::ObjectId,
    spec::MIN_DOCUMENT_SIZE,
    validate::{ValidateOptions, ValidationError, validate_document},
    value::{BinaryRef, CodeWithScopeRef, RegexRef, Timestamp, ValueRef},
    visitor::{Visitor, visit_all},
};

/// A BSON document, referencing raw bytes stored elsewhere. This can be
/// created from a [`DocumentBuf`] or from any type that contains valid BSON
/// data, including static binary literals, [`Vec<u8>`], or arrays.
///
/// This is an unsized type, meaning that it must always be used behind a
/// pointer like `&`.
///
/// Accessing elements parses the bytes during iteration instead of up
/// front, so malformed bytes surface as errors at access time rather than
/// at construction time; [`Document::from_bytes`] checks only the length
/// prefix and the trailing NUL.
///
/// ```
/// use bsonbuf::Document;
///
/// let doc = Document::from_bytes(b"\x13\x00\x00\x00\x02hi\x00\x06\x00\x00\x00y'all\x00\x00")?;
/// let mut iter = doc.iter();
/// let (key, value) = iter.next().unwrap()?;
/// assert_eq!(key, "hi");
/// assert_eq!(value.as_str(), Some("y'all"));
/// assert!(iter.next().is_none());
/// # Ok::<(), bsonbuf::Error>(())
/// ```
#[derive(Debug)]
#[repr(transparent)]
pub struct Document {
    data: [u8],
}

impl Document {
    /// Constructs a new [`Document`] over the given bytes, validating _only_
    /// the following invariants:
    ///   * `data` is at least five bytes long (the minimum for a valid BSON
    ///     document)
    ///   * the initial four bytes of `data` accurately represent the length
    ///     of the bytes as required by the BSON spec
    ///   * the last byte of `data` is a 0
    ///
    /// The internal structure of the elements is _not_ validated; method
    /// calls on the resulting document return errors where appropriate, and
    /// [`Document::validate`] performs a full pass.
    pub fn from_bytes<D: AsRef<[u8]> + ?Sized>(data: &D) -> Result<&Document> {
        let data = data.as_ref();
        if data.len() < MIN_DOCUMENT_SIZE {
            return Err(Error::malformed_bytes("document too short"));
        }
        if data.len() > i32::MAX as usize {
            return Err(Error::malformed_bytes("document too long"));
        }
        let length = i32_from_slice(data)?;
        if data.len() as i32 != length {
            return Err(Error::malformed_bytes(format!(
                "declared length {} does not match buffer length {}",
                length,
                data.len()
            )));
        }
        if data[data.len() - 1] != 0 {
            return Err(Error::malformed_bytes("document not NUL terminated"));
        }
        Ok(unsafe { Document::from_bytes_unchecked(data) })
    }

    /// Creates a new `Document` referencing the provided data slice without
    /// checking the length prefix or terminator.
    ///
    /// # Safety
    ///
    /// The caller must ensure the first four bytes are a little-endian
    /// length equal to the slice length and that the last byte is 0.
    pub(crate) unsafe fn from_bytes_unchecked(data: &[u8]) -> &Document {
        // Safety: Document is repr(transparent) over [u8].
        unsafe { &*(data as *const [u8] as *const Document) }
    }

    /// The raw bytes of the document.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Whether the document contains no elements.
    pub fn is_empty(&self) -> bool {
        self.data.len() <= MIN_DOCUMENT_SIZE
    }

    /// The number of elements that can be successfully decoded, walking the
    /// document from the beginning and stopping at the first malformed
    /// element, if any.
    pub fn count(&self) -> usize {
        self.elements().map_while(|result| result.ok()).count()
    }

    /// An iterator yielding `Result<(&str, ValueRef)>` for each element.
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self)
    }

    /// An iterator over the document's [`Element`]s. These hold a view onto
    /// the document but do not decode values until asked.
    pub fn elements(&self) -> Elements<'_> {
        Elements::new(self)
    }

    /// Walks every element, dispatching to the matching methods of
    /// `visitor`. Returns `true` if traversal was halted early, either by a
    /// callback or by corrupt bytes.
    pub fn visit_all<V: Visitor + ?Sized>(&self, visitor: &mut V) -> bool {
        visit_all(self, visitor)
    }

    /// Checks the structural integrity of every element, and optionally
    /// UTF-8 correctness and key naming policies.
    ///
    /// On failure the returned [`ValidationError`] carries the byte offset
    /// of the first offending element, relative to the start of this
    /// document.
    ///
    /// ```
    /// use bsonbuf::{DocumentBuf, ValidateOptions, cstr};
    ///
    /// let mut doc = DocumentBuf::new();
    /// doc.append(cstr!("$op"), 1i32)?;
    /// assert!(doc.validate(ValidateOptions::default()).is_ok());
    ///
    /// let options = ValidateOptions {
    ///     dollar_keys: true,
    ///     ..Default::default()
    /// };
    /// assert_eq!(doc.validate(options).unwrap_err().offset, 4);
    /// # Ok::<(), bsonbuf::Error>(())
    /// ```
    pub fn validate(
        &self,
        options: ValidateOptions,
    ) -> std::result::Result<(), ValidationError> {
        validate_document(self, options)
    }

    /// Renders the document as MongoDB legacy extended JSON.
    ///
    /// Types without a JSON analogue use `$`-prefixed wrapper objects;
    /// JavaScript code renders as a bare quoted string (no `$code` wrapper),
    /// and the scope of code-with-scope elements is not emitted, so the
    /// output is not generally round-trippable.
    ///
    /// ```
    /// use bsonbuf::{DocumentBuf, cstr};
    ///
    /// let mut doc = DocumentBuf::new();
    /// assert_eq!(doc.as_json(), "{}");
    /// doc.append(cstr!("a"), 1i32)?;
    /// assert_eq!(doc.as_json(), r#"{ "a" : 1 }"#);
    /// # Ok::<(), bsonbuf::Error>(())
    /// ```
    pub fn as_json(&self) -> String {
        json::document_to_json(self)
    }

    /// Compares documents by encoded length first, then by a bytewise
    /// comparison of the canonical encodings.
    ///
    /// This is a total order but not a lexicographic order on values; it is
    /// stable across implementations for identical insertion order.
    pub fn compare(&self, other: &Document) -> Ordering {
        self.data
            .len()
            .cmp(&other.data.len())
            .then_with(|| self.data.cmp(&other.data))
    }

    /// Copies the bytes into an owned [`DocumentBuf`].
    pub fn to_document_buf(&self) -> DocumentBuf {
        DocumentBuf::from_document(self)
    }

    /// Gets the element with the given key, walking the document from the
    /// beginning (an O(N) operation). Returns `Ok(None)` if the key is not
    /// present and an error if a malformed element is encountered first.
    pub fn get<'a>(&'a self, key: &str) -> Result<Option<ValueRef<'a>>> {
        for result in self.iter() {
            let (k, value) = result?;
            if k == key {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Like [`get`](Self::get), but yields the undecoded [`Element`].
    pub fn get_element<'a>(&'a self, key: &str) -> Result<Option<Element<'a>>> {
        for result in self.elements() {
            let element = result?;
            if element.key_bytes() == key.as_bytes() {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    fn get_with<'a, T>(
        &'a self,
        key: &str,
        f: impl FnOnce(ValueRef<'a>) -> Option<T>,
    ) -> Result<Option<T>> {
        match self.get(key)? {
            Some(value) => f(value)
                .map(Some)
                .ok_or_else(|| Error::unexpected_type("mismatched element type").with_key(key)),
            None => Ok(None),
        }
    }

    /// Gets the double with the given key.
    pub fn get_f64(&self, key: &str) -> Result<Option<f64>> {
        self.get_with(key, ValueRef::as_f64)
    }

    /// Gets the string with the given key.
    pub fn get_str<'a>(&'a self, key: &str) -> Result<Option<&'a str>> {
        self.get_with(key, ValueRef::as_str)
    }

    /// Gets the embedded document with the given key.
    pub fn get_document<'a>(&'a self, key: &str) -> Result<Option<&'a Document>> {
        self.get_with(key, ValueRef::as_document)
    }

    /// Gets the array with the given key.
    pub fn get_array<'a>(&'a self, key: &str) -> Result<Option<&'a Array>> {
        self.get_with(key, ValueRef::as_array)
    }

    /// Gets the binary value with the given key.
    pub fn get_binary<'a>(&'a self, key: &str) -> Result<Option<BinaryRef<'a>>> {
        self.get_with(key, ValueRef::as_binary)
    }

    /// Gets the ObjectId with the given key.
    pub fn get_object_id(&self, key: &str) -> Result<Option<ObjectId>> {
        self.get_with(key, ValueRef::as_object_id)
    }

    /// Gets the boolean with the given key.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        self.get_with(key, ValueRef::as_bool)
    }

    /// Gets the datetime with the given key.
    pub fn get_datetime(&self, key: &str) -> Result<Option<DateTime>> {
        self.get_with(key, ValueRef::as_datetime)
    }

    /// Gets the regex with the given key.
    pub fn get_regex<'a>(&'a self, key: &str) -> Result<Option<RegexRef<'a>>> {
        self.get_with(key, ValueRef::as_regex)
    }

    /// Gets the JavaScript code with the given key.
    pub fn get_javascript<'a>(&'a self, key: &str) -> Result<Option<&'a str>> {
        self.get_with(key, ValueRef::as_javascript)
    }

    /// Gets the code-with-scope value with the given key.
    pub fn get_javascript_with_scope<'a>(
        &'a self,
        key: &str,
    ) -> Result<Option<CodeWithScopeRef<'a>>> {
        self.get_with(key, ValueRef::as_javascript_with_scope)
    }

    /// Gets the i32 with the given key.
    pub fn get_i32(&self, key: &str) -> Result<Option<i32>> {
        self.get_with(key, ValueRef::as_i32)
    }

    /// Gets the timestamp with the given key.
    pub fn get_timestamp(&self, key: &str) -> Result<Option<Timestamp>> {
        self.get_with(key, ValueRef::as_timestamp)
    }

    /// Gets the i64 with the given key.
    pub fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        self.get_with(key, ValueRef::as_i64)
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Document) -> bool {
        self.data == other.data
    }
}

impl Eq for Document {}

impl AsRef<Document> for Document {
    fn as_ref(&self) -> &Document {
        self
    }
}

impl ToOwned for Document {
    type Owned = DocumentBuf;

    fn to_owned(&self) -> Self::Owned {
        self.to_document_buf()
    }
}

impl<'a> IntoIterator for &'a Document {
    type IntoIter = Iter<'a>;
    type Item = Result<(&'a str, ValueRef<'a>)>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}
