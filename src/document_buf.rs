//! The owned document type.

use std::borrow::Borrow;

use crate::{
    buffer::Buffer,
    cstr::CStr,
    document::Document,
    error::{Error, Result},
    iter::{Elements, Iter},
    spec::{ElementType, MIN_DOCUMENT_SIZE},
    value::ValueRef,
    writer::{ArrayWriter, DocumentWriter, append_value, open_child},
};

const EMPTY_DOCUMENT: [u8; MIN_DOCUMENT_SIZE] = [MIN_DOCUMENT_SIZE as u8, 0, 0, 0, 0];

/// An owned BSON document, backed by a buffer of raw BSON bytes.
///
/// A new document starts in a small inline buffer embedded in the handle
/// and moves to the heap only when it outgrows it. The length prefix and
/// terminator are kept consistent after every append, so the bytes are a
/// well-formed document at every observable point; there is no separate
/// "finish" step.
///
/// This type implements [`Deref`](std::ops::Deref) to [`Document`], so all
/// read methods — iteration, getters, [`validate`](Document::validate),
/// [`as_json`](Document::as_json), [`compare`](Document::compare) — are
/// available on `DocumentBuf` values as well.
///
/// ```
/// use bsonbuf::{DocumentBuf, cstr};
///
/// let mut doc = DocumentBuf::new();
/// assert_eq!(doc.as_bytes(), b"\x05\x00\x00\x00\x00");
///
/// doc.append(cstr!("a"), 1i32)?;
/// assert_eq!(doc.as_bytes(), b"\x0c\x00\x00\x00\x10a\x00\x01\x00\x00\x00\x00");
/// assert_eq!(doc.count(), 1);
/// # Ok::<(), bsonbuf::Error>(())
/// ```
#[derive(Clone)]
pub struct DocumentBuf {
    data: Buffer,
}

impl DocumentBuf {
    /// Creates a new, empty document.
    pub fn new() -> Self {
        let mut data = Buffer::new();
        data.extend_from_slice(&EMPTY_DOCUMENT);
        Self { data }
    }

    /// Creates a new, empty document with room for `size` bytes, so that a
    /// document of a known size can be built without intermediate growth.
    pub fn with_capacity(size: usize) -> Result<Self> {
        if size >= i32::MAX as usize {
            return Err(Error::size_overflow(size));
        }
        let mut doc = Self::new();
        doc.data.reserve(size.saturating_sub(MIN_DOCUMENT_SIZE))?;
        Ok(doc)
    }

    /// Constructs a document from bytes, validating the length prefix and
    /// trailing NUL the same way [`Document::from_bytes`] does.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let _ = Document::from_bytes(data.as_slice())?;
        Ok(Self {
            data: Buffer::from_vec(data),
        })
    }

    /// Copies an existing [`Document`].
    pub fn from_document(doc: &Document) -> Self {
        Self {
            data: Buffer::from_vec(doc.as_bytes().to_vec()),
        }
    }

    /// The document as a borrowed [`Document`] view.
    pub fn as_document(&self) -> &Document {
        // Safety: every constructor and mutation maintains the length
        // prefix and the trailing NUL.
        unsafe { Document::from_bytes_unchecked(self.data.as_slice()) }
    }

    /// The raw bytes of the document.
    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_slice()
    }

    /// Consumes the document, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data.into_vec()
    }

    /// An iterator yielding `Result<(&str, ValueRef)>` for each element.
    pub fn iter(&self) -> Iter<'_> {
        self.as_document().iter()
    }

    /// An iterator over the document's undecoded elements.
    pub fn elements(&self) -> Elements<'_> {
        self.as_document().elements()
    }

    /// Appends a key/value pair to the end of the document.
    ///
    /// Any type convertible to [`ValueRef`] can be passed; appending
    /// `None` produces a null element, and a code-with-scope value with an
    /// empty scope is stored as a plain code element. It is a user error to
    /// append the same key twice; the writer does not check for duplicates.
    ///
    /// ```
    /// use bsonbuf::{DocumentBuf, cstr};
    ///
    /// let mut doc = DocumentBuf::new();
    /// doc.append(cstr!("name"), "herman")?;
    /// doc.append(cstr!("nickname"), None::<&str>)?;
    /// assert_eq!(doc.get_str("name")?, Some("herman"));
    /// assert_eq!(doc.get("nickname")?.unwrap().as_null(), Some(()));
    /// # Ok::<(), bsonbuf::Error>(())
    /// ```
    pub fn append<'v>(
        &mut self,
        key: impl AsRef<CStr>,
        value: impl Into<ValueRef<'v>>,
    ) -> Result<()> {
        append_value(&mut self.data, &[0], key.as_ref(), value.into())
    }

    /// Opens a sub-document under `key` that writes into this document's
    /// buffer. The returned writer borrows `self`, so the sub-document must
    /// be finished (dropped or [`end`](DocumentWriter::end)ed) before this
    /// document can be used again.
    ///
    /// ```
    /// use bsonbuf::{DocumentBuf, cstr};
    ///
    /// let mut doc = DocumentBuf::new();
    /// let mut child = doc.begin_document(cstr!("x"))?;
    /// child.append(cstr!("y"), "hi")?;
    /// child.end();
    /// assert_eq!(doc.as_json(), r#"{ "x" : { "y" : "hi" } }"#);
    /// # Ok::<(), bsonbuf::Error>(())
    /// ```
    pub fn begin_document(&mut self, key: impl AsRef<CStr>) -> Result<DocumentWriter<'_>> {
        let offset = open_child(
            &mut self.data,
            &[0],
            ElementType::EmbeddedDocument,
            key.as_ref(),
        )?;
        Ok(DocumentWriter::new(&mut self.data, vec![0, offset]))
    }

    /// Opens a sub-array under `key`. The returned writer generates the
    /// decimal index keys "0", "1", … itself.
    pub fn begin_array(&mut self, key: impl AsRef<CStr>) -> Result<ArrayWriter<'_>> {
        let offset = open_child(&mut self.data, &[0], ElementType::Array, key.as_ref())?;
        Ok(ArrayWriter::new(DocumentWriter::new(
            &mut self.data,
            vec![0, offset],
        )))
    }
}

impl Default for DocumentBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DocumentBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentBuf")
            .field("data", &hex::encode(self.as_bytes()))
            .finish()
    }
}

impl PartialEq for DocumentBuf {
    fn eq(&self, other: &Self) -> bool {
        self.as_document() == other.as_document()
    }
}

impl Eq for DocumentBuf {}

impl std::ops::Deref for DocumentBuf {
    type Target = Document;

    fn deref(&self) -> &Self::Target {
        self.as_document()
    }
}

impl AsRef<Document> for DocumentBuf {
    fn as_ref(&self) -> &Document {
        self.as_document()
    }
}

impl Borrow<Document> for DocumentBuf {
    fn borrow(&self) -> &Document {
        self.as_document()
    }
}

impl From<&Document> for DocumentBuf {
    fn from(doc: &Document) -> Self {
        Self::from_document(doc)
    }
}

impl<'a> IntoIterator for &'a DocumentBuf {
    type IntoIter = Iter<'a>;
    type Item = Result<(&'a str, ValueRef<'a>)>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}
