//! Arrays: documents whose keys are decimal indices.

use std::borrow::Borrow;

use crate::{
    document::Document,
    document_buf::DocumentBuf,
    error::{Error, Result},
    iter::Elements,
    json,
    value::ValueRef,
    writer::{ArrayWriter, DocumentWriter},
};

/// A BSON array, referencing raw bytes stored elsewhere.
///
/// On the wire an array is an embedded document whose keys are the ASCII
/// decimal indices "0", "1", …. The writers generate those keys; reading is
/// positional and does not inspect them. Like [`Document`], this is an
/// unsized type used behind a reference.
#[derive(Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct Array {
    doc: Document,
}

impl Array {
    /// Constructs an array over the given bytes, performing the same header
    /// checks as [`Document::from_bytes`].
    pub fn from_bytes<D: AsRef<[u8]> + ?Sized>(data: &D) -> Result<&Array> {
        Ok(Array::from_document(Document::from_bytes(data)?))
    }

    /// Reinterprets a document as an array. The element keys are not
    /// checked, here or during iteration.
    pub fn from_document(doc: &Document) -> &Array {
        // Safety: Array is repr(transparent) over Document.
        unsafe { &*(doc as *const Document as *const Array) }
    }

    /// The array as a plain document.
    pub fn as_document(&self) -> &Document {
        &self.doc
    }

    /// The raw bytes of the array.
    pub fn as_bytes(&self) -> &[u8] {
        self.doc.as_bytes()
    }

    /// Whether the array contains no elements.
    pub fn is_empty(&self) -> bool {
        self.doc.is_empty()
    }

    /// The number of elements that can be successfully decoded.
    pub fn count(&self) -> usize {
        self.doc.count()
    }

    /// An iterator over the array's values, in document order.
    pub fn iter(&self) -> ArrayIter<'_> {
        ArrayIter {
            inner: self.doc.elements(),
        }
    }

    /// Renders the array as MongoDB legacy extended JSON; element keys are
    /// suppressed.
    ///
    /// ```
    /// use bsonbuf::ArrayBuf;
    ///
    /// let mut array = ArrayBuf::new();
    /// array.push(0i32)?;
    /// array.push(1i32)?;
    /// assert_eq!(array.as_json(), "[ 0, 1 ]");
    /// # Ok::<(), bsonbuf::Error>(())
    /// ```
    pub fn as_json(&self) -> String {
        json::array_to_json(self)
    }

    /// Gets the value at the given index, walking the array from the
    /// beginning. Returns `Ok(None)` past the end of the array.
    pub fn get(&self, index: usize) -> Result<Option<ValueRef<'_>>> {
        self.iter().nth(index).transpose()
    }

    fn get_with<'a, T>(
        &'a self,
        index: usize,
        f: impl FnOnce(ValueRef<'a>) -> Option<T>,
    ) -> Result<Option<T>> {
        match self.get(index)? {
            Some(value) => f(value).map(Some).ok_or_else(|| {
                Error::unexpected_type(format!("mismatched element type at index {}", index))
            }),
            None => Ok(None),
        }
    }

    /// Gets the double at the given index.
    pub fn get_f64(&self, index: usize) -> Result<Option<f64>> {
        self.get_with(index, ValueRef::as_f64)
    }

    /// Gets the string at the given index.
    pub fn get_str(&self, index: usize) -> Result<Option<&str>> {
        self.get_with(index, ValueRef::as_str)
    }

    /// Gets the embedded document at the given index.
    pub fn get_document(&self, index: usize) -> Result<Option<&Document>> {
        self.get_with(index, ValueRef::as_document)
    }

    /// Gets the array at the given index.
    pub fn get_array(&self, index: usize) -> Result<Option<&Array>> {
        self.get_with(index, ValueRef::as_array)
    }

    /// Gets the boolean at the given index.
    pub fn get_bool(&self, index: usize) -> Result<Option<bool>> {
        self.get_with(index, ValueRef::as_bool)
    }

    /// Gets the ObjectId at the given index.
    pub fn get_object_id(&self, index: usize) -> Result<Option<crate::oid::ObjectId>> {
        self.get_with(index, ValueRef::as_object_id)
    }

    /// Gets the i32 at the given index.
    pub fn get_i32(&self, index: usize) -> Result<Option<i32>> {
        self.get_with(index, ValueRef::as_i32)
    }

    /// Gets the i64 at the given index.
    pub fn get_i64(&self, index: usize) -> Result<Option<i64>> {
        self.get_with(index, ValueRef::as_i64)
    }
}

impl<'a> IntoIterator for &'a Array {
    type IntoIter = ArrayIter<'a>;
    type Item = Result<ValueRef<'a>>;

    fn into_iter(self) -> ArrayIter<'a> {
        self.iter()
    }
}

/// An iterator over an array's values.
///
/// Iteration is positional: the stored keys are skipped rather than
/// checked against the expected decimal indices, so a document with stray
/// keys read as an array still yields its values in order.
pub struct ArrayIter<'a> {
    inner: Elements<'a>,
}

impl<'a> Iterator for ArrayIter<'a> {
    type Item = Result<ValueRef<'a>>;

    fn next(&mut self) -> Option<Result<ValueRef<'a>>> {
        self.inner
            .next()
            .map(|result| result.and_then(|element| element.value()))
    }
}

/// An owned BSON array.
///
/// Elements are appended with [`push`](Self::push); the decimal index keys
/// are generated internally.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArrayBuf {
    inner: DocumentBuf,
    len: usize,
}

impl ArrayBuf {
    /// Creates a new, empty array.
    pub fn new() -> ArrayBuf {
        Self {
            inner: DocumentBuf::new(),
            len: 0,
        }
    }

    /// Appends a value to the end of the array.
    pub fn push<'v>(&mut self, value: impl Into<ValueRef<'v>>) -> Result<()> {
        let key = crate::CString::from_string_unchecked(self.len.to_string());
        self.inner.append(&key, value)?;
        self.len += 1;
        Ok(())
    }

    /// Opens a sub-document at the end of the array.
    pub fn begin_document(&mut self) -> Result<DocumentWriter<'_>> {
        let key = crate::CString::from_string_unchecked(self.len.to_string());
        let writer = self.inner.begin_document(&key)?;
        self.len += 1;
        Ok(writer)
    }

    /// Opens a sub-array at the end of the array.
    pub fn begin_array(&mut self) -> Result<ArrayWriter<'_>> {
        let key = crate::CString::from_string_unchecked(self.len.to_string());
        let writer = self.inner.begin_array(&key)?;
        self.len += 1;
        Ok(writer)
    }

    /// The number of elements pushed so far.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the array contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The raw bytes of the array.
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    /// Consumes the array, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.inner.into_bytes()
    }
}

impl std::ops::Deref for ArrayBuf {
    type Target = Array;

    fn deref(&self) -> &Self::Target {
        Array::from_document(self.inner.as_document())
    }
}

impl AsRef<Array> for ArrayBuf {
    fn as_ref(&self) -> &Array {
        self
    }
}

impl Borrow<Array> for ArrayBuf {
    fn borrow(&self) -> &Array {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DocumentBuf, cstr};

    #[test]
    fn pushes_generate_index_keys() {
        let mut array = ArrayBuf::new();
        array.push("zero").unwrap();
        array.push(1i32).unwrap();
        array.push(true).unwrap();

        let doc = Document::from_bytes(array.as_bytes()).unwrap();
        let keys: Vec<_> = doc
            .iter()
            .map(|r| r.unwrap().0.to_string())
            .collect();
        assert_eq!(keys, ["0", "1", "2"]);

        assert_eq!(array.get_str(0).unwrap(), Some("zero"));
        assert_eq!(array.get_i32(1).unwrap(), Some(1));
        assert_eq!(array.get_bool(2).unwrap(), Some(true));
        assert_eq!(array.get(3).unwrap(), None);
    }

    #[test]
    fn iteration_is_positional() {
        // keys "0", "X" — reading does not police the indices
        let mut doc = DocumentBuf::new();
        doc.append(cstr!("0"), ValueRef::Null).unwrap();
        doc.append(cstr!("X"), 514i32).unwrap();
        let array = Array::from_document(doc.as_document());

        let mut iter = array.iter();
        assert_eq!(iter.next().unwrap().unwrap(), ValueRef::Null);
        assert_eq!(iter.next().unwrap().unwrap(), ValueRef::Int32(514));
        assert!(iter.next().is_none());
        assert_eq!(array.get_i32(1).unwrap(), Some(514));
    }

    #[test]
    fn nested_writers() {
        let mut array = ArrayBuf::new();
        array.push(1i32).unwrap();
        {
            let mut doc = array.begin_document().unwrap();
            doc.append(cstr!("k"), "v").unwrap();
        }
        {
            let mut inner = array.begin_array().unwrap();
            inner.push(9i32).unwrap();
        }

        assert_eq!(array.as_json(), r#"[ 1, { "k" : "v" }, [ 9 ] ]"#);
        assert_eq!(array.len(), 3);
    }
}
