//! Scoped writers for building documents in place.
//!
//! A document under construction is a stack of open frames, one per
//! unclosed (sub-)document. Frame `i`'s length prefix sits at a recorded
//! offset, its terminator is the `(i+1)`-th byte from the end of the
//! buffer, and its current length is therefore `buffer_len - i - offset`.
//! Appending writes the element over the terminator region and re-encodes
//! every open prefix, so the whole buffer is a well-formed document after
//! every single append; closing a child has no byte-level work left to do.

use crate::{
    buffer::Buffer,
    cstr::{CStr, CString},
    document::Document,
    error::{Error, Result},
    spec::{ElementType, MIN_DOCUMENT_SIZE},
    value::ValueRef,
};

const EMPTY_DOCUMENT: [u8; MIN_DOCUMENT_SIZE] = [MIN_DOCUMENT_SIZE as u8, 0, 0, 0, 0];

/// A writer for a document being built inside a root buffer.
///
/// Obtained from [`DocumentBuf::begin_document`](crate::DocumentBuf::begin_document),
/// [`SequenceWriter::begin_document`](SequenceWriter::begin_document), or
/// [`begin_document`](Self::begin_document) on another writer. The writer
/// borrows the root buffer, so the parent cannot be touched until this
/// writer is dropped or [`end`](Self::end)ed; that makes a child outliving
/// its parent unrepresentable.
pub struct DocumentWriter<'a> {
    buf: &'a mut Buffer,
    /// Length-prefix offsets of every open document, outermost first.
    frames: Vec<usize>,
}

impl<'a> DocumentWriter<'a> {
    pub(crate) fn new(buf: &'a mut Buffer, frames: Vec<usize>) -> Self {
        Self { buf, frames }
    }

    /// Appends a key/value pair to this document.
    ///
    /// It is a user error to append the same key more than once to the same
    /// document; the writer does not check for duplicates.
    pub fn append<'v>(
        &mut self,
        key: impl AsRef<CStr>,
        value: impl Into<ValueRef<'v>>,
    ) -> Result<()> {
        append_value(self.buf, &self.frames, key.as_ref(), value.into())
    }

    /// Opens a sub-document under `key`, returning a writer for it.
    pub fn begin_document(&mut self, key: impl AsRef<CStr>) -> Result<DocumentWriter<'_>> {
        let offset = open_child(
            self.buf,
            &self.frames,
            ElementType::EmbeddedDocument,
            key.as_ref(),
        )?;
        let mut frames = self.frames.clone();
        frames.push(offset);
        Ok(DocumentWriter {
            buf: &mut *self.buf,
            frames,
        })
    }

    /// Opens a sub-array under `key`, returning a writer that generates
    /// the decimal index keys itself.
    pub fn begin_array(&mut self, key: impl AsRef<CStr>) -> Result<ArrayWriter<'_>> {
        let offset = open_child(self.buf, &self.frames, ElementType::Array, key.as_ref())?;
        let mut frames = self.frames.clone();
        frames.push(offset);
        Ok(ArrayWriter {
            inner: DocumentWriter {
                buf: &mut *self.buf,
                frames,
            },
            index: 0,
        })
    }

    /// Closes this document.
    ///
    /// Length prefixes and terminators are kept consistent after every
    /// append, so this releases the borrow and nothing else; dropping the
    /// writer is equivalent.
    pub fn end(self) {}
}

/// A writer for an array being built inside a root buffer, appending
/// elements under generated decimal index keys "0", "1", ….
pub struct ArrayWriter<'a> {
    inner: DocumentWriter<'a>,
    index: usize,
}

impl<'a> ArrayWriter<'a> {
    pub(crate) fn new(inner: DocumentWriter<'a>) -> Self {
        Self { inner, index: 0 }
    }

    /// Appends a value under the next index key.
    pub fn push<'v>(&mut self, value: impl Into<ValueRef<'v>>) -> Result<()> {
        let key = index_key(self.index);
        self.inner.append(&key, value)?;
        self.index += 1;
        Ok(())
    }

    /// Opens a sub-document under the next index key.
    pub fn begin_document(&mut self) -> Result<DocumentWriter<'_>> {
        let key = index_key(self.index);
        let writer = self.inner.begin_document(&key)?;
        self.index += 1;
        Ok(writer)
    }

    /// Opens a sub-array under the next index key.
    pub fn begin_array(&mut self) -> Result<ArrayWriter<'_>> {
        let key = index_key(self.index);
        let writer = self.inner.begin_array(&key)?;
        self.index += 1;
        Ok(writer)
    }

    /// Closes this array. Dropping the writer is equivalent.
    pub fn end(self) {}
}

fn index_key(index: usize) -> CString {
    // decimal digits never contain a NUL
    CString::from_string_unchecked(index.to_string())
}

/// Lays successive documents end-to-end in a single growable buffer.
///
/// This replaces repeated allocate-build-copy cycles when streaming many
/// documents into one output, e.g. a wire-protocol message body.
///
/// ```
/// use bsonbuf::{SequenceWriter, cstr};
///
/// let mut seq = SequenceWriter::new();
/// for i in 0..3i32 {
///     let mut doc = seq.begin_document()?;
///     doc.append(cstr!("i"), i)?;
/// }
/// let docs: Vec<_> = seq.documents().collect::<Result<_, _>>()?;
/// assert_eq!(docs.len(), 3);
/// assert_eq!(docs[2].get_i32("i")?, Some(2));
/// # Ok::<(), bsonbuf::Error>(())
/// ```
pub struct SequenceWriter {
    buf: Buffer,
}

impl SequenceWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self { buf: Buffer::new() }
    }

    /// Starts a new document at the end of the buffer.
    pub fn begin_document(&mut self) -> Result<DocumentWriter<'_>> {
        let base = self.buf.len();
        self.buf.reserve(MIN_DOCUMENT_SIZE)?;
        self.buf.extend_from_slice(&EMPTY_DOCUMENT);
        Ok(DocumentWriter::new(&mut self.buf, vec![base]))
    }

    /// The accumulated bytes of every document written so far.
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_slice()
    }

    /// Consumes the writer, returning the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.into_vec()
    }

    /// Walks the accumulated buffer, yielding each document in turn.
    pub fn documents(&self) -> SequenceIter<'_> {
        SequenceIter {
            data: self.buf.as_slice(),
            offset: 0,
        }
    }
}

impl Default for SequenceWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the documents accumulated in a [`SequenceWriter`].
pub struct SequenceIter<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for SequenceIter<'a> {
    type Item = Result<&'a Document>;

    fn next(&mut self) -> Option<Result<&'a Document>> {
        if self.offset >= self.data.len() {
            return None;
        }
        let remaining = &self.data[self.offset..];
        let len = match crate::iter::i32_from_slice(remaining) {
            Ok(len) if len >= MIN_DOCUMENT_SIZE as i32 && len as usize <= remaining.len() => {
                len as usize
            }
            Ok(len) => {
                self.offset = self.data.len();
                return Some(Err(Error::malformed_bytes(format!(
                    "invalid document length {} in sequence",
                    len
                ))));
            }
            Err(e) => {
                self.offset = self.data.len();
                return Some(Err(e));
            }
        };
        let result = Document::from_bytes(&remaining[..len]);
        self.offset += len;
        if result.is_err() {
            self.offset = self.data.len();
        }
        Some(result)
    }
}

/// Appends one element to the innermost open document and re-encodes every
/// open length prefix.
pub(crate) fn append_value(
    buf: &mut Buffer,
    frames: &[usize],
    key: &CStr,
    value: ValueRef<'_>,
) -> Result<()> {
    // an empty scope downgrades to a plain code element
    let value = match value {
        ValueRef::JavaScriptCodeWithScope(cws) if cws.scope.is_empty() => {
            ValueRef::JavaScriptCode(cws.code)
        }
        other => other,
    };
    if let ValueRef::RegularExpression(re) = &value {
        if re.pattern.as_bytes().contains(&0) || re.options.as_bytes().contains(&0) {
            return Err(Error::malformed_bytes("regex with interior NUL")
                .with_key(key.as_str()));
        }
    }

    let grow = 1 + key.len() + 1 + encoded_value_len(&value);
    grow_for_element(buf, frames, grow)?;

    let depth = frames.len() - 1;
    let insert_at = buf.len() - 1 - depth;
    buf.truncate(insert_at);
    buf.push(value.element_type() as u8);
    buf.extend_from_slice(key.as_bytes());
    buf.push(0);
    write_value(buf, value);
    for _ in 0..=depth {
        buf.push(0);
    }
    encode_frame_lengths(buf, frames);
    Ok(())
}

/// Writes the element header and empty-document image for a child under
/// `key`, returning the offset of the child's length prefix.
pub(crate) fn open_child(
    buf: &mut Buffer,
    frames: &[usize],
    kind: ElementType,
    key: &CStr,
) -> Result<usize> {
    let grow = 1 + key.len() + 1 + MIN_DOCUMENT_SIZE;
    grow_for_element(buf, frames, grow)?;

    let depth = frames.len() - 1;
    let insert_at = buf.len() - 1 - depth;
    buf.truncate(insert_at);
    buf.push(kind as u8);
    buf.extend_from_slice(key.as_bytes());
    buf.push(0);
    let child_offset = insert_at + 1 + key.len() + 1;
    buf.extend_from_slice(&EMPTY_DOCUMENT);
    for _ in 0..=depth {
        buf.push(0);
    }
    encode_frame_lengths(buf, frames);
    Ok(child_offset)
}

/// Checks the size bound and reserves room for `grow` more bytes in one
/// step, so an append either fully succeeds or leaves the buffer untouched.
fn grow_for_element(buf: &mut Buffer, frames: &[usize], grow: usize) -> Result<()> {
    let root_len = buf.len() - frames[0];
    let new_root_len = root_len
        .checked_add(grow)
        .ok_or_else(|| Error::size_overflow(usize::MAX))?;
    if new_root_len >= i32::MAX as usize {
        return Err(Error::size_overflow(new_root_len));
    }
    buf.reserve(grow)
}

fn encode_frame_lengths(buf: &mut Buffer, frames: &[usize]) {
    let total = buf.len();
    let data = buf.as_mut_slice();
    for (i, &offset) in frames.iter().enumerate() {
        let len = (total - i - offset) as i32;
        data[offset..offset + 4].copy_from_slice(&len.to_le_bytes());
    }
}

fn encoded_value_len(value: &ValueRef<'_>) -> usize {
    match value {
        ValueRef::Double(_) => 8,
        ValueRef::String(s) => 4 + s.len() + 1,
        ValueRef::Document(d) => d.as_bytes().len(),
        ValueRef::Array(a) => a.as_bytes().len(),
        ValueRef::Binary(b) => 4 + 1 + b.bytes.len(),
        ValueRef::Undefined => 0,
        ValueRef::ObjectId(_) => 12,
        ValueRef::Boolean(_) => 1,
        ValueRef::DateTime(_) => 8,
        ValueRef::Null => 0,
        ValueRef::RegularExpression(re) => re.pattern.len() + 1 + re.options.len() + 1,
        ValueRef::DbPointer(p) => 4 + p.namespace.len() + 1 + 12,
        ValueRef::JavaScriptCode(s) => 4 + s.len() + 1,
        ValueRef::Symbol(s) => 4 + s.len() + 1,
        ValueRef::JavaScriptCodeWithScope(cws) => {
            4 + 4 + cws.code.len() + 1 + cws.scope.as_bytes().len()
        }
        ValueRef::Int32(_) => 4,
        ValueRef::Timestamp(_) => 8,
        ValueRef::Int64(_) => 8,
        ValueRef::MinKey => 0,
        ValueRef::MaxKey => 0,
    }
}

fn write_value(buf: &mut Buffer, value: ValueRef<'_>) {
    match value {
        ValueRef::Double(v) => buf.extend_from_slice(&v.to_le_bytes()),
        ValueRef::String(s) => write_string(buf, s),
        ValueRef::Document(d) => buf.extend_from_slice(d.as_bytes()),
        ValueRef::Array(a) => buf.extend_from_slice(a.as_bytes()),
        ValueRef::Binary(b) => {
            buf.extend_from_slice(&(b.bytes.len() as i32).to_le_bytes());
            buf.push(u8::from(b.subtype));
            buf.extend_from_slice(b.bytes);
        }
        ValueRef::Undefined | ValueRef::Null | ValueRef::MinKey | ValueRef::MaxKey => {}
        ValueRef::ObjectId(oid) => buf.extend_from_slice(&oid.bytes()),
        ValueRef::Boolean(v) => buf.push(v as u8),
        ValueRef::DateTime(dt) => {
            buf.extend_from_slice(&dt.timestamp_millis().to_le_bytes())
        }
        ValueRef::RegularExpression(re) => {
            buf.extend_from_slice(re.pattern.as_bytes());
            buf.push(0);
            buf.extend_from_slice(re.options.as_bytes());
            buf.push(0);
        }
        ValueRef::DbPointer(p) => {
            write_string(buf, p.namespace);
            buf.extend_from_slice(&p.id.bytes());
        }
        ValueRef::JavaScriptCode(s) => write_string(buf, s),
        ValueRef::Symbol(s) => write_string(buf, s),
        ValueRef::JavaScriptCodeWithScope(cws) => {
            let total = 4 + 4 + cws.code.len() + 1 + cws.scope.as_bytes().len();
            buf.extend_from_slice(&(total as i32).to_le_bytes());
            write_string(buf, cws.code);
            buf.extend_from_slice(cws.scope.as_bytes());
        }
        ValueRef::Int32(v) => buf.extend_from_slice(&v.to_le_bytes()),
        ValueRef::Timestamp(ts) => buf.extend_from_slice(&ts.to_le_bytes()),
        ValueRef::Int64(v) => buf.extend_from_slice(&v.to_le_bytes()),
    }
}

fn write_string(buf: &mut Buffer, s: &str) {
    buf.extend_from_slice(&((s.len() + 1) as i32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DocumentBuf, cstr};
    use pretty_assertions::assert_eq;

    #[test]
    fn sequence_writer_concatenates_documents() {
        let mut seq = SequenceWriter::new();
        {
            let mut doc = seq.begin_document().unwrap();
            doc.append(cstr!("a"), 1i32).unwrap();
        }
        {
            let doc = seq.begin_document().unwrap();
            doc.end();
        }

        let mut expected = DocumentBuf::new();
        expected.append(cstr!("a"), 1i32).unwrap();
        let mut bytes = expected.as_bytes().to_vec();
        bytes.extend_from_slice(&EMPTY_DOCUMENT);
        assert_eq!(seq.as_bytes(), bytes.as_slice());

        let docs: Vec<_> = seq.documents().map(|d| d.unwrap()).collect();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].get_i32("a").unwrap(), Some(1));
        assert!(docs[1].is_empty());
    }

    #[test]
    fn sequence_iter_reports_garbage() {
        let mut seq = SequenceWriter::new();
        seq.begin_document().unwrap().end();
        let mut bytes = seq.into_bytes();
        bytes.extend_from_slice(&[3, 0, 0, 0]); // bogus trailing length

        let mut seq = SequenceWriter::new();
        seq.buf = Buffer::from_vec(bytes);
        let results: Vec<_> = seq.documents().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn appends_write_through_to_every_open_prefix() {
        let mut doc = DocumentBuf::new();
        let mut outer = doc.begin_document(cstr!("o")).unwrap();
        let mut inner = outer.begin_document(cstr!("i")).unwrap();
        inner.append(cstr!("v"), 7i32).unwrap();

        // the whole buffer is well-formed while both children are open
        let bytes = inner.buf.as_slice().to_vec();
        let view = crate::Document::from_bytes(&bytes).unwrap();
        assert_eq!(
            view.get_document("o")
                .unwrap()
                .unwrap()
                .get_document("i")
                .unwrap()
                .unwrap()
                .get_i32("v")
                .unwrap(),
            Some(7)
        );
    }
}
