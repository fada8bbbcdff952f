//! Buffer-backed construction, traversal, validation, and extended JSON
//! rendering of [BSON](http://bsonspec.org/spec.html) documents.
//!
//! A [`DocumentBuf`] owns the raw bytes of a document and keeps them in
//! canonical form after every append, so the buffer can be handed to the
//! wire at any point with no separate "finish" step. Nested documents and
//! arrays are built in place through scoped writers that share the root
//! buffer. Reading goes through the unsized [`Document`] view, which walks
//! the bytes without copying them.
//!
//! ```
//! use bsonbuf::{Document, DocumentBuf, ValidateOptions, cstr};
//!
//! let mut doc = DocumentBuf::new();
//! doc.append(cstr!("name"), "Herman Melville")?;
//! doc.append(cstr!("year"), 1851i32)?;
//! let mut chapters = doc.begin_array(cstr!("chapters"))?;
//! chapters.push("Loomings")?;
//! chapters.push("The Carpet-Bag")?;
//! chapters.end();
//!
//! // the bytes are complete and readable at any point
//! let view = Document::from_bytes(doc.as_bytes())?;
//! assert_eq!(view.get_i32("year")?, Some(1851));
//! assert_eq!(view.count(), 3);
//! assert!(view.validate(ValidateOptions::default()).is_ok());
//! # Ok::<(), bsonbuf::Error>(())
//! ```
//!
//! Traversal is visitor-driven: [`Visitor`] has one optional callback per
//! element type, and [`Document::visit_all`] dispatches through them. The
//! validator and the [`Document::as_json`] renderer are both visitors.

#[doc(inline)]
pub use self::{
    array::{Array, ArrayBuf, ArrayIter},
    cstr::{CStr, CString},
    datetime::DateTime,
    document::Document,
    document_buf::DocumentBuf,
    error::{Error, Result},
    iter::{Element, Elements, Iter},
    oid::ObjectId,
    spec::{BinarySubtype, ElementType},
    validate::{ValidateOptions, ValidationError},
    value::{BinaryRef, CodeWithScopeRef, DbPointerRef, RegexRef, Timestamp, ValueRef},
    visitor::{Visitor, visit_all},
    writer::{ArrayWriter, DocumentWriter, SequenceIter, SequenceWriter},
};

pub mod array;
mod base64;
mod buffer;
pub mod cstr;
pub mod datetime;
pub mod document;
pub mod document_buf;
pub mod error;
pub mod iter;
mod json;
pub mod oid;
pub mod spec;
mod utf8;
pub mod validate;
pub mod value;
pub mod visitor;
pub mod writer;

#[cfg(test)]
mod props;
#[cfg(test)]
mod tests;
