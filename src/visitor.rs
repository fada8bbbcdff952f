//! Visitor-driven traversal of a document.
//!
//! The validator and the JSON renderer walk documents identically and only
//! differ in what they do at each element, so the traversal is factored
//! into [`visit_all`] dispatching to a [`Visitor`].

use crate::{
    array::Array,
    document::Document,
    error::Result,
    iter::Element,
    oid::ObjectId,
    spec::{BinarySubtype, ElementType},
    value::{Timestamp, ValueRef},
};

/// Per-element-type callbacks for [`visit_all`].
///
/// Every method has a default implementation, so an implementor only
/// handles the types it cares about. Methods return a stop flag: `true`
/// halts the traversal. String-carrying callbacks receive the raw bytes of
/// the value, which are not guaranteed to be valid UTF-8.
///
/// Callbacks for embedded documents and arrays do not descend on their own;
/// an implementation that wants to recurse calls
/// [`Document::visit_all`] on the child.
#[allow(unused_variables)]
pub trait Visitor {
    /// Called after the traversal positions on each element, before the
    /// element's typed callback.
    fn visit_before(&mut self, element: &Element<'_>) -> bool {
        false
    }

    /// Called when iteration stops on malformed bytes, with the byte offset
    /// of the offending element.
    fn visit_corrupt(&mut self, offset: usize) {}

    /// Called for each double element.
    fn visit_double(&mut self, value: f64) -> bool {
        false
    }

    /// Called for each utf8 string element, with its raw content bytes.
    fn visit_utf8(&mut self, value: &[u8]) -> bool {
        false
    }

    /// Called for each embedded document element.
    fn visit_document(&mut self, document: &Document) -> bool {
        false
    }

    /// Called for each array element.
    fn visit_array(&mut self, array: &Array) -> bool {
        false
    }

    /// Called for each binary element.
    fn visit_binary(&mut self, subtype: BinarySubtype, bytes: &[u8]) -> bool {
        false
    }

    /// Called for each undefined element.
    fn visit_undefined(&mut self) -> bool {
        false
    }

    /// Called for each ObjectId element.
    fn visit_object_id(&mut self, oid: ObjectId) -> bool {
        false
    }

    /// Called for each boolean element.
    fn visit_boolean(&mut self, value: bool) -> bool {
        false
    }

    /// Called for each datetime element, with milliseconds since the epoch.
    fn visit_date_time(&mut self, millis: i64) -> bool {
        false
    }

    /// Called for each null element.
    fn visit_null(&mut self) -> bool {
        false
    }

    /// Called for each regex element, with the raw pattern and options.
    fn visit_regex(&mut self, pattern: &[u8], options: &[u8]) -> bool {
        false
    }

    /// Called for each DBPointer element, with the raw namespace bytes.
    fn visit_db_pointer(&mut self, namespace: &[u8], id: ObjectId) -> bool {
        false
    }

    /// Called for each JavaScript code element, with its raw content bytes.
    fn visit_code(&mut self, code: &[u8]) -> bool {
        false
    }

    /// Called for each symbol element, with its raw content bytes.
    fn visit_symbol(&mut self, symbol: &[u8]) -> bool {
        false
    }

    /// Called for each code-with-scope element.
    fn visit_code_with_scope(&mut self, code: &[u8], scope: &Document) -> bool {
        false
    }

    /// Called for each int32 element.
    fn visit_int32(&mut self, value: i32) -> bool {
        false
    }

    /// Called for each timestamp element.
    fn visit_timestamp(&mut self, timestamp: Timestamp) -> bool {
        false
    }

    /// Called for each int64 element.
    fn visit_int64(&mut self, value: i64) -> bool {
        false
    }

    /// Called for each min-key element.
    fn visit_min_key(&mut self) -> bool {
        false
    }

    /// Called for each max-key element.
    fn visit_max_key(&mut self) -> bool {
        false
    }
}

/// Walks every element of `doc`, dispatching to `visitor`. Returns `true`
/// if traversal was halted, either by a callback returning `true` or by
/// corrupt bytes (reported through [`Visitor::visit_corrupt`]).
pub fn visit_all<V: Visitor + ?Sized>(doc: &Document, visitor: &mut V) -> bool {
    let mut elements = doc.elements();
    loop {
        let element = match elements.next() {
            None => return false,
            Some(Ok(element)) => element,
            Some(Err(_)) => {
                visitor.visit_corrupt(elements.error_offset().unwrap_or(0));
                return true;
            }
        };
        if visitor.visit_before(&element) {
            return true;
        }
        match dispatch(&element, visitor) {
            Ok(false) => {}
            Ok(true) => return true,
            Err(_) => {
                visitor.visit_corrupt(element.offset());
                return true;
            }
        }
    }
}

fn dispatch<V: Visitor + ?Sized>(element: &Element<'_>, visitor: &mut V) -> Result<bool> {
    // String-carrying types go through the raw accessors so that invalid
    // UTF-8 reaches the visitor instead of failing the dispatch.
    Ok(match element.element_type() {
        ElementType::String => visitor.visit_utf8(element.string_value_bytes()),
        ElementType::JavaScriptCode => visitor.visit_code(element.string_value_bytes()),
        ElementType::Symbol => visitor.visit_symbol(element.string_value_bytes()),
        ElementType::RegularExpression => {
            let (pattern, options) = element.regex_value_bytes();
            visitor.visit_regex(pattern, options)
        }
        ElementType::DbPointer => {
            let (namespace, id) = element.db_pointer_value_parts()?;
            visitor.visit_db_pointer(namespace, id)
        }
        ElementType::JavaScriptCodeWithScope => {
            let (code, scope) = element.code_with_scope_value_parts()?;
            visitor.visit_code_with_scope(code, scope)
        }
        ElementType::Binary => {
            let (subtype, bytes) = element.binary_value_parts();
            visitor.visit_binary(subtype, bytes)
        }
        ElementType::EmbeddedDocument => {
            visitor.visit_document(Document::from_bytes(element.value_bytes())?)
        }
        ElementType::Array => visitor.visit_array(Array::from_document(Document::from_bytes(
            element.value_bytes(),
        )?)),
        _ => match element.value()? {
            ValueRef::Double(v) => visitor.visit_double(v),
            ValueRef::Undefined => visitor.visit_undefined(),
            ValueRef::ObjectId(v) => visitor.visit_object_id(v),
            ValueRef::Boolean(v) => visitor.visit_boolean(v),
            ValueRef::DateTime(v) => visitor.visit_date_time(v.timestamp_millis()),
            ValueRef::Null => visitor.visit_null(),
            ValueRef::Int32(v) => visitor.visit_int32(v),
            ValueRef::Timestamp(v) => visitor.visit_timestamp(v),
            ValueRef::Int64(v) => visitor.visit_int64(v),
            ValueRef::MinKey => visitor.visit_min_key(),
            ValueRef::MaxKey => visitor.visit_max_key(),
            // string-carrying variants are dispatched from raw bytes above
            _ => false,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DocumentBuf, cstr};

    #[derive(Default)]
    struct Counter {
        elements: usize,
        int32s: usize,
        corrupt: Option<usize>,
    }

    impl Visitor for Counter {
        fn visit_before(&mut self, _element: &Element<'_>) -> bool {
            self.elements += 1;
            false
        }

        fn visit_corrupt(&mut self, offset: usize) {
            self.corrupt = Some(offset);
        }

        fn visit_int32(&mut self, _value: i32) -> bool {
            self.int32s += 1;
            false
        }
    }

    #[test]
    fn dispatches_per_type() {
        let mut doc = DocumentBuf::new();
        doc.append(cstr!("a"), 1i32).unwrap();
        doc.append(cstr!("b"), "two").unwrap();
        doc.append(cstr!("c"), 3i32).unwrap();

        let mut counter = Counter::default();
        assert!(!doc.visit_all(&mut counter));
        assert_eq!(counter.elements, 3);
        assert_eq!(counter.int32s, 2);
        assert_eq!(counter.corrupt, None);
    }

    #[test]
    fn corrupt_bytes_invoke_the_hook() {
        let mut bytes = DocumentBuf::new();
        bytes.append(cstr!("a"), 1i32).unwrap();
        let mut bytes = bytes.into_bytes();
        bytes[4] = 0x20; // invalid tag
        let doc = crate::Document::from_bytes(&bytes).unwrap();

        let mut counter = Counter::default();
        assert!(doc.visit_all(&mut counter));
        assert_eq!(counter.corrupt, Some(4));
    }

    struct StopAfterFirst(usize);

    impl Visitor for StopAfterFirst {
        fn visit_before(&mut self, _element: &Element<'_>) -> bool {
            self.0 += 1;
            self.0 >= 2
        }
    }

    #[test]
    fn stop_flag_halts_traversal() {
        let mut doc = DocumentBuf::new();
        doc.append(cstr!("a"), 1i32).unwrap();
        doc.append(cstr!("b"), 2i32).unwrap();
        doc.append(cstr!("c"), 3i32).unwrap();

        let mut stopper = StopAfterFirst(0);
        assert!(doc.visit_all(&mut stopper));
        assert_eq!(stopper.0, 2);
    }
}
