//! Whole-document validation.

use thiserror::Error;

use crate::{array::Array, document::Document, iter::Element, utf8, visitor::Visitor};

/// Policies applied by [`Document::validate`] in addition to the structural
/// checks, which always run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Check that keys and utf8-typed values are valid UTF-8.
    pub utf8: bool,

    /// Permit embedded NUL bytes inside utf8-typed values. Only meaningful
    /// together with [`utf8`](Self::utf8).
    pub utf8_allow_null: bool,

    /// Reject keys beginning with `$`.
    pub dollar_keys: bool,

    /// Reject keys containing `.`.
    pub dot_keys: bool,
}

/// A validation failure, carrying the byte offset of the first offending
/// element relative to the start of the validated document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("invalid document at byte offset {offset}")]
pub struct ValidationError {
    /// Byte offset of the first offending element.
    pub offset: usize,
}

pub(crate) fn validate_document(
    doc: &Document,
    options: ValidateOptions,
) -> Result<(), ValidationError> {
    let mut visitor = ValidateVisitor {
        options,
        base: 0,
        element_offset: 0,
        value_offset: 0,
        err_offset: None,
    };
    doc.visit_all(&mut visitor);
    match visitor.err_offset {
        None => Ok(()),
        Some(offset) => Err(ValidationError { offset }),
    }
}

struct ValidateVisitor {
    options: ValidateOptions,
    /// Offset of the document being walked within the outermost one.
    base: usize,
    /// Offset of the current element, reported on policy violations.
    element_offset: usize,
    /// Offset of the current element's value, used as the base when
    /// recursing into it.
    value_offset: usize,
    err_offset: Option<usize>,
}

impl ValidateVisitor {
    fn check_child(&mut self, child: &Document) -> bool {
        let mut nested = ValidateVisitor {
            options: self.options,
            base: self.value_offset,
            element_offset: self.value_offset,
            value_offset: self.value_offset,
            err_offset: None,
        };
        child.visit_all(&mut nested);
        if nested.err_offset.is_some() {
            self.err_offset = nested.err_offset;
            return true;
        }
        false
    }
}

impl Visitor for ValidateVisitor {
    fn visit_before(&mut self, element: &Element<'_>) -> bool {
        self.element_offset = self.base + element.offset();
        self.value_offset = self.base + element.value_offset();

        let key = element.key_bytes();
        if self.options.dollar_keys && key.first() == Some(&b'$') {
            self.err_offset = Some(self.element_offset);
            return true;
        }
        if self.options.dot_keys && key.contains(&b'.') {
            self.err_offset = Some(self.element_offset);
            return true;
        }
        // keys are cstrings, so an embedded NUL is unrepresentable
        if self.options.utf8 && !utf8::validate(key, true) {
            self.err_offset = Some(self.element_offset);
            return true;
        }
        false
    }

    fn visit_corrupt(&mut self, offset: usize) {
        self.err_offset = Some(self.base + offset);
    }

    fn visit_utf8(&mut self, value: &[u8]) -> bool {
        if self.options.utf8 && !utf8::validate(value, self.options.utf8_allow_null) {
            // point at the element, not its value
            self.err_offset = Some(self.element_offset);
            return true;
        }
        false
    }

    fn visit_document(&mut self, document: &Document) -> bool {
        self.check_child(document)
    }

    fn visit_array(&mut self, array: &Array) -> bool {
        self.check_child(array.as_document())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DocumentBuf, cstr};

    fn flags(f: impl FnOnce(&mut ValidateOptions)) -> ValidateOptions {
        let mut options = ValidateOptions::default();
        f(&mut options);
        options
    }

    #[test]
    fn clean_document_passes_all_policies() {
        let mut doc = DocumentBuf::new();
        doc.append(cstr!("name"), "value").unwrap();
        doc.append(cstr!("n"), 3i32).unwrap();
        let mut child = doc.begin_document(cstr!("child")).unwrap();
        child.append(cstr!("inner"), "ok").unwrap();
        child.end();

        let all = ValidateOptions {
            utf8: true,
            utf8_allow_null: false,
            dollar_keys: true,
            dot_keys: true,
        };
        assert!(doc.validate(all).is_ok());
    }

    #[test]
    fn dollar_key_is_rejected_with_offset() {
        let mut doc = DocumentBuf::new();
        doc.append(cstr!("fine"), 1i32).unwrap();
        doc.append(cstr!("$op"), 1i32).unwrap();

        assert!(doc.validate(ValidateOptions::default()).is_ok());
        let err = doc
            .validate(flags(|o| o.dollar_keys = true))
            .unwrap_err();
        // tag(1) + "fine\0"(5) + i32(4) after the prefix
        assert_eq!(err.offset, 4 + 10);
    }

    #[test]
    fn dot_key_is_rejected() {
        let mut doc = DocumentBuf::new();
        doc.append(cstr!("a.b"), 1i32).unwrap();
        assert!(doc.validate(ValidateOptions::default()).is_ok());
        assert_eq!(
            doc.validate(flags(|o| o.dot_keys = true)).unwrap_err().offset,
            4
        );
    }

    #[test]
    fn invalid_utf8_value_is_rejected_only_with_the_flag() {
        // "s": <invalid utf8 string value>
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&15i32.to_le_bytes());
        bytes.extend_from_slice(b"\x02s\x00\x03\x00\x00\x00\xc3\x28\x00");
        bytes.push(0);
        let doc = crate::Document::from_bytes(&bytes).unwrap();

        assert!(doc.validate(ValidateOptions::default()).is_ok());
        let err = doc.validate(flags(|o| o.utf8 = true)).unwrap_err();
        assert_eq!(err.offset, 4);
    }

    #[test]
    fn embedded_nul_policy() {
        let mut doc = DocumentBuf::new();
        doc.append(cstr!("s"), "with\0nul").unwrap();

        assert!(doc.validate(ValidateOptions::default()).is_ok());
        assert!(
            doc.validate(flags(|o| {
                o.utf8 = true;
                o.utf8_allow_null = true;
            }))
            .is_ok()
        );
        assert_eq!(
            doc.validate(flags(|o| o.utf8 = true)).unwrap_err().offset,
            4
        );
    }

    #[test]
    fn nested_violation_reports_root_relative_offset() {
        let mut doc = DocumentBuf::new();
        doc.append(cstr!("ok"), 1i32).unwrap();
        let mut child = doc.begin_document(cstr!("child")).unwrap();
        child.append(cstr!("$bad"), 2i32).unwrap();
        child.end();

        let err = doc
            .validate(flags(|o| o.dollar_keys = true))
            .unwrap_err();
        // root prefix(4) + "ok" element(8) + tag(1) + "child\0"(6) + child prefix(4)
        assert_eq!(err.offset, 4 + 8 + 7 + 4);

        // the offending element really is there
        let bytes = doc.as_bytes();
        assert_eq!(bytes[err.offset], 0x10);
        assert_eq!(&bytes[err.offset + 1..err.offset + 5], b"$bad");
    }

    #[test]
    fn corrupt_child_reports_offset() {
        let mut doc = DocumentBuf::new();
        let mut child = doc.begin_document(cstr!("c")).unwrap();
        child.append(cstr!("k"), 5i32).unwrap();
        child.end();
        let mut bytes = doc.into_bytes();
        // corrupt the child's element tag
        let tag_at = 4 + 1 + 2 + 4;
        bytes[tag_at] = 0x21;
        let doc = crate::Document::from_bytes(&bytes).unwrap();

        let err = doc.validate(ValidateOptions::default()).unwrap_err();
        assert_eq!(err.offset, tag_at);
    }
}
