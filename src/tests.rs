//! End-to-end coverage of the documented behavior: the wire-format
//! scenarios and the cross-component laws that individual module tests
//! don't exercise together.

use std::cmp::Ordering;

use pretty_assertions::assert_eq;

use crate::{
    Array, ArrayBuf, CStr, Document, DocumentBuf, SequenceWriter, ValidateOptions, ValueRef,
    cstr,
};

#[test]
fn empty_document() {
    // S1
    let doc = DocumentBuf::new();
    assert_eq!(doc.as_bytes(), b"\x05\x00\x00\x00\x00");
    assert_eq!(doc.as_json(), "{}");
    assert_eq!(doc.count(), 0);
    assert!(doc.validate(ValidateOptions::default()).is_ok());
}

#[test]
fn single_int32_document() {
    // S2
    let mut doc = DocumentBuf::new();
    doc.append(cstr!("a"), 1i32).unwrap();
    assert_eq!(
        doc.as_bytes(),
        b"\x0c\x00\x00\x00\x10\x61\x00\x01\x00\x00\x00\x00"
    );
    assert_eq!(doc.count(), 1);
    assert_eq!(doc.as_json(), r#"{ "a" : 1 }"#);
}

#[test]
fn nested_document() {
    // S3
    let mut doc = DocumentBuf::new();
    let mut child = doc.begin_document(cstr!("x")).unwrap();
    child.append(cstr!("y"), "hi").unwrap();
    child.end();

    assert_eq!(doc.as_bytes().len(), 23);
    assert_eq!(doc.as_json(), r#"{ "x" : { "y" : "hi" } }"#);
}

#[test]
fn array_document() {
    // S4
    let mut array = ArrayBuf::new();
    array.push(0i32).unwrap();
    array.push(1i32).unwrap();
    assert_eq!(array.as_json(), "[ 0, 1 ]");
}

#[test]
fn dollar_key_validation() {
    // S5
    let mut doc = DocumentBuf::new();
    doc.append(cstr!("$op"), 1i32).unwrap();
    let options = ValidateOptions {
        dollar_keys: true,
        ..Default::default()
    };
    let err = doc.validate(options).unwrap_err();
    assert_eq!(err.offset, 4);
}

#[test]
fn truncated_static_init() {
    // S6
    let mut doc = DocumentBuf::new();
    doc.append(cstr!("key"), "value").unwrap();
    let bytes = doc.as_bytes();
    assert!(Document::from_bytes(&bytes[..bytes.len() - 3]).is_err());
}

#[test]
fn header_invariant_is_maintained_across_operations() {
    // law 1: after any sequence of operations the prefix matches the
    // length and the last byte is NUL
    let mut doc = DocumentBuf::new();
    let check = |doc: &DocumentBuf| {
        let bytes = doc.as_bytes();
        let declared = u32::from_le_bytes(bytes[..4].try_into().unwrap()) as usize;
        assert_eq!(declared, bytes.len());
        assert_eq!(*bytes.last().unwrap(), 0);
    };

    check(&doc);
    doc.append(cstr!("a"), 1.5f64).unwrap();
    check(&doc);
    {
        let mut child = doc.begin_document(cstr!("b")).unwrap();
        child.append(cstr!("c"), "text").unwrap();
        let mut grandchild = child.begin_array(cstr!("d")).unwrap();
        grandchild.push(false).unwrap();
    }
    check(&doc);
    doc.append(cstr!("e"), None::<&str>).unwrap();
    check(&doc);
}

#[test]
fn parse_round_trip_is_idempotent() {
    // law 2
    let mut doc = DocumentBuf::new();
    doc.append(cstr!("k"), "v").unwrap();
    doc.append(cstr!("n"), 12i64).unwrap();

    let once = DocumentBuf::from_bytes(doc.as_bytes().to_vec()).unwrap();
    let twice = DocumentBuf::from_bytes(once.as_bytes().to_vec()).unwrap();
    assert_eq!(doc, once);
    assert_eq!(once, twice);
}

#[test]
fn count_matches_iteration() {
    // law 8
    let mut doc = DocumentBuf::new();
    for key in ["one", "two", "three", "four"] {
        let key: &CStr = key.try_into().unwrap();
        doc.append(key, 1i32).unwrap();
    }
    assert_eq!(doc.count(), 4);
    assert_eq!(doc.iter().filter(|e| e.is_ok()).count(), 4);
}

#[test]
fn compare_is_a_total_order() {
    // law 9
    let mut small = DocumentBuf::new();
    small.append(cstr!("a"), 1i32).unwrap();
    let mut large = DocumentBuf::new();
    large.append(cstr!("a"), "longer than an int32").unwrap();
    let mut peer = DocumentBuf::new();
    peer.append(cstr!("a"), 2i32).unwrap();

    // length dominates
    assert_eq!(small.compare(&large), Ordering::Less);
    assert_eq!(large.compare(&small), Ordering::Greater);
    // equal lengths fall back to bytewise comparison
    assert_eq!(small.compare(&peer), Ordering::Less);
    assert_eq!(peer.compare(&small), Ordering::Greater);
    assert_eq!(small.compare(&small), Ordering::Equal);

    // equality is byte equality
    let copy = DocumentBuf::from_bytes(small.as_bytes().to_vec()).unwrap();
    assert_eq!(small, copy);
    assert_ne!(small, peer);
}

#[test]
fn documents_embed_across_handles() {
    // a document built in one buffer embeds byte-for-byte in another
    let mut inner = DocumentBuf::new();
    inner.append(cstr!("deep"), 9i32).unwrap();

    let mut seq = SequenceWriter::new();
    {
        let mut doc = seq.begin_document().unwrap();
        doc.append(cstr!("wrapped"), &inner).unwrap();
    }
    let bytes = seq.into_bytes();
    let doc = Document::from_bytes(&bytes).unwrap();
    assert_eq!(
        doc.get_document("wrapped").unwrap().unwrap().as_bytes(),
        inner.as_bytes()
    );
}

#[test]
fn static_view_of_builder_output() {
    let mut doc = DocumentBuf::new();
    doc.append(cstr!("flag"), true).unwrap();
    let mut array = doc.begin_array(cstr!("values")).unwrap();
    array.push(10i32).unwrap();
    array.push(20i32).unwrap();
    array.end();

    let view: &Document = Document::from_bytes(doc.as_bytes()).unwrap();
    assert_eq!(view.get_bool("flag").unwrap(), Some(true));
    let values: &Array = view.get_array("values").unwrap().unwrap();
    let decoded: Vec<i32> = values
        .iter()
        .map(|v| v.unwrap().as_i32().unwrap())
        .collect();
    assert_eq!(decoded, [10, 20]);
}

#[test]
fn mixed_appends_render_and_validate() {
    let mut doc = DocumentBuf::new();
    doc.append(cstr!("utf8"), "text").unwrap();
    doc.append(cstr!("int"), -7i32).unwrap();
    doc.append(cstr!("long"), 1i64 << 40).unwrap();
    doc.append(cstr!("none"), ValueRef::Null).unwrap();
    {
        let mut sub = doc.begin_document(cstr!("sub")).unwrap();
        sub.append(cstr!("inner"), 0.25f64).unwrap();
    }

    assert!(
        doc.validate(ValidateOptions {
            utf8: true,
            dollar_keys: true,
            dot_keys: true,
            ..Default::default()
        })
        .is_ok()
    );
    assert_eq!(
        doc.as_json(),
        r#"{ "utf8" : "text", "int" : -7, "long" : 1099511627776, "none" : null, "sub" : { "inner" : 0.250000 } }"#
    );
}
