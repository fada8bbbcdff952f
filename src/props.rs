//! Recursive property tests over generated value trees.

use proptest::prelude::*;

use crate::{
    ArrayBuf, CStr, DateTime, DocumentBuf, ObjectId, ValidateOptions, ValueRef,
    spec::BinarySubtype,
    value::{BinaryRef, CodeWithScopeRef, RegexRef, Timestamp},
    writer::{ArrayWriter, DocumentWriter},
};

#[derive(Debug, Clone)]
enum Val {
    Double(f64),
    Str(String),
    Bool(bool),
    I32(i32),
    I64(i64),
    Null,
    Undefined,
    MinKey,
    MaxKey,
    Oid([u8; 12]),
    DateTime(i64),
    Timestamp(u32, u32),
    Regex(String, String),
    Binary(u8, Vec<u8>),
    Code(String),
    Symbol(String),
    Doc(Vec<(String, Val)>),
    Array(Vec<Val>),
    CodeWithScope(String, Vec<(String, Val)>),
}

impl Val {
    /// The scalar (non-container) representation, if any.
    fn scalar(&self) -> Option<ValueRef<'_>> {
        Some(match self {
            Val::Double(v) => ValueRef::Double(*v),
            Val::Str(s) => ValueRef::String(s),
            Val::Bool(b) => ValueRef::Boolean(*b),
            Val::I32(v) => ValueRef::Int32(*v),
            Val::I64(v) => ValueRef::Int64(*v),
            Val::Null => ValueRef::Null,
            Val::Undefined => ValueRef::Undefined,
            Val::MinKey => ValueRef::MinKey,
            Val::MaxKey => ValueRef::MaxKey,
            Val::Oid(bytes) => ValueRef::ObjectId(ObjectId::from_bytes(*bytes)),
            Val::DateTime(ms) => ValueRef::DateTime(DateTime::from_millis(*ms)),
            Val::Timestamp(t, i) => ValueRef::Timestamp(Timestamp {
                time: *t,
                increment: *i,
            }),
            Val::Regex(pattern, options) => ValueRef::RegularExpression(RegexRef {
                pattern,
                options,
            }),
            Val::Binary(subtype, bytes) => ValueRef::Binary(BinaryRef {
                subtype: BinarySubtype::from(*subtype),
                bytes,
            }),
            Val::Code(code) => ValueRef::JavaScriptCode(code),
            Val::Symbol(symbol) => ValueRef::Symbol(symbol),
            Val::Doc(..) | Val::Array(..) | Val::CodeWithScope(..) => return None,
        })
    }
}

fn key(k: &str) -> &CStr {
    k.try_into().expect("generated keys contain no NUL")
}

/// Builds the document by composing prebuilt child buffers and appending
/// them by value.
fn build_by_value(fields: &[(String, Val)]) -> DocumentBuf {
    let mut doc = DocumentBuf::new();
    for (k, v) in fields {
        match v {
            Val::Doc(fields) => {
                let child = build_by_value(fields);
                doc.append(key(k), &child).unwrap();
            }
            Val::Array(items) => {
                let child = build_array_by_value(items);
                doc.append(key(k), &child).unwrap();
            }
            Val::CodeWithScope(code, fields) => {
                let scope = build_by_value(fields);
                doc.append(
                    key(k),
                    CodeWithScopeRef {
                        code,
                        scope: &scope,
                    },
                )
                .unwrap();
            }
            scalar => doc.append(key(k), scalar.scalar().unwrap()).unwrap(),
        }
    }
    doc
}

fn build_array_by_value(items: &[Val]) -> ArrayBuf {
    let mut array = ArrayBuf::new();
    for item in items {
        match item {
            Val::Doc(fields) => {
                let child = build_by_value(fields);
                array.push(&child).unwrap();
            }
            Val::Array(nested) => {
                let child = build_array_by_value(nested);
                array.push(&child).unwrap();
            }
            Val::CodeWithScope(code, fields) => {
                let scope = build_by_value(fields);
                array
                    .push(CodeWithScopeRef {
                        code,
                        scope: &scope,
                    })
                    .unwrap();
            }
            scalar => array.push(scalar.scalar().unwrap()).unwrap(),
        }
    }
    array
}

/// Builds the same document in place through the scoped child writers.
fn build_by_writers(fields: &[(String, Val)]) -> DocumentBuf {
    let mut doc = DocumentBuf::new();
    for (k, v) in fields {
        match v {
            Val::Doc(fields) => {
                let mut child = doc.begin_document(key(k)).unwrap();
                write_fields(&mut child, fields);
            }
            Val::Array(items) => {
                let mut child = doc.begin_array(key(k)).unwrap();
                write_items(&mut child, items);
            }
            Val::CodeWithScope(code, fields) => {
                let scope = build_by_writers(fields);
                doc.append(
                    key(k),
                    CodeWithScopeRef {
                        code,
                        scope: &scope,
                    },
                )
                .unwrap();
            }
            scalar => doc.append(key(k), scalar.scalar().unwrap()).unwrap(),
        }
    }
    doc
}

fn write_fields(writer: &mut DocumentWriter<'_>, fields: &[(String, Val)]) {
    for (k, v) in fields {
        match v {
            Val::Doc(fields) => {
                let mut child = writer.begin_document(key(k)).unwrap();
                write_fields(&mut child, fields);
            }
            Val::Array(items) => {
                let mut child = writer.begin_array(key(k)).unwrap();
                write_items(&mut child, items);
            }
            Val::CodeWithScope(code, fields) => {
                let scope = build_by_writers(fields);
                writer
                    .append(
                        key(k),
                        CodeWithScopeRef {
                            code,
                            scope: &scope,
                        },
                    )
                    .unwrap();
            }
            scalar => writer.append(key(k), scalar.scalar().unwrap()).unwrap(),
        }
    }
}

fn write_items(writer: &mut ArrayWriter<'_>, items: &[Val]) {
    for item in items {
        match item {
            Val::Doc(fields) => {
                let mut child = writer.begin_document().unwrap();
                write_fields(&mut child, fields);
            }
            Val::Array(nested) => {
                let mut child = writer.begin_array().unwrap();
                write_items(&mut child, nested);
            }
            Val::CodeWithScope(code, fields) => {
                let scope = build_by_writers(fields);
                writer
                    .push(CodeWithScopeRef {
                        code,
                        scope: &scope,
                    })
                    .unwrap();
            }
            scalar => writer.push(scalar.scalar().unwrap()).unwrap(),
        }
    }
}

fn arbitrary_val() -> impl Strategy<Value = Val> {
    let numeric = prop_oneof![
        any::<f64>()
            .prop_filter("finite doubles render as JSON", |f| f.is_finite())
            .prop_map(Val::Double),
        any::<bool>().prop_map(Val::Bool),
        any::<i32>().prop_map(Val::I32),
        any::<i64>().prop_map(Val::I64),
        any::<i64>().prop_map(Val::DateTime),
        any::<(u32, u32)>().prop_map(|(t, i)| Val::Timestamp(t, i)),
        Just(Val::Null),
        Just(Val::Undefined),
        Just(Val::MinKey),
        Just(Val::MaxKey),
    ];
    let stringy = prop_oneof![
        "[^\\x00]{0,16}".prop_map(Val::Str),
        any::<[u8; 12]>().prop_map(Val::Oid),
        ("[^\\x00]{0,8}", "[a-z]{0,4}").prop_map(|(p, o)| Val::Regex(p, o)),
        (any::<u8>(), prop::collection::vec(any::<u8>(), 0..16))
            .prop_map(|(subtype, bytes)| Val::Binary(subtype, bytes)),
        "[^\\x00]{0,16}".prop_map(Val::Code),
        "[^\\x00]{0,16}".prop_map(Val::Symbol),
    ];
    let leaf = prop_oneof![numeric, stringy];

    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(("[^\\x00]{0,12}", inner.clone()), 0..6).prop_map(Val::Doc),
            prop::collection::vec(inner.clone(), 0..6).prop_map(Val::Array),
            ("[^\\x00]{0,12}", prop::collection::vec(("[^\\x00]{0,8}", inner), 0..4))
                .prop_map(|(code, scope)| Val::CodeWithScope(code, scope)),
        ]
    })
}

fn arbitrary_fields() -> impl Strategy<Value = Vec<(String, Val)>> {
    prop::collection::vec(("[^\\x00]{0,12}", arbitrary_val()), 0..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn header_invariant_holds(fields in arbitrary_fields()) {
        let doc = build_by_value(&fields);
        let bytes = doc.as_bytes();
        prop_assert_eq!(
            u32::from_le_bytes(bytes[..4].try_into().unwrap()) as usize,
            bytes.len()
        );
        prop_assert_eq!(*bytes.last().unwrap(), 0u8);
    }

    #[test]
    fn writers_and_value_appends_agree(fields in arbitrary_fields()) {
        let by_value = build_by_value(&fields);
        let by_writers = build_by_writers(&fields);
        prop_assert_eq!(by_value.as_bytes(), by_writers.as_bytes());
    }

    #[test]
    fn parse_round_trips(fields in arbitrary_fields()) {
        let doc = build_by_value(&fields);
        let parsed = DocumentBuf::from_bytes(doc.as_bytes().to_vec()).unwrap();
        prop_assert_eq!(&parsed, &doc);
        prop_assert_eq!(parsed.count(), fields.len());
    }

    #[test]
    fn structurally_valid(fields in arbitrary_fields()) {
        let doc = build_by_value(&fields);
        prop_assert!(doc.validate(ValidateOptions::default()).is_ok());
        // everything appended through the safe API is valid UTF-8
        let utf8 = ValidateOptions {
            utf8: true,
            utf8_allow_null: true,
            ..Default::default()
        };
        prop_assert!(doc.validate(utf8).is_ok());
    }

    #[test]
    fn rendered_json_parses(fields in arbitrary_fields()) {
        let doc = build_by_value(&fields);
        let json = doc.as_json();
        let parsed: std::result::Result<serde_json::Value, _> = serde_json::from_str(&json);
        prop_assert!(parsed.is_ok(), "unparseable JSON: {}", json);
    }

    #[test]
    fn compare_agrees_with_byte_order(a in arbitrary_fields(), b in arbitrary_fields()) {
        let left = build_by_value(&a);
        let right = build_by_value(&b);
        let expected = left
            .as_bytes()
            .len()
            .cmp(&right.as_bytes().len())
            .then_with(|| left.as_bytes().cmp(right.as_bytes()));
        prop_assert_eq!(left.compare(&right), expected);
        prop_assert_eq!((left.compare(&right) == std::cmp::Ordering::Equal),
            left == right);
    }
}
