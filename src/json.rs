//! Rendering documents as MongoDB legacy extended JSON.

use std::fmt::Write;

use crate::{
    array::Array,
    base64,
    document::Document,
    iter::Element,
    oid::ObjectId,
    spec::BinarySubtype,
    value::Timestamp,
    visitor::Visitor,
};

pub(crate) fn document_to_json(doc: &Document) -> String {
    if doc.is_empty() {
        return "{}".to_string();
    }
    let mut out = String::from("{ ");
    let mut visitor = JsonVisitor {
        count: 0,
        keys: true,
        out: &mut out,
    };
    doc.visit_all(&mut visitor);
    out.push_str(" }");
    out
}

pub(crate) fn array_to_json(array: &Array) -> String {
    let doc = array.as_document();
    if doc.is_empty() {
        return "[]".to_string();
    }
    let mut out = String::from("[ ");
    let mut visitor = JsonVisitor {
        count: 0,
        keys: false,
        out: &mut out,
    };
    doc.visit_all(&mut visitor);
    out.push_str(" ]");
    out
}

struct JsonVisitor<'a> {
    count: u32,
    /// Whether element keys are emitted; disabled inside arrays.
    keys: bool,
    out: &'a mut String,
}

impl JsonVisitor<'_> {
    fn quoted(&mut self, bytes: &[u8]) {
        self.out.push('"');
        append_json_escaped(self.out, bytes);
        self.out.push('"');
    }
}

impl Visitor for JsonVisitor<'_> {
    fn visit_before(&mut self, element: &Element<'_>) -> bool {
        if self.count > 0 {
            self.out.push_str(", ");
        }
        if self.keys {
            self.quoted(element.key_bytes());
            self.out.push_str(" : ");
        }
        self.count += 1;
        false
    }

    fn visit_double(&mut self, value: f64) -> bool {
        let _ = write!(self.out, "{:.6}", value);
        false
    }

    fn visit_utf8(&mut self, value: &[u8]) -> bool {
        self.quoted(value);
        false
    }

    fn visit_document(&mut self, document: &Document) -> bool {
        let rendered = document_to_json(document);
        self.out.push_str(&rendered);
        false
    }

    fn visit_array(&mut self, array: &Array) -> bool {
        let rendered = array_to_json(array);
        self.out.push_str(&rendered);
        false
    }

    fn visit_binary(&mut self, subtype: BinarySubtype, bytes: &[u8]) -> bool {
        let _ = write!(self.out, "{{ \"$type\" : \"{:02x}\"", u8::from(subtype));
        self.out.push_str(", \"$binary\" : \"");
        self.out.push_str(&base64::encode(bytes));
        self.out.push_str("\" }");
        false
    }

    fn visit_undefined(&mut self) -> bool {
        self.out.push_str("{ \"$undefined\" : true }");
        false
    }

    fn visit_object_id(&mut self, oid: ObjectId) -> bool {
        self.out.push_str("{ \"$oid\" : \"");
        self.out.push_str(&oid.to_hex());
        self.out.push_str("\" }");
        false
    }

    fn visit_boolean(&mut self, value: bool) -> bool {
        self.out.push_str(if value { "true" } else { "false" });
        false
    }

    fn visit_date_time(&mut self, millis: i64) -> bool {
        let _ = write!(self.out, "{{ \"$date\" : {} }}", millis);
        false
    }

    fn visit_null(&mut self) -> bool {
        self.out.push_str("null");
        false
    }

    fn visit_regex(&mut self, pattern: &[u8], options: &[u8]) -> bool {
        self.out.push_str("{ \"$regex\" : ");
        self.quoted(pattern);
        self.out.push_str(", \"$options\" : ");
        self.quoted(options);
        self.out.push_str(" }");
        false
    }

    fn visit_db_pointer(&mut self, namespace: &[u8], id: ObjectId) -> bool {
        self.out.push_str("{ \"$ref\" : ");
        self.quoted(namespace);
        self.out.push_str(", \"$id\" : \"");
        self.out.push_str(&id.to_hex());
        self.out.push_str("\" }");
        false
    }

    fn visit_code(&mut self, code: &[u8]) -> bool {
        self.quoted(code);
        false
    }

    fn visit_symbol(&mut self, symbol: &[u8]) -> bool {
        self.quoted(symbol);
        false
    }

    fn visit_code_with_scope(&mut self, code: &[u8], _scope: &Document) -> bool {
        // the scope is not representable in legacy extended JSON
        self.quoted(code);
        false
    }

    fn visit_int32(&mut self, value: i32) -> bool {
        let _ = write!(self.out, "{}", value);
        false
    }

    fn visit_timestamp(&mut self, timestamp: Timestamp) -> bool {
        let _ = write!(
            self.out,
            "{{ \"$timestamp\" : {{ \"t\": {}, \"i\": {} }} }}",
            timestamp.time, timestamp.increment
        );
        false
    }

    fn visit_int64(&mut self, value: i64) -> bool {
        let _ = write!(self.out, "{}", value);
        false
    }

    fn visit_min_key(&mut self) -> bool {
        self.out.push_str("{ \"$minKey\" : 1 }");
        false
    }

    fn visit_max_key(&mut self) -> bool {
        self.out.push_str("{ \"$maxKey\" : 1 }");
        false
    }
}

/// Appends `bytes` with JSON escape sequences for control characters,
/// quotes, and backslashes, and `\uXXXX` sequences for all non-ASCII code
/// points, so the output is ASCII-safe. Invalid UTF-8 is rendered lossily.
fn append_json_escaped(out: &mut String, bytes: &[u8]) {
    for c in String::from_utf8_lossy(bytes).chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c if c.is_ascii() => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{:04x}", unit);
                }
            }
        }
    }
}
