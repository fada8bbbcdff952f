//! Key strings for BSON elements.
//!
//! Element keys (and regular-expression halves) are stored on the wire as
//! NUL-terminated strings, so they must not contain an interior NUL byte.
//! [`CStr`] and [`CString`] enforce that at the type level; the
//! [`cstr!`](crate::cstr!) macro checks string literals at compile time.

use crate::{
    error::{Error, Result},
    utf8,
};

/// A borrowed document key: UTF-8 text with no interior NUL byte.
///
/// `CStr` is to [`CString`] as [`prim@str`] is to [`String`]. The wire
/// format's trailing NUL is not part of the buffer; the encoder writes it.
/// Construct one at compile time with [`cstr!`](crate::cstr!) or at run
/// time via [`TryFrom`]:
///
/// ```
/// use bsonbuf::CStr;
///
/// let key: &CStr = "title".try_into()?;
/// assert_eq!(key.as_str(), "title");
/// assert!(<&CStr>::try_from("ti\0tle").is_err());
/// # Ok::<(), bsonbuf::Error>(())
/// ```
#[derive(Debug)]
#[repr(transparent)]
pub struct CStr(str);

impl CStr {
    const fn borrowed(text: &str) -> &CStr {
        // Safety: CStr is a transparent wrapper over str.
        unsafe { &*(text as *const str as *const CStr) }
    }

    /// View the key as a Rust `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The length of the key in bytes, excluding the wire terminator.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl<'a> TryFrom<&'a str> for &'a CStr {
    type Error = Error;

    fn try_from(text: &'a str) -> Result<&'a CStr> {
        if utf8::contains_nul(text.as_bytes()) {
            return Err(Error::malformed_bytes(format!(
                "key contains an interior NUL: {:?}",
                text
            )));
        }
        Ok(CStr::borrowed(text))
    }
}

impl PartialEq for CStr {
    fn eq(&self, other: &CStr) -> bool {
        self.0 == other.0
    }
}

impl Eq for CStr {}

impl std::fmt::Display for CStr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<CStr> for CStr {
    fn as_ref(&self) -> &CStr {
        self
    }
}

impl AsRef<str> for CStr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::ToOwned for CStr {
    type Owned = CString;

    fn to_owned(&self) -> Self::Owned {
        CString(self.0.to_string())
    }
}

/// Checks a key literal in const context; a literal with an interior NUL
/// fails the build when the surrounding `const` is evaluated.
#[doc(hidden)]
pub const fn checked_literal(text: &str) -> &CStr {
    if utf8::contains_nul(text.as_bytes()) {
        panic!("key literal contains an interior NUL byte");
    }
    CStr::borrowed(text)
}

/// Construct a `&'static CStr` from a string literal, rejecting interior
/// NUL bytes at compile time.
/// ```
/// # use bsonbuf::{CStr, cstr};
/// let key: &CStr = cstr!("hello");
/// ```
/// ```compile_fail
/// # use bsonbuf::{CStr, cstr};
/// // A literal with an interior NUL will not compile:
/// let key: &CStr = cstr!("hel\0lo");
/// ```
#[macro_export]
macro_rules! cstr {
    ($text:literal) => {{
        const KEY: &$crate::CStr = $crate::cstr::checked_literal($text);
        KEY
    }};
}

/// An owned document key: UTF-8 text with no interior NUL byte.
///
/// Obtained from a [`CStr`] via [`ToOwned`]/[`Into`] or checked from a
/// [`String`] or [`prim@str`] via [`TryFrom`].
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CString(String);

impl CString {
    pub(crate) fn from_string_unchecked(text: String) -> Self {
        Self(text)
    }

    /// View the key as a `&CStr`.
    pub fn as_cstr(&self) -> &CStr {
        CStr::borrowed(&self.0)
    }

    /// Consume `self` to return the underlying `String`.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for CString {
    type Error = Error;

    fn try_from(text: String) -> Result<Self> {
        if utf8::contains_nul(text.as_bytes()) {
            return Err(Error::malformed_bytes(format!(
                "key contains an interior NUL: {:?}",
                text
            )));
        }
        Ok(Self(text))
    }
}

impl TryFrom<&str> for CString {
    type Error = Error;

    fn try_from(text: &str) -> Result<Self> {
        let key: &CStr = text.try_into()?;
        Ok(key.to_owned())
    }
}

impl From<&CStr> for CString {
    fn from(key: &CStr) -> Self {
        key.to_owned()
    }
}

impl std::ops::Deref for CString {
    type Target = CStr;

    fn deref(&self) -> &Self::Target {
        self.as_cstr()
    }
}

impl AsRef<CStr> for CString {
    fn as_ref(&self) -> &CStr {
        self.as_cstr()
    }
}

impl std::borrow::Borrow<CStr> for CString {
    fn borrow(&self) -> &CStr {
        self.as_cstr()
    }
}

impl std::fmt::Display for CString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
