//! Error types for the `bsonbuf` crate.

use thiserror::Error;

/// The result type for all fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error produced while building or reading a BSON document.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,

    /// An optional message describing the error.
    pub message: Option<String>,

    /// The document key associated with the error, if any.
    pub key: Option<String>,

    /// The byte offset of the element associated with the error, if any.
    pub offset: Option<usize>,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BSON error")?;

        if let Some(key) = self.key.as_deref() {
            write!(f, " at key \"{key}\"")?;
        }
        if let Some(offset) = self.offset {
            write!(f, " at byte offset {offset}")?;
        }

        write!(f, ". Kind: {}", self.kind)?;
        if let Some(ref message) = self.message {
            write!(f, ". Message: {}", message)?;
        }

        write!(f, ".")
    }
}

/// The types of errors that can occur in the `bsonbuf` crate.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed BSON bytes were encountered.
    #[error("Malformed BSON bytes")]
    #[non_exhaustive]
    MalformedBytes {},

    /// Invalid UTF-8 bytes were encountered.
    #[error("Invalid UTF-8")]
    #[non_exhaustive]
    Utf8Encoding {},

    /// A value was present but did not have the expected type.
    #[error("Unexpected element type")]
    #[non_exhaustive]
    UnexpectedType {},

    /// The document would exceed the maximum encodable size.
    #[error("Document too large")]
    #[non_exhaustive]
    SizeOverflow {},

    /// An error related to the [`ObjectId`](crate::oid::ObjectId) type occurred.
    #[error("An ObjectId-related error occurred")]
    #[non_exhaustive]
    ObjectId {},
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            key: None,
            offset: None,
        }
    }
}

impl Error {
    pub(crate) fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub(crate) fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub(crate) fn with_message(mut self, message: impl ToString) -> Self {
        self.message = Some(message.to_string());
        self
    }

    pub(crate) fn malformed_bytes(message: impl ToString) -> Self {
        Self::from(ErrorKind::MalformedBytes {}).with_message(message)
    }

    pub(crate) fn utf8_encoding(message: impl ToString) -> Self {
        Self::from(ErrorKind::Utf8Encoding {}).with_message(message)
    }

    pub(crate) fn unexpected_type(message: impl ToString) -> Self {
        Self::from(ErrorKind::UnexpectedType {}).with_message(message)
    }

    pub(crate) fn size_overflow(len: usize) -> Self {
        Self::from(ErrorKind::SizeOverflow {})
            .with_message(format!("document would be {} bytes", len))
    }

    pub(crate) fn oid(message: impl ToString) -> Self {
        Self::from(ErrorKind::ObjectId {}).with_message(message)
    }

    /// Whether this error was caused by malformed bytes.
    pub fn is_malformed_bytes(&self) -> bool {
        matches!(self.kind, ErrorKind::MalformedBytes { .. })
    }
}
