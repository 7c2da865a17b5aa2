use std::fmt;

use serde::{de, ser};
use thiserror::Error;

use crate::{field_type::FieldType, hash::IoHash};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Occurs when a field, name, or payload runs past the end of the buffer it was read from.
    #[error("Expected data length {expected}, but got {actual} on step [{step}]")]
    LengthTooShort {
        step: &'static str,
        actual: usize,
        expected: usize,
    },
    /// Occurs when a type byte doesn't name any known field kind.
    #[error("Unrecognized field type byte {0:#04x}")]
    BadType(u8),
    /// Basic compact binary encoding failure
    #[error("Basic data encoding failure: {0}")]
    BadEncode(String),
    /// Nesting went deeper than [`MAX_DEPTH`][crate::MAX_DEPTH].
    #[error("Hit parsing limit: {0}")]
    ParseLimit(String),
    /// Occurs when serde serialization or deserialization fails
    #[error("{0}")]
    SerdeFail(String),
    /// A typed view (object, array) was requested over a field of some other kind.
    #[error("Expected {expected} field, found {actual:?}")]
    UnexpectedType {
        expected: &'static str,
        actual: FieldType,
    },
    /// A document references attachments the blob store doesn't have.
    #[error("Missing {} referenced attachment(s)", .0.len())]
    MissingReferences(Vec<IoHash>),
    /// Failure reported by a [`BlobStore`][crate::references::BlobStore] implementation.
    #[error("Blob store failure")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::SerdeFail(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::SerdeFail(msg.to_string())
    }
}

/// The outcome of the last typed accessor called on a [`Field`][crate::Field].
///
/// Accessors never fail outright. They hand back the caller's default and record why here, so a
/// caller can make several best-effort reads and check once at the end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FieldError {
    /// The last access succeeded.
    #[default]
    None,
    /// The field's kind can't produce the requested type at all.
    TypeError,
    /// The kind fits, but the stored value doesn't fit the requested width or precision.
    RangeError,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldError::None => f.write_str("no error"),
            FieldError::TypeError => f.write_str("field type mismatch"),
            FieldError::RangeError => f.write_str("field value out of range"),
        }
    }
}
