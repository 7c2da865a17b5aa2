//! compact-binary is a self-describing binary format for structured documents. Every value is a
//! field: a type byte, an optional name, and a payload whose size can always be found without
//! decoding it. Documents can be read in place without copying, and identical documents always
//! encode to identical bytes, so a document can be named by its hash.
//!
//! The format provides:
//!
//! - Objects (named members) and arrays (unnamed elements), each with a "uniform" encoding that
//!   stores one shared type byte instead of one per member
//! - Integers in a variable-length encoding, 32- and 64-bit floats, strings, and binary
//! - Hashes, UUIDs, date-times, and time spans as value types
//! - Object and binary attachments: references, by hash, to other documents and to opaque blobs
//!
//! Reading starts from [`Field::new`], which validates the whole document once, so every accessor
//! after that is infallible. Typed accessors take a default and record a [`FieldError`] when the
//! stored value doesn't fit:
//!
//! ```
//! # use compact_binary::{Field, FieldError, Writer};
//! let mut writer = Writer::new();
//! writer.begin_object_value();
//! writer.write_integer("small", 200);
//! writer.write_string("text", "hello");
//! writer.end_object();
//! let bytes = writer.to_vec();
//!
//! let obj = Field::new(&bytes).unwrap().as_object();
//! let mut small = obj.find("small");
//! assert_eq!(small.as_uint8(0), 200);
//! assert_eq!(small.as_int8(0), 0);
//! assert_eq!(small.error(), FieldError::RangeError);
//! assert_eq!(obj.find("text").as_string(""), "hello");
//! ```
//!
//! Documents are built with a [`Writer`], or from any serde value with [`to_vec`].

mod array;
mod attachments;
mod de;
mod error;
mod field;
mod field_type;
mod hash;
mod integer;
mod iter;
mod object;
pub mod references;
mod ser;
mod time;
mod value;
pub mod varint;
mod writer;

pub use array::Array;
pub use attachments::{collect_attachments, AttachmentCounts};
pub use de::{from_field, from_slice};
pub use error::{Error, FieldError, Result};
pub use field::{Field, FieldBuf};
pub use field_type::{FieldType, TypeByte, HAS_FIELD_NAME};
pub use hash::{
    BinaryAttachment, Blake3Hash, IoHash, IoHashState, ObjectAttachment, BLAKE3_HASH_BYTES,
    IO_HASH_BYTES,
};
pub use integer::Integer;
pub use iter::FieldIter;
pub use object::Object;
pub use references::{BlobStore, MemoryBlobStore, ReferenceResolver, References};
pub use ser::to_vec;
pub use time::{DateTime, TimeSpan};
pub use value::Value;
pub use writer::Writer;

/// The maximum nesting depth of objects and arrays. Parsing a deeper document fails with
/// [`Error::ParseLimit`], as does serializing a value that would produce one.
pub const MAX_DEPTH: usize = 256;

/// The most elements an array may hold. Parsing a longer one fails with [`Error::ParseLimit`], as
/// does serializing one, and [`Writer`] panics when asked to close one.
pub const MAX_ARRAY_LEN: u64 = 1 << 24;

/// The longest string [`Field::as_string`] will return. Longer strings are reported as a
/// [`FieldError::RangeError`].
pub const MAX_STRING_LEN: u64 = (1 << 31) - 1;
