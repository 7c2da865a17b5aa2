use std::fmt;

use crate::error::{Error, Result};

/// Flag bit on a type byte marking that a name precedes the payload.
pub const HAS_FIELD_NAME: u8 = 0x80;
const TYPE_MASK: u8 = 0x7F;

/// The closed set of value kinds a field can hold. Stored in the low bits of a type byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum FieldType {
    /// No value at all. The type of a default or missing field.
    None = 0x00,
    Null = 0x01,
    Object = 0x02,
    /// An object whose members all share one value type, stored once.
    UniformObject = 0x03,
    Array = 0x04,
    /// An array whose elements all share one type, stored once.
    UniformArray = 0x05,
    Binary = 0x06,
    String = 0x07,
    IntegerPositive = 0x08,
    /// Payload holds the magnitude minus one.
    IntegerNegative = 0x09,
    Float32 = 0x0a,
    Float64 = 0x0b,
    BoolFalse = 0x0c,
    BoolTrue = 0x0d,
    /// Hash of another compact binary document.
    ObjectAttachment = 0x0e,
    /// Hash of an opaque blob.
    BinaryAttachment = 0x0f,
    Hash = 0x10,
    Uuid = 0x11,
    DateTime = 0x12,
    TimeSpan = 0x13,
}

impl FieldType {
    /// Look up a kind by its code. The name flag must already be masked off.
    pub fn from_u8(n: u8) -> Option<FieldType> {
        use self::FieldType::*;
        Some(match n {
            0x00 => None,
            0x01 => Null,
            0x02 => Object,
            0x03 => UniformObject,
            0x04 => Array,
            0x05 => UniformArray,
            0x06 => Binary,
            0x07 => String,
            0x08 => IntegerPositive,
            0x09 => IntegerNegative,
            0x0a => Float32,
            0x0b => Float64,
            0x0c => BoolFalse,
            0x0d => BoolTrue,
            0x0e => ObjectAttachment,
            0x0f => BinaryAttachment,
            0x10 => Hash,
            0x11 => Uuid,
            0x12 => DateTime,
            0x13 => TimeSpan,
            _ => return Option::None,
        })
    }

    pub fn into_u8(self) -> u8 {
        self as u8
    }

    /// Attach a name flag, producing a full type byte.
    pub fn with_name(self) -> TypeByte {
        TypeByte::new(self, true)
    }

    pub fn is_object(self) -> bool {
        matches!(self, FieldType::Object | FieldType::UniformObject)
    }

    pub fn is_array(self) -> bool {
        matches!(self, FieldType::Array | FieldType::UniformArray)
    }

    /// True for the two container families, objects and arrays.
    pub fn has_fields(self) -> bool {
        self.is_object() || self.is_array()
    }

    pub fn is_uniform(self) -> bool {
        matches!(self, FieldType::UniformObject | FieldType::UniformArray)
    }

    pub fn is_integer(self) -> bool {
        matches!(self, FieldType::IntegerPositive | FieldType::IntegerNegative)
    }

    pub fn is_float(self) -> bool {
        matches!(self, FieldType::Float32 | FieldType::Float64)
    }

    pub fn is_bool(self) -> bool {
        matches!(self, FieldType::BoolFalse | FieldType::BoolTrue)
    }

    pub fn is_attachment(self) -> bool {
        matches!(self, FieldType::ObjectAttachment | FieldType::BinaryAttachment)
    }

    /// True for every kind whose payload is a 160-bit hash.
    pub fn is_hash(self) -> bool {
        self.is_attachment() || self == FieldType::Hash
    }

    /// DateTime and TimeSpan, whose payloads are tick counts.
    pub fn is_time(self) -> bool {
        matches!(self, FieldType::DateTime | FieldType::TimeSpan)
    }

    /// Payload width for kinds that don't carry their own length. `None` for kinds that do.
    pub fn fixed_payload_size(self) -> Option<usize> {
        use self::FieldType::*;
        match self {
            None | Null | BoolFalse | BoolTrue => Some(0),
            Float32 => Some(4),
            Float64 | DateTime | TimeSpan => Some(8),
            Uuid => Some(16),
            ObjectAttachment | BinaryAttachment | Hash => Some(20),
            Object | UniformObject | Array | UniformArray | Binary | String | IntegerPositive
            | IntegerNegative => Option::None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<FieldType> for u8 {
    fn from(val: FieldType) -> u8 {
        val.into_u8()
    }
}

/// A full type byte: a kind plus the independent "has name" flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeByte {
    kind: FieldType,
    has_name: bool,
}

impl TypeByte {
    pub fn new(kind: FieldType, has_name: bool) -> Self {
        Self { kind, has_name }
    }

    /// Split a raw byte into kind and flag, failing on codes outside the known set.
    pub fn from_u8(n: u8) -> Result<Self> {
        let kind = FieldType::from_u8(n & TYPE_MASK).ok_or(Error::BadType(n))?;
        Ok(Self {
            kind,
            has_name: (n & HAS_FIELD_NAME) != 0,
        })
    }

    pub fn into_u8(self) -> u8 {
        let flag = if self.has_name { HAS_FIELD_NAME } else { 0 };
        self.kind.into_u8() | flag
    }

    pub fn kind(self) -> FieldType {
        self.kind
    }

    pub fn has_name(self) -> bool {
        self.has_name
    }

    pub fn without_name(self) -> Self {
        Self {
            kind: self.kind,
            has_name: false,
        }
    }
}

impl From<FieldType> for TypeByte {
    fn from(kind: FieldType) -> Self {
        TypeByte::new(kind, false)
    }
}

impl From<TypeByte> for u8 {
    fn from(val: TypeByte) -> u8 {
        val.into_u8()
    }
}

impl TryFrom<u8> for TypeByte {
    type Error = Error;
    fn try_from(n: u8) -> Result<Self> {
        TypeByte::from_u8(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_roundtrips() {
        for n in 0u8..=0xff {
            match TypeByte::from_u8(n) {
                Ok(t) => {
                    assert_eq!(t.into_u8(), n);
                    assert_eq!(t.has_name(), n & 0x80 != 0);
                }
                Err(Error::BadType(v)) => {
                    assert_eq!(v, n);
                    assert!((n & 0x7f) > 0x13, "code {:#04x} should be known", n);
                }
                Err(e) => panic!("unexpected error {}", e),
            }
        }
    }

    #[test]
    fn families() {
        assert!(FieldType::UniformObject.is_object());
        assert!(FieldType::UniformArray.is_array());
        assert!(!FieldType::Binary.has_fields());
        assert!(FieldType::BinaryAttachment.is_hash());
        assert!(!FieldType::Uuid.is_hash());
        assert_eq!(FieldType::IntegerNegative as u8 & 1, 1);
        assert_eq!(FieldType::IntegerPositive as u8 & 1, 0);
        assert_eq!(FieldType::Hash.fixed_payload_size(), Some(20));
        assert_eq!(FieldType::String.fixed_payload_size(), None);
    }

    #[test]
    fn name_flag() {
        let t = FieldType::Object.with_name();
        assert_eq!(t.into_u8(), 0x82);
        assert_eq!(t.without_name(), TypeByte::from(FieldType::Object));
    }
}
