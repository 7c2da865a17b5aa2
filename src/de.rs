//! Deserialization.
//!
//! The reverse of [`to_vec`][crate::to_vec]. Strings and byte buffers are borrowed from the input,
//! so `&str` and `&[u8]` members can be deserialized without copying.
//!
//! Hash and attachment fields are handed to visitors as 20-byte buffers, Uuid fields as 16 bytes
//! in RFC 4122 order, and DateTime and TimeSpan fields as `i64` tick counts.

use serde::de::value::BorrowedStrDeserializer;
use serde::de::Error as DeError;
use serde::de::*;

use crate::{
    error::{Error, Result},
    field::Field,
    field_type::FieldType,
    iter::FieldIter,
    ser::reserved_kind,
    value::Value,
};

/// Decode a `T` from a buffer holding exactly one field.
///
/// ```
/// # use compact_binary::{from_slice, to_vec};
/// #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
/// struct Point<'a> {
///     label: &'a str,
///     x: i32,
/// }
///
/// let bytes = to_vec(&Point { label: "origin", x: 0 }).unwrap();
/// let point: Point = from_slice(&bytes).unwrap();
/// assert_eq!(point, Point { label: "origin", x: 0 });
/// ```
pub fn from_slice<'de, T: Deserialize<'de>>(data: &'de [u8]) -> Result<T> {
    let field = Field::new(data)?;
    if field.size() != data.len() {
        return Err(Error::BadEncode(format!(
            "{} trailing bytes after field",
            data.len() - field.size()
        )));
    }
    from_field(field)
}

/// Decode a `T` from an already parsed field. The field's own name is ignored.
pub fn from_field<'de, T: Deserialize<'de>>(field: Field<'de>) -> Result<T> {
    T::deserialize(FieldDeserializer::new(field))
}

fn unexpected<'a>(value: &'a Value) -> Unexpected<'a> {
    match *value {
        Value::None | Value::Null => Unexpected::Unit,
        Value::Object(_) => Unexpected::Map,
        Value::Array(_) => Unexpected::Seq,
        Value::Binary(v) => Unexpected::Bytes(v),
        Value::String(v) => Unexpected::Str(v),
        Value::Integer(v) => match (v.as_u64(), v.as_i64()) {
            (Some(v), _) => Unexpected::Unsigned(v),
            (None, Some(v)) => Unexpected::Signed(v),
            (None, None) => Unexpected::Other("integer below i64::MIN"),
        },
        Value::Float32(v) => Unexpected::Float(v as f64),
        Value::Float64(v) => Unexpected::Float(v),
        Value::Bool(v) => Unexpected::Bool(v),
        Value::ObjectAttachment(_) => Unexpected::Other("object attachment"),
        Value::BinaryAttachment(_) => Unexpected::Other("binary attachment"),
        Value::Hash(_) => Unexpected::Other("hash"),
        Value::Uuid(_) => Unexpected::Other("uuid"),
        Value::DateTime(_) => Unexpected::Other("date time"),
        Value::TimeSpan(_) => Unexpected::Other("time span"),
    }
}

struct FieldDeserializer<'de> {
    field: Field<'de>,
}

impl<'de> FieldDeserializer<'de> {
    fn new(field: Field<'de>) -> Self {
        Self { field }
    }
}

impl<'de> Deserializer<'de> for FieldDeserializer<'de> {
    type Error = Error;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.field.value() {
            Value::None | Value::Null => visitor.visit_unit(),
            Value::Bool(v) => visitor.visit_bool(v),
            // Values below i64::MIN only fit an i128, and other visitors reject them.
            Value::Integer(v) => match (v.as_u64(), v.as_i64()) {
                (Some(v), _) => visitor.visit_u64(v),
                (None, Some(v)) => visitor.visit_i64(v),
                (None, None) => visitor.visit_i128(v.into()),
            },
            Value::Float32(v) => visitor.visit_f32(v),
            Value::Float64(v) => visitor.visit_f64(v),
            Value::String(v) => visitor.visit_borrowed_str(v),
            Value::Binary(v) => visitor.visit_borrowed_bytes(v),
            Value::Object(v) => visitor.visit_map(MapAccess::new(v.iter())),
            Value::Array(v) => visitor.visit_seq(SeqAccess::new(v.iter())),
            Value::Hash(_) | Value::ObjectAttachment(_) | Value::BinaryAttachment(_) => {
                visitor.visit_borrowed_bytes(self.field.payload())
            }
            Value::Uuid(v) => visitor.visit_bytes(v.as_bytes()),
            Value::DateTime(v) => visitor.visit_i64(v.ticks()),
            Value::TimeSpan(v) => visitor.visit_i64(v.ticks()),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.field.kind() {
            FieldType::None | FieldType::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        let Some(expected) = reserved_kind(name) else {
            return visitor.visit_newtype_struct(self);
        };
        let actual = self.field.kind();
        // A plain hash can be read out of either attachment kind.
        let fits = actual == expected || (expected == FieldType::Hash && actual.is_hash());
        if !fits {
            let value = self.field.value();
            let what = format!("{} field", expected);
            return Err(Error::invalid_type(unexpected(&value), &what.as_str()));
        }
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self.field.value() {
            Value::String(variant) => visitor.visit_enum(EnumAccess::new(variant, None)),
            Value::Object(obj) => {
                let mut members = obj.iter();
                let (Some(member), None) = (members.next(), members.next()) else {
                    return Err(Error::invalid_length(
                        obj.iter().count(),
                        &"object with a single member",
                    ));
                };
                visitor.visit_enum(EnumAccess::new(member.name(), Some(member)))
            }
            value => Err(Error::invalid_type(
                unexpected(&value),
                &"string or single-member object",
            )),
        }
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str
        string bytes byte_buf unit unit_struct
        seq tuple tuple_struct map struct identifier ignored_any
    }
}

struct SeqAccess<'de> {
    iter: FieldIter<'de>,
}

impl<'de> SeqAccess<'de> {
    fn new(iter: FieldIter<'de>) -> Self {
        Self { iter }
    }
}

impl<'de> serde::de::SeqAccess<'de> for SeqAccess<'de> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        match self.iter.next() {
            Some(field) => seed.deserialize(FieldDeserializer::new(field)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        self.iter.remaining().map(|n| n as usize)
    }
}

struct MapAccess<'de> {
    iter: FieldIter<'de>,
    value: Option<Field<'de>>,
}

impl<'de> MapAccess<'de> {
    fn new(iter: FieldIter<'de>) -> Self {
        Self { iter, value: None }
    }
}

impl<'de> serde::de::MapAccess<'de> for MapAccess<'de> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        let Some(field) = self.iter.next() else {
            return Ok(None);
        };
        self.value = Some(field);
        seed.deserialize(BorrowedStrDeserializer::new(field.name()))
            .map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let field = self
            .value
            .take()
            .ok_or_else(|| Error::SerdeFail("map value requested before its key".to_string()))?;
        seed.deserialize(FieldDeserializer::new(field))
    }

    fn size_hint(&self) -> Option<usize> {
        self.iter.remaining().map(|n| n as usize)
    }
}

struct EnumAccess<'de> {
    variant: &'de str,
    value: Option<Field<'de>>,
}

impl<'de> EnumAccess<'de> {
    fn new(variant: &'de str, value: Option<Field<'de>>) -> Self {
        Self { variant, value }
    }
}

impl<'de> serde::de::EnumAccess<'de> for EnumAccess<'de> {
    type Error = Error;
    type Variant = VariantAccess<'de>;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self::Variant)> {
        let variant = seed.deserialize(BorrowedStrDeserializer::new(self.variant))?;
        Ok((variant, VariantAccess { value: self.value }))
    }
}

struct VariantAccess<'de> {
    value: Option<Field<'de>>,
}

impl<'de> VariantAccess<'de> {
    fn content(self, expected: &'static str) -> Result<FieldDeserializer<'de>> {
        self.value
            .map(FieldDeserializer::new)
            .ok_or_else(|| Error::invalid_type(Unexpected::UnitVariant, &expected))
    }
}

impl<'de> serde::de::VariantAccess<'de> for VariantAccess<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            None => Ok(()),
            Some(field) if field.is_null() => Ok(()),
            Some(field) => Err(Error::invalid_type(
                unexpected(&field.value()),
                &"unit variant",
            )),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(self.content("newtype variant")?)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.content("tuple variant")?.deserialize_seq(visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.content("struct variant")?.deserialize_map(visitor)
    }
}
