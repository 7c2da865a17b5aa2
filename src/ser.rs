//! Serialization.
//!
//! Any [`Serialize`] value can be encoded as a compact binary document with [`to_vec`]:
//!
//! - Structs become objects, with members in declaration order.
//! - Maps become objects, with members sorted by key so equal maps encode identically. Keys must
//!   serialize as strings.
//! - Sequences and tuples become arrays.
//! - `None` and unit become Null.
//! - Byte buffers (see `serde_bytes`) become Binary.
//! - A unit enum variant becomes its name as a string. Every other variant becomes an object with
//!   a single member, named for the variant.
//!
//! [`IoHash`][crate::IoHash], the attachment newtypes, [`DateTime`][crate::DateTime] and
//! [`TimeSpan`][crate::TimeSpan] encode as their own field kinds instead of as plain binary or
//! integers.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::ser::*;

use crate::{
    error::{Error, Result},
    field::Field,
    field_type::FieldType,
    hash::IO_HASH_BYTES,
    integer::Integer,
    writer::Writer,
    MAX_ARRAY_LEN, MAX_DEPTH,
};

pub(crate) const CB_HASH: &str = "$compact_binary::Hash";
pub(crate) const CB_OBJECT_ATTACHMENT: &str = "$compact_binary::ObjectAttachment";
pub(crate) const CB_BINARY_ATTACHMENT: &str = "$compact_binary::BinaryAttachment";
pub(crate) const CB_DATE_TIME: &str = "$compact_binary::DateTime";
pub(crate) const CB_TIME_SPAN: &str = "$compact_binary::TimeSpan";

/// The field kind a reserved newtype name stands for.
pub(crate) fn reserved_kind(name: &str) -> Option<FieldType> {
    match name {
        CB_HASH => Some(FieldType::Hash),
        CB_OBJECT_ATTACHMENT => Some(FieldType::ObjectAttachment),
        CB_BINARY_ATTACHMENT => Some(FieldType::BinaryAttachment),
        CB_DATE_TIME => Some(FieldType::DateTime),
        CB_TIME_SPAN => Some(FieldType::TimeSpan),
        _ => None,
    }
}

/// Encode `value` as a single compact binary field.
///
/// ```
/// # use compact_binary::{to_vec, Field};
/// #[derive(serde::Serialize)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let bytes = to_vec(&Point { x: 1, y: -2 }).unwrap();
/// let mut obj = Field::new(&bytes).unwrap().as_object();
/// assert_eq!(obj.find("y").as_int32(0), -2);
/// ```
pub fn to_vec<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut se = CbSerializer::default();
    value.serialize(&mut se)?;
    Ok(se.writer.to_vec())
}

#[derive(Default)]
struct CbSerializer {
    writer: Writer<'static>,
    /// Name for the next field written, set while inside an object.
    name: Option<Cow<'static, str>>,
    depth: usize,
}

impl CbSerializer {
    fn at_depth(depth: usize) -> Self {
        Self {
            depth,
            ..Self::default()
        }
    }

    fn write(&mut self, kind: FieldType, payload: &[u8]) -> Result<()> {
        let name = self.name.take();
        self.writer.write(name.as_deref(), kind, payload);
        Ok(())
    }

    fn write_sized(&mut self, kind: FieldType, data: &[u8]) -> Result<()> {
        let name = self.name.take();
        self.writer.write_sized(name.as_deref(), kind, data);
        Ok(())
    }

    fn write_int(&mut self, v: Integer) -> Result<()> {
        let name = self.name.take();
        self.writer.write_int(name.as_deref(), v);
        Ok(())
    }

    fn begin(&mut self, kind: FieldType) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(Error::ParseLimit(format!(
                "serialized value nests deeper than {} levels",
                MAX_DEPTH
            )));
        }
        let name = self.name.take();
        self.writer.begin_scope(name.as_deref(), kind, None);
        Ok(())
    }

    fn end(&mut self, kind: FieldType) {
        self.depth -= 1;
        if kind.is_object() {
            self.writer.end_object()
        } else {
            self.writer.end_array()
        }
    }

    /// Open the single-member object that wraps a non-unit enum variant.
    fn begin_variant(&mut self, variant: &'static str) -> Result<()> {
        self.begin(FieldType::Object)?;
        self.name = Some(Cow::Borrowed(variant));
        Ok(())
    }
}

impl<'a> Serializer for &'a mut CbSerializer {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = SeqSerializer<'a>;
    type SerializeTuple = SeqSerializer<'a>;
    type SerializeTupleStruct = SeqSerializer<'a>;
    type SerializeTupleVariant = SeqSerializer<'a>;
    type SerializeMap = MapSerializer<'a>;
    type SerializeStruct = StructSerializer<'a>;
    type SerializeStructVariant = StructSerializer<'a>;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_bool(self, v: bool) -> Result<()> {
        let kind = if v {
            FieldType::BoolTrue
        } else {
            FieldType::BoolFalse
        };
        self.write(kind, &[])
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.write_int(v.into())
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.write_int(v.into())
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.write_int(v.into())
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.write_int(v.into())
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.write_int(v.into())
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.write_int(v.into())
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.write_int(v.into())
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.write_int(v.into())
    }

    fn serialize_i128(self, v: i128) -> Result<()> {
        let v = Integer::try_from(v).map_err(|v| {
            Error::SerdeFail(format!("integer {} is outside -2^64..2^64", v))
        })?;
        self.write_int(v)
    }

    fn serialize_u128(self, v: u128) -> Result<()> {
        let v = u64::try_from(v).map_err(|_| {
            Error::SerdeFail(format!("integer {} is outside -2^64..2^64", v))
        })?;
        self.write_int(v.into())
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        let name = self.name.take();
        self.writer.write_f32(name.as_deref(), v);
        Ok(())
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        let name = self.name.take();
        self.writer.write_f64(name.as_deref(), v);
        Ok(())
    }

    fn serialize_char(self, v: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.serialize_str(v.encode_utf8(&mut buf))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.write_sized(FieldType::String, v.as_bytes())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.write_sized(FieldType::Binary, v)
    }

    fn serialize_none(self) -> Result<()> {
        self.write(FieldType::Null, &[])
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.write(FieldType::Null, &[])
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<()> {
        match reserved_kind(name) {
            Some(kind) => {
                let mut ext = ExtSerializer::new(kind);
                value.serialize(&mut ext)?;
                let payload = ext
                    .payload
                    .ok_or_else(|| Error::SerdeFail(format!("no value given for {}", kind)))?;
                self.write(kind, &payload)
            }
            None => value.serialize(self),
        }
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()> {
        self.begin_variant(variant)?;
        value.serialize(&mut *self)?;
        self.end(FieldType::Object);
        Ok(())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        self.begin(FieldType::Array)?;
        Ok(SeqSerializer::new(self, false))
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.begin_variant(variant)?;
        self.begin(FieldType::Array)?;
        Ok(SeqSerializer::new(self, true))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        self.begin(FieldType::Object)?;
        Ok(MapSerializer::new(self))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        self.begin(FieldType::Object)?;
        Ok(StructSerializer::new(self, false))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.begin_variant(variant)?;
        self.begin(FieldType::Object)?;
        Ok(StructSerializer::new(self, true))
    }
}

struct SeqSerializer<'a> {
    se: &'a mut CbSerializer,
    variant: bool,
    len: u64,
}

impl<'a> SeqSerializer<'a> {
    fn new(se: &'a mut CbSerializer, variant: bool) -> Self {
        Self {
            se,
            variant,
            len: 0,
        }
    }

    fn element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.len += 1;
        if self.len > MAX_ARRAY_LEN {
            return Err(Error::ParseLimit(format!(
                "serialized sequence is longer than {} elements",
                MAX_ARRAY_LEN
            )));
        }
        value.serialize(&mut *self.se)
    }

    fn end_inner(self) -> Result<()> {
        self.se.end(FieldType::Array);
        if self.variant {
            self.se.end(FieldType::Object);
        }
        Ok(())
    }
}

impl SerializeSeq for SeqSerializer<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.end_inner()
    }
}

impl SerializeTuple for SeqSerializer<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.end_inner()
    }
}

impl SerializeTupleStruct for SeqSerializer<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.end_inner()
    }
}

impl SerializeTupleVariant for SeqSerializer<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.end_inner()
    }
}

/// Map entries are encoded on their own and held until the end, so they can be written out in key
/// order.
struct MapSerializer<'a> {
    se: &'a mut CbSerializer,
    entries: BTreeMap<String, Vec<u8>>,
    pending_key: Option<String>,
}

impl<'a> MapSerializer<'a> {
    fn new(se: &'a mut CbSerializer) -> Self {
        Self {
            se,
            entries: BTreeMap::new(),
            pending_key: None,
        }
    }
}

impl SerializeMap for MapSerializer<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<()> {
        let mut new_key = String::new();
        key.serialize(KeySerializer::new(&mut new_key))?;
        if self.entries.contains_key(&new_key) {
            return Err(Error::SerdeFail(format!("map has repeated key {:?}", new_key)));
        }
        self.pending_key = Some(new_key);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| Error::SerdeFail("map value given without a key".to_string()))?;
        let mut entry = CbSerializer::at_depth(self.se.depth);
        value.serialize(&mut entry)?;
        self.entries.insert(key, entry.writer.to_vec());
        Ok(())
    }

    fn end(self) -> Result<()> {
        if let Some(key) = self.pending_key {
            return Err(Error::SerdeFail(format!("map key {:?} has no value", key)));
        }
        for (key, bytes) in self.entries.iter() {
            let field = Field::new(bytes)?;
            self.se.writer.write_field(key, &field);
        }
        self.se.end(FieldType::Object);
        Ok(())
    }
}

struct StructSerializer<'a> {
    se: &'a mut CbSerializer,
    variant: bool,
}

impl<'a> StructSerializer<'a> {
    fn new(se: &'a mut CbSerializer, variant: bool) -> Self {
        Self { se, variant }
    }

    fn member<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.se.name = Some(Cow::Borrowed(key));
        value.serialize(&mut *self.se)
    }

    fn end_inner(self) -> Result<()> {
        self.se.end(FieldType::Object);
        if self.variant {
            self.se.end(FieldType::Object);
        }
        Ok(())
    }
}

impl SerializeStruct for StructSerializer<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.member(key, value)
    }

    fn end(self) -> Result<()> {
        self.end_inner()
    }
}

impl SerializeStructVariant for StructSerializer<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.member(key, value)
    }

    fn end(self) -> Result<()> {
        self.end_inner()
    }
}

/// Catches the payload of a reserved newtype: 20 hash bytes, or an i64 tick count.
struct ExtSerializer {
    kind: FieldType,
    payload: Option<Vec<u8>>,
}

impl ExtSerializer {
    fn new(kind: FieldType) -> Self {
        Self {
            kind,
            payload: None,
        }
    }

    fn ser_fail(&self, received: &'static str) -> Error {
        let expected = if self.kind.is_time() { "i64" } else { "bytes" };
        Error::SerdeFail(format!(
            "expected {} for {}, received {}",
            expected, self.kind, received
        ))
    }
}

impl Serializer for &mut ExtSerializer {
    type Ok = ();
    type Error = Error;

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        if self.kind.is_time() || self.payload.is_some() {
            return Err(self.ser_fail("bytes"));
        }
        if v.len() != IO_HASH_BYTES {
            return Err(Error::SerdeFail(format!(
                "{} needs {} bytes, received {}",
                self.kind,
                IO_HASH_BYTES,
                v.len()
            )));
        }
        self.payload = Some(v.to_vec());
        Ok(())
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        if !self.kind.is_time() || self.payload.is_some() {
            return Err(self.ser_fail("i64"));
        }
        self.payload = Some(v.to_be_bytes().to_vec());
        Ok(())
    }

    type SerializeSeq = Impossible<(), Error>;
    type SerializeTuple = Impossible<(), Error>;
    type SerializeTupleStruct = Impossible<(), Error>;
    type SerializeTupleVariant = Impossible<(), Error>;
    type SerializeMap = Impossible<(), Error>;
    type SerializeStruct = Impossible<(), Error>;
    type SerializeStructVariant = Impossible<(), Error>;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_bool(self, _: bool) -> Result<()> {
        Err(self.ser_fail("bool"))
    }

    fn serialize_i8(self, _: i8) -> Result<()> {
        Err(self.ser_fail("i8"))
    }

    fn serialize_i16(self, _: i16) -> Result<()> {
        Err(self.ser_fail("i16"))
    }

    fn serialize_i32(self, _: i32) -> Result<()> {
        Err(self.ser_fail("i32"))
    }

    fn serialize_u8(self, _: u8) -> Result<()> {
        Err(self.ser_fail("u8"))
    }

    fn serialize_u16(self, _: u16) -> Result<()> {
        Err(self.ser_fail("u16"))
    }

    fn serialize_u32(self, _: u32) -> Result<()> {
        Err(self.ser_fail("u32"))
    }

    fn serialize_u64(self, _: u64) -> Result<()> {
        Err(self.ser_fail("u64"))
    }

    fn serialize_f32(self, _: f32) -> Result<()> {
        Err(self.ser_fail("f32"))
    }

    fn serialize_f64(self, _: f64) -> Result<()> {
        Err(self.ser_fail("f64"))
    }

    fn serialize_char(self, _: char) -> Result<()> {
        Err(self.ser_fail("char"))
    }

    fn serialize_str(self, _: &str) -> Result<()> {
        Err(self.ser_fail("str"))
    }

    fn serialize_none(self) -> Result<()> {
        Err(self.ser_fail("None"))
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _: &T) -> Result<()> {
        Err(self.ser_fail("Some"))
    }

    fn serialize_unit(self) -> Result<()> {
        Err(self.ser_fail("unit"))
    }

    fn serialize_unit_struct(self, _: &'static str) -> Result<()> {
        Err(self.ser_fail("unit_struct"))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<()> {
        Err(self.ser_fail("unit_variant"))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _v: &T,
    ) -> Result<()> {
        Err(self.ser_fail("newtype_struct"))
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()> {
        Err(self.ser_fail("newtype_variant"))
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(self.ser_fail("seq"))
    }

    fn serialize_tuple(self, _: usize) -> Result<Self::SerializeTuple> {
        Err(self.ser_fail("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(self.ser_fail("tuple_struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(self.ser_fail("tuple_variant"))
    }

    fn serialize_map(self, _: Option<usize>) -> Result<Self::SerializeMap> {
        Err(self.ser_fail("map"))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(self.ser_fail("struct"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(self.ser_fail("struct_variant"))
    }
}

/// Object member names. Only strings, chars, unit variants, and newtypes around those are
/// accepted.
struct KeySerializer<'a> {
    s: &'a mut String,
}

impl<'a> KeySerializer<'a> {
    fn new(s: &'a mut String) -> Self {
        s.clear();
        Self { s }
    }

    fn ser_fail(&self, received: &'static str) -> Error {
        Error::SerdeFail(format!("expected string key, received {}", received))
    }
}

impl Serializer for KeySerializer<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_char(self, v: char) -> Result<()> {
        self.s.push(v);
        Ok(())
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.s.push_str(v);
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.s.push_str(variant);
        Ok(())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        v: &T,
    ) -> Result<()> {
        v.serialize(self)
    }

    type SerializeSeq = Impossible<(), Error>;
    type SerializeTuple = Impossible<(), Error>;
    type SerializeTupleStruct = Impossible<(), Error>;
    type SerializeTupleVariant = Impossible<(), Error>;
    type SerializeMap = Impossible<(), Error>;
    type SerializeStruct = Impossible<(), Error>;
    type SerializeStructVariant = Impossible<(), Error>;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_bool(self, _: bool) -> Result<()> {
        Err(self.ser_fail("bool"))
    }

    fn serialize_i8(self, _: i8) -> Result<()> {
        Err(self.ser_fail("i8"))
    }

    fn serialize_i16(self, _: i16) -> Result<()> {
        Err(self.ser_fail("i16"))
    }

    fn serialize_i32(self, _: i32) -> Result<()> {
        Err(self.ser_fail("i32"))
    }

    fn serialize_i64(self, _: i64) -> Result<()> {
        Err(self.ser_fail("i64"))
    }

    fn serialize_u8(self, _: u8) -> Result<()> {
        Err(self.ser_fail("u8"))
    }

    fn serialize_u16(self, _: u16) -> Result<()> {
        Err(self.ser_fail("u16"))
    }

    fn serialize_u32(self, _: u32) -> Result<()> {
        Err(self.ser_fail("u32"))
    }

    fn serialize_u64(self, _: u64) -> Result<()> {
        Err(self.ser_fail("u64"))
    }

    fn serialize_f32(self, _: f32) -> Result<()> {
        Err(self.ser_fail("f32"))
    }

    fn serialize_f64(self, _: f64) -> Result<()> {
        Err(self.ser_fail("f64"))
    }

    fn serialize_bytes(self, _: &[u8]) -> Result<()> {
        Err(self.ser_fail("bytes"))
    }

    fn serialize_none(self) -> Result<()> {
        Err(self.ser_fail("None"))
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _: &T) -> Result<()> {
        Err(self.ser_fail("Some"))
    }

    fn serialize_unit(self) -> Result<()> {
        Err(self.ser_fail("unit"))
    }

    fn serialize_unit_struct(self, _: &'static str) -> Result<()> {
        Err(self.ser_fail("unit_struct"))
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()> {
        Err(self.ser_fail("newtype_variant"))
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(self.ser_fail("seq"))
    }

    fn serialize_tuple(self, _: usize) -> Result<Self::SerializeTuple> {
        Err(self.ser_fail("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(self.ser_fail("tuple_struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(self.ser_fail("tuple_variant"))
    }

    fn serialize_map(self, _: Option<usize>) -> Result<Self::SerializeMap> {
        Err(self.ser_fail("map"))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(self.ser_fail("struct"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(self.ser_fail("struct_variant"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde::Serialize;

    use super::*;
    use crate::{BinaryAttachment, DateTime, IoHash, TimeSpan};

    #[derive(Serialize)]
    struct Widget<'a> {
        name: &'a str,
        count: u32,
        offset: i16,
        ratio: f32,
        tags: Vec<&'a str>,
        missing: Option<u8>,
        #[serde(with = "serde_bytes")]
        data: Vec<u8>,
    }

    #[derive(Serialize)]
    enum Shape {
        Empty,
        Circle(f64),
        Line(u8, u8),
        Rect { w: u8, h: u8 },
    }

    #[test]
    fn scalars() {
        let cases: Vec<(Vec<u8>, Vec<u8>)> = vec![
            (to_vec(&()).unwrap(), vec![0x01]),
            (to_vec(&true).unwrap(), vec![0x0d]),
            (to_vec(&false).unwrap(), vec![0x0c]),
            (to_vec(&1u8).unwrap(), vec![0x08, 0x01]),
            (to_vec(&-1i64).unwrap(), vec![0x09, 0x00]),
            (to_vec(&300u16).unwrap(), vec![0x08, 0x81, 0x2c]),
            (to_vec(&'x').unwrap(), vec![0x07, 0x01, b'x']),
            (to_vec("hi").unwrap(), vec![0x07, 0x02, b'h', b'i']),
            (to_vec(&Option::<u8>::None).unwrap(), vec![0x01]),
            (to_vec(&Some(0u8)).unwrap(), vec![0x08, 0x00]),
            (to_vec(&1.5f32).unwrap(), vec![0x0a, 0x3f, 0xc0, 0x00, 0x00]),
            (
                to_vec(serde_bytes::Bytes::new(&[1, 2])).unwrap(),
                vec![0x06, 0x02, 0x01, 0x02],
            ),
        ];
        for (index, (actual, expected)) in cases.iter().enumerate() {
            println!("Test #{}", index);
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn struct_in_declaration_order() {
        let widget = Widget {
            name: "w",
            count: 3,
            offset: -4,
            ratio: 0.5,
            tags: vec!["a", "b"],
            missing: None,
            data: vec![9],
        };
        let bytes = to_vec(&widget).unwrap();
        let obj = Field::new(&bytes).unwrap().as_object();
        let names: Vec<&str> = obj.iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            ["name", "count", "offset", "ratio", "tags", "missing", "data"]
        );
        assert_eq!(obj.find("name").as_string(""), "w");
        assert_eq!(obj.find("count").as_uint32(0), 3);
        assert_eq!(obj.find("offset").as_int16(0), -4);
        assert_eq!(obj.find("ratio").as_float32(0.0), 0.5);
        let tags: Vec<&str> = obj
            .find("tags")
            .as_array()
            .iter()
            .map(|mut f| f.as_string(""))
            .collect();
        assert_eq!(tags, ["a", "b"]);
        assert!(obj.find("missing").is_null());
        assert_eq!(obj.find("data").as_binary(&[]), [9]);
    }

    #[test]
    fn maps_are_sorted() {
        let mut map = HashMap::new();
        for key in ["delta", "alpha", "charlie", "bravo"] {
            map.insert(key.to_string(), key.len());
        }
        let bytes = to_vec(&map).unwrap();
        let obj = Field::new(&bytes).unwrap().as_object();
        let names: Vec<&str> = obj.iter().map(|f| f.name()).collect();
        assert_eq!(names, ["alpha", "bravo", "charlie", "delta"]);
        assert_eq!(obj.find("charlie").as_uint64(0), 7);

        let ordered: BTreeMap<&str, usize> =
            map.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(to_vec(&ordered).unwrap(), bytes);
    }

    #[test]
    fn non_string_keys_fail() {
        let mut map = HashMap::new();
        map.insert(1u8, 2u8);
        assert!(matches!(to_vec(&map), Err(Error::SerdeFail(_))));
    }

    #[test]
    fn enums() {
        let bytes = to_vec(&Shape::Empty).unwrap();
        assert_eq!(bytes, [0x07, 0x05, b'E', b'm', b'p', b't', b'y']);

        let bytes = to_vec(&Shape::Circle(1.0)).unwrap();
        let obj = Field::new(&bytes).unwrap().as_object();
        assert_eq!(obj.iter().count(), 1);
        assert_eq!(obj.find("Circle").as_float64(0.0), 1.0);

        let bytes = to_vec(&Shape::Line(1, 2)).unwrap();
        let obj = Field::new(&bytes).unwrap().as_object();
        let line: Vec<u8> = obj
            .find("Line")
            .as_array()
            .iter()
            .map(|mut f| f.as_uint8(0))
            .collect();
        assert_eq!(line, [1, 2]);

        let bytes = to_vec(&Shape::Rect { w: 3, h: 4 }).unwrap();
        let obj = Field::new(&bytes).unwrap().as_object();
        let mut rect = obj.find("Rect");
        assert!(rect.is_object());
        assert_eq!(rect.as_object().find("h").as_uint8(0), 4);
    }

    #[test]
    fn native_kinds() {
        #[derive(Serialize)]
        struct Record {
            hash: IoHash,
            blob: BinaryAttachment,
            at: DateTime,
            took: TimeSpan,
        }
        let hash = IoHash::compute(b"record");
        let record = Record {
            hash,
            blob: BinaryAttachment(hash),
            at: DateTime::from_ticks(1234),
            took: TimeSpan::from_ticks(-5),
        };
        let bytes = to_vec(&record).unwrap();
        let obj = Field::new(&bytes).unwrap().as_object();
        let kinds: Vec<FieldType> = obj.iter().map(|f| f.kind()).collect();
        assert_eq!(
            kinds,
            [
                FieldType::Hash,
                FieldType::BinaryAttachment,
                FieldType::DateTime,
                FieldType::TimeSpan
            ]
        );
        assert_eq!(obj.find("hash").as_hash(IoHash::ZERO), hash);
        assert_eq!(obj.find("blob").as_attachment(IoHash::ZERO), hash);
        assert_eq!(obj.find("at").as_date_time_ticks(0), 1234);
        assert_eq!(obj.find("took").as_time_span_ticks(0), -5);
    }

    #[test]
    fn too_long() {
        let units = vec![(); MAX_ARRAY_LEN as usize + 1];
        assert!(matches!(to_vec(&units), Err(Error::ParseLimit(_))));
        let bytes = to_vec(&vec![(); 3]).unwrap();
        assert_eq!(bytes, [0x04, 0x04, 0x03, 0x01, 0x01, 0x01]);
    }

    #[derive(Serialize)]
    #[serde(untagged)]
    enum Nested {
        Leaf,
        Node(Vec<Nested>),
    }

    #[test]
    fn too_deep() {
        let mut value = Nested::Leaf;
        for _ in 0..MAX_DEPTH {
            value = Nested::Node(vec![value]);
        }
        assert!(to_vec(&value).is_ok());
        let value = Nested::Node(vec![value]);
        assert!(matches!(to_vec(&value), Err(Error::ParseLimit(_))));
    }
}
