//! The basic unit of a compact binary document.
//!
//! A field is an optional name plus a typed value. It is a borrowed view over the caller's bytes:
//! the buffer must outlive every [`Field`], [`Object`], and [`Array`] handed out for it, and an
//! owned copy is obtained with [`Field::copy_to`] or [`FieldBuf`].
//!
//! Construction validates the whole tree under the field, so nothing downstream can fail on
//! malformed input. Typed accessors never fail outright: they take a default, return it when the
//! stored value doesn't fit, and record the reason as the field's [`FieldError`].

use std::fmt;

use byteorder::{BigEndian, ByteOrder};
use tracing::debug;
use uuid::Uuid;

use crate::{
    array::Array,
    error::{Error, FieldError, Result},
    field_type::{FieldType, TypeByte},
    hash::{Blake3Hash, IoHash},
    integer::Integer,
    iter::{open_container, FieldIter},
    object::Object,
    time::{DateTime, TimeSpan},
    value::Value,
    varint, MAX_ARRAY_LEN, MAX_DEPTH, MAX_STRING_LEN,
};

/// A typed, optionally named value borrowed from an encoded buffer.
#[derive(Clone, Copy)]
pub struct Field<'a> {
    type_byte: TypeByte,
    /// The type byte is the first byte of `view`.
    embedded: bool,
    /// Exact source bytes of the field.
    view: &'a [u8],
    name: &'a str,
    payload: &'a [u8],
    error: FieldError,
}

impl Default for Field<'_> {
    /// The valueless field: no name, kind None, no payload.
    fn default() -> Self {
        Field {
            type_byte: TypeByte::from(FieldType::None),
            embedded: false,
            view: &[],
            name: "",
            payload: &[],
            error: FieldError::None,
        }
    }
}

/// Split one field off the front of `data`, returning it and the bytes after it.
///
/// `ty` supplies the type byte when it isn't stored in `data`. Only the field's own extent is
/// checked here; nested members are left to [`Field::validate`].
pub(crate) fn split_field(ty: Option<TypeByte>, data: &[u8]) -> Result<(Field<'_>, &[u8])> {
    let mut rest = data;
    let (type_byte, embedded) = match ty {
        Some(ty) => (ty, false),
        None => {
            let (&first, tail) = rest.split_first().ok_or(Error::LengthTooShort {
                step: "read type byte",
                actual: 0,
                expected: 1,
            })?;
            rest = tail;
            (TypeByte::from_u8(first)?, true)
        }
    };

    let name = if type_byte.has_name() {
        let len = read_len(&mut rest, "read field name")?;
        let (name, tail) = rest.split_at(len);
        rest = tail;
        std::str::from_utf8(name)
            .map_err(|_| Error::BadEncode("field name is not valid UTF-8".into()))?
    } else {
        ""
    };

    let payload_len = payload_size(type_byte.kind(), rest)?;
    if rest.len() < payload_len {
        return Err(Error::LengthTooShort {
            step: "read field payload",
            actual: rest.len(),
            expected: payload_len,
        });
    }
    let (payload, rest) = rest.split_at(payload_len);
    let used = data.len() - rest.len();
    let field = Field {
        type_byte,
        embedded,
        view: &data[..used],
        name,
        payload,
        error: FieldError::None,
    };
    Ok((field, rest))
}

/// Read a varint length and check that many bytes remain.
fn read_len(buf: &mut &[u8], step: &'static str) -> Result<usize> {
    let len = varint::read_u64(buf)?;
    let len = usize::try_from(len)
        .map_err(|_| Error::BadEncode(format!("length {} too large on step [{}]", len, step)))?;
    if buf.len() < len {
        return Err(Error::LengthTooShort {
            step,
            actual: buf.len(),
            expected: len,
        });
    }
    Ok(len)
}

/// Bytes taken by a payload of `kind` at the front of `buf`, including any length prefix.
fn payload_size(kind: FieldType, buf: &[u8]) -> Result<usize> {
    if let Some(size) = kind.fixed_payload_size() {
        return Ok(size);
    }
    let first = *buf.first().ok_or(Error::LengthTooShort {
        step: "read payload prefix",
        actual: 0,
        expected: 1,
    })?;
    let prefix = varint::measure(first);
    if kind.is_integer() {
        return Ok(prefix);
    }
    let mut rest = buf;
    let len = varint::read_u64(&mut rest)?;
    usize::try_from(len)
        .ok()
        .and_then(|len| len.checked_add(prefix))
        .ok_or_else(|| Error::BadEncode(format!("payload length {} too large", len)))
}

macro_rules! as_int {
    ($(#[$doc:meta])* $name:ident, $t:ty, $bits:expr, $signed:expr) => {
        $(#[$doc])*
        pub fn $name(&mut self, default: $t) -> $t {
            match self.integer_bits($bits, $signed) {
                Some(v) => v as $t,
                None => default,
            }
        }
    };
}

impl<'a> Field<'a> {
    /// Parse the field at the front of `data`, reading its type byte from the buffer.
    ///
    /// Bytes after the end of the field are ignored. Fails if the field or anything nested in it is
    /// malformed or truncated.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        Self::parse(None, data)
    }

    /// Parse a field whose type byte is known out of band and isn't present in `data`.
    ///
    /// The result behaves like the same field read from a self-contained buffer, except that
    /// [`try_get_view`](Self::try_get_view) can't hand out the source bytes.
    pub fn with_type(data: &'a [u8], ty: impl Into<TypeByte>) -> Result<Self> {
        Self::parse(Some(ty.into()), data)
    }

    fn parse(ty: Option<TypeByte>, data: &'a [u8]) -> Result<Self> {
        split_field(ty, data)
            .and_then(|(field, _)| field.validate(0).map(|()| field))
            .inspect_err(|e| debug!(error = %e, len = data.len(), "rejected compact binary field"))
    }

    /// This field with its name stripped. Named fields lose their source view.
    pub(crate) fn unnamed(&self) -> Field<'a> {
        if !self.has_name() {
            return Field {
                error: FieldError::None,
                ..*self
            };
        }
        Field {
            type_byte: self.type_byte.without_name(),
            embedded: false,
            view: self.payload,
            name: "",
            payload: self.payload,
            error: FieldError::None,
        }
    }

    /// An empty object or array, the result of a mismatched `as_object`/`as_array`.
    pub(crate) fn empty_container(kind: FieldType) -> Field<'static> {
        let payload: &'static [u8] = if kind.is_array() { &[0x01, 0x00] } else { &[0x00] };
        Field {
            type_byte: TypeByte::from(kind),
            embedded: false,
            view: payload,
            name: "",
            payload,
            error: FieldError::None,
        }
    }

    /// Check everything nested inside this field.
    pub(crate) fn validate(&self, depth: usize) -> Result<()> {
        let kind = self.kind();
        if kind == FieldType::String {
            let mut text = self.payload;
            varint::read_u64(&mut text)?;
            std::str::from_utf8(text)
                .map_err(|_| Error::BadEncode("string is not valid UTF-8".into()))?;
            return Ok(());
        }
        if !kind.has_fields() {
            return Ok(());
        }
        if depth >= MAX_DEPTH {
            return Err(Error::ParseLimit(format!(
                "nesting deeper than {} levels",
                MAX_DEPTH
            )));
        }

        let parts = open_container(kind, self.payload)?;
        if let Some(shared) = parts.shared {
            if kind.is_object() && !shared.has_name() {
                return Err(Error::BadEncode(
                    "uniform object member type has no name flag".into(),
                ));
            }
        }

        let mut body = parts.body;
        match parts.count {
            Some(count) => {
                if count > MAX_ARRAY_LEN {
                    return Err(Error::ParseLimit(format!(
                        "array of {} elements is longer than {}",
                        count, MAX_ARRAY_LEN
                    )));
                }
                // Uniform runs of fixed-width unnamed values need only a length check.
                let width = parts
                    .shared
                    .filter(|s| !s.has_name())
                    .and_then(|s| s.kind().fixed_payload_size());
                if let Some(width) = width {
                    if count.checked_mul(width as u64) != Some(body.len() as u64) {
                        return Err(Error::BadEncode(format!(
                            "array of {} elements doesn't fill {} bytes",
                            count,
                            body.len()
                        )));
                    }
                    return Ok(());
                }
                for _ in 0..count {
                    let (item, rest) = split_field(parts.shared, body)?;
                    item.validate(depth + 1)?;
                    body = rest;
                }
                if !body.is_empty() {
                    return Err(Error::BadEncode(format!(
                        "{} bytes left after the last array element",
                        body.len()
                    )));
                }
            }
            None => {
                while !body.is_empty() {
                    let (member, rest) = split_field(parts.shared, body)?;
                    if !member.has_name() {
                        return Err(Error::BadEncode("object member has no name".into()));
                    }
                    member.validate(depth + 1)?;
                    body = rest;
                }
            }
        }
        Ok(())
    }

    pub fn kind(&self) -> FieldType {
        self.type_byte.kind()
    }

    pub fn type_byte(&self) -> TypeByte {
        self.type_byte
    }

    /// The field's name, or the empty string if it has none.
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn has_name(&self) -> bool {
        self.type_byte.has_name()
    }

    /// False only for the None kind.
    pub fn has_value(&self) -> bool {
        self.kind() != FieldType::None
    }

    /// The result of the last typed accessor.
    pub fn error(&self) -> FieldError {
        self.error
    }

    pub fn has_error(&self) -> bool {
        self.error != FieldError::None
    }

    /// Raw payload bytes, including the length prefix for sized kinds.
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Length of the canonical encoding: type byte, name, and payload.
    pub fn size(&self) -> usize {
        self.view.len() + !self.embedded as usize
    }

    /// The exact source bytes, if they start with this field's type byte.
    pub fn try_get_view(&self) -> Option<&'a [u8]> {
        self.embedded.then_some(self.view)
    }

    /// Append the canonical encoding to `buf`.
    pub fn copy_to(&self, buf: &mut Vec<u8>) {
        buf.reserve(self.size());
        if !self.embedded {
            buf.push(self.type_byte.into_u8());
        }
        buf.extend_from_slice(self.view);
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.copy_to(&mut buf);
        buf
    }

    /// BLAKE3 over the canonical encoding. Names are part of it.
    pub fn hash(&self) -> Blake3Hash {
        let mut hasher = blake3::Hasher::new();
        if !self.embedded {
            hasher.update(&[self.type_byte.into_u8()]);
        }
        hasher.update(self.view);
        Blake3Hash::from_hasher(&hasher)
    }

    /// Iterate over the members of an object or the elements of an array. Other kinds have none.
    pub fn iter(&self) -> FieldIter<'a> {
        let kind = self.kind();
        if kind.has_fields() {
            FieldIter::over(kind, self.payload)
        } else {
            FieldIter::default()
        }
    }

    /// Decode the value into a [`Value`]. Doesn't touch the error state.
    pub fn value(&self) -> Value<'a> {
        Value::from_field(self)
    }

    fn set(&mut self, error: FieldError) {
        self.error = error;
    }

    fn check(&mut self, ok: bool) -> bool {
        self.set(if ok {
            FieldError::None
        } else {
            FieldError::TypeError
        });
        ok
    }

    pub fn is_null(&self) -> bool {
        self.kind() == FieldType::Null
    }

    pub fn is_object(&self) -> bool {
        self.kind().is_object()
    }

    pub fn is_array(&self) -> bool {
        self.kind().is_array()
    }

    pub fn is_string(&self) -> bool {
        self.kind() == FieldType::String
    }

    pub fn is_binary(&self) -> bool {
        self.kind() == FieldType::Binary
    }

    pub fn is_integer(&self) -> bool {
        self.kind().is_integer()
    }

    /// True for either float kind and for integers, which can be read as floats when small enough.
    pub fn is_float(&self) -> bool {
        self.kind().is_float() || self.kind().is_integer()
    }

    pub fn is_bool(&self) -> bool {
        self.kind().is_bool()
    }

    pub fn is_attachment(&self) -> bool {
        self.kind().is_attachment()
    }

    pub fn is_object_attachment(&self) -> bool {
        self.kind() == FieldType::ObjectAttachment
    }

    pub fn is_binary_attachment(&self) -> bool {
        self.kind() == FieldType::BinaryAttachment
    }

    pub fn is_hash(&self) -> bool {
        self.kind().is_hash()
    }

    pub fn is_uuid(&self) -> bool {
        self.kind() == FieldType::Uuid
    }

    pub fn is_date_time(&self) -> bool {
        self.kind() == FieldType::DateTime
    }

    pub fn is_time_span(&self) -> bool {
        self.kind() == FieldType::TimeSpan
    }

    /// View the value as an object. Anything else yields an empty object and a TypeError.
    pub fn as_object(&mut self) -> Object<'a> {
        if self.check(self.is_object()) {
            Object::from_field_unchecked(self)
        } else {
            Object::default()
        }
    }

    /// View the value as an array. Anything else yields an empty array and a TypeError.
    pub fn as_array(&mut self) -> Array<'a> {
        if self.check(self.is_array()) {
            Array::from_field_unchecked(self)
        } else {
            Array::default()
        }
    }

    pub fn as_string(&mut self, default: &'a str) -> &'a str {
        if !self.check(self.is_string()) {
            return default;
        }
        let mut text = self.payload;
        let len = varint::read_u64(&mut text).unwrap_or(0);
        if len > MAX_STRING_LEN {
            self.set(FieldError::RangeError);
            return default;
        }
        match std::str::from_utf8(text) {
            Ok(s) => s,
            Err(_) => {
                self.set(FieldError::TypeError);
                default
            }
        }
    }

    pub fn as_binary(&mut self, default: &'a [u8]) -> &'a [u8] {
        if !self.check(self.is_binary()) {
            return default;
        }
        let mut bytes = self.payload;
        match varint::read_u64(&mut bytes) {
            Ok(_) => bytes,
            Err(_) => {
                self.set(FieldError::TypeError);
                default
            }
        }
    }

    /// Raw varint payload and sign of an integer field.
    fn integer_parts(&self) -> Option<(u64, bool)> {
        let kind = self.kind();
        if !kind.is_integer() {
            return None;
        }
        let magnitude = varint::read_u64(&mut &self.payload[..]).ok()?;
        Some((magnitude, kind == FieldType::IntegerNegative))
    }

    /// Two's complement bits of an integer, if it fits in `bits` bits of magnitude. Signed targets
    /// spend one of their bits on the sign, so they ask for 7, 15, 31 or 63.
    fn integer_bits(&mut self, bits: u32, signed: bool) -> Option<u64> {
        let Some((magnitude, negative)) = self.integer_parts() else {
            self.set(FieldError::TypeError);
            return None;
        };
        let out_of_range = !1u64 << (bits - 1);
        if magnitude & out_of_range != 0 || (negative && !signed) {
            self.set(FieldError::RangeError);
            return None;
        }
        self.set(FieldError::None);
        Some(if negative { !magnitude } else { magnitude })
    }

    as_int!(as_int8, i8, 7, true);
    as_int!(as_int16, i16, 15, true);
    as_int!(as_int32, i32, 31, true);
    as_int!(as_int64, i64, 63, true);
    as_int!(as_uint8, u8, 8, false);
    as_int!(as_uint16, u16, 16, false);
    as_int!(as_uint32, u32, 32, false);
    as_int!(as_uint64, u64, 64, false);

    /// Any integer field. Unlike the fixed-width accessors this never reports a RangeError, since
    /// [`Integer`] covers every value the wire format can hold.
    pub fn as_integer(&mut self, default: Integer) -> Integer {
        let kind = self.kind();
        let integer = self
            .integer_parts()
            .and_then(|(payload, _)| Integer::from_payload(kind, payload));
        match integer {
            Some(v) => {
                self.set(FieldError::None);
                v
            }
            None => {
                self.set(FieldError::TypeError);
                default
            }
        }
    }

    /// Integers convert only when their magnitude fits the 24-bit mantissa. Float64 values convert
    /// only when the result is exact.
    pub fn as_float32(&mut self, default: f32) -> f32 {
        match self.kind() {
            FieldType::Float32 => {
                self.set(FieldError::None);
                BigEndian::read_f32(self.payload)
            }
            FieldType::Float64 => {
                let v = BigEndian::read_f64(self.payload);
                let narrow = v as f32;
                if narrow as f64 == v || v.is_nan() {
                    self.set(FieldError::None);
                    narrow
                } else {
                    self.set(FieldError::RangeError);
                    default
                }
            }
            _ => match self.integer_as_float(24) {
                Some((magnitude, negative)) => {
                    let v = magnitude as f32;
                    if negative {
                        -v
                    } else {
                        v
                    }
                }
                None => default,
            },
        }
    }

    /// Integers convert only when their magnitude fits the 53-bit mantissa.
    pub fn as_float64(&mut self, default: f64) -> f64 {
        match self.kind() {
            FieldType::Float32 => {
                self.set(FieldError::None);
                BigEndian::read_f32(self.payload) as f64
            }
            FieldType::Float64 => {
                self.set(FieldError::None);
                BigEndian::read_f64(self.payload)
            }
            _ => match self.integer_as_float(53) {
                Some((magnitude, negative)) => {
                    let v = magnitude as f64;
                    if negative {
                        -v
                    } else {
                        v
                    }
                }
                None => default,
            },
        }
    }

    fn integer_as_float(&mut self, mantissa_bits: u32) -> Option<(u64, bool)> {
        let Some((payload, negative)) = self.integer_parts() else {
            self.set(FieldError::TypeError);
            return None;
        };
        let magnitude = (payload as u128) + negative as u128;
        if magnitude >> mantissa_bits != 0 {
            self.set(FieldError::RangeError);
            return None;
        }
        self.set(FieldError::None);
        Some((magnitude as u64, negative))
    }

    pub fn as_bool(&mut self, default: bool) -> bool {
        match self.kind() {
            FieldType::BoolTrue => {
                self.set(FieldError::None);
                true
            }
            FieldType::BoolFalse => {
                self.set(FieldError::None);
                false
            }
            _ => {
                self.set(FieldError::TypeError);
                default
            }
        }
    }

    fn hash_payload(&mut self, ok: bool, default: IoHash) -> IoHash {
        if !self.check(ok) {
            return default;
        }
        match IoHash::from_slice(self.payload) {
            Some(hash) => hash,
            None => {
                self.set(FieldError::TypeError);
                default
            }
        }
    }

    /// Reads Hash fields and both attachment kinds.
    pub fn as_hash(&mut self, default: IoHash) -> IoHash {
        self.hash_payload(self.is_hash(), default)
    }

    /// Reads either attachment kind.
    pub fn as_attachment(&mut self, default: IoHash) -> IoHash {
        self.hash_payload(self.is_attachment(), default)
    }

    pub fn as_object_attachment(&mut self, default: IoHash) -> IoHash {
        self.hash_payload(self.is_object_attachment(), default)
    }

    pub fn as_binary_attachment(&mut self, default: IoHash) -> IoHash {
        self.hash_payload(self.is_binary_attachment(), default)
    }

    /// The 16 payload bytes are read as a GUID: the first three groups little-endian.
    pub fn as_uuid(&mut self, default: Uuid) -> Uuid {
        if !self.check(self.is_uuid()) {
            return default;
        }
        match <[u8; 16]>::try_from(self.payload) {
            Ok(bytes) => Uuid::from_bytes_le(bytes),
            Err(_) => {
                self.set(FieldError::TypeError);
                default
            }
        }
    }

    pub fn as_date_time(&mut self, default: DateTime) -> DateTime {
        if self.check(self.is_date_time()) {
            DateTime::from_payload(self.payload)
        } else {
            default
        }
    }

    pub fn as_date_time_ticks(&mut self, default: i64) -> i64 {
        self.as_date_time(DateTime::from_ticks(default)).ticks()
    }

    pub fn as_time_span(&mut self, default: TimeSpan) -> TimeSpan {
        if self.check(self.is_time_span()) {
            TimeSpan::from_payload(self.payload)
        } else {
            default
        }
    }

    pub fn as_time_span_ticks(&mut self, default: i64) -> i64 {
        self.as_time_span(TimeSpan::from_ticks(default)).ticks()
    }
}

impl PartialEq for Field<'_> {
    /// Compares values, not encodings. The field's own name is ignored, members of objects are
    /// compared by name and value, and uniform containers equal their non-uniform counterparts.
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.kind(), other.kind());
        if a.is_object() && b.is_object() {
            return Object::from_field_unchecked(self) == Object::from_field_unchecked(other);
        }
        if a.is_array() && b.is_array() {
            return Array::from_field_unchecked(self) == Array::from_field_unchecked(other);
        }
        a == b && self.payload == other.payload
    }
}

impl fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.has_name() {
            write!(f, "{:?}: ", self.name)?;
        }
        fmt::Debug::fmt(&self.value(), f)
    }
}

impl<'a> IntoIterator for Field<'a> {
    type Item = Field<'a>;
    type IntoIter = FieldIter<'a>;

    fn into_iter(self) -> FieldIter<'a> {
        self.iter()
    }
}

/// An owned, validated compact binary field.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FieldBuf {
    buf: Vec<u8>,
}

impl FieldBuf {
    /// Validate `buf` as a single self-contained field. Trailing bytes are an error.
    pub fn new(buf: Vec<u8>) -> Result<Self> {
        let field = Field::new(&buf)?;
        if field.size() != buf.len() {
            return Err(Error::BadEncode(format!(
                "{} bytes left after the field",
                buf.len() - field.size()
            )));
        }
        Ok(Self { buf })
    }

    /// Wrap bytes produced by a [`Writer`](crate::Writer), which are valid by construction.
    pub(crate) fn from_writer(buf: Vec<u8>) -> Self {
        Self { buf }
    }

    pub fn as_field(&self) -> Field<'_> {
        split_field(None, &self.buf)
            .map(|(field, _)| field)
            .unwrap_or_default()
    }

    /// The field as an object, or an empty object if it is some other kind.
    pub fn as_object(&self) -> Object<'_> {
        self.as_field().as_object()
    }

    pub fn as_array(&self) -> Array<'_> {
        self.as_field().as_array()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    pub fn hash(&self) -> Blake3Hash {
        Blake3Hash::compute(&self.buf)
    }

    /// The [`IoHash`] naming this document when it is stored as an attachment.
    pub fn io_hash(&self) -> IoHash {
        IoHash::compute(&self.buf)
    }
}

impl AsRef<[u8]> for FieldBuf {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl TryFrom<Vec<u8>> for FieldBuf {
    type Error = Error;
    fn try_from(buf: Vec<u8>) -> Result<Self> {
        FieldBuf::new(buf)
    }
}

impl fmt::Debug for FieldBuf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.as_field(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Writer;

    fn field(data: &[u8]) -> Field<'_> {
        Field::new(data).unwrap()
    }

    #[test]
    fn default_field() {
        let mut f = Field::default();
        assert!(!f.has_value());
        assert!(!f.has_name());
        assert_eq!(f.size(), 1);
        assert_eq!(f.to_vec(), [0x00]);
        assert_eq!(f.try_get_view(), None);
        assert_eq!(f.as_int32(7), 7);
        assert_eq!(f.error(), FieldError::TypeError);

        let parsed = field(&[0x00]);
        assert_eq!(parsed.size(), 1);
        assert_eq!(parsed.hash(), Field::default().hash());
        assert_eq!(parsed.hash(), Blake3Hash::compute(&[0x00]));
        let external = Field::with_type(&[], FieldType::None).unwrap();
        assert_eq!(external.hash(), parsed.hash());
    }

    #[test]
    fn named_field() {
        let data = [0x88, 0x03, b'a', b'b', b'c', 0x05];
        let mut f = field(&data);
        assert!(f.has_name());
        assert_eq!(f.name(), "abc");
        assert_eq!(f.size(), data.len());
        assert_eq!(f.try_get_view(), Some(&data[..]));
        assert_eq!(f.hash(), Blake3Hash::compute(&data));
        assert_eq!(f.as_uint8(0), 5);
        assert!(!f.has_error());
    }

    #[test]
    fn external_type() {
        let data = [0x07, 0x02, b'h', b'i'];
        let embedded = field(&data);
        let mut external = Field::with_type(&data[1..], FieldType::String).unwrap();
        assert_eq!(external.size(), embedded.size());
        assert_eq!(external.try_get_view(), None);
        assert_eq!(external.to_vec(), data);
        assert_eq!(external.hash(), embedded.hash());
        assert_eq!(external.as_string(""), "hi");
        assert_eq!(external, embedded);
    }

    #[test]
    fn trailing_bytes_ignored() {
        let f = field(&[0x08, 0x01, 0xff, 0xff]);
        assert_eq!(f.size(), 2);
    }

    #[test]
    fn malformed() {
        let cases: Vec<&[u8]> = vec![
            &[],
            &[0x14],
            &[0x40],
            &[0x07, 0x05, b'a'],
            &[0x87, 0x05, b'a'],
            &[0x10, 0x00],
            &[0x08],
            &[0x07, 0x01, 0xff],
            &[0x02, 0x02, 0x08, 0x01],
            &[0x04, 0x03, 0x02, 0x08, 0x01],
            &[0x05, 0x03, 0x02, 0x08, 0x01],
            &[0x03, 0x02, 0x08, 0x01],
            // u64::MAX zero-width Null elements in twelve bytes.
            &[0x05, 0x0a, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01],
        ];
        for (index, case) in cases.iter().enumerate() {
            println!("Test #{}: {:x?}", index, case);
            assert!(Field::new(case).is_err());
        }
    }

    /// A uniform array of `count` Nulls, which take no bytes each.
    fn null_run(count: u64) -> Vec<u8> {
        let mut header = Vec::new();
        varint::write_u64(&mut header, count);
        header.push(FieldType::Null.into_u8());
        let mut data = vec![FieldType::UniformArray.into_u8()];
        varint::write_u64(&mut data, header.len() as u64);
        data.extend_from_slice(&header);
        data
    }

    #[test]
    fn array_length_limit() {
        let longest = null_run(MAX_ARRAY_LEN);
        let mut f = field(&longest);
        assert_eq!(f.as_array().len(), MAX_ARRAY_LEN);

        for count in [MAX_ARRAY_LEN + 1, u64::MAX] {
            println!("Test: {} elements", count);
            let data = null_run(count);
            assert!(matches!(Field::new(&data), Err(Error::ParseLimit(_))));
        }
    }

    #[test]
    fn depth_limit() {
        let mut writer = Writer::new();
        for _ in 0..MAX_DEPTH {
            writer.begin_array_value();
        }
        for _ in 0..MAX_DEPTH {
            writer.end_array();
        }
        let ok = writer.to_vec();
        assert!(Field::new(&ok).is_ok());

        let mut writer = Writer::new();
        for _ in 0..=MAX_DEPTH {
            writer.begin_array_value();
        }
        for _ in 0..=MAX_DEPTH {
            writer.end_array();
        }
        let deep = writer.to_vec();
        assert!(matches!(Field::new(&deep), Err(Error::ParseLimit(_))));
    }

    #[test]
    fn integer_ranges() {
        // (bytes, i8, i16, i32, i64, u8, u16, u32, u64) with None meaning RangeError.
        struct Case {
            data: Vec<u8>,
            i8: Option<i8>,
            i16: Option<i16>,
            u8: Option<u8>,
            u16: Option<u16>,
            i64: Option<i64>,
            u64: Option<u64>,
        }
        let cases = vec![
            Case {
                data: vec![0x08, 0x7f],
                i8: Some(127),
                i16: Some(127),
                u8: Some(127),
                u16: Some(127),
                i64: Some(127),
                u64: Some(127),
            },
            Case {
                data: vec![0x08, 0x80, 0x80],
                i8: None,
                i16: Some(128),
                u8: Some(128),
                u16: Some(128),
                i64: Some(128),
                u64: Some(128),
            },
            Case {
                data: vec![0x08, 0x80, 0xff],
                i8: None,
                i16: Some(255),
                u8: Some(255),
                u16: Some(255),
                i64: Some(255),
                u64: Some(255),
            },
            Case {
                data: vec![0x08, 0x81, 0x00],
                i8: None,
                i16: Some(256),
                u8: None,
                u16: Some(256),
                i64: Some(256),
                u64: Some(256),
            },
            Case {
                data: vec![0x09, 0x7f],
                i8: Some(-128),
                i16: Some(-128),
                u8: None,
                u16: None,
                i64: Some(-128),
                u64: None,
            },
            Case {
                data: vec![0x09, 0x80, 0x80],
                i8: None,
                i16: Some(-129),
                u8: None,
                u16: None,
                i64: Some(-129),
                u64: None,
            },
            Case {
                data: vec![0x08, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
                i8: None,
                i16: None,
                u8: None,
                u16: None,
                i64: None,
                u64: Some(u64::MAX),
            },
            Case {
                data: vec![0x09, 0xff, 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
                i8: None,
                i16: None,
                u8: None,
                u16: None,
                i64: Some(i64::MIN),
                u64: None,
            },
        ];
        for (index, case) in cases.iter().enumerate() {
            println!("Test #{}: {:x?}", index, case.data);
            let mut f = field(&case.data);
            macro_rules! check {
                ($method:ident, $expected:expr, $default:expr) => {
                    let v = f.$method($default);
                    match $expected {
                        Some(e) => {
                            assert_eq!(v, e);
                            assert_eq!(f.error(), FieldError::None);
                        }
                        None => {
                            assert_eq!(v, $default);
                            assert_eq!(f.error(), FieldError::RangeError);
                        }
                    }
                };
            }
            check!(as_int8, case.i8, 3);
            check!(as_int16, case.i16, 3);
            check!(as_uint8, case.u8, 3);
            check!(as_uint16, case.u16, 3);
            check!(as_int64, case.i64, 3);
            check!(as_uint64, case.u64, 3);
        }
    }

    #[test]
    fn full_range_integers() {
        // -2^64, stored as a payload of u64::MAX.
        let data = [0x09, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        let mut f = field(&data);
        assert_eq!(f.as_int64(7), 7);
        assert_eq!(f.error(), FieldError::RangeError);
        assert_eq!(f.as_integer(Integer::default()), Integer::MIN);
        assert!(!f.has_error());
        assert_eq!(f.value(), Value::Integer(Integer::MIN));
        assert_eq!(format!("{:?}", f), "Integer(-18446744073709551616)");

        let mut f = field(&[0x08, 0x05]);
        assert_eq!(f.as_integer(Integer::default()), Integer::from(5u8));
        let mut f = field(&[0x07, 0x00]);
        assert_eq!(f.as_integer(Integer::from(1u8)), Integer::from(1u8));
        assert_eq!(f.error(), FieldError::TypeError);
    }

    #[test]
    fn integer_to_float() {
        // 2^24 - 1 fits a float mantissa, 2^24 doesn't.
        let mut f = field(&[0x08, 0xe0, 0xff, 0xff, 0xff]);
        assert_eq!(f.as_float32(0.0), 16_777_215.0);
        assert!(!f.has_error());
        let mut f = field(&[0x08, 0xe1, 0x00, 0x00, 0x00]);
        assert_eq!(f.as_float32(0.5), 0.5);
        assert_eq!(f.error(), FieldError::RangeError);
        assert_eq!(f.as_float64(0.5), 16_777_216.0);
        assert!(!f.has_error());
        // -(2^24 - 1) is stored as 2^24 - 2.
        let mut f = field(&[0x09, 0xe0, 0xff, 0xff, 0xfe]);
        assert_eq!(f.as_float32(0.0), -16_777_215.0);
        assert!(!f.has_error());
        let mut f = field(&[0x09, 0xe0, 0xff, 0xff, 0xff]);
        assert_eq!(f.as_float32(0.0), 0.0);
        assert_eq!(f.error(), FieldError::RangeError);
        let mut f = field(&[0x08, 0x01]);
        assert_eq!(f.as_float64(0.0), 1.0);
        let mut f = field(&[0x0c]);
        assert_eq!(f.as_float64(2.0), 2.0);
        assert_eq!(f.error(), FieldError::TypeError);
    }

    #[test]
    fn floats() {
        let mut data = vec![0x0a];
        data.extend_from_slice(&1.5f32.to_be_bytes());
        let mut f = field(&data);
        assert_eq!(f.as_float32(0.0), 1.5);
        assert_eq!(f.as_float64(0.0), 1.5);
        assert!(!f.has_error());

        let mut data = vec![0x0b];
        data.extend_from_slice(&0.1f64.to_be_bytes());
        let mut f = field(&data);
        assert_eq!(f.as_float64(0.0), 0.1);
        assert_eq!(f.as_float32(2.0), 2.0);
        assert_eq!(f.error(), FieldError::RangeError);

        let mut data = vec![0x0b];
        data.extend_from_slice(&0.25f64.to_be_bytes());
        let mut f = field(&data);
        assert_eq!(f.as_float32(0.0), 0.25);
        assert!(!f.has_error());
    }

    #[test]
    fn default_on_type_error() {
        let mut f = field(&[0x07, 0x01, b'x']);
        assert_eq!(f.as_int32(9), 9);
        assert_eq!(f.error(), FieldError::TypeError);
        assert!(f.as_bool(true));
        assert_eq!(f.error(), FieldError::TypeError);
        assert_eq!(f.as_hash(IoHash::ZERO), IoHash::ZERO);
        assert_eq!(f.as_uuid(Uuid::nil()), Uuid::nil());
        assert_eq!(f.as_binary(b"d"), b"d");
        assert_eq!(f.as_date_time_ticks(4), 4);
        assert!(f.as_object().iter().next().is_none());
        assert_eq!(f.error(), FieldError::TypeError);
        assert_eq!(f.as_array().len(), 0);
        assert_eq!(f.as_string("no"), "x");
        assert_eq!(f.error(), FieldError::None);
    }

    #[test]
    fn hashes_and_attachments() {
        let hash = IoHash::compute(b"blob");
        for kind in [
            FieldType::Hash,
            FieldType::ObjectAttachment,
            FieldType::BinaryAttachment,
        ] {
            let mut data = vec![kind.into_u8()];
            data.extend_from_slice(hash.as_ref());
            let mut f = field(&data);
            assert_eq!(f.as_hash(IoHash::ZERO), hash);
            assert!(!f.has_error());
            let attachment = f.as_attachment(IoHash::ZERO);
            assert_eq!(attachment == hash, kind.is_attachment());
            assert_eq!(f.has_error(), !kind.is_attachment());
            let object = f.as_object_attachment(IoHash::ZERO);
            assert_eq!(object == hash, kind == FieldType::ObjectAttachment);
            let binary = f.as_binary_attachment(IoHash::ZERO);
            assert_eq!(binary == hash, kind == FieldType::BinaryAttachment);
        }
    }

    #[test]
    fn uuid_byte_order() {
        let mut data = vec![0x11];
        data.extend(0u8..16);
        let mut f = field(&data);
        let id = f.as_uuid(Uuid::nil());
        assert_eq!(id.to_string(), "03020100-0504-0706-0809-0a0b0c0d0e0f");
    }

    #[test]
    fn time_values() {
        let mut data = vec![0x12];
        data.extend_from_slice(&1234i64.to_be_bytes());
        let mut f = field(&data);
        assert_eq!(f.as_date_time_ticks(0), 1234);
        assert_eq!(f.as_time_span_ticks(-1), -1);
        assert_eq!(f.error(), FieldError::TypeError);
        data[0] = 0x13;
        let mut f = field(&data);
        assert_eq!(f.as_time_span(TimeSpan::ZERO), TimeSpan::from_ticks(1234));
    }

    #[test]
    fn strings_and_binary() {
        let mut f = field(&[0x06, 0x03, 1, 2, 3]);
        assert_eq!(f.as_binary(&[]), [1, 2, 3]);
        assert_eq!(f.as_string("d"), "d");
        assert_eq!(f.error(), FieldError::TypeError);
        let mut f = field(&[0x07, 0x00]);
        assert_eq!(f.as_string("d"), "");
        assert!(!f.has_error());
    }

    #[test]
    fn structural_equality() {
        let mut writer = Writer::new();
        writer.begin_array_value();
        writer.write_integer_value(1);
        writer.write_integer_value(2);
        writer.end_array();
        let plain = writer.to_vec();

        let mut writer = Writer::new();
        writer.begin_uniform_array_value(FieldType::IntegerPositive);
        writer.write_integer_value(1);
        writer.write_integer_value(2);
        writer.end_array();
        let uniform = writer.to_vec();

        assert_ne!(plain, uniform);
        assert_eq!(field(&plain), field(&uniform));

        let mut writer = Writer::new();
        writer.begin_object_value();
        writer.begin_array("named");
        writer.write_integer_value(1);
        writer.write_integer_value(2);
        writer.end_array();
        writer.end_object();
        let wrapped = writer.to_vec();
        let named = field(&wrapped).as_object().find("named");
        assert!(named.has_name());
        assert_eq!(named, field(&plain));

        assert_ne!(field(&[0x08, 0x01]), field(&[0x09, 0x01]));
        assert_ne!(field(&[0x08, 0x01]), field(&[0x08, 0x02]));
    }
}
