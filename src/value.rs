use std::fmt;

use uuid::Uuid;

use crate::{
    array::Array,
    field::Field,
    field_type::FieldType,
    hash::IoHash,
    integer::Integer,
    object::Object,
    time::{DateTime, TimeSpan},
};

/// A decoded field value, borrowing strings, binary and containers from the source buffer.
#[derive(Clone, Copy, Default, PartialEq)]
pub enum Value<'a> {
    #[default]
    None,
    Null,
    Object(Object<'a>),
    Array(Array<'a>),
    Binary(&'a [u8]),
    String(&'a str),
    Integer(Integer),
    Float32(f32),
    Float64(f64),
    Bool(bool),
    ObjectAttachment(IoHash),
    BinaryAttachment(IoHash),
    Hash(IoHash),
    Uuid(Uuid),
    DateTime(DateTime),
    TimeSpan(TimeSpan),
}

impl<'a> Value<'a> {
    pub(crate) fn from_field(field: &Field<'a>) -> Self {
        let mut f = *field;
        match f.kind() {
            FieldType::None => Value::None,
            FieldType::Null => Value::Null,
            FieldType::Object | FieldType::UniformObject => Value::Object(f.as_object()),
            FieldType::Array | FieldType::UniformArray => Value::Array(f.as_array()),
            FieldType::Binary => Value::Binary(f.as_binary(&[])),
            FieldType::String => Value::String(f.as_string("")),
            FieldType::IntegerPositive | FieldType::IntegerNegative => {
                Value::Integer(f.as_integer(Integer::default()))
            }
            FieldType::Float32 => Value::Float32(f.as_float32(0.0)),
            FieldType::Float64 => Value::Float64(f.as_float64(0.0)),
            FieldType::BoolFalse => Value::Bool(false),
            FieldType::BoolTrue => Value::Bool(true),
            FieldType::ObjectAttachment => Value::ObjectAttachment(f.as_hash(IoHash::ZERO)),
            FieldType::BinaryAttachment => Value::BinaryAttachment(f.as_hash(IoHash::ZERO)),
            FieldType::Hash => Value::Hash(f.as_hash(IoHash::ZERO)),
            FieldType::Uuid => Value::Uuid(f.as_uuid(Uuid::nil())),
            FieldType::DateTime => Value::DateTime(f.as_date_time(DateTime::default())),
            FieldType::TimeSpan => Value::TimeSpan(f.as_time_span(TimeSpan::default())),
        }
    }

    pub fn kind(&self) -> FieldType {
        match self {
            Value::None => FieldType::None,
            Value::Null => FieldType::Null,
            Value::Object(o) if o.is_uniform() => FieldType::UniformObject,
            Value::Object(_) => FieldType::Object,
            Value::Array(a) if a.is_uniform() => FieldType::UniformArray,
            Value::Array(_) => FieldType::Array,
            Value::Binary(_) => FieldType::Binary,
            Value::String(_) => FieldType::String,
            Value::Integer(i) => i.kind(),
            Value::Float32(_) => FieldType::Float32,
            Value::Float64(_) => FieldType::Float64,
            Value::Bool(false) => FieldType::BoolFalse,
            Value::Bool(true) => FieldType::BoolTrue,
            Value::ObjectAttachment(_) => FieldType::ObjectAttachment,
            Value::BinaryAttachment(_) => FieldType::BinaryAttachment,
            Value::Hash(_) => FieldType::Hash,
            Value::Uuid(_) => FieldType::Uuid,
            Value::DateTime(_) => FieldType::DateTime,
            Value::TimeSpan(_) => FieldType::TimeSpan,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match *self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        match *self {
            Value::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<Integer> {
        match *self {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<Object<'a>> {
        match *self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<Array<'a>> {
        match *self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Hash fields and both attachment kinds.
    pub fn as_hash(&self) -> Option<IoHash> {
        match *self {
            Value::Hash(h) | Value::ObjectAttachment(h) | Value::BinaryAttachment(h) => Some(h),
            _ => None,
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Null => f.write_str("Null"),
            Value::Object(o) => fmt::Debug::fmt(o, f),
            Value::Array(a) => fmt::Debug::fmt(a, f),
            Value::Binary(b) => write!(f, "Binary({})", hex::encode(b)),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Integer(i) => write!(f, "Integer({})", i),
            Value::Float32(v) => f.debug_tuple("Float32").field(v).finish(),
            Value::Float64(v) => f.debug_tuple("Float64").field(v).finish(),
            Value::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Value::ObjectAttachment(h) => write!(f, "ObjectAttachment({})", h),
            Value::BinaryAttachment(h) => write!(f, "BinaryAttachment({})", h),
            Value::Hash(h) => write!(f, "Hash({})", h),
            Value::Uuid(u) => write!(f, "Uuid({})", u),
            Value::DateTime(t) => write!(f, "DateTime({})", t.ticks()),
            Value::TimeSpan(t) => write!(f, "TimeSpan({})", t.ticks()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Writer;

    #[test]
    fn every_kind() {
        let hash = IoHash::compute(b"v");
        let id = Uuid::from_u128(0x1234);
        let mut writer = Writer::new();
        writer.begin_object_value();
        writer.write_null("null");
        writer.write_binary("bin", &[1, 2]);
        writer.write_string("str", "s");
        writer.write_integer("pos", 5u8);
        writer.write_integer("neg", -5);
        writer.write_float32("f32", 0.5);
        writer.write_float64("f64", 0.25);
        writer.write_bool("bool", true);
        writer.write_object_attachment("oa", hash);
        writer.write_binary_attachment("ba", hash);
        writer.write_hash("hash", hash);
        writer.write_uuid("uuid", id);
        writer.write_date_time("dt", DateTime::from_ticks(10));
        writer.write_time_span("ts", TimeSpan::from_ticks(-10));
        writer.begin_array("arr");
        writer.end_array();
        writer.end_object();
        let bytes = writer.to_vec();

        let obj = Object::new(&bytes).unwrap();
        let values: Vec<Value> = obj.iter().map(|f| f.value()).collect();
        let expected = vec![
            Value::Null,
            Value::Binary(&[1, 2]),
            Value::String("s"),
            Value::Integer(Integer::from(5)),
            Value::Integer(Integer::from(-5)),
            Value::Float32(0.5),
            Value::Float64(0.25),
            Value::Bool(true),
            Value::ObjectAttachment(hash),
            Value::BinaryAttachment(hash),
            Value::Hash(hash),
            Value::Uuid(id),
            Value::DateTime(DateTime::from_ticks(10)),
            Value::TimeSpan(TimeSpan::from_ticks(-10)),
            Value::Array(Array::default()),
        ];
        assert_eq!(values, expected);
        for (field, value) in obj.iter().zip(values.iter()) {
            assert_eq!(field.kind(), value.kind());
        }
        assert_eq!(Field::default().value(), Value::None);
    }

    #[test]
    fn extreme_integers() {
        let cases: Vec<(Vec<u8>, i128)> = vec![
            (vec![0x08, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff], u64::MAX as i128),
            (vec![0x09, 0xff, 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff], i64::MIN as i128),
            (vec![0x09, 0xff, 0x80, 0, 0, 0, 0, 0, 0, 0], i64::MIN as i128 - 1),
            (vec![0x09, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff], -(1i128 << 64)),
        ];
        for (index, (data, expected)) in cases.iter().enumerate() {
            println!("Test #{}: {}", index, expected);
            let value = Field::new(data).unwrap().value();
            let int = value.as_integer().unwrap();
            assert_eq!(i128::from(int), *expected);
            assert_eq!(format!("{:?}", value), format!("Integer({})", expected));
        }
    }

    #[test]
    fn helpers() {
        let bytes = [0x07, 0x02, b'h', b'i'];
        let v = Field::new(&bytes).unwrap().value();
        assert_eq!(v.as_str(), Some("hi"));
        assert_eq!(v.as_integer(), None);
        assert_eq!(format!("{:?}", v), r#"String("hi")"#);
    }
}
