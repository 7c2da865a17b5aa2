use std::fmt;

use crate::{
    error::{Error, Result},
    field::{Field, FieldBuf},
    field_type::FieldType,
    hash::Blake3Hash,
    iter::FieldIter,
    writer::Writer,
};

/// A sequence of named fields.
///
/// Covers both the plain and the uniform encoding. Names aren't required to be unique, and lookups
/// are linear scans that return the first match.
#[derive(Clone, Copy)]
pub struct Object<'a> {
    field: Field<'a>,
}

impl Default for Object<'_> {
    fn default() -> Self {
        Object {
            field: Field::empty_container(FieldType::Object),
        }
    }
}

impl<'a> Object<'a> {
    /// Parse an object from the front of `data`. A name on the field is dropped.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        Self::from_field(&Field::new(data)?)
    }

    pub fn from_field(field: &Field<'a>) -> Result<Self> {
        if !field.is_object() {
            return Err(Error::UnexpectedType {
                expected: "object",
                actual: field.kind(),
            });
        }
        Ok(Self::from_field_unchecked(field))
    }

    pub(crate) fn from_field_unchecked(field: &Field<'a>) -> Self {
        Object {
            field: field.unnamed(),
        }
    }

    /// Write an object with a closure and return the finished document.
    ///
    /// ```
    /// # use compact_binary::Object;
    /// let doc = Object::build(|w| {
    ///     w.write_integer("a", 1);
    ///     w.write_string("b", "two");
    /// });
    /// let mut b = doc.as_object().find("b");
    /// assert_eq!(b.as_string(""), "two");
    /// ```
    pub fn build<'b, F: FnOnce(&mut Writer<'b>)>(f: F) -> FieldBuf {
        let mut writer = Writer::new();
        writer.begin_object_value();
        f(&mut writer);
        writer.end_object();
        FieldBuf::from_writer(writer.to_vec())
    }

    pub fn iter(&self) -> FieldIter<'a> {
        self.field.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn is_uniform(&self) -> bool {
        self.field.kind() == FieldType::UniformObject
    }

    /// First member named `name`, or a valueless field.
    pub fn find(&self, name: &str) -> Field<'a> {
        self.get(name).unwrap_or_default()
    }

    /// First member whose name matches `name` ignoring case, or a valueless field.
    pub fn find_ignore_case(&self, name: &str) -> Field<'a> {
        let lower = |s: &str| s.chars().flat_map(char::to_lowercase).collect::<String>();
        let target = lower(name);
        self.iter()
            .find(|f| f.name().eq_ignore_ascii_case(name) || lower(f.name()) == target)
            .unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<Field<'a>> {
        self.iter().find(|f| f.name() == name)
    }

    pub fn get_or(&self, name: &str, default: Field<'a>) -> Field<'a> {
        self.get(name).unwrap_or(default)
    }

    /// The object as an unnamed field.
    pub fn as_field(&self) -> Field<'a> {
        self.field
    }

    pub fn size(&self) -> usize {
        self.field.size()
    }

    /// The source bytes, when the object was read unnamed with its type byte in place.
    pub fn try_get_view(&self) -> Option<&'a [u8]> {
        self.field.try_get_view()
    }

    pub fn copy_to(&self, buf: &mut Vec<u8>) {
        self.field.copy_to(buf)
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.field.to_vec()
    }

    pub fn hash(&self) -> Blake3Hash {
        self.field.hash()
    }
}

impl PartialEq for Object<'_> {
    fn eq(&self, other: &Self) -> bool {
        let mut a = self.iter();
        let mut b = other.iter();
        loop {
            match (a.next(), b.next()) {
                (None, None) => return true,
                (Some(x), Some(y)) if x.name() == y.name() && x == y => (),
                _ => return false,
            }
        }
    }
}

impl fmt::Debug for Object<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|m| (m.name(), m.value())))
            .finish()
    }
}

impl<'a> IntoIterator for Object<'a> {
    type Item = Field<'a>;
    type IntoIter = FieldIter<'a>;

    fn into_iter(self) -> FieldIter<'a> {
        self.iter()
    }
}

impl<'a> IntoIterator for &Object<'a> {
    type Item = Field<'a>;
    type IntoIter = FieldIter<'a>;

    fn into_iter(self) -> FieldIter<'a> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;

    fn abc() -> Vec<u8> {
        let mut writer = Writer::new();
        writer.begin_object_value();
        writer.write_integer("a", 1);
        writer.write_integer("b", 2);
        writer.write_integer("c", 3);
        writer.end_object();
        writer.to_vec()
    }

    #[test]
    fn empty() {
        let obj = Object::default();
        assert_eq!(obj.to_vec(), [0x02, 0x00]);
        assert_eq!(obj.size(), 2);
        assert!(obj.is_empty());
        let parsed = Object::new(&[0x02, 0x00]).unwrap();
        assert_eq!(parsed, obj);
        assert_eq!(parsed.hash(), obj.hash());
        let mut iter = parsed.iter();
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }

    #[test]
    fn three_integers() {
        let bytes = abc();
        assert_eq!(
            bytes,
            [
                0x02, 0x0c, 0x88, 0x01, b'a', 0x01, 0x88, 0x01, b'b', 0x02, 0x88, 0x01, b'c', 0x03
            ]
        );
        let obj = Object::new(&bytes).unwrap();
        assert_eq!(obj.size(), 14);
        assert_eq!(obj.try_get_view(), Some(&bytes[..]));
        let values: Vec<(String, u8)> = obj
            .iter()
            .map(|mut f| (f.name().to_owned(), f.as_uint8(0)))
            .collect();
        assert_eq!(
            values,
            vec![("a".into(), 1), ("b".into(), 2), ("c".into(), 3)]
        );
    }

    #[test]
    fn lookups() {
        let bytes = abc();
        let obj = Object::new(&bytes).unwrap();
        assert_eq!(obj.find("b").as_int32(0), 2);
        assert!(!obj.find("B").has_value());
        assert_eq!(obj.find_ignore_case("B").as_int32(0), 2);
        assert!(obj.get("d").is_none());

        let mut missing = obj.find("d");
        assert!(!missing.has_value());
        assert_eq!(missing.as_int32(42), 42);
        assert_eq!(missing.error(), FieldError::TypeError);

        let mut fallback = obj.get_or("d", obj.find("c"));
        assert_eq!(fallback.as_int32(0), 3);
    }

    #[test]
    fn first_match_wins() {
        let doc = Object::build(|w| {
            w.write_integer("x", 1);
            w.write_integer("x", 2);
        });
        assert_eq!(doc.as_object().find("x").as_int32(0), 1);
        assert_eq!(doc.as_object().iter().count(), 2);
    }

    #[test]
    fn named_object_drops_name() {
        let mut writer = Writer::new();
        writer.begin_object_value();
        writer.begin_object("inner");
        writer.write_bool("t", true);
        writer.end_object();
        writer.end_object();
        let bytes = writer.to_vec();

        let mut outer = Field::new(&bytes).unwrap();
        let inner_field = outer.as_object().find("inner");
        assert!(inner_field.has_name());
        let inner = Object::from_field(&inner_field).unwrap();
        assert_eq!(inner.try_get_view(), None);
        assert_eq!(inner.to_vec(), [0x02, 0x03, 0x8d, 0x01, b't']);
        assert_eq!(inner.size(), 5);
        assert!(!inner.as_field().has_name());
        assert_eq!(inner.as_field(), inner_field);
        assert!(inner_field.hash() != inner.hash());

        assert!(matches!(
            Object::new(&[0x08, 0x01]),
            Err(Error::UnexpectedType {
                expected: "object",
                actual: FieldType::IntegerPositive
            })
        ));
    }

    #[test]
    fn uniform_object() {
        let mut writer = Writer::new();
        writer.begin_uniform_object_value(FieldType::IntegerPositive);
        writer.write_integer("a", 1);
        writer.write_integer("b", 2);
        writer.write_integer("c", 3);
        writer.end_object();
        let bytes = writer.to_vec();
        assert_eq!(
            bytes,
            [0x03, 0x0a, 0x88, 0x01, b'a', 0x01, 0x01, b'b', 0x02, 0x01, b'c', 0x03]
        );
        let uniform = Object::new(&bytes).unwrap();
        assert!(uniform.is_uniform());
        assert_eq!(uniform.find("c").as_uint64(0), 3);
        let plain_bytes = abc();
        let plain = Object::new(&plain_bytes).unwrap();
        assert_eq!(uniform, plain);
        assert_ne!(uniform.hash(), plain.hash());

        let member = uniform.find("a");
        assert_eq!(member.try_get_view(), None);
        assert_eq!(member.to_vec(), [0x88, 0x01, b'a', 0x01]);
    }

    #[test]
    fn differing_objects() {
        let a = Object::build(|w| w.write_integer("a", 1));
        let b = Object::build(|w| w.write_integer("b", 1));
        let c = Object::build(|w| {
            w.write_integer("a", 1);
            w.write_integer("b", 1);
        });
        assert_ne!(a.as_object(), b.as_object());
        assert_ne!(a.as_object(), c.as_object());
        assert_ne!(c.as_object(), a.as_object());
    }
}
