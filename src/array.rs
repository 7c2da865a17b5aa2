use std::fmt;

use crate::{
    error::{Error, Result},
    field::Field,
    field_type::FieldType,
    hash::Blake3Hash,
    iter::{open_container, FieldIter},
};

/// A counted sequence of unnamed fields, in either the plain or the uniform encoding.
#[derive(Clone, Copy)]
pub struct Array<'a> {
    field: Field<'a>,
}

impl Default for Array<'_> {
    fn default() -> Self {
        Array {
            field: Field::empty_container(FieldType::Array),
        }
    }
}

impl<'a> Array<'a> {
    /// Parse an array from the front of `data`. A name on the field is dropped.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        Self::from_field(&Field::new(data)?)
    }

    pub fn from_field(field: &Field<'a>) -> Result<Self> {
        if !field.is_array() {
            return Err(Error::UnexpectedType {
                expected: "array",
                actual: field.kind(),
            });
        }
        Ok(Self::from_field_unchecked(field))
    }

    pub(crate) fn from_field_unchecked(field: &Field<'a>) -> Self {
        Array {
            field: field.unnamed(),
        }
    }

    /// Number of elements, as stored in the header.
    pub fn len(&self) -> u64 {
        open_container(self.field.kind(), self.field.payload())
            .ok()
            .and_then(|parts| parts.count)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_uniform(&self) -> bool {
        self.field.kind() == FieldType::UniformArray
    }

    pub fn iter(&self) -> FieldIter<'a> {
        self.field.iter()
    }

    pub fn as_field(&self) -> Field<'a> {
        self.field
    }

    pub fn size(&self) -> usize {
        self.field.size()
    }

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

impl PartialEq for Array<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl fmt::Debug for Array<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|e| e.value()))
            .finish()
    }
}

impl<'a> IntoIterator for Array<'a> {
    type Item = Field<'a>;
    type IntoIter = FieldIter<'a>;

    fn into_iter(self) -> FieldIter<'a> {
        self.iter()
    }
}

impl<'a> IntoIterator for &Array<'a> {
    type Item = Field<'a>;
    type IntoIter = FieldIter<'a>;

    fn into_iter(self) -> FieldIter<'a> {
        self.iter()
    }
}
