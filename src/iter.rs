//! Sequential cursor over encoded fields.

use std::iter::FusedIterator;

use crate::{
    error::Result,
    field::{split_field, Field},
    field_type::{FieldType, TypeByte},
    varint,
};

/// The pieces of a container payload once its size prefix is stripped.
pub(crate) struct ContainerParts<'a> {
    /// Element count, for arrays.
    pub count: Option<u64>,
    /// Shared member type, for uniform containers that have one.
    pub shared: Option<TypeByte>,
    /// Member bytes.
    pub body: &'a [u8],
}

/// Read the size, count, and shared type header of an object or array payload.
pub(crate) fn open_container(kind: FieldType, payload: &[u8]) -> Result<ContainerParts<'_>> {
    let mut body = payload;
    // The size prefix was already checked against the payload when the field was split off.
    varint::read_u64(&mut body)?;
    let count = if kind.is_array() {
        Some(varint::read_u64(&mut body)?)
    } else {
        None
    };
    let shared = match body.split_first() {
        Some((&ty, rest)) if kind.is_uniform() => {
            body = rest;
            Some(TypeByte::from_u8(ty)?)
        }
        _ => None,
    };
    Ok(ContainerParts {
        count,
        shared,
        body,
    })
}

/// Iterator over a run of encoded fields.
///
/// Runs either carry a type byte per field, or share one type byte supplied up front (the uniform
/// layout). Array runs are bounded by their element count so that zero-width uniform elements
/// still come out the right number of times; object runs end with their bytes.
///
/// A field that fails to parse ends the iteration. Fields handed out by [`Field`], [`Object`] and
/// [`Array`] were validated when they were constructed, so this only happens for bytes that
/// bypassed validation.
///
/// [`Object`]: crate::Object
/// [`Array`]: crate::Array
#[derive(Clone, Debug, Default)]
pub struct FieldIter<'a> {
    data: &'a [u8],
    uniform: Option<TypeByte>,
    remaining: Option<u64>,
    single: Option<Field<'a>>,
}

impl<'a> FieldIter<'a> {
    /// Iterate over a buffer of back-to-back self-contained fields, each starting with its own type
    /// byte. Every field is validated first.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let mut rest = data;
        while !rest.is_empty() {
            let (field, next) = split_field(None, rest)?;
            field.validate(0)?;
            rest = next;
        }
        Ok(Self::raw(data, None, None))
    }

    /// Iterate over exactly one field. Lets scalars and containers go through the same visiting
    /// code.
    pub fn single(field: Field<'a>) -> Self {
        Self {
            single: Some(field),
            remaining: Some(0),
            ..Self::default()
        }
    }

    pub(crate) fn raw(data: &'a [u8], uniform: Option<TypeByte>, remaining: Option<u64>) -> Self {
        Self {
            data,
            uniform,
            remaining,
            single: None,
        }
    }

    /// Iterate over the members of a container payload of the given kind.
    pub(crate) fn over(kind: FieldType, payload: &'a [u8]) -> Self {
        match open_container(kind, payload) {
            Ok(parts) => Self::raw(parts.body, parts.shared, parts.count),
            Err(_) => Self::default(),
        }
    }

    /// Elements left, when the run is bounded by a count.
    pub fn remaining(&self) -> Option<u64> {
        self.remaining
            .map(|n| n + self.single.is_some() as u64)
    }

    fn finish(&mut self) {
        self.data = &[];
        self.remaining = Some(0);
    }
}

impl<'a> Iterator for FieldIter<'a> {
    type Item = Field<'a>;

    fn next(&mut self) -> Option<Field<'a>> {
        if let Some(field) = self.single.take() {
            return Some(field);
        }
        match self.remaining {
            Some(0) => return None,
            None if self.data.is_empty() => return None,
            _ => (),
        }
        match split_field(self.uniform, self.data) {
            Ok((field, rest)) => {
                self.data = rest;
                if let Some(n) = self.remaining.as_mut() {
                    *n -= 1;
                }
                Some(field)
            }
            Err(_) => {
                self.finish();
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining() {
            Some(n) => {
                let n = usize::try_from(n).unwrap_or(usize::MAX);
                (n, Some(n))
            }
            None => (0, Some(self.data.len())),
        }
    }
}

impl FusedIterator for FieldIter<'_> {}
