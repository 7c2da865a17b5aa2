use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};

use serde::{
    de::{Deserialize, Deserializer},
    ser::{Serialize, Serializer},
};

use crate::field_type::FieldType;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum IntPriv {
    /// Always non-less than zero.
    PosInt(u64),
    /// Always less than zero, stored as its magnitude minus one.
    NegInt(u64),
}

/// An integer field's value, anywhere from -2^64 to 2^64 - 1.
///
/// On the wire a non-negative value is an IntegerPositive holding the value itself, and a negative
/// value is an IntegerNegative holding its magnitude minus one. Every bit pattern of the payload is
/// meaningful, so negative values reach one further than `u64` does. Values below `i64::MIN` only
/// convert to `i128`.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Integer {
    n: IntPriv,
}

impl Integer {
    /// Minimum possible integer that can be represented, -2^64.
    pub const MIN: Integer = Integer {
        n: IntPriv::NegInt(u64::MAX),
    };

    /// Maximum possible integer that can be represented. Equivalent to `u64::MAX`.
    pub const MAX: Integer = Integer {
        n: IntPriv::PosInt(u64::MAX),
    };

    /// Rebuild an integer from its field kind and raw varint payload.
    ///
    /// Returns `None` if `kind` isn't an integer kind.
    pub fn from_payload(kind: FieldType, payload: u64) -> Option<Integer> {
        match kind {
            FieldType::IntegerPositive => Some(Integer {
                n: IntPriv::PosInt(payload),
            }),
            FieldType::IntegerNegative => Some(Integer {
                n: IntPriv::NegInt(payload),
            }),
            _ => None,
        }
    }

    /// The field kind this integer is written as.
    pub fn kind(&self) -> FieldType {
        match self.n {
            IntPriv::PosInt(_) => FieldType::IntegerPositive,
            IntPriv::NegInt(_) => FieldType::IntegerNegative,
        }
    }

    /// The varint payload this integer is written as.
    pub fn payload(&self) -> u64 {
        match self.n {
            IntPriv::PosInt(n) | IntPriv::NegInt(n) => n,
        }
    }

    pub fn is_negative(&self) -> bool {
        matches!(self.n, IntPriv::NegInt(_))
    }

    /// Returns the integer represented as `i64` if possible, or else `None`.
    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self.n {
            IntPriv::PosInt(n) => i64::try_from(n).ok(),
            // !n == -(n + 1) in two's complement.
            IntPriv::NegInt(n) if n <= i64::MAX as u64 => Some(!n as i64),
            IntPriv::NegInt(_) => None,
        }
    }

    /// Returns the integer represented as `u64` if possible, or else `None`.
    #[inline]
    pub fn as_u64(&self) -> Option<u64> {
        match self.n {
            IntPriv::PosInt(n) => Some(n),
            IntPriv::NegInt(_) => None,
        }
    }

    /// Returns the integer as `f64`, rounding if it has more than 53 significant bits.
    #[inline]
    pub fn as_f64(&self) -> f64 {
        match self.n {
            IntPriv::PosInt(n) => n as f64,
            IntPriv::NegInt(n) => -(n as f64) - 1.0,
        }
    }
}

impl Default for Integer {
    fn default() -> Self {
        Self {
            n: IntPriv::PosInt(0),
        }
    }
}

impl Ord for Integer {
    fn cmp(&self, other: &Integer) -> Ordering {
        match (self.n, other.n) {
            // A larger stored magnitude is a smaller value.
            (IntPriv::NegInt(lhs), IntPriv::NegInt(ref rhs)) => rhs.cmp(&lhs),
            (IntPriv::NegInt(_), IntPriv::PosInt(_)) => Ordering::Less,
            (IntPriv::PosInt(_), IntPriv::NegInt(_)) => Ordering::Greater,
            (IntPriv::PosInt(lhs), IntPriv::PosInt(ref rhs)) => lhs.cmp(rhs),
        }
    }
}

impl PartialOrd for Integer {
    fn partial_cmp(&self, other: &Integer) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Debug for Integer {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self.n {
            IntPriv::PosInt(v) => fmt.debug_tuple("PosInt").field(&v).finish(),
            IntPriv::NegInt(_) => fmt.debug_tuple("NegInt").field(&i128::from(*self)).finish(),
        }
    }
}

impl Display for Integer {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self.n {
            IntPriv::PosInt(v) => Display::fmt(&v, fmt),
            IntPriv::NegInt(_) => Display::fmt(&i128::from(*self), fmt),
        }
    }
}

macro_rules! impl_from_unsigned {
    ($t: ty) => {
        impl From<$t> for Integer {
            fn from(n: $t) -> Self {
                Integer {
                    n: IntPriv::PosInt(n as u64),
                }
            }
        }
    };
}

macro_rules! impl_from_signed {
    ($t: ty) => {
        impl From<$t> for Integer {
            fn from(n: $t) -> Self {
                if n < 0 {
                    Integer {
                        n: IntPriv::NegInt(!(n as i64) as u64),
                    }
                } else {
                    Integer {
                        n: IntPriv::PosInt(n as u64),
                    }
                }
            }
        }
    };
}

impl_from_unsigned!(u8);
impl_from_unsigned!(u16);
impl_from_unsigned!(u32);
impl_from_unsigned!(u64);
impl_from_unsigned!(usize);
impl_from_signed!(i8);
impl_from_signed!(i16);
impl_from_signed!(i32);
impl_from_signed!(i64);
impl_from_signed!(isize);

macro_rules! impl_try_from {
    ($t: ty) => {
        impl TryFrom<Integer> for $t {
            type Error = Integer;
            fn try_from(v: Integer) -> Result<Self, Self::Error> {
                match v.n {
                    IntPriv::PosInt(n) => TryFrom::try_from(n).map_err(|_| v),
                    IntPriv::NegInt(_) => v
                        .as_i64()
                        .and_then(|n| TryFrom::try_from(n).ok())
                        .ok_or(v),
                }
            }
        }
    };
}

impl_try_from!(u8);
impl_try_from!(u16);
impl_try_from!(u32);
impl_try_from!(u64);
impl_try_from!(usize);
impl_try_from!(i8);
impl_try_from!(i16);
impl_try_from!(i32);
impl_try_from!(i64);
impl_try_from!(isize);

impl From<Integer> for i128 {
    fn from(v: Integer) -> Self {
        match v.n {
            IntPriv::PosInt(n) => n as i128,
            IntPriv::NegInt(n) => -(n as i128) - 1,
        }
    }
}

impl TryFrom<i128> for Integer {
    type Error = i128;
    fn try_from(v: i128) -> Result<Self, Self::Error> {
        let n = if v < 0 {
            IntPriv::NegInt(u64::try_from(-(v + 1)).map_err(|_| v)?)
        } else {
            IntPriv::PosInt(u64::try_from(v).map_err(|_| v)?)
        };
        Ok(Integer { n })
    }
}

impl Serialize for Integer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.n {
            IntPriv::PosInt(v) => serializer.serialize_u64(v),
            IntPriv::NegInt(_) => match self.as_i64() {
                Some(v) => serializer.serialize_i64(v),
                None => serializer.serialize_i128(i128::from(*self)),
            },
        }
    }
}

impl<'de> Deserialize<'de> for Integer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IntVisitor;
        impl<'de> serde::de::Visitor<'de> for IntVisitor {
            type Value = Integer;

            fn expecting(&self, fmt: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
                write!(fmt, "an integer")
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(Integer::from(v))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Integer::from(v))
            }

            fn visit_i128<E: serde::de::Error>(self, v: i128) -> Result<Self::Value, E> {
                Integer::try_from(v).map_err(|_| {
                    E::invalid_value(serde::de::Unexpected::Other("integer out of range"), &self)
                })
            }

            fn visit_u128<E: serde::de::Error>(self, v: u128) -> Result<Self::Value, E> {
                u64::try_from(v).map(Integer::from).map_err(|_| {
                    E::invalid_value(serde::de::Unexpected::Other("integer out of range"), &self)
                })
            }
        }

        deserializer.deserialize_any(IntVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_convention() {
        let cases: Vec<(Integer, FieldType, u64)> = vec![
            (Integer::from(0), FieldType::IntegerPositive, 0),
            (Integer::from(u64::MAX), FieldType::IntegerPositive, u64::MAX),
            (Integer::from(-1), FieldType::IntegerNegative, 0),
            (Integer::from(-128), FieldType::IntegerNegative, 127),
            (Integer::from(i64::MIN), FieldType::IntegerNegative, (1u64 << 63) - 1),
            (Integer::MIN, FieldType::IntegerNegative, u64::MAX),
        ];
        for (index, (int, kind, payload)) in cases.iter().enumerate() {
            println!("Test #{}: {}", index, int);
            assert_eq!(int.kind(), *kind);
            assert_eq!(int.payload(), *payload);
            assert_eq!(Integer::from_payload(*kind, *payload), Some(*int));
        }
        assert_eq!(Integer::from_payload(FieldType::String, 1), None);
        let below = Integer::from_payload(FieldType::IntegerNegative, 1 << 63).unwrap();
        assert_eq!(i128::from(below), i64::MIN as i128 - 1);
        assert_eq!(below.as_i64(), None);
    }

    #[test]
    fn ordering() {
        assert!(Integer::MIN < Integer::from(i64::MIN));
        assert!(Integer::from(i64::MIN) < Integer::from(-2));
        assert!(Integer::from(-2) < Integer::from(-1));
        assert!(Integer::from(-1) < Integer::from(0u8));
        assert!(Integer::from(0u8) < Integer::MAX);
    }

    #[test]
    fn conversions() {
        assert_eq!(Integer::from(-5).as_i64(), Some(-5));
        assert_eq!(Integer::from(-5).as_u64(), None);
        assert_eq!(Integer::MAX.as_i64(), None);
        assert_eq!(u8::try_from(Integer::from(300)), Err(Integer::from(300)));
        assert_eq!(i16::try_from(Integer::from(-300)), Ok(-300i16));
        assert_eq!(i64::try_from(Integer::MIN), Err(Integer::MIN));
        assert_eq!(Integer::MIN.as_i64(), None);
        assert_eq!(Integer::MIN.as_u64(), None);
        assert_eq!(Integer::MIN.as_f64(), -18_446_744_073_709_551_616.0);
        assert_eq!(i128::from(Integer::MIN), -(1i128 << 64));
        assert_eq!(Integer::try_from(-(1i128 << 64)), Ok(Integer::MIN));
        assert_eq!(Integer::try_from(u64::MAX as i128), Ok(Integer::MAX));
        assert!(Integer::try_from(-(1i128 << 64) - 1).is_err());
        assert!(Integer::try_from(1i128 << 64).is_err());
        assert_eq!(Integer::MIN.to_string(), "-18446744073709551616");
        assert_eq!(Integer::from(-7).to_string(), "-7");
    }
}
