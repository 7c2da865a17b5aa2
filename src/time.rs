//! Tick-based time values.
//!
//! Both [`DateTime`] and [`TimeSpan`] store a signed count of 100 ns ticks. A `DateTime` counts
//! from 0001-01-01T00:00:00 UTC.

use std::fmt;
use std::ops;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use byteorder::{BigEndian, ByteOrder};
use serde::{
    de::{Deserialize, Deserializer},
    ser::{Serialize, Serializer},
};

use crate::ser::{CB_DATE_TIME, CB_TIME_SPAN};

/// Ticks per second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;
const NANOS_PER_TICK: i64 = 100;
/// Ticks from 0001-01-01 to 1970-01-01.
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// A point in time, in ticks since 0001-01-01T00:00:00 UTC.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime {
    ticks: i64,
}

/// A signed span of time, in ticks.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSpan {
    ticks: i64,
}

impl DateTime {
    pub const MIN: DateTime = DateTime { ticks: i64::MIN };
    pub const MAX: DateTime = DateTime { ticks: i64::MAX };
    pub const UNIX_EPOCH: DateTime = DateTime {
        ticks: UNIX_EPOCH_TICKS,
    };

    pub const fn from_ticks(ticks: i64) -> Self {
        Self { ticks }
    }

    pub const fn ticks(&self) -> i64 {
        self.ticks
    }

    /// Build from Unix seconds and a sub-second nanosecond count. Nanoseconds are truncated to
    /// whole ticks. `None` if the result doesn't fit.
    pub fn from_unix(secs: i64, nanos: u32) -> Option<Self> {
        let ticks = secs
            .checked_mul(TICKS_PER_SECOND)?
            .checked_add(nanos as i64 / NANOS_PER_TICK)?
            .checked_add(UNIX_EPOCH_TICKS)?;
        Some(Self { ticks })
    }

    /// Seconds since the Unix epoch, rounded toward negative infinity.
    pub fn unix_seconds(&self) -> i64 {
        (self.ticks as i128 - UNIX_EPOCH_TICKS as i128).div_euclid(TICKS_PER_SECOND as i128) as i64
    }

    /// Current system time. `None` if the clock is outside the representable range.
    pub fn now() -> Option<Self> {
        Self::try_from(SystemTime::now()).ok()
    }

    pub(crate) fn from_payload(payload: &[u8]) -> Self {
        Self {
            ticks: BigEndian::read_i64(payload),
        }
    }

    pub(crate) fn to_payload(self) -> [u8; 8] {
        let mut buf = [0u8; 8];
        BigEndian::write_i64(&mut buf, self.ticks);
        buf
    }
}

impl TimeSpan {
    pub const ZERO: TimeSpan = TimeSpan { ticks: 0 };

    pub const fn from_ticks(ticks: i64) -> Self {
        Self { ticks }
    }

    pub const fn ticks(&self) -> i64 {
        self.ticks
    }

    pub fn from_secs(secs: i64) -> Option<Self> {
        Some(Self {
            ticks: secs.checked_mul(TICKS_PER_SECOND)?,
        })
    }

    pub fn is_negative(&self) -> bool {
        self.ticks < 0
    }

    pub(crate) fn from_payload(payload: &[u8]) -> Self {
        Self {
            ticks: BigEndian::read_i64(payload),
        }
    }

    pub(crate) fn to_payload(self) -> [u8; 8] {
        let mut buf = [0u8; 8];
        BigEndian::write_i64(&mut buf, self.ticks);
        buf
    }
}

fn duration_to_ticks(d: Duration) -> Option<i64> {
    let ticks = d.as_nanos() / NANOS_PER_TICK as u128;
    i64::try_from(ticks).ok()
}

fn ticks_to_duration(ticks: u64) -> Duration {
    Duration::new(
        ticks / TICKS_PER_SECOND as u64,
        ((ticks % TICKS_PER_SECOND as u64) * NANOS_PER_TICK as u64) as u32,
    )
}

impl TryFrom<SystemTime> for DateTime {
    type Error = SystemTime;
    fn try_from(t: SystemTime) -> Result<Self, Self::Error> {
        let ticks = match t.duration_since(UNIX_EPOCH) {
            Ok(after) => duration_to_ticks(after).and_then(|d| UNIX_EPOCH_TICKS.checked_add(d)),
            Err(before) => {
                duration_to_ticks(before.duration()).and_then(|d| UNIX_EPOCH_TICKS.checked_sub(d))
            }
        };
        ticks.map(DateTime::from_ticks).ok_or(t)
    }
}

impl TryFrom<DateTime> for SystemTime {
    type Error = DateTime;
    fn try_from(t: DateTime) -> Result<Self, Self::Error> {
        let offset = t.ticks as i128 - UNIX_EPOCH_TICKS as i128;
        let span = ticks_to_duration(offset.unsigned_abs() as u64);
        let res = if offset >= 0 {
            UNIX_EPOCH.checked_add(span)
        } else {
            UNIX_EPOCH.checked_sub(span)
        };
        res.ok_or(t)
    }
}

impl TryFrom<Duration> for TimeSpan {
    type Error = Duration;
    fn try_from(d: Duration) -> Result<Self, Self::Error> {
        duration_to_ticks(d).map(TimeSpan::from_ticks).ok_or(d)
    }
}

impl TryFrom<TimeSpan> for Duration {
    type Error = TimeSpan;
    /// Fails for negative spans.
    fn try_from(t: TimeSpan) -> Result<Self, Self::Error> {
        u64::try_from(t.ticks).map(ticks_to_duration).map_err(|_| t)
    }
}

impl ops::Add<TimeSpan> for DateTime {
    type Output = DateTime;
    fn add(self, rhs: TimeSpan) -> DateTime {
        DateTime {
            ticks: self.ticks.saturating_add(rhs.ticks),
        }
    }
}

impl ops::Sub for DateTime {
    type Output = TimeSpan;
    fn sub(self, rhs: DateTime) -> TimeSpan {
        TimeSpan {
            ticks: self.ticks.saturating_sub(rhs.ticks),
        }
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let offset = self.ticks as i128 - UNIX_EPOCH_TICKS as i128;
        let sub = offset.rem_euclid(TICKS_PER_SECOND as i128);
        write!(f, "UTC: {} sec + {} ticks", self.unix_seconds(), sub)
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ticks", self.ticks)
    }
}

impl Serialize for DateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_i64(self.ticks)
        } else {
            serializer.serialize_newtype_struct(CB_DATE_TIME, &self.ticks)
        }
    }
}

impl Serialize for TimeSpan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_i64(self.ticks)
        } else {
            serializer.serialize_newtype_struct(CB_TIME_SPAN, &self.ticks)
        }
    }
}

struct TicksVisitor;

impl<'de> serde::de::Visitor<'de> for TicksVisitor {
    type Value = i64;

    fn expecting(&self, fmt: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(fmt, "a tick count")
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(self, d: D) -> Result<i64, D::Error> {
        d.deserialize_i64(self)
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v)
            .map_err(|_| E::invalid_value(serde::de::Unexpected::Unsigned(v), &self))
    }
}

impl<'de> Deserialize<'de> for DateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ticks = if deserializer.is_human_readable() {
            deserializer.deserialize_i64(TicksVisitor)?
        } else {
            deserializer.deserialize_newtype_struct(CB_DATE_TIME, TicksVisitor)?
        };
        Ok(DateTime::from_ticks(ticks))
    }
}

impl<'de> Deserialize<'de> for TimeSpan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ticks = if deserializer.is_human_readable() {
            deserializer.deserialize_i64(TicksVisitor)?
        } else {
            deserializer.deserialize_newtype_struct(CB_TIME_SPAN, TicksVisitor)?
        };
        Ok(TimeSpan::from_ticks(ticks))
    }
}
