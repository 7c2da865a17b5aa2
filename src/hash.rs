//! Content hashes.
//!
//! [`IoHash`] is the 160-bit hash that names attachments and fills Hash fields: the first 20 bytes
//! of a BLAKE3 digest. [`Blake3Hash`] is the full 256-bit digest, used to fingerprint a field's
//! canonical bytes.

use std::fmt;
use std::str::FromStr;

use serde::{
    de::{self, Deserialize, Deserializer, SeqAccess, Visitor},
    ser::{Serialize, Serializer},
};
use serde_bytes::Bytes;

use crate::ser::{CB_BINARY_ATTACHMENT, CB_HASH, CB_OBJECT_ATTACHMENT};

pub const IO_HASH_BYTES: usize = 20;
pub const BLAKE3_HASH_BYTES: usize = 32;

/// 160-bit content hash.
///
/// The all-zero hash is the canonical "no reference" value.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IoHash([u8; IO_HASH_BYTES]);

impl IoHash {
    pub const ZERO: IoHash = IoHash([0; IO_HASH_BYTES]);

    pub const fn from_bytes(digest: [u8; IO_HASH_BYTES]) -> Self {
        Self(digest)
    }

    /// Hash a single buffer.
    pub fn compute(data: &[u8]) -> Self {
        let mut state = IoHashState::new();
        state.update(data);
        state.finalize()
    }

    /// Take the first 20 bytes of a slice. `None` if it's too short.
    pub fn from_slice(data: &[u8]) -> Option<Self> {
        let digest = data.get(..IO_HASH_BYTES)?;
        let mut hash = [0u8; IO_HASH_BYTES];
        hash.copy_from_slice(digest);
        Some(Self(hash))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; IO_HASH_BYTES]
    }

    pub fn digest(&self) -> &[u8; IO_HASH_BYTES] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for IoHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Blake3Hash> for IoHash {
    fn from(hash: Blake3Hash) -> Self {
        let mut digest = [0u8; IO_HASH_BYTES];
        digest.copy_from_slice(&hash.0[..IO_HASH_BYTES]);
        Self(digest)
    }
}

impl fmt::Display for IoHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for IoHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "IoHash({})", self.to_hex())
    }
}

impl FromStr for IoHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut digest = [0u8; IO_HASH_BYTES];
        hex::decode_to_slice(s, &mut digest)?;
        Ok(Self(digest))
    }
}

/// Incremental hasher producing an [`IoHash`].
#[derive(Clone, Debug, Default)]
pub struct IoHashState {
    state: blake3::Hasher,
}

impl IoHashState {
    pub fn new() -> Self {
        Self {
            state: blake3::Hasher::new(),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.state.update(data);
    }

    pub fn finalize(&self) -> IoHash {
        Blake3Hash(*self.state.finalize().as_bytes()).into()
    }
}

/// Full 256-bit BLAKE3 digest.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Blake3Hash([u8; BLAKE3_HASH_BYTES]);

impl Blake3Hash {
    pub const fn from_bytes(digest: [u8; BLAKE3_HASH_BYTES]) -> Self {
        Self(digest)
    }

    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    pub(crate) fn from_hasher(hasher: &blake3::Hasher) -> Self {
        Self(*hasher.finalize().as_bytes())
    }

    pub fn digest(&self) -> &[u8; BLAKE3_HASH_BYTES] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for Blake3Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Blake3Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Blake3Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Blake3Hash({})", self.to_hex())
    }
}

/// Reference to another compact binary document by hash.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectAttachment(pub IoHash);

/// Reference to an opaque blob by hash.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BinaryAttachment(pub IoHash);

impl ObjectAttachment {
    pub const ZERO: ObjectAttachment = ObjectAttachment(IoHash::ZERO);

    pub fn hash(&self) -> &IoHash {
        &self.0
    }
}

impl BinaryAttachment {
    pub const ZERO: BinaryAttachment = BinaryAttachment(IoHash::ZERO);

    pub fn hash(&self) -> &IoHash {
        &self.0
    }
}

impl From<IoHash> for ObjectAttachment {
    fn from(hash: IoHash) -> Self {
        Self(hash)
    }
}

impl From<IoHash> for BinaryAttachment {
    fn from(hash: IoHash) -> Self {
        Self(hash)
    }
}

// Hash-like values travel through serde as a newtype with a reserved name around the raw digest,
// which lets the compact binary serializer pick the matching field kind. Human-readable formats
// get hex.
fn serialize_hash<S: Serializer>(
    serializer: S,
    name: &'static str,
    hash: &IoHash,
) -> Result<S::Ok, S::Error> {
    if serializer.is_human_readable() {
        serializer.serialize_str(&hash.to_hex())
    } else {
        serializer.serialize_newtype_struct(name, Bytes::new(&hash.0))
    }
}

struct HashVisitor;

impl<'de> Visitor<'de> for HashVisitor {
    type Value = IoHash;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a {}-byte hash", IO_HASH_BYTES)
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(self, d: D) -> Result<IoHash, D::Error> {
        d.deserialize_bytes(self)
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<IoHash, E> {
        if v.len() != IO_HASH_BYTES {
            return Err(E::invalid_length(v.len(), &self));
        }
        IoHash::from_slice(v).ok_or_else(|| E::invalid_length(v.len(), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<IoHash, E> {
        v.parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<IoHash, A::Error> {
        let mut digest = [0u8; IO_HASH_BYTES];
        for (i, b) in digest.iter_mut().enumerate() {
            *b = seq
                .next_element()?
                .ok_or_else(|| de::Error::invalid_length(i, &self))?;
        }
        Ok(IoHash(digest))
    }
}

fn deserialize_hash<'de, D: Deserializer<'de>>(
    deserializer: D,
    name: &'static str,
) -> Result<IoHash, D::Error> {
    if deserializer.is_human_readable() {
        deserializer.deserialize_str(HashVisitor)
    } else {
        deserializer.deserialize_newtype_struct(name, HashVisitor)
    }
}

impl Serialize for IoHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_hash(serializer, CB_HASH, self)
    }
}

impl<'de> Deserialize<'de> for IoHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_hash(deserializer, CB_HASH)
    }
}

impl Serialize for ObjectAttachment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_hash(serializer, CB_OBJECT_ATTACHMENT, &self.0)
    }
}

impl<'de> Deserialize<'de> for ObjectAttachment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_hash(deserializer, CB_OBJECT_ATTACHMENT).map(ObjectAttachment)
    }
}

impl Serialize for BinaryAttachment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_hash(serializer, CB_BINARY_ATTACHMENT, &self.0)
    }
}

impl<'de> Deserialize<'de> for BinaryAttachment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_hash(deserializer, CB_BINARY_ATTACHMENT).map(BinaryAttachment)
    }
}
