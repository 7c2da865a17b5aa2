//! Resolving attachment references against a content-addressed blob store.
//!
//! Documents only hold the hashes of what they reference. Finding everything a document depends
//! on means following each ObjectAttachment into the document it names, which needs a
//! [`BlobStore`] to fetch those documents from.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::RwLock;

use tracing::{trace, warn};

use crate::{
    error::{Error, Result},
    field::Field,
    field_type::FieldType,
    hash::IoHash,
};

/// A store of blobs named by their [`IoHash`].
pub trait BlobStore {
    /// Bytes stored under `hash`, if any.
    fn fetch(&self, hash: &IoHash) -> Result<Option<Vec<u8>>>;

    fn contains(&self, hash: &IoHash) -> Result<bool> {
        Ok(self.fetch(hash)?.is_some())
    }

    /// Store `data`, returning the hash it can be fetched by.
    fn store(&self, data: &[u8]) -> Result<IoHash>;
}

/// A [`BlobStore`] held in memory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<IoHash, Vec<u8>>>,
}

fn poisoned<T>(_: T) -> Error {
    Error::Store("blob store lock poisoned".into())
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn remove(&self, hash: &IoHash) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.write().map_err(poisoned)?.remove(hash))
    }
}

impl BlobStore for MemoryBlobStore {
    fn fetch(&self, hash: &IoHash) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.read().map_err(poisoned)?.get(hash).cloned())
    }

    fn contains(&self, hash: &IoHash) -> Result<bool> {
        Ok(self.blobs.read().map_err(poisoned)?.contains_key(hash))
    }

    fn store(&self, data: &[u8]) -> Result<IoHash> {
        let hash = IoHash::compute(data);
        self.blobs
            .write()
            .map_err(poisoned)?
            .entry(hash)
            .or_insert_with(|| data.to_vec());
        Ok(hash)
    }
}

/// Everything reachable from a document through its attachments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct References {
    /// Documents reached through ObjectAttachments, in breadth-first order.
    pub objects: Vec<IoHash>,
    /// Blobs reached through BinaryAttachments, in the order first seen.
    pub binaries: Vec<IoHash>,
}

#[derive(Default)]
struct Walk {
    refs: References,
    seen: HashSet<IoHash>,
    /// Documents still to fetch and scan.
    pending: VecDeque<IoHash>,
    missing: Vec<IoHash>,
}

/// Walks attachment references, following ObjectAttachments through a [`BlobStore`].
pub struct ReferenceResolver<'s, S: BlobStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: BlobStore + ?Sized> ReferenceResolver<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Find every document and blob reachable from `root`. Each hash is reported once, and zero
    /// hashes are skipped.
    ///
    /// Fails with [`Error::MissingReferences`] if any reachable hash is absent from the store, and
    /// with a parse error if a referenced document is malformed.
    pub fn resolve(&self, root: &Field) -> Result<References> {
        let mut walk = Walk::default();
        self.scan(root, &mut walk)?;
        while let Some(hash) = walk.pending.pop_front() {
            let Some(bytes) = self.store.fetch(&hash)? else {
                warn!(%hash, "referenced document is missing");
                walk.missing.push(hash);
                continue;
            };
            trace!(%hash, len = bytes.len(), "fetched referenced document");
            walk.refs.objects.push(hash);
            let doc = Field::new(&bytes)?;
            self.scan(&doc, &mut walk)?;
        }

        if walk.missing.is_empty() {
            Ok(walk.refs)
        } else {
            Err(Error::MissingReferences(walk.missing))
        }
    }

    fn scan(&self, doc: &Field, walk: &mut Walk) -> Result<()> {
        let mut found = Vec::new();
        doc.iterate_attachments(|mut f| found.push((f.kind(), f.as_attachment(IoHash::ZERO))));
        for (kind, hash) in found {
            if hash.is_zero() || !walk.seen.insert(hash) {
                continue;
            }
            trace!(%hash, ?kind, "found attachment reference");
            if kind == FieldType::ObjectAttachment {
                walk.pending.push_back(hash);
            } else if self.store.contains(&hash)? {
                walk.refs.binaries.push(hash);
            } else {
                warn!(%hash, "referenced blob is missing");
                walk.missing.push(hash);
            }
        }
        Ok(())
    }

    /// Every blob reachable from `root` through BinaryAttachments, including those in referenced
    /// documents.
    pub fn referenced_blobs(&self, root: &Field) -> Result<Vec<IoHash>> {
        self.resolve(root).map(|refs| refs.binaries)
    }
}
