//! Walking the attachment references held in a document.

use crate::{field::Field, hash::IoHash, iter::open_container};

fn walk<'a>(field: &Field<'a>, visit: &mut dyn FnMut(Field<'a>)) {
    let kind = field.kind();
    if kind.is_attachment() {
        visit(*field);
        return;
    }
    if !kind.has_fields() {
        return;
    }
    // Uniform runs of scalars that aren't attachments can be skipped whole.
    if kind.is_uniform() {
        if let Ok(parts) = open_container(kind, field.payload()) {
            if let Some(shared) = parts.shared {
                let member = shared.kind();
                if !member.is_attachment() && !member.has_fields() {
                    return;
                }
            }
        }
    }
    for child in field.iter() {
        walk(&child, visit);
    }
}

impl<'a> Field<'a> {
    /// Call `visit` on every ObjectAttachment and BinaryAttachment field in this field, this field
    /// included, depth-first in document order. Duplicates are visited each time they appear.
    pub fn iterate_attachments<F: FnMut(Field<'a>)>(&self, mut visit: F) {
        walk(self, &mut visit)
    }
}

/// Every attachment hash in `root`, in document order.
pub fn collect_attachments(root: &Field) -> Vec<IoHash> {
    let mut hashes = Vec::new();
    root.iterate_attachments(|mut f| hashes.push(f.as_attachment(IoHash::ZERO)));
    hashes
}

/// Number of attachment fields of each kind in a document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttachmentCounts {
    pub binary: usize,
    pub object: usize,
}

impl AttachmentCounts {
    pub fn of(root: &Field) -> Self {
        let mut counts = Self::default();
        root.iterate_attachments(|f| {
            if f.is_object_attachment() {
                counts.object += 1;
            } else {
                counts.binary += 1;
            }
        });
        counts
    }

    pub fn total(&self) -> usize {
        self.binary + self.object
    }
}
