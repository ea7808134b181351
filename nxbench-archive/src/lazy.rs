//! Zero-Copy Lazy Reader
//!
//! Opens a bundle by validating the archived payload once, then serves every
//! node access straight out of the file bytes. Child lookup binary-searches
//! the name-sorted child tables; nothing is materialized until asked for.

use crate::bundle::{self, ArchivedBundleNode, ArchivedBundleTree, BundleTree, DecodeCache};
use nxbench_core::{ArchiveError, ImagePayload, TreeArchive, TreeNode, Variant};
use std::path::Path;

/// Zero-copy bundle handle.
pub struct LazyFile {
    payload: rkyv::AlignedVec,
    decoded: DecodeCache,
}

impl std::fmt::Debug for LazyFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyFile").finish_non_exhaustive()
    }
}

impl LazyFile {
    fn tree(&self) -> &ArchivedBundleTree {
        // SAFETY: `payload` was validated by `check_archived_root` in
        // `open` and is immutable for the life of the handle.
        unsafe { rkyv::archived_root::<BundleTree>(&self.payload) }
    }
}

impl TreeArchive for LazyFile {
    type Node<'a>
        = LazyNode<'a>
    where
        Self: 'a;

    fn open(path: &Path, variant: Variant) -> Result<Self, ArchiveError> {
        let payload = bundle::read_payload(path, variant)?;
        let archived = rkyv::check_archived_root::<BundleTree>(&payload)
            .map_err(|e| ArchiveError::Format(format!("invalid bundle payload: {e}")))?;
        if archived.nodes.is_empty() {
            return Err(ArchiveError::Format("empty node table".to_string()));
        }
        tracing::debug!(path = %path.display(), nodes = archived.nodes.len(), "opened bundle");

        Ok(Self {
            payload,
            decoded: DecodeCache::default(),
        })
    }

    fn root(&self) -> LazyNode<'_> {
        LazyNode {
            file: self,
            index: 0,
        }
    }
}

/// Borrowed node of a [`LazyFile`].
#[derive(Clone, Copy)]
pub struct LazyNode<'a> {
    file: &'a LazyFile,
    index: u32,
}

impl std::fmt::Debug for LazyNode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyNode")
            .field("index", &self.index)
            .finish()
    }
}

impl LazyNode<'_> {
    fn data(&self) -> &ArchivedBundleNode {
        &self.file.tree().nodes[self.index as usize]
    }
}

impl PartialEq for LazyNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.file, other.file) && self.index == other.index
    }
}

impl<'a> TreeNode for LazyNode<'a> {
    type Children = LazyChildren<'a>;
    type Image = LazyImage<'a>;

    fn name(&self) -> &str {
        self.data().name.as_str()
    }

    fn children(&self) -> LazyChildren<'a> {
        let data = &self.file.tree().nodes[self.index as usize];
        LazyChildren {
            file: self.file,
            ids: data.children.iter(),
        }
    }

    fn child(&self, name: &str) -> Option<Self> {
        let nodes = &self.file.tree().nodes;
        let ids = &nodes[self.index as usize].children;
        let pos = ids
            .binary_search_by(|&id| nodes[id as usize].name.as_str().cmp(name))
            .ok()?;
        Some(LazyNode {
            file: self.file,
            index: ids[pos],
        })
    }

    fn image(&self) -> Option<LazyImage<'a>> {
        let file = self.file;
        let data = &file.tree().nodes[self.index as usize];
        data.image.as_ref().map(|&index| LazyImage { file, index })
    }
}

/// Iterator over a [`LazyNode`]'s children.
pub struct LazyChildren<'a> {
    file: &'a LazyFile,
    ids: std::slice::Iter<'a, u32>,
}

impl<'a> Iterator for LazyChildren<'a> {
    type Item = LazyNode<'a>;

    fn next(&mut self) -> Option<LazyNode<'a>> {
        self.ids.next().map(|&index| LazyNode {
            file: self.file,
            index,
        })
    }
}

/// Lazily-decoded image payload of a [`LazyNode`].
pub struct LazyImage<'a> {
    file: &'a LazyFile,
    index: u32,
}

impl ImagePayload for LazyImage<'_> {
    fn decode(&self) -> Result<usize, ArchiveError> {
        let blob = &self.file.tree().images[self.index as usize];
        bundle::decode_cached(&self.file.decoded, blob.as_slice(), self.index)
    }

    fn dispose(&self) {
        bundle::evict(&self.file.decoded, self.index);
    }
}
