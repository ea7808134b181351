//! Eager Readers
//!
//! Materialize the whole node tree at open, the way parse-on-open libraries
//! do. Child lookup goes through a pluggable [`ChildIndex`]: a per-node
//! hashed index built during open, or a naive linear scan modeling the
//! legacy-library baseline. Image payloads stay compressed until decoded,
//! as in the zero-copy reader.

use crate::bundle::{self, BundleNode, BundleTree, DecodeCache};
use fxhash::FxHashMap;
use nxbench_core::{ArchiveError, ImagePayload, TreeArchive, TreeNode, Variant};
use rkyv::Deserialize;
use std::path::Path;

/// Child-lookup strategy of an [`EagerFile`].
pub trait ChildIndex: Sized {
    /// Build the index over the materialized node table.
    fn build(nodes: &[BundleNode]) -> Self;

    /// Resolve `name` among the children of `parent`.
    fn lookup(&self, nodes: &[BundleNode], parent: u32, name: &str) -> Option<u32>;
}

/// Per-node hashed child index, built once at open.
pub struct HashIndex {
    by_name: Vec<FxHashMap<String, u32>>,
}

impl ChildIndex for HashIndex {
    fn build(nodes: &[BundleNode]) -> Self {
        let by_name = nodes
            .iter()
            .map(|node| {
                node.children
                    .iter()
                    .map(|&id| (nodes[id as usize].name.clone(), id))
                    .collect()
            })
            .collect();
        Self { by_name }
    }

    fn lookup(&self, _nodes: &[BundleNode], parent: u32, name: &str) -> Option<u32> {
        self.by_name[parent as usize].get(name).copied()
    }
}

/// Linear scan over the child table on every lookup.
pub struct LinearIndex;

impl ChildIndex for LinearIndex {
    fn build(_nodes: &[BundleNode]) -> Self {
        Self
    }

    fn lookup(&self, nodes: &[BundleNode], parent: u32, name: &str) -> Option<u32> {
        nodes[parent as usize]
            .children
            .iter()
            .copied()
            .find(|&id| nodes[id as usize].name == name)
    }
}

/// Bundle handle with the tree fully materialized at open.
pub struct EagerFile<I> {
    tree: BundleTree,
    index: I,
    decoded: DecodeCache,
}

/// Eager reader with a hashed child index.
pub type IndexedFile = EagerFile<HashIndex>;

/// Eager reader with linear child lookup.
pub type ScannedFile = EagerFile<LinearIndex>;

impl<I: ChildIndex> TreeArchive for EagerFile<I> {
    type Node<'a>
        = EagerNode<'a, I>
    where
        Self: 'a;

    fn open(path: &Path, variant: Variant) -> Result<Self, ArchiveError> {
        let payload = bundle::read_payload(path, variant)?;
        let archived = rkyv::check_archived_root::<BundleTree>(&payload)
            .map_err(|e| ArchiveError::Format(format!("invalid bundle payload: {e}")))?;
        let tree: BundleTree = archived
            .deserialize(&mut rkyv::Infallible)
            .expect("infallible deserialization");
        if tree.nodes.is_empty() {
            return Err(ArchiveError::Format("empty node table".to_string()));
        }
        tracing::debug!(path = %path.display(), nodes = tree.nodes.len(), "materialized bundle");

        let index = I::build(&tree.nodes);
        Ok(Self {
            tree,
            index,
            decoded: DecodeCache::default(),
        })
    }

    fn root(&self) -> EagerNode<'_, I> {
        EagerNode {
            file: self,
            index: 0,
        }
    }
}

/// Borrowed node of an [`EagerFile`].
pub struct EagerNode<'a, I> {
    file: &'a EagerFile<I>,
    index: u32,
}

impl<I> std::fmt::Debug for EagerNode<'_, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EagerNode")
            .field("index", &self.index)
            .finish()
    }
}

impl<I> Clone for EagerNode<'_, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I> Copy for EagerNode<'_, I> {}

impl<I> PartialEq for EagerNode<'_, I> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.file, other.file) && self.index == other.index
    }
}

impl<'a, I: ChildIndex> TreeNode for EagerNode<'a, I> {
    type Children = EagerChildren<'a, I>;
    type Image = EagerImage<'a, I>;

    fn name(&self) -> &str {
        &self.file.tree.nodes[self.index as usize].name
    }

    fn children(&self) -> EagerChildren<'a, I> {
        EagerChildren {
            file: self.file,
            ids: self.file.tree.nodes[self.index as usize].children.iter(),
        }
    }

    fn child(&self, name: &str) -> Option<Self> {
        self.file
            .index
            .lookup(&self.file.tree.nodes, self.index, name)
            .map(|index| EagerNode {
                file: self.file,
                index,
            })
    }

    fn image(&self) -> Option<EagerImage<'a, I>> {
        let file = self.file;
        file.tree.nodes[self.index as usize]
            .image
            .map(|index| EagerImage { file, index })
    }
}

/// Iterator over an [`EagerNode`]'s children.
pub struct EagerChildren<'a, I> {
    file: &'a EagerFile<I>,
    ids: std::slice::Iter<'a, u32>,
}

impl<'a, I> Iterator for EagerChildren<'a, I> {
    type Item = EagerNode<'a, I>;

    fn next(&mut self) -> Option<EagerNode<'a, I>> {
        self.ids.next().map(|&index| EagerNode {
            file: self.file,
            index,
        })
    }
}

/// Lazily-decoded image payload of an [`EagerNode`].
pub struct EagerImage<'a, I> {
    file: &'a EagerFile<I>,
    index: u32,
}

impl<I> ImagePayload for EagerImage<'_, I> {
    fn decode(&self) -> Result<usize, ArchiveError> {
        let blob = &self.file.tree.images[self.index as usize];
        bundle::decode_cached(&self.file.decoded, blob, self.index)
    }

    fn dispose(&self) {
        bundle::evict(&self.file.decoded, self.index);
    }
}
