//! The `.nxb` Bundle Format
//!
//! Bundle layout:
//! ```text
//! +-------+---------+-------------+----------+------------------+
//! | magic | version | variant tag | reserved | rkyv payload     |
//! | 4     | 1       | 1           | 2        | BundleTree       |
//! +-------+---------+-------------+----------+------------------+
//! ```
//!
//! The payload is an rkyv-archived [`BundleTree`]: a flat node table in
//! preorder (index 0 is the root), each node carrying a name-sorted child
//! table, plus a side table of LZ4-compressed image payloads. The sorted
//! child tables are what makes the zero-copy reader's binary-search lookup
//! possible; eager readers build their own indexes on top.

use fxhash::FxHashMap;
use nxbench_core::{ArchiveError, Variant};
use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Magic bytes opening every bundle.
pub const MAGIC: [u8; 4] = *b"NXB1";

/// Current bundle format version.
pub const FORMAT_VERSION: u8 = 1;

const HEADER_LEN: usize = 8;

/// Archived payload of a bundle.
#[derive(Debug, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct BundleTree {
    /// Flat node table; index 0 is the root.
    pub(crate) nodes: Vec<BundleNode>,
    /// LZ4-compressed image payloads referenced by nodes.
    pub(crate) images: Vec<Vec<u8>>,
}

/// One node of the flat table.
#[derive(Debug, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct BundleNode {
    /// Node name, unique among siblings.
    pub(crate) name: String,
    /// Child node indexes, sorted by child name.
    pub(crate) children: Vec<u32>,
    /// Index into the image table if this node is an image-bearing leaf.
    pub(crate) image: Option<u32>,
}

/// Handle to a node while building a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(u32);

/// Builds `.nxb` bundles for tests and fixtures.
pub struct BundleBuilder {
    nodes: Vec<BundleNode>,
    images: Vec<Vec<u8>>,
    variant: Variant,
}

impl BundleBuilder {
    /// Start a bundle for `variant` with an empty root node.
    pub fn new(variant: Variant) -> Self {
        Self {
            nodes: vec![BundleNode {
                name: String::new(),
                children: Vec::new(),
                image: None,
            }],
            images: Vec::new(),
            variant,
        }
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Add a child node under `parent`. Sibling names must be unique.
    pub fn add_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = self.nodes.len() as u32;
        self.nodes.push(BundleNode {
            name: name.to_string(),
            children: Vec::new(),
            image: None,
        });
        self.nodes[parent.0 as usize].children.push(id);
        NodeId(id)
    }

    /// Add an image-bearing leaf under `parent`. The payload is stored
    /// LZ4-compressed and decoded lazily by readers.
    pub fn add_image_child(&mut self, parent: NodeId, name: &str, pixels: &[u8]) -> NodeId {
        let id = self.add_child(parent, name);
        let image = self.images.len() as u32;
        self.images.push(lz4_flex::compress_prepend_size(pixels));
        self.nodes[id.0 as usize].image = Some(image);
        id
    }

    /// Write the bundle to `path`, sorting every child table by name.
    pub fn write_to(&self, path: &Path) -> Result<(), ArchiveError> {
        let nodes: Vec<BundleNode> = self
            .nodes
            .iter()
            .map(|node| {
                let mut children = node.children.clone();
                children.sort_by(|&a, &b| {
                    self.nodes[a as usize].name.cmp(&self.nodes[b as usize].name)
                });
                BundleNode {
                    name: node.name.clone(),
                    children,
                    image: node.image,
                }
            })
            .collect();
        let tree = BundleTree {
            nodes,
            images: self.images.clone(),
        };

        let payload = rkyv::to_bytes::<_, 1024>(&tree)
            .map_err(|e| ArchiveError::Format(format!("serialization failed: {e}")))?;

        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(&MAGIC)?;
        out.write_all(&[FORMAT_VERSION, self.variant.tag(), 0, 0])?;
        out.write_all(&payload)?;
        out.flush()?;
        Ok(())
    }
}

/// Read a bundle's header and return its archived payload in an aligned
/// buffer. The caller validates the payload once before any archived
/// access.
pub(crate) fn read_payload(path: &Path, variant: Variant) -> Result<rkyv::AlignedVec, ArchiveError> {
    let file = File::open(path)?;
    let size = file.metadata()?.len() as usize;
    if size < HEADER_LEN {
        return Err(ArchiveError::Format("truncated bundle header".to_string()));
    }
    let mut reader = BufReader::new(file);

    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header)?;
    if header[0..4] != MAGIC {
        return Err(ArchiveError::Format("bad magic, not a bundle".to_string()));
    }
    if header[4] != FORMAT_VERSION {
        return Err(ArchiveError::Format(format!(
            "unsupported bundle version {}",
            header[4]
        )));
    }
    match Variant::from_tag(header[5]) {
        Some(found) if found == variant => {}
        Some(found) => {
            return Err(ArchiveError::Format(format!(
                "bundle requires the {found:?} variant, opened as {variant:?}"
            )));
        }
        None => {
            return Err(ArchiveError::Format(format!(
                "unknown variant tag {}",
                header[5]
            )));
        }
    }

    let mut payload = rkyv::AlignedVec::with_capacity(size - HEADER_LEN);
    payload.resize(size - HEADER_LEN, 0);
    reader.read_exact(&mut payload[..])?;
    Ok(payload)
}

/// Per-file cache of decoded image payloads, keyed by image-table index.
/// Execution is single-threaded, so a `RefCell` is enough.
pub(crate) type DecodeCache = RefCell<FxHashMap<u32, Vec<u8>>>;

/// Decode `blob` into `cache` under `index`, or return the cached length.
pub(crate) fn decode_cached(
    cache: &DecodeCache,
    blob: &[u8],
    index: u32,
) -> Result<usize, ArchiveError> {
    let mut cache = cache.borrow_mut();
    if let Some(pixels) = cache.get(&index) {
        return Ok(pixels.len());
    }
    let pixels = lz4_flex::decompress_size_prepended(blob)
        .map_err(|e| ArchiveError::Format(format!("LZ4 decompression failed: {e}")))?;
    let len = pixels.len();
    cache.insert(index, pixels);
    Ok(len)
}

/// Drop the decoded buffer cached under `index`, if any.
pub(crate) fn evict(cache: &DecodeCache, index: u32) {
    cache.borrow_mut().remove(&index);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LazyFile;
    use crate::testutil::sample_bundle;
    use nxbench_core::TreeArchive;
    use std::io::Write as _;

    #[test]
    fn test_header_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample_bundle(dir.path(), Variant::Classic);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[0..4], &MAGIC);
        assert_eq!(bytes[4], FORMAT_VERSION);
        assert_eq!(bytes[5], Variant::Classic.tag());
    }

    #[test]
    fn test_bad_magic_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a-bundle.nxb");
        std::fs::write(&path, b"PKG4\x01\x00\x00\x00garbage").unwrap();

        let err = LazyFile::open(&path, Variant::Plain).unwrap_err();
        assert!(matches!(err, ArchiveError::Format(ref msg) if msg.contains("magic")));
    }

    #[test]
    fn test_truncated_bundle_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.nxb");
        std::fs::write(&path, b"NXB1").unwrap();

        let err = LazyFile::open(&path, Variant::Plain).unwrap_err();
        assert!(matches!(err, ArchiveError::Format(ref msg) if msg.contains("truncated")));
    }

    #[test]
    fn test_corrupt_payload_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.nxb");
        let mut out = std::fs::File::create(&path).unwrap();
        out.write_all(&MAGIC).unwrap();
        out.write_all(&[FORMAT_VERSION, 0, 0, 0]).unwrap();
        out.write_all(&[0xFF; 64]).unwrap();

        let err = LazyFile::open(&path, Variant::Plain).unwrap_err();
        assert!(matches!(err, ArchiveError::Format(_)));
    }

    #[test]
    fn test_variant_mismatch_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample_bundle(dir.path(), Variant::Classic);

        let err = LazyFile::open(&path, Variant::Plain).unwrap_err();
        assert!(matches!(err, ArchiveError::Format(ref msg) if msg.contains("variant")));
        assert!(LazyFile::open(&path, Variant::Classic).is_ok());
    }

    #[test]
    fn test_unsupported_version_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.nxb");
        let mut bytes = std::fs::read(sample_bundle(dir.path(), Variant::Plain)).unwrap();
        bytes[4] = FORMAT_VERSION + 1;
        std::fs::write(&path, bytes).unwrap();

        let err = LazyFile::open(&path, Variant::Plain).unwrap_err();
        assert!(matches!(err, ArchiveError::Format(ref msg) if msg.contains("version")));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = LazyFile::open(Path::new("/nonexistent/bundle.nxb"), Variant::Plain).unwrap_err();
        assert!(matches!(err, ArchiveError::Io(_)));
    }
}
