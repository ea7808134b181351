#![warn(missing_docs)]
//! nxbench Reference Archives
//!
//! The upstream archive libraries nxbench was built to measure have no Rust
//! ports, so this crate ships reference implementations of the collaborator
//! interface over a single on-disk format, the `.nxb` bundle. Each reader
//! models one library's parsing strategy:
//! - [`LazyFile`]: validate-once zero-copy access, children resolved by
//!   binary search over name-sorted tables, everything decoded on demand
//! - [`IndexedFile`]: the whole tree materialized at open with a per-node
//!   hashed child index
//! - [`ScannedFile`]: materialized tree, naive linear name lookup
//!
//! Image payloads are LZ4-compressed in the bundle and decoded lazily into
//! a per-file cache; `dispose` evicts a decoded buffer.

mod bundle;
mod eager;
mod lazy;

pub use bundle::{BundleBuilder, BundleNode, FORMAT_VERSION, MAGIC, NodeId};
pub use eager::{ChildIndex, EagerFile, HashIndex, IndexedFile, LinearIndex, ScannedFile};
pub use lazy::LazyFile;
