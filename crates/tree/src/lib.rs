//! # Tree - EddyKV Storage Tree
//!
//! The central orchestrator that ties together the [`memtable`], [`wal`],
//! [`bloom`], and [`segment`] crates into a complete LSM-tree key-value
//! store.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                    TREE                       │
//! │                                               │
//! │ write.rs → WAL append → Memtable insert       │
//! │              |                                │
//! │              |  (threshold exceeded?)         │
//! │              |            yes                 │
//! │              v                                │
//! │           flush → new segment + WAL reset     │
//! │                                               │
//! │ merge.rs → fuse two adjacent segments,        │
//! │            newer value wins key ties          │
//! │                                               │
//! │ read.rs → Memtable → bloom gate → segments    │
//! │            newest-first, first match wins     │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module       | Purpose                                                |
//! |--------------|--------------------------------------------------------|
//! | `lib.rs`     | `Tree` struct, open, options, accessors, `Debug`       |
//! | [`recovery`] | Segment discovery, bloom + memtable rebuild, tmp cleanup |
//! | [`write`]    | `put()`, `flush()`, internal memtable sealing          |
//! | [`read`]     | `fetch()`                                              |
//! | [`merge`]    | Caller-driven two-segment merge                        |
//!
//! ## Recency
//!
//! ```text
//! ┌────────────────────────────┐  ← freshest, checked first
//! │ MEMTABLE                   │
//! ├────────────────────────────┤
//! │ segment-<highest id>.data  │
//! ├────────────────────────────┤
//! │ ...                        │
//! ├────────────────────────────┤  ← oldest, checked last
//! │ segment-1.data             │
//! └────────────────────────────┘
//! ```
//!
//! Segment ids are assigned at flush time and strictly increase, so the id
//! *is* the recency order and the descending in-memory id list is the read
//! path's search order. No manifest is needed.
//!
//! ## Crash Safety
//!
//! Every write is appended (and fsynced) to the WAL **before** the memtable
//! insert. The WAL is reset only **after** a successful flush has sealed the
//! memtable into a segment. Segments and merges are written to a temp file
//! and renamed into place atomically; leftover temp files are swept on open.
//! Recovery replays the WAL into a fresh memtable and rebuilds the bloom
//! filter by streaming every segment.

mod merge;
mod read;
mod recovery;
mod write;

use anyhow::Result;
use bloom::BloomFilter;
use memtable::Memtable;
use std::path::{Path, PathBuf};
use thiserror::Error;
use wal::Wal;

pub use codec::Value;

/// Default memtable byte-size threshold that triggers a flush.
pub const DEFAULT_FLUSH_THRESHOLD: usize = 1_000_000;

/// Tuning knobs for opening a tree.
#[derive(Debug, Clone)]
pub struct TreeOptions {
    /// Memtable byte size above which a `put` seals a new segment.
    pub flush_threshold: usize,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
        }
    }
}

/// Typed merge preconditions, surfaced through the `anyhow` boundary so
/// callers can downcast.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// Both merge arguments named the same segment.
    #[error("cannot merge segment {0} with itself")]
    SelfMerge(u64),

    /// The first merge argument must be the older (smaller) id.
    #[error("merge arguments out of order: {older} is not older than {newer}")]
    MergeOutOfOrder {
        /// What the caller passed as the older id.
        older: u64,
        /// What the caller passed as the newer id.
        newer: u64,
    },
}

/// An LSM-tree over one exclusively-owned directory.
///
/// # Write Path
///
/// 1. Append the encoded `(key, value)` pair to the WAL (fsynced).
/// 2. Insert into the in-memory memtable (replacing any prior value).
/// 3. If the memtable's byte size exceeds `flush_threshold`, seal it as
///    `segment-<max id + 1>.data` and reset the WAL.
///
/// # Read Path
///
/// 1. Check the memtable (freshest data).
/// 2. Ask the bloom filter; a negative answer is definitive.
/// 3. Scan segments newest to oldest; the first match wins.
///
/// # Recovery
///
/// On [`Tree::open`] the directory is scanned for segment files (ids sorted
/// descending), the bloom filter is rebuilt by streaming every segment, and
/// the memtable is rebuilt by replaying `db.wal`.
///
/// # Concurrency
///
/// Single-writer: `put`, `flush`, and `merge` must be serialized by the
/// caller, and `fetch` must not race them. One `Tree` instance owns its
/// directory for its lifetime.
pub struct Tree {
    pub(crate) dir: PathBuf,
    /// Known segment ids, newest first.
    pub(crate) segments: Vec<u64>,
    pub(crate) flush_threshold: usize,
    pub(crate) mem: Memtable,
    /// Tracks the union of segment keys only; memtable-only keys may be
    /// absent. Never persisted; rebuilt from segments on open.
    pub(crate) bloom: BloomFilter,
    pub(crate) wal: Wal,
}

impl std::fmt::Debug for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("dir", &self.dir)
            .field("segments", &self.segments)
            .field("flush_threshold", &self.flush_threshold)
            .field("memtable_entries", &self.mem.len())
            .field("memtable_bytes", &self.mem.byte_size())
            .field("bloom_size", &self.bloom.size())
            .finish()
    }
}

impl Tree {
    /// Opens (or creates) the tree at `dir` with default options.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::open_with(dir, TreeOptions::default())
    }

    /// Opens (or creates) the tree at `dir`, performing full recovery from
    /// any segments and WAL already present.
    ///
    /// # Recovery Steps
    ///
    /// 1. Create the directory if it does not exist.
    /// 2. Sweep leftover `.tmp` files from interrupted writes.
    /// 3. Collect segment ids from filenames, sorted descending.
    /// 4. Rebuild the bloom filter by streaming every segment.
    /// 5. Replay `db.wal` into a fresh memtable (before the WAL handle is
    ///    opened for appending).
    /// 6. Ensure an empty WAL exists.
    pub fn open_with<P: AsRef<Path>>(dir: P, options: TreeOptions) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        recovery::cleanup_temp_files(&dir);

        let segments = recovery::discover_segments(&dir)?;
        let bloom = recovery::rebuild_bloom(&dir, &segments)?;
        let mem = recovery::rebuild_memtable(&dir)?;
        let wal = Wal::open(&dir)?;

        log::debug!(
            "opened tree at {} ({} segments, {} replayed writes)",
            dir.display(),
            segments.len(),
            mem.len()
        );

        Ok(Self {
            dir,
            segments,
            flush_threshold: options.flush_threshold,
            mem,
            bloom,
            wal,
        })
    }

    /// Returns the directory this tree owns.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// Returns the known segment ids, newest first.
    #[must_use]
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    /// Returns the flush threshold in bytes.
    #[must_use]
    pub fn flush_threshold(&self) -> usize {
        self.flush_threshold
    }

    /// Returns the number of entries currently buffered in the memtable.
    #[must_use]
    pub fn memtable_len(&self) -> usize {
        self.mem.len()
    }

    /// Returns the memtable's current byte size.
    #[must_use]
    pub fn memtable_byte_size(&self) -> usize {
        self.mem.byte_size()
    }

    /// Returns the bloom filter covering the union of segment keys.
    ///
    /// Exposed so recovery can be verified structurally: a reopened tree's
    /// filter equals one built from the same insertions.
    #[must_use]
    pub fn bloom(&self) -> &BloomFilter {
        &self.bloom
    }
}

#[cfg(test)]
mod tests;
