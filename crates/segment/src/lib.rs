//! # Segment - Immutable Sorted Runs
//!
//! On-disk storage files for the EddyKV storage tree.
//!
//! When the in-memory memtable exceeds its size threshold the tree seals it
//! as a segment. Segments are *write-once, read-many*: once created they
//! are never modified, only replaced wholesale by a merge.
//!
//! ## File layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ codec frame (key 1) │ codec frame (value 1)              │
//! │ codec frame (key 2) │ codec frame (value 2)              │
//! │ ...                                                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! A bare concatenation of framed `(key, value)` pairs, ascending by encoded
//! key bytes, keys unique within a file, no header, no footer, no padding.
//! The write-ahead log shares this format, which is why [`SegmentStream`]
//! also serves as the WAL replay reader.
//!
//! ## Naming
//!
//! Segment files are named `segment-<n>.data` where `n` is a positive
//! integer assigned at flush time. Higher `n` means strictly newer; the id
//! is the recency order, so no separate manifest is needed.
//!
//! ## Module responsibilities
//!
//! | Module      | Purpose                                             |
//! |-------------|-----------------------------------------------------|
//! | [`name`]    | Filename grammar: parse, format, probe, create      |
//! | [`writer`]  | Atomic segment writes (temp file + fsync + rename)  |
//! | [`reader`]  | Chunked streaming reads with partial-frame resumption |
//! | [`merge`]   | Two-way sorted merge, newer side wins ties          |

mod merge;
mod name;
mod reader;
mod writer;

pub use merge::MergeStream;
pub use name::{
    ensure_exists, is_segment_file, segment_filename, segment_number, segment_path,
    SEGMENT_PREFIX, SEGMENT_SUFFIX,
};
pub use reader::{SegmentStream, DEFAULT_CHUNK_SIZE};
pub use writer::{temp_path, SegmentWriter, TEMP_SUFFIX};

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur naming, reading, or merging segments.
#[derive(Debug, Error)]
pub enum SegmentError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A filename does not match `segment-<n>.data`.
    #[error("not a segment filename: {0:?}")]
    InvalidFilename(String),

    /// A file ended mid-pair: an unpaired key or a truncated frame at EOF.
    #[error("segment {} is incomplete", .0.display())]
    Incomplete(PathBuf),

    /// The codec rejected a frame while streaming a file.
    #[error("decode error in {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: codec::CodecError,
    },
}

#[cfg(test)]
mod tests;
