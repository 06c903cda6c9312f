//! # WAL — Write-Ahead Log
//!
//! Provides crash-safe durability for the EddyKV storage tree.
//!
//! Every `put` is serialized as a key frame followed by a value frame and
//! appended to `db.wal` **before** the corresponding memtable insert. On
//! restart the WAL is streamed back to reconstruct the memtable, so no
//! acknowledged write is lost.
//!
//! ## File format
//!
//! The WAL carries the exact framing segments use: a bare concatenation of
//! codec frames in insertion order. No sequence numbers, no checksums, no
//! record headers of its own; replay goes through the same streaming reader
//! the segments use.
//!
//! ## Lifecycle
//!
//! The log mirrors the current memtable: [`Wal::open`] ensures an empty or
//! existing `db.wal` inside the tree directory, [`Wal::append`] adds frames
//! with an fsync per call, and [`Wal::reset`] removes and recreates the file
//! after a successful flush has sealed the memtable into a segment.
//!
//! ## Example
//!
//! ```rust,no_run
//! use wal::Wal;
//!
//! let mut wal = Wal::open("some/tree/dir").unwrap();
//! wal.append(b"frame bytes").unwrap();
//! wal.reset().unwrap();
//! ```

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Name of the log file inside a tree directory.
pub const WAL_FILENAME: &str = "db.wal";

/// Returns `dir/db.wal`.
#[must_use]
pub fn wal_path(dir: &Path) -> PathBuf {
    dir.join(WAL_FILENAME)
}

/// Errors that can occur during WAL operations.
#[derive(Debug, Error)]
pub enum WalError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Handle to a tree's write-ahead log.
///
/// Holds the file open in append mode for its lifetime; every append is
/// followed by `sync_all()` so the write is durable before the call returns.
pub struct Wal {
    path: PathBuf,
    file: File,
}

impl Wal {
    /// Opens (or creates) `dir/db.wal`, creating `dir` recursively if absent.
    ///
    /// An existing log is left untouched; its frames are the not-yet-flushed
    /// writes a recovery pass will replay.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, WalError> {
        std::fs::create_dir_all(dir.as_ref())?;
        let path = wal_path(dir.as_ref());
        let file = Self::open_file(&path)?;
        Ok(Self { path, file })
    }

    /// Appends pre-framed bytes and fsyncs.
    ///
    /// The caller passes complete frames (a key/value pair per `put`); the
    /// WAL itself adds nothing.
    pub fn append(&mut self, frames: &[u8]) -> Result<(), WalError> {
        self.file.write_all(frames)?;
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Removes the log file and recreates it empty.
    ///
    /// Called after a flush: the sealed segment now owns the data, so the
    /// log restarts from nothing.
    pub fn reset(&mut self) -> Result<(), WalError> {
        std::fs::remove_file(&self.path)?;
        self.file = Self::open_file(&self.path)?;
        Ok(())
    }

    /// Path of the underlying `db.wal` file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_file(path: &Path) -> Result<File, WalError> {
        Ok(OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?)
    }
}

/// Deletes `dir/db.wal` if present.
pub fn remove<P: AsRef<Path>>(dir: P) -> Result<(), WalError> {
    let path = wal_path(dir.as_ref());
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}
