//! Two-way merge of sorted segment files.
//!
//! Produces `(key, value)` pairs in ascending encoded-key order. When both
//! inputs present the same key, only the pair from the **newer** file is
//! emitted and both sides advance; this is what preserves recency when the
//! tree fuses two adjacent segments.
//!
//! Unlike a levelled store's N-way heap merge, recency here is positional:
//! the second path *is* the newer run, so a simple two-cursor walk with one
//! pair of lookahead per side suffices.

use std::cmp::Ordering;
use std::path::Path;

use crate::{SegmentError, SegmentStream};

type Pair = (Vec<u8>, Vec<u8>);

/// Merges two independently-sorted segment files into a single sorted
/// stream of framed pairs.
///
/// Lazy: each side holds one lookahead pair, refilled from chunked reads.
/// When one side is exhausted the remainder of the other passes through.
/// Both file handles close when the stream ends or is dropped.
pub struct MergeStream {
    older: SegmentStream,
    newer: SegmentStream,
    older_head: Option<Pair>,
    newer_head: Option<Pair>,
    finished: bool,
}

impl MergeStream {
    /// Opens both inputs with the default chunk size. `newer_path` wins key
    /// ties.
    pub fn open<P: AsRef<Path>>(older_path: P, newer_path: P) -> Result<Self, SegmentError> {
        Self::open_with_chunk_size(older_path, newer_path, crate::DEFAULT_CHUNK_SIZE)
    }

    /// Opens both inputs reading at most `chunk_size` bytes per refill.
    pub fn open_with_chunk_size<P: AsRef<Path>>(
        older_path: P,
        newer_path: P,
        chunk_size: usize,
    ) -> Result<Self, SegmentError> {
        let mut older = SegmentStream::open_with_chunk_size(older_path, chunk_size)?;
        let mut newer = SegmentStream::open_with_chunk_size(newer_path, chunk_size)?;

        let older_head = older.next().transpose()?;
        let newer_head = newer.next().transpose()?;

        Ok(Self {
            older,
            newer,
            older_head,
            newer_head,
            finished: false,
        })
    }

    /// Yields the older head and refills its lookahead slot.
    fn advance_older(&mut self) -> Result<Option<Pair>, SegmentError> {
        let head = self.older_head.take();
        self.older_head = self.older.next().transpose()?;
        Ok(head)
    }

    /// Yields the newer head and refills its lookahead slot.
    fn advance_newer(&mut self) -> Result<Option<Pair>, SegmentError> {
        let head = self.newer_head.take();
        self.newer_head = self.newer.next().transpose()?;
        Ok(head)
    }

    fn next_pair(&mut self) -> Result<Option<Pair>, SegmentError> {
        match (&self.older_head, &self.newer_head) {
            (None, None) => Ok(None),
            (Some(_), None) => self.advance_older(),
            (None, Some(_)) => self.advance_newer(),
            (Some((older_key, _)), Some((newer_key, _))) => match older_key.cmp(newer_key) {
                Ordering::Less => self.advance_older(),
                Ordering::Greater => self.advance_newer(),
                Ordering::Equal => {
                    // Duplicate key: the newer segment's value shadows the
                    // older one, and both runs move past it.
                    self.advance_older()?;
                    self.advance_newer()
                }
            },
        }
    }
}

impl Iterator for MergeStream {
    type Item = Result<Pair, SegmentError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_pair() {
            Ok(Some(pair)) => Some(Ok(pair)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
