/// Merge: fuses two segments into one, preserving recency.
///
/// Uses [`MergeStream`] for sorted streaming from both inputs; duplicate
/// keys take the newer segment's value. The result is written to a temp file
/// and renamed over the older segment, the newer file is deleted, and the
/// merged run keeps the older id. Everything still older than it remains
/// older, so the id order stays the recency order.
use anyhow::Result;
use segment::{MergeStream, SegmentError, SegmentWriter};

use crate::{Tree, TreeError};

impl Tree {
    /// Merges segment `older` with segment `newer` (caller-driven; nothing
    /// schedules this).
    ///
    /// # Preconditions
    ///
    /// `older` must be strictly less than `newer`: the second argument is
    /// the newer run whose values win key ties. Violations surface as
    /// [`TreeError::SelfMerge`] or [`TreeError::MergeOutOfOrder`].
    ///
    /// The bloom filter is untouched: the union of keys on disk is
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error on a precondition violation, a torn or undecodable
    /// input segment, or I/O failure. The inputs are only removed after the
    /// merged run is fully written and fsynced.
    pub fn merge(&mut self, older: u64, newer: u64) -> Result<()> {
        if older == newer {
            return Err(TreeError::SelfMerge(older).into());
        }
        if older > newer {
            return Err(TreeError::MergeOutOfOrder { older, newer }.into());
        }

        let older_path = segment::segment_path(&self.dir, older);
        let newer_path = segment::segment_path(&self.dir, newer);
        let staging = segment::temp_path(&older_path);

        // Stream the merge straight into the writer; a mid-stream error is
        // captured so the truncated staging file never replaces a segment.
        let mut merge_error: Option<SegmentError> = None;
        let stream = MergeStream::open(&older_path, &newer_path)?;
        let pairs = stream.map_while(|r| match r {
            Ok(pair) => Some(pair),
            Err(e) => {
                merge_error = Some(e);
                None
            }
        });

        let write_result = SegmentWriter::write_pairs(&staging, pairs);

        if let Some(e) = merge_error {
            let _ = std::fs::remove_file(&staging);
            return Err(e.into());
        }
        write_result?;

        // Both inputs are fully consumed and the merged run is durable.
        // Rename first: if the process dies before the remove, the newer
        // file still shadows the (identical) merged values under it, so a
        // reopened tree stays consistent.
        std::fs::rename(&staging, &older_path)?;
        std::fs::remove_file(&newer_path)?;

        self.segments.retain(|&id| id != newer);

        log::debug!("merged segment {} into segment {}", newer, older);
        Ok(())
    }
}
