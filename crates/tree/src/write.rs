/// Write path: `put()`, `flush()`, and the internal memtable sealing.
///
/// All mutations flow through this module. Each write is first appended to
/// the WAL for durability, then applied to the in-memory memtable. When the
/// memtable exceeds the configured flush threshold, it is sealed as a new
/// segment on disk and the WAL restarts empty.
use anyhow::Result;
use codec::Value;
use memtable::Memtable;
use segment::SegmentWriter;

use crate::Tree;

impl Tree {
    /// Inserts a key-value pair, overwriting any prior value for the key.
    ///
    /// The pair is appended to the WAL (fsynced) before the memtable insert,
    /// so an acknowledged write survives a crash. If the memtable's byte
    /// size then exceeds the flush threshold, it is sealed as a new segment
    /// and the WAL is reset.
    pub fn put(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        let value = value.into();

        let key_frame = codec::encode(&key);
        let value_frame = codec::encode(&value);

        // WAL first; a crash after this point replays the pair on open.
        let mut frames = Vec::with_capacity(key_frame.len() + value_frame.len());
        frames.extend_from_slice(&key_frame);
        frames.extend_from_slice(&value_frame);
        self.wal.append(&frames)?;

        self.mem.insert(key_frame, value_frame);

        if self.mem.byte_size() > self.flush_threshold {
            self.seal_memtable()?;
            self.wal.reset()?;
        }

        Ok(())
    }

    /// Seals the current memtable as a new segment and resets the WAL.
    ///
    /// This is a no-op if the memtable is empty. Afterwards the WAL is empty
    /// and a fresh memtable is in place; the new segment id is one greater
    /// than the highest existing id.
    pub fn flush(&mut self) -> Result<()> {
        if self.mem.is_empty() {
            return Ok(());
        }
        self.seal_memtable()?;
        self.wal.reset()?;
        Ok(())
    }

    /// Internal seal: writes the segment, feeds the bloom filter, prepends
    /// the new id, and replaces the memtable. WAL rotation is the caller's
    /// responsibility.
    ///
    /// # Steps
    ///
    /// 1. New segment id = highest existing id + 1 (or 1 for the first).
    /// 2. Write the memtable's pairs, already ascending by encoded key, via
    ///    [`SegmentWriter::write_pairs`] (atomic temp + rename).
    /// 3. Insert every key into the bloom filter.
    /// 4. Prepend the id to the descending segment list and install a fresh
    ///    memtable.
    pub(crate) fn seal_memtable(&mut self) -> Result<()> {
        let id = self.segments.first().copied().unwrap_or(0) + 1;
        let path = segment::segment_path(&self.dir, id);

        SegmentWriter::write_pairs(&path, self.mem.iter().map(|(k, v)| (k.clone(), v.clone())))?;

        for (key, _value) in self.mem.iter() {
            self.bloom.insert(key);
        }

        log::debug!(
            "sealed segment {} ({} entries, {} bytes)",
            id,
            self.mem.len(),
            self.mem.byte_size()
        );

        self.segments.insert(0, id);
        self.mem = Memtable::new();
        Ok(())
    }
}
