/// WAL replay and segment recovery logic.
///
/// This module handles the cold-start path: discovering segment files,
/// rebuilding the bloom filter from their keys, replaying the WAL into a
/// fresh memtable, and sweeping temp files left by interrupted writes.
use anyhow::Result;
use bloom::BloomFilter;
use memtable::Memtable;
use segment::SegmentStream;
use std::path::Path;

/// Collects the ids of every segment file in `dir`, sorted descending.
///
/// Non-segment names (the WAL, temp files, anything an operator dropped in)
/// are ignored; the filename grammar is the filter.
pub(crate) fn discover_segments(dir: &Path) -> Result<Vec<u64>> {
    let mut ids = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let name = entry?.file_name();
        if let Some(name) = name.to_str() {
            if segment::is_segment_file(name) {
                ids.push(segment::segment_number(name)?);
            }
        }
    }
    // Newest first: the id order is the recency order.
    ids.sort_unstable_by(|a, b| b.cmp(a));
    Ok(ids)
}

/// Rebuilds the bloom filter by streaming every segment and inserting every
/// key.
///
/// Insertion order does not affect the result (the bit vector is
/// order-independent and the size counter counts the same multiset of keys),
/// so a rebuilt filter compares equal to the one the previous process held
/// (for flush-only histories; a merge collapses duplicate keys on disk).
pub(crate) fn rebuild_bloom(dir: &Path, segments: &[u64]) -> Result<BloomFilter> {
    let mut bloom = BloomFilter::new();
    for &id in segments {
        for pair in SegmentStream::open(segment::segment_path(dir, id))? {
            let (key, _value) = pair?;
            bloom.insert(&key);
        }
    }
    Ok(bloom)
}

/// Replays `db.wal` into a fresh memtable.
///
/// The WAL shares the segment framing, so the segment stream reads it. An
/// absent WAL is a fresh start. Replay happens before the WAL handle is
/// opened for appending.
pub(crate) fn rebuild_memtable(dir: &Path) -> Result<Memtable> {
    let mut mem = Memtable::new();
    let wal_file = wal::wal_path(dir);
    if wal_file.exists() {
        for pair in SegmentStream::open(&wal_file)? {
            let (key, value) = pair?;
            mem.insert(key, value);
        }
    }
    Ok(mem)
}

/// Sweeps leftover `.tmp` files from interrupted flushes and merges.
pub(crate) fn cleanup_temp_files(dir: &Path) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let p = entry.path();
            if let Some(name) = p.file_name().and_then(|n| n.to_str()) {
                if name.ends_with(segment::TEMP_SUFFIX) {
                    log::warn!("removing leftover temp file {}", p.display());
                    let _ = std::fs::remove_file(&p);
                }
            }
        }
    }
}
