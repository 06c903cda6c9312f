use codec::Value;
use std::fs;
use std::path::Path;

pub fn count_segment_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(segment::is_segment_file)
                .unwrap_or(false)
        })
        .count()
}

/// Raw bytes of `segment-<id>.data`.
pub fn segment_bytes(dir: &Path, id: u64) -> Vec<u8> {
    fs::read(segment::segment_path(dir, id)).unwrap()
}

/// Raw bytes of `db.wal`.
pub fn wal_bytes(dir: &Path) -> Vec<u8> {
    fs::read(wal::wal_path(dir)).unwrap()
}

/// Encodes a `&str` as its byte-string frame.
pub fn frame(s: &str) -> Vec<u8> {
    codec::encode(&Value::from(s))
}

/// The on-disk bytes for a `(key, value)` string pair.
pub fn framed_pair(key: &str, value: &str) -> Vec<u8> {
    let mut out = frame(key);
    out.extend_from_slice(&frame(value));
    out
}
