use codec::{encode, Value};
use std::path::{Path, PathBuf};

use crate::SegmentWriter;

/// Encodes a `&str` key or value as its byte-string frame.
pub fn frame(s: &str) -> Vec<u8> {
    encode(&Value::from(s))
}

/// Builds the framed pair list for `(key, value)` string pairs.
pub fn framed_pairs(pairs: &[(&str, &str)]) -> Vec<(Vec<u8>, Vec<u8>)> {
    pairs.iter().map(|(k, v)| (frame(k), frame(v))).collect()
}

/// Writes a segment file holding `pairs` (already in ascending key order)
/// and returns its path.
pub fn write_segment(dir: &Path, name: &str, pairs: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    SegmentWriter::write_pairs(&path, framed_pairs(pairs)).unwrap();
    path
}
