use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::SegmentError;

pub const SEGMENT_PREFIX: &str = "segment-";
pub const SEGMENT_SUFFIX: &str = ".data";

/// Formats the filename for segment id `n`: `segment-<n>.data`.
#[must_use]
pub fn segment_filename(n: u64) -> String {
    format!("{}{}{}", SEGMENT_PREFIX, n, SEGMENT_SUFFIX)
}

/// Parses a segment id out of a filename.
///
/// Accepts exactly `segment-<positive decimal>.data`; anything else
/// (wrong affixes, empty digits, signs, non-digits, zero, overflow) is
/// [`SegmentError::InvalidFilename`].
pub fn segment_number(name: &str) -> Result<u64, SegmentError> {
    let invalid = || SegmentError::InvalidFilename(name.to_string());

    let digits = name
        .strip_prefix(SEGMENT_PREFIX)
        .and_then(|rest| rest.strip_suffix(SEGMENT_SUFFIX))
        .ok_or_else(invalid)?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let n: u64 = digits.parse().map_err(|_| invalid())?;
    if n == 0 {
        return Err(invalid());
    }
    Ok(n)
}

/// Total predicate: does `name` parse as a segment filename?
#[must_use]
pub fn is_segment_file(name: &str) -> bool {
    segment_number(name).is_ok()
}

/// Returns `dir/segment-<n>.data`.
#[must_use]
pub fn segment_path(dir: &Path, n: u64) -> PathBuf {
    dir.join(segment_filename(n))
}

/// Creates `dir/segment-<n>.data` if absent (contents untouched otherwise)
/// and returns its path.
pub fn ensure_exists(dir: &Path, n: u64) -> Result<PathBuf, SegmentError> {
    let path = segment_path(dir, n);
    OpenOptions::new().create(true).append(true).open(&path)?;
    Ok(path)
}
