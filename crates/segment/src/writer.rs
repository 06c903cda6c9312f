use std::ffi::OsString;
use std::fs::{rename, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::SegmentError;

/// Suffix appended to a segment path while its contents are being written.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Returns `<path>.tmp`, the staging file a write lands in before the
/// atomic rename into place.
#[must_use]
pub fn temp_path(path: &Path) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_os_string();
    os.push(TEMP_SUFFIX);
    PathBuf::from(os)
}

pub struct SegmentWriter {}

impl SegmentWriter {
    /// Writes a segment at `path` from pre-framed `(key, value)` pairs.
    ///
    /// The pairs must already be in ascending encoded-key order (the
    /// memtable's enumeration order, or a merge stream's output); the
    /// writer concatenates frames verbatim.
    ///
    /// Implementation notes:
    /// - Writes to a temp file next to the target, fsyncs, then atomically
    ///   renames. A crash mid-write leaves only a `.tmp` file; readers never
    ///   observe a half-written segment.
    pub fn write_pairs<P, I>(path: P, pairs: I) -> Result<(), SegmentError>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = (Vec<u8>, Vec<u8>)>,
    {
        let path = path.as_ref();
        let tmp = temp_path(path);

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)?;

        for (key, value) in pairs {
            file.write_all(&key)?;
            file.write_all(&value)?;
        }

        file.flush()?;
        file.sync_all()?;

        rename(&tmp, path)?;
        Ok(())
    }
}
