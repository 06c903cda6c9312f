use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use codec::{decode_one, DecodeStep};

use crate::SegmentError;

/// How many bytes each refill reads from the underlying file.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Lazy reader over a segment (or WAL) file, yielding framed `(key, value)`
/// pairs in file order.
///
/// Reads at most `chunk_size` bytes at a time, carries any undecoded tail
/// into the next read, and validates every frame through the codec. The
/// yielded pairs are the *encoded* frames: ordering and equality in the
/// tree are defined on encoded bytes, so callers compare them directly and
/// only decode when a logical value is needed.
///
/// The stream owns the file handle and releases it when iteration ends,
/// fails, or the stream is dropped mid-way.
///
/// # Errors
///
/// - [`SegmentError::Incomplete`]: EOF with an unpaired key or a partial
///   trailing frame. Only a torn file produces either state.
/// - [`SegmentError::Decode`]: the codec rejected a frame.
pub struct SegmentStream {
    path: PathBuf,
    /// `None` once EOF is reached or an error terminated iteration.
    file: Option<File>,
    chunk_size: usize,
    /// Undecoded tail carried between chunk reads.
    carry: Vec<u8>,
    /// A key frame waiting for its value frame.
    pending_key: Option<Vec<u8>>,
    finished: bool,
}

impl SegmentStream {
    /// Opens `path` with the default chunk size.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SegmentError> {
        Self::open_with_chunk_size(path, DEFAULT_CHUNK_SIZE)
    }

    /// Opens `path`, reading at most `chunk_size` bytes per refill.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is 0.
    pub fn open_with_chunk_size<P: AsRef<Path>>(
        path: P,
        chunk_size: usize,
    ) -> Result<Self, SegmentError> {
        assert!(chunk_size > 0, "chunk_size must be > 0");
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        Ok(Self {
            path,
            file: Some(file),
            chunk_size,
            carry: Vec::new(),
            pending_key: None,
            finished: false,
        })
    }

    /// Path of the file being streamed.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Splits the next complete frame off the carry buffer, validating it
    /// through the codec. `None` means the carry holds at most a partial
    /// frame and more input is needed.
    fn take_frame(&mut self) -> Result<Option<Vec<u8>>, SegmentError> {
        match decode_one(&self.carry) {
            Ok(DecodeStep::Done) | Ok(DecodeStep::Partial) => Ok(None),
            Ok(DecodeStep::Value(_, rest)) => {
                let consumed = self.carry.len() - rest.len();
                Ok(Some(self.carry.drain(..consumed).collect()))
            }
            Err(source) => Err(SegmentError::Decode {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Reads the next chunk into the carry. Returns 0 at EOF.
    fn refill(&mut self) -> Result<usize, SegmentError> {
        let Some(file) = self.file.as_mut() else {
            return Ok(0);
        };
        let mut chunk = vec![0u8; self.chunk_size];
        let n = file.read(&mut chunk)?;
        self.carry.extend_from_slice(&chunk[..n]);
        Ok(n)
    }

    fn next_pair(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>, SegmentError> {
        loop {
            while let Some(frame) = self.take_frame()? {
                match self.pending_key.take() {
                    Some(key) => return Ok(Some((key, frame))),
                    None => self.pending_key = Some(frame),
                }
            }

            if self.refill()? == 0 {
                // EOF with a lone key or a partial frame means the file was
                // torn mid-pair.
                if self.pending_key.is_some() || !self.carry.is_empty() {
                    return Err(SegmentError::Incomplete(self.path.clone()));
                }
                self.file = None;
                return Ok(None);
            }
        }
    }
}

impl Iterator for SegmentStream {
    type Item = Result<(Vec<u8>, Vec<u8>), SegmentError>;

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
                self.file = None;
                Some(Err(e))
            }
        }
    }
}
