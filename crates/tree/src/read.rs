/// Read path: `fetch()`.
///
/// Point lookups check the memtable first (freshest data), then consult the
/// bloom filter (a negative answer proves the key is in no segment), and
/// only then scan segments from newest to oldest. The first match wins.
use anyhow::{bail, Result};
use codec::{DecodeStep, Value};
use segment::SegmentStream;
use std::cmp::Ordering;

use crate::Tree;

impl Tree {
    /// Looks up a key, returning its most recently written value.
    ///
    /// Recency is memtable > newest segment > ... > oldest segment. A bloom
    /// miss short-circuits the segment scan; a bloom false positive just
    /// means the scan runs and finds nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if a segment read fails (torn file, decode error,
    /// I/O).
    pub fn fetch(&self, key: impl Into<Value>) -> Result<Option<Value>> {
        let key_frame = codec::encode(&key.into());

        if let Some(value_frame) = self.mem.get(&key_frame) {
            return Ok(Some(decode_value(value_frame)?));
        }

        if !self.bloom.may_contain(&key_frame) {
            return Ok(None);
        }

        for &id in &self.segments {
            let path = segment::segment_path(&self.dir, id);
            for pair in SegmentStream::open(&path)? {
                let (stored_key, stored_value) = pair?;
                match stored_key.cmp(&key_frame) {
                    Ordering::Less => continue,
                    Ordering::Equal => return Ok(Some(decode_value(&stored_value)?)),
                    // Keys are ascending within a segment, so the target
                    // cannot appear further on.
                    Ordering::Greater => break,
                }
            }
        }

        Ok(None)
    }
}

/// Decodes a stored value frame back into a [`Value`].
fn decode_value(frame: &[u8]) -> Result<Value> {
    match codec::decode_one(frame)? {
        DecodeStep::Value(value, rest) if rest.is_empty() => Ok(value),
        _ => bail!("stored value is not a single complete frame"),
    }
}
