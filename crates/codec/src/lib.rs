//! # Codec - Self-Describing Value Framing
//!
//! The binary encoding every other EddyKV crate speaks. Keys and values are
//! typed scalars, each serialized as a single self-describing **frame**:
//!
//! ```text
//! [tag: u8][length?][payload ...]
//! ```
//!
//! | Tag | Type    | Length field | Payload                               |
//! |-----|---------|--------------|---------------------------------------|
//! | `f` | float64 | none (8)     | byte-ordered IEEE-754 encoding        |
//! | `i` | int64   | none (8)     | big-endian two's complement           |
//! | `a` | symbol  | u16 BE       | UTF-8 bytes of the interned name      |
//! | `s` | bytes   | u32 BE       | arbitrary bytes                       |
//!
//! Frames concatenate with no separators or padding; segment files and the
//! WAL are nothing but frame sequences. Ordering and equality of keys are
//! defined on the **encoded bytes**, which is why the float payload uses an
//! order-preserving transform: for any two finite floats `a < b`,
//! `encode(a) < encode(b)` lexicographically. NaN is outside the supported
//! domain: the transform never produces it, and the decoder rejects any
//! payload that maps to it.
//!
//! ## Streaming decode
//!
//! [`decode_one`] distinguishes three non-error outcomes: [`DecodeStep::Done`]
//! (empty input), [`DecodeStep::Partial`] (a recognized tag whose length
//! header or payload is truncated), and a decoded value with the unconsumed
//! suffix. [`decode_many`] folds these so a chunked reader can stop at a
//! partial frame, fetch more bytes, and resume:
//!
//! ```rust
//! use codec::{decode_many, encode, Value};
//!
//! let frame = encode(&Value::Int(42));
//! let (values, rest) = decode_many(&frame[..4]).unwrap();
//! assert!(values.is_empty());
//! assert_eq!(rest, &frame[..4]); // carry this tail, append more input, retry
//! ```
//!
//! ## Symbols
//!
//! Symbols are short names resolvable against a process-global intern table.
//! [`Value::symbol`] interns; the decoder **refuses** names that were never
//! interned rather than allocating them, so hostile input cannot grow the
//! table.

use byteorder::{BigEndian, ByteOrder};
use std::collections::HashSet;
use std::sync::{OnceLock, PoisonError, RwLock};
use thiserror::Error;

/// Frame tag for byte-ordered float64 payloads.
pub const TAG_FLOAT: u8 = b'f';
/// Frame tag for big-endian int64 payloads.
pub const TAG_INT: u8 = b'i';
/// Frame tag for interned symbol names (u16 BE length prefix).
pub const TAG_SYMBOL: u8 = b'a';
/// Frame tag for opaque byte strings (u32 BE length prefix).
pub const TAG_BYTES: u8 = b's';

/// A typed scalar, the closed set of key and value types.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit IEEE-754 float. NaN is not representable in the codec.
    Float(f64),
    /// Interned symbolic name.
    Symbol(String),
    /// Opaque byte string.
    Bytes(Vec<u8>),
}

impl Value {
    /// Creates a symbol value, interning `name` so it round-trips through
    /// the decoder.
    ///
    /// # Panics
    ///
    /// Panics if `name` exceeds the u16 length field (65,535 bytes). Symbols
    /// are short identifiers; anything longer belongs in [`Value::Bytes`].
    pub fn symbol(name: &str) -> Self {
        assert!(
            name.len() <= u16::MAX as usize,
            "symbol name exceeds u16 length field"
        );
        intern(name);
        Value::Symbol(name.to_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Bytes(v.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

/// Errors a frame can fail decoding with.
///
/// A truncated frame is **not** an error: [`decode_one`] reports it as
/// [`DecodeStep::Partial`] so chunked readers can resume.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The first byte of a frame is not one of `f`, `i`, `a`, `s`.
    #[error("unknown frame tag {0:#04x}")]
    UnknownTag(u8),

    /// A float payload decoded to NaN, which the order-preserving encoding
    /// never emits.
    #[error("invalid byte-ordered float payload {0:02x?}")]
    InvalidFloat([u8; 8]),

    /// A symbol payload named a symbol absent from the intern table.
    #[error("symbol {0:?} is not interned")]
    UnknownSymbol(String),
}

/// Outcome of decoding a single frame from the front of `input`.
#[derive(Debug, PartialEq)]
pub enum DecodeStep<'a> {
    /// Input was empty, a clean end of the frame sequence.
    Done,
    /// The tag is recognized but the length header or payload is truncated.
    /// Concatenate more input and retry.
    Partial,
    /// One decoded value plus the unconsumed suffix of `input`.
    Value(Value, &'a [u8]),
}

/// Serializes a value into a fresh frame.
#[must_use]
pub fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::with_capacity(16);
    encode_into(value, &mut out);
    out
}

/// Appends the frame for `value` to `out`.
///
/// Frames are self-delimiting, so callers concatenate freely; this is how
/// WAL appends and segment rows are built without intermediate allocations.
pub fn encode_into(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Int(v) => {
            out.push(TAG_INT);
            out.extend_from_slice(&v.to_be_bytes());
        }
        Value::Float(v) => {
            out.push(TAG_FLOAT);
            out.extend_from_slice(&float_to_ordered_bits(*v).to_be_bytes());
        }
        Value::Symbol(name) => {
            out.push(TAG_SYMBOL);
            out.extend_from_slice(&(name.len() as u16).to_be_bytes());
            out.extend_from_slice(name.as_bytes());
        }
        Value::Bytes(bytes) => {
            out.push(TAG_BYTES);
            out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
            out.extend_from_slice(bytes);
        }
    }
}

/// Serializes a `(key, value)` pair as two adjacent frames.
///
/// This is the unit the WAL appends and segment files repeat.
#[must_use]
pub fn encode_pair(key: &Value, value: &Value) -> Vec<u8> {
    let mut out = Vec::with_capacity(32);
    encode_into(key, &mut out);
    encode_into(value, &mut out);
    out
}

/// Decodes one frame from the front of `input`.
///
/// Returns [`DecodeStep::Done`] on empty input and [`DecodeStep::Partial`]
/// when the frame is recognizably truncated. See [`CodecError`] for the
/// error cases.
pub fn decode_one(input: &[u8]) -> Result<DecodeStep<'_>, CodecError> {
    let Some(&tag) = input.first() else {
        return Ok(DecodeStep::Done);
    };

    match tag {
        TAG_FLOAT => {
            if input.len() < 9 {
                return Ok(DecodeStep::Partial);
            }
            let mut payload = [0u8; 8];
            payload.copy_from_slice(&input[1..9]);
            let v = float_from_ordered_bits(u64::from_be_bytes(payload));
            if v.is_nan() {
                return Err(CodecError::InvalidFloat(payload));
            }
            Ok(DecodeStep::Value(Value::Float(v), &input[9..]))
        }
        TAG_INT => {
            if input.len() < 9 {
                return Ok(DecodeStep::Partial);
            }
            let v = BigEndian::read_i64(&input[1..9]);
            Ok(DecodeStep::Value(Value::Int(v), &input[9..]))
        }
        TAG_SYMBOL => {
            if input.len() < 3 {
                return Ok(DecodeStep::Partial);
            }
            let len = BigEndian::read_u16(&input[1..3]) as usize;
            if input.len() < 3 + len {
                return Ok(DecodeStep::Partial);
            }
            let raw = &input[3..3 + len];
            // The intern table only holds valid UTF-8, so a non-UTF-8 name
            // can never resolve; report it as unknown.
            let name = match std::str::from_utf8(raw) {
                Ok(s) => s,
                Err(_) => {
                    return Err(CodecError::UnknownSymbol(
                        String::from_utf8_lossy(raw).into_owned(),
                    ))
                }
            };
            if !is_interned(name) {
                return Err(CodecError::UnknownSymbol(name.to_string()));
            }
            Ok(DecodeStep::Value(
                Value::Symbol(name.to_string()),
                &input[3 + len..],
            ))
        }
        TAG_BYTES => {
            if input.len() < 5 {
                return Ok(DecodeStep::Partial);
            }
            let len = BigEndian::read_u32(&input[1..5]) as usize;
            if input.len() < 5 + len {
                return Ok(DecodeStep::Partial);
            }
            Ok(DecodeStep::Value(
                Value::Bytes(input[5..5 + len].to_vec()),
                &input[5 + len..],
            ))
        }
        other => Err(CodecError::UnknownTag(other)),
    }
}

/// Decodes as many complete frames as `input` holds.
///
/// Returns the decoded values in input order plus the undecoded tail. The
/// tail is empty when the input ended exactly on a frame boundary; a partial
/// trailing frame is returned verbatim so the caller can append more input
/// and call again. Errors abort the whole decode.
pub fn decode_many(mut input: &[u8]) -> Result<(Vec<Value>, &[u8]), CodecError> {
    let mut values = Vec::new();
    loop {
        match decode_one(input)? {
            DecodeStep::Done | DecodeStep::Partial => return Ok((values, input)),
            DecodeStep::Value(v, rest) => {
                values.push(v);
                input = rest;
            }
        }
    }
}

// ---- Order-preserving float transform ----
//
// Positive floats compare like their bit patterns; negative floats compare
// inverted. Setting the sign bit on positives and complementing negatives
// yields an unsigned integer whose big-endian bytes sort like the floats.

fn float_to_ordered_bits(v: f64) -> u64 {
    let bits = v.to_bits();
    if bits >> 63 == 1 {
        !bits
    } else {
        bits ^ (1 << 63)
    }
}

fn float_from_ordered_bits(enc: u64) -> f64 {
    if enc >> 63 == 1 {
        f64::from_bits(enc ^ (1 << 63))
    } else {
        f64::from_bits(!enc)
    }
}

// ---- Symbol intern table ----

static SYMBOLS: OnceLock<RwLock<HashSet<String>>> = OnceLock::new();

fn symbols() -> &'static RwLock<HashSet<String>> {
    SYMBOLS.get_or_init(|| RwLock::new(HashSet::new()))
}

/// Registers `name` in the process-global symbol table.
///
/// Idempotent. Interning is the only way a name enters the table; the
/// decoder never adds one.
pub fn intern(name: &str) {
    let mut table = symbols().write().unwrap_or_else(PoisonError::into_inner);
    if !table.contains(name) {
        table.insert(name.to_string());
    }
}

/// Returns `true` if `name` has been interned in this process.
#[must_use]
pub fn is_interned(name: &str) -> bool {
    symbols()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .contains(name)
}
