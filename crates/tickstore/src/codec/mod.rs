//! Chunk codecs for column data.
//!
//! A [`Codec`] turns a chunk of entries into bytes and back. Two
//! implementations live here:
//!
//! - [`DeltaCodec`]: minimum-delta compression for integer columns,
//!   built on the [`varint`] integer codec
//! - [`RawCodec`]: fixed-width little-endian pass-through, used for
//!   float columns and as the baseline for pluggable compressors
//!
//! The framing around codec output (lengths, version, checksum) is the
//! column stream's concern; codecs are pure transformations over
//! in-memory buffers.

pub mod delta;
pub mod varint;

pub use delta::{DeltaCodec, DeltaValue};

use crate::error::{Result, StoreError};
use std::marker::PhantomData;

/// Count of 100-nanosecond units since a fixed epoch; the time unit used
/// throughout the crate in place of a wall-clock type.
pub type Tick = i64;

/// Sentinel meaning "before any data".
pub const MIN_TICKS: Tick = i64::MIN;

/// Sentinel meaning "no more data".
pub const MAX_TICKS: Tick = i64::MAX;

/// A single time-series sample: a tick paired with a value.
///
/// Entries within one column are ordered by `ticks`; duplicates are
/// allowed, and cursors surface the last one written at a given tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry<V> {
    /// Sample time in ticks.
    pub ticks: Tick,
    /// Sample value.
    pub value: V,
}

impl<V> Entry<V> {
    /// Creates an entry from its parts.
    pub fn new(ticks: Tick, value: V) -> Self {
        Self { ticks, value }
    }
}

/// Wire code for a column's value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ValueKind {
    /// 32-bit signed integer.
    I32 = 0,
    /// 64-bit signed integer.
    I64 = 1,
    /// 32-bit float.
    F32 = 2,
    /// 64-bit float.
    F64 = 3,
}

impl ValueKind {
    /// Resolves a type code read from column metadata.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnsupportedType`] for a code with no
    /// matching codec or cursor specialization. Fatal for that column
    /// only.
    pub fn from_u8(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::I32),
            1 => Ok(Self::I64),
            2 => Ok(Self::F32),
            3 => Ok(Self::F64),
            _ => Err(StoreError::UnsupportedType(code)),
        }
    }
}

/// A field value latched by a cursor, with its type made explicit.
///
/// Lets a multi-field consumer read heterogeneous columns through one
/// channel without losing the native representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldScalar {
    /// 32-bit signed integer value.
    I32(i32),
    /// 64-bit signed integer value.
    I64(i64),
    /// 32-bit float value.
    F32(f32),
    /// 64-bit float value.
    F64(f64),
}

/// A value type storable in a column.
///
/// Supplies the wire type code, the fixed width used by [`RawCodec`],
/// and the "missing" value a cursor holds before its first sample:
/// `NaN` for floats, `0` for integers.
pub trait FieldValue: Copy + PartialEq + 'static {
    /// Wire code for this type.
    const KIND: ValueKind;
    /// Fixed width in bytes.
    const WIDTH: usize;

    /// The value a cursor reports before reaching any sample.
    fn missing() -> Self;

    /// Wraps the value in a [`FieldScalar`].
    fn to_scalar(self) -> FieldScalar;

    /// Appends the little-endian bytes of the value.
    fn write_le(self, out: &mut Vec<u8>);

    /// Reads a value from exactly [`Self::WIDTH`] little-endian bytes.
    fn from_le(bytes: &[u8]) -> Self;
}

impl FieldValue for i32 {
    const KIND: ValueKind = ValueKind::I32;
    const WIDTH: usize = 4;

    fn missing() -> Self {
        0
    }

    fn to_scalar(self) -> FieldScalar {
        FieldScalar::I32(self)
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn from_le(bytes: &[u8]) -> Self {
        i32::from_le_bytes(bytes.try_into().expect("i32 field is 4 bytes"))
    }
}

impl FieldValue for i64 {
    const KIND: ValueKind = ValueKind::I64;
    const WIDTH: usize = 8;

    fn missing() -> Self {
        0
    }

    fn to_scalar(self) -> FieldScalar {
        FieldScalar::I64(self)
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn from_le(bytes: &[u8]) -> Self {
        i64::from_le_bytes(bytes.try_into().expect("i64 field is 8 bytes"))
    }
}

impl FieldValue for f32 {
    const KIND: ValueKind = ValueKind::F32;
    const WIDTH: usize = 4;

    fn missing() -> Self {
        f32::NAN
    }

    fn to_scalar(self) -> FieldScalar {
        FieldScalar::F32(self)
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn from_le(bytes: &[u8]) -> Self {
        f32::from_le_bytes(bytes.try_into().expect("f32 field is 4 bytes"))
    }
}

impl FieldValue for f64 {
    const KIND: ValueKind = ValueKind::F64;
    const WIDTH: usize = 8;

    fn missing() -> Self {
        f64::NAN
    }

    fn to_scalar(self) -> FieldScalar {
        FieldScalar::F64(self)
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn from_le(bytes: &[u8]) -> Self {
        f64::from_le_bytes(bytes.try_into().expect("f64 field is 8 bytes"))
    }
}

/// A pluggable chunk codec.
///
/// An external compressor (LZ4 and friends) satisfies this same
/// interface; the column stream treats all implementations alike.
pub trait Codec {
    /// The per-entry item type the codec works over.
    type Item;

    /// Worst-case encoded size for a chunk of `count` items, used to
    /// pre-size output buffers.
    ///
    /// Returns `None` when the size arithmetic overflows; the caller
    /// surfaces that as [`StoreError::Overflow`].
    fn max_encoded_size(&self, count: usize) -> Option<usize>;

    /// Encodes `chunk`, appending the bytes to `out`.
    fn encode(&self, chunk: &[Self::Item], out: &mut Vec<u8>);

    /// Decodes `bytes`, appending the recovered items to `out`.
    ///
    /// Consumes the input to exhaustion; the caller supplies exactly the
    /// bytes one matching `encode` produced.
    fn decode(&self, bytes: &[u8], out: &mut Vec<Self::Item>);
}

/// Fixed-width pass-through codec: each entry is its tick followed by
/// the value, both little-endian.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawCodec<V> {
    _marker: PhantomData<V>,
}

impl<V> RawCodec<V> {
    /// Creates a raw codec.
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<V: FieldValue> Codec for RawCodec<V> {
    type Item = Entry<V>;

    fn max_encoded_size(&self, count: usize) -> Option<usize> {
        count.checked_mul(8 + V::WIDTH)
    }

    fn encode(&self, chunk: &[Entry<V>], out: &mut Vec<u8>) {
        for entry in chunk {
            out.extend_from_slice(&entry.ticks.to_le_bytes());
            entry.value.write_le(out);
        }
    }

    fn decode(&self, bytes: &[u8], out: &mut Vec<Entry<V>>) {
        let step = 8 + V::WIDTH;
        for field in bytes.chunks_exact(step) {
            let ticks = i64::from_le_bytes(field[0..8].try_into().expect("tick field is 8 bytes"));
            let value = V::from_le(&field[8..]);
            out.push(Entry::new(ticks, value));
        }
    }
}
