//! Minimum-delta compression for integer columns.
//!
//! Exploits two regularities of time-series chunks: ticks grow by fairly
//! uniform steps, and values change by small increments. Consecutive
//! differences are rebased against the chunk's own minimum step so the
//! per-entry fields cluster near zero, where the varint codec emits its
//! smallest length classes.
//!
//! # Encoded layout
//!
//! ```text
//! ticks[0]      signed-64 varint
//! min_dticks    signed-64 varint   minimum tick delta over the chunk
//! value[0]      signed value varint
//! neg_base      signed value varint   -(largest negative value delta)
//! pos_base      signed value varint   smallest non-negative value delta
//! then per entry i = 1..n:
//!   dticks[i] - min_dticks        signed-64 varint
//!   value delta                   flagged signed varint:
//!     flag=1: magnitude = -dvalue[i] - neg_base
//!     flag=0: magnitude =  dvalue[i] - pos_base
//! ```
//!
//! Negative and non-negative value deltas carry independent baselines,
//! so runs of either sign compress equally well. There is no entry
//! count in the payload; decode consumes bytes until exhaustion and the
//! framing layer cross-checks the recovered count.
//!
//! All delta arithmetic wraps at the value's native width on both
//! sides, so chunks touching the extremes of the domain still
//! round-trip bit-exactly.

use crate::codec::{varint, Codec, Entry, FieldValue};
use std::marker::PhantomData;

/// Worst case for one encoded tick field.
const MAX_TICKS_FIELD: usize = 9;

/// An integer value type the minimum-delta transform applies to.
///
/// Arithmetic runs in a sign-extended `i64` working representation;
/// [`DeltaValue::wrapped`] folds results back onto the native width.
pub trait DeltaValue: FieldValue {
    /// Worst case for one encoded value field.
    const MAX_FIELD: usize;

    /// Sign-extended working representation.
    fn repr(self) -> i64;

    /// Truncates a working value back to the native type.
    fn from_repr(repr: i64) -> Self;

    /// Folds a working value onto the native width, keeping the sign.
    fn wrapped(repr: i64) -> i64 {
        Self::from_repr(repr).repr()
    }

    /// Writes a header field through the unflagged signed codec.
    fn write_base(out: &mut Vec<u8>, repr: i64);

    /// Reads a header field written by [`DeltaValue::write_base`].
    fn read_base(r: &mut varint::Reader<'_>) -> i64;

    /// Writes a per-entry delta through the flagged signed codec.
    fn write_delta(out: &mut Vec<u8>, flag: bool, magnitude: i64);

    /// Reads a `(magnitude, flag)` pair written by
    /// [`DeltaValue::write_delta`].
    fn read_delta(r: &mut varint::Reader<'_>) -> (i64, bool);
}

impl DeltaValue for i32 {
    const MAX_FIELD: usize = 5;

    fn repr(self) -> i64 {
        i64::from(self)
    }

    fn from_repr(repr: i64) -> Self {
        repr as i32
    }

    fn write_base(out: &mut Vec<u8>, repr: i64) {
        varint::encode_i32(out, repr as i32);
    }

    fn read_base(r: &mut varint::Reader<'_>) -> i64 {
        i64::from(varint::decode_i32(r))
    }

    fn write_delta(out: &mut Vec<u8>, flag: bool, magnitude: i64) {
        varint::encode_i32_flagged(out, flag, magnitude as i32);
    }

    fn read_delta(r: &mut varint::Reader<'_>) -> (i64, bool) {
        let (magnitude, flag) = varint::decode_i32_flagged(r);
        (i64::from(magnitude), flag)
    }
}

impl DeltaValue for i64 {
    const MAX_FIELD: usize = 9;

    fn repr(self) -> i64 {
        self
    }

    fn from_repr(repr: i64) -> Self {
        repr
    }

    fn write_base(out: &mut Vec<u8>, repr: i64) {
        varint::encode_i64(out, repr);
    }

    fn read_base(r: &mut varint::Reader<'_>) -> i64 {
        varint::decode_i64(r)
    }

    fn write_delta(out: &mut Vec<u8>, flag: bool, magnitude: i64) {
        varint::encode_i64_flagged(out, flag, magnitude);
    }

    fn read_delta(r: &mut varint::Reader<'_>) -> (i64, bool) {
        varint::decode_i64_flagged(r)
    }
}

/// Minimum-delta codec over `Entry<V>` chunks.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeltaCodec<V> {
    _marker: PhantomData<V>,
}

impl<V> DeltaCodec<V> {
    /// Creates a delta codec.
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<V: DeltaValue> Codec for DeltaCodec<V> {
    type Item = Entry<V>;

    fn max_encoded_size(&self, count: usize) -> Option<usize> {
        // Every field assumed full width: ticks occupy n - 1 deltas plus
        // two header fields, values n - 1 deltas plus three.
        let ticks = count.checked_add(1)?.checked_mul(MAX_TICKS_FIELD)?;
        let values = count.checked_add(2)?.checked_mul(V::MAX_FIELD)?;
        ticks.checked_add(values)
    }

    fn encode(&self, chunk: &[Entry<V>], out: &mut Vec<u8>) {
        if chunk.is_empty() {
            return;
        }

        let mut min_dticks = i64::MAX;
        let mut max_neg: Option<i64> = None;
        let mut min_pos: Option<i64> = None;
        for pair in chunk.windows(2) {
            let dticks = pair[1].ticks.wrapping_sub(pair[0].ticks);
            min_dticks = min_dticks.min(dticks);
            let dvalue = V::wrapped(pair[1].value.repr().wrapping_sub(pair[0].value.repr()));
            if dvalue < 0 {
                max_neg = Some(max_neg.map_or(dvalue, |m| m.max(dvalue)));
            } else {
                min_pos = Some(min_pos.map_or(dvalue, |m| m.min(dvalue)));
            }
        }
        if chunk.len() == 1 {
            min_dticks = 0;
        }
        let neg_base = V::wrapped(max_neg.unwrap_or(0).wrapping_neg());
        let pos_base = min_pos.unwrap_or(0);

        varint::encode_i64(out, chunk[0].ticks);
        varint::encode_i64(out, min_dticks);
        V::write_base(out, chunk[0].value.repr());
        V::write_base(out, neg_base);
        V::write_base(out, pos_base);

        for pair in chunk.windows(2) {
            let dticks = pair[1].ticks.wrapping_sub(pair[0].ticks);
            varint::encode_i64(out, dticks.wrapping_sub(min_dticks));

            let dvalue = V::wrapped(pair[1].value.repr().wrapping_sub(pair[0].value.repr()));
            if dvalue < 0 {
                let magnitude = V::wrapped(dvalue.wrapping_neg().wrapping_sub(neg_base));
                V::write_delta(out, true, magnitude);
            } else {
                let magnitude = V::wrapped(dvalue.wrapping_sub(pos_base));
                V::write_delta(out, false, magnitude);
            }
        }
    }

    fn decode(&self, bytes: &[u8], out: &mut Vec<Entry<V>>) {
        if bytes.is_empty() {
            return;
        }

        let mut r = varint::Reader::new(bytes);
        let mut ticks = varint::decode_i64(&mut r);
        let min_dticks = varint::decode_i64(&mut r);
        let mut value = V::read_base(&mut r);
        let neg_base = V::read_base(&mut r);
        let pos_base = V::read_base(&mut r);
        out.push(Entry::new(ticks, V::from_repr(value)));

        while !r.is_empty() {
            let dticks = varint::decode_i64(&mut r).wrapping_add(min_dticks);
            ticks = ticks.wrapping_add(dticks);

            let (magnitude, negative) = V::read_delta(&mut r);
            let dvalue = if negative {
                V::wrapped(magnitude.wrapping_add(neg_base)).wrapping_neg()
            } else {
                V::wrapped(magnitude.wrapping_add(pos_base))
            };
            value = V::wrapped(value.wrapping_add(dvalue));
            out.push(Entry::new(ticks, V::from_repr(value)));
        }
    }
}
