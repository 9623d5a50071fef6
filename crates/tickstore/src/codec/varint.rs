//! Bit-packed variable-length integer codec.
//!
//! Encodes `u32`/`i32`/`u64`/`i64` values into 1-9 byte representations.
//! The top bits of the first byte carry a 3-bit *length class* selecting
//! how many bytes the value occupies; the remaining bits of byte 0 plus
//! all following bytes hold the magnitude big-endian. Signed variants
//! reserve the most significant bit of byte 0 for the sign; flagged
//! variants reserve one more bit for a caller-supplied boolean.
//!
//! # Byte 0 layouts
//!
//! ```text
//! unsigned:  [ class:3 | data:5 ]            payload bits = 5 + 8*class
//! signed:    [ sign:1 | class:3 | data:4 ]   payload bits = 4 + 8*class
//! flagged:   [ sign:1 | flag:1 | class:3 | data:3 ]
//!                                            payload bits = 3 + 8*class
//! ```
//!
//! Classes 0-6 are followed by `class` raw magnitude bytes. Class 7 is
//! the full-width escape: byte 0 is followed by the complete 4- or
//! 8-byte magnitude. `i32::MIN` and `i64::MIN` have no positive
//! counterpart, so their magnitude is taken with a wrapping negate and
//! stored through the full-width class, where the extra bit fits.
//!
//! Encode always succeeds; every value has a valid class. Decode trusts
//! the header and performs no length validation of its own - feeding it
//! truncated or foreign bytes panics on the out-of-bounds read. Frame
//! integrity is the column stream's job, not the codec's.

/// A read position over an immutable byte slice.
///
/// Decoders advance the reader by exactly the number of bytes the
/// matching encode call produced; this byte-count symmetry is the core
/// round-trip invariant of the codec.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current byte position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos == self.data.len()
    }

    fn take(&mut self) -> u8 {
        let b = self.data[self.pos];
        self.pos += 1;
        b
    }
}

/// Number of significant bits in `magnitude` (0 for 0).
fn bit_width(magnitude: u64) -> usize {
    (64 - magnitude.leading_zeros()) as usize
}

/// Smallest class whose payload budget fits `bits`, or 7 for full width.
///
/// `data_bits` is the payload budget of class 0 (the data bits left in
/// byte 0); each further class adds one 8-bit byte. `max_class` is 6 for
/// 64-bit values and 3 for 32-bit values, whose class-4 budget would
/// already exceed the value width.
fn pick_class(bits: usize, data_bits: usize, max_class: usize) -> usize {
    for class in 0..=max_class {
        if bits <= data_bits + 8 * class {
            return class;
        }
    }
    7
}

fn write_magnitude(
    out: &mut Vec<u8>,
    head: u8,
    magnitude: u64,
    class: usize,
    class_shift: u32,
    data_mask: u8,
    full_bytes: usize,
) {
    if class == 7 {
        out.push(head | (7 << class_shift));
        for i in (0..full_bytes).rev() {
            out.push((magnitude >> (8 * i)) as u8);
        }
    } else {
        out.push(head | ((class as u8) << class_shift) | ((magnitude >> (8 * class)) as u8 & data_mask));
        for i in (0..class).rev() {
            out.push((magnitude >> (8 * i)) as u8);
        }
    }
}

fn read_magnitude(
    r: &mut Reader<'_>,
    first: u8,
    class: usize,
    data_mask: u8,
    full_bytes: usize,
) -> u64 {
    if class == 7 {
        let mut v = 0u64;
        for _ in 0..full_bytes {
            v = (v << 8) | u64::from(r.take());
        }
        v
    } else {
        let mut v = u64::from(first & data_mask);
        for _ in 0..class {
            v = (v << 8) | u64::from(r.take());
        }
        v
    }
}

// Unsigned layout: class in bits 5-7, 5 data bits in byte 0.
const U_SHIFT: u32 = 5;
const U_MASK: u8 = 0x1f;
const U_DATA_BITS: usize = 5;

// Signed layout: sign in bit 7, class in bits 4-6, 4 data bits.
const S_SIGN: u8 = 0x80;
const S_SHIFT: u32 = 4;
const S_MASK: u8 = 0x0f;
const S_DATA_BITS: usize = 4;

// Flagged layout: sign in bit 7, flag in bit 6, class in bits 3-5,
// 3 data bits.
const F_SIGN: u8 = 0x80;
const F_FLAG: u8 = 0x40;
const F_SHIFT: u32 = 3;
const F_MASK: u8 = 0x07;
const F_DATA_BITS: usize = 3;

fn encode_unsigned(out: &mut Vec<u8>, value: u64, max_class: usize, full_bytes: usize) {
    let class = pick_class(bit_width(value), U_DATA_BITS, max_class);
    write_magnitude(out, 0, value, class, U_SHIFT, U_MASK, full_bytes);
}

fn decode_unsigned(r: &mut Reader<'_>, full_bytes: usize) -> u64 {
    let b0 = r.take();
    let class = (b0 >> U_SHIFT) as usize;
    read_magnitude(r, b0, class, U_MASK, full_bytes)
}

fn encode_signed(out: &mut Vec<u8>, value: i64, max_class: usize, full_bytes: usize) {
    // wrapping_neg maps i64::MIN onto its own bit pattern, which reads
    // back as the 2^63 magnitude and fits the full-width class.
    let sign = value < 0;
    let magnitude = if sign { (value as u64).wrapping_neg() } else { value as u64 };
    let head = if sign { S_SIGN } else { 0 };
    let class = pick_class(bit_width(magnitude), S_DATA_BITS, max_class);
    write_magnitude(out, head, magnitude, class, S_SHIFT, S_MASK, full_bytes);
}

fn decode_signed(r: &mut Reader<'_>, full_bytes: usize) -> i64 {
    let b0 = r.take();
    let class = ((b0 >> S_SHIFT) & 0x07) as usize;
    let magnitude = read_magnitude(r, b0, class, S_MASK, full_bytes);
    if b0 & S_SIGN != 0 {
        (magnitude as i64).wrapping_neg()
    } else {
        magnitude as i64
    }
}

fn encode_flagged(out: &mut Vec<u8>, flag: bool, value: i64, max_class: usize, full_bytes: usize) {
    let sign = value < 0;
    let magnitude = if sign { (value as u64).wrapping_neg() } else { value as u64 };
    let mut head = if sign { F_SIGN } else { 0 };
    if flag {
        head |= F_FLAG;
    }
    let class = pick_class(bit_width(magnitude), F_DATA_BITS, max_class);
    write_magnitude(out, head, magnitude, class, F_SHIFT, F_MASK, full_bytes);
}

fn decode_flagged(r: &mut Reader<'_>, full_bytes: usize) -> (i64, bool) {
    let b0 = r.take();
    let class = ((b0 >> F_SHIFT) & 0x07) as usize;
    let magnitude = read_magnitude(r, b0, class, F_MASK, full_bytes);
    let value = if b0 & F_SIGN != 0 {
        (magnitude as i64).wrapping_neg()
    } else {
        magnitude as i64
    };
    (value, b0 & F_FLAG != 0)
}

fn classed_len(bits: usize, data_bits: usize, max_class: usize, full_bytes: usize) -> usize {
    let class = pick_class(bits, data_bits, max_class);
    if class == 7 {
        full_bytes + 1
    } else {
        class + 1
    }
}

fn signed_magnitude(value: i64) -> u64 {
    if value < 0 {
        (value as u64).wrapping_neg()
    } else {
        value as u64
    }
}

/// Appends the variable-length encoding of `value` to `out`.
pub fn encode_u64(out: &mut Vec<u8>, value: u64) {
    encode_unsigned(out, value, 6, 8);
}

/// Decodes a `u64` written by [`encode_u64`], advancing the reader.
pub fn decode_u64(r: &mut Reader<'_>) -> u64 {
    decode_unsigned(r, 8)
}

/// Number of bytes [`encode_u64`] produces for `value`.
pub fn encoded_len_u64(value: u64) -> usize {
    classed_len(bit_width(value), U_DATA_BITS, 6, 8)
}

/// Appends the variable-length encoding of `value` to `out`.
pub fn encode_u32(out: &mut Vec<u8>, value: u32) {
    encode_unsigned(out, u64::from(value), 3, 4);
}

/// Decodes a `u32` written by [`encode_u32`], advancing the reader.
pub fn decode_u32(r: &mut Reader<'_>) -> u32 {
    decode_unsigned(r, 4) as u32
}

/// Number of bytes [`encode_u32`] produces for `value`.
pub fn encoded_len_u32(value: u32) -> usize {
    classed_len(bit_width(u64::from(value)), U_DATA_BITS, 3, 4)
}

/// Appends the sign-aware encoding of `value` to `out`.
pub fn encode_i64(out: &mut Vec<u8>, value: i64) {
    encode_signed(out, value, 6, 8);
}

/// Decodes an `i64` written by [`encode_i64`], advancing the reader.
pub fn decode_i64(r: &mut Reader<'_>) -> i64 {
    decode_signed(r, 8)
}

/// Number of bytes [`encode_i64`] produces for `value`.
pub fn encoded_len_i64(value: i64) -> usize {
    classed_len(bit_width(signed_magnitude(value)), S_DATA_BITS, 6, 8)
}

/// Appends the sign-aware encoding of `value` to `out`.
pub fn encode_i32(out: &mut Vec<u8>, value: i32) {
    encode_signed(out, i64::from(value), 3, 4);
}

/// Decodes an `i32` written by [`encode_i32`], advancing the reader.
pub fn decode_i32(r: &mut Reader<'_>) -> i32 {
    decode_signed(r, 4) as i32
}

/// Number of bytes [`encode_i32`] produces for `value`.
pub fn encoded_len_i32(value: i32) -> usize {
    classed_len(bit_width(signed_magnitude(i64::from(value))), S_DATA_BITS, 3, 4)
}

/// Appends the sign-aware encoding of `value` plus one caller bit.
pub fn encode_i64_flagged(out: &mut Vec<u8>, flag: bool, value: i64) {
    encode_flagged(out, flag, value, 6, 8);
}

/// Decodes a `(value, flag)` pair written by [`encode_i64_flagged`].
pub fn decode_i64_flagged(r: &mut Reader<'_>) -> (i64, bool) {
    decode_flagged(r, 8)
}

/// Number of bytes [`encode_i64_flagged`] produces for `value`.
pub fn encoded_len_i64_flagged(value: i64) -> usize {
    classed_len(bit_width(signed_magnitude(value)), F_DATA_BITS, 6, 8)
}

/// Appends the sign-aware encoding of `value` plus one caller bit.
pub fn encode_i32_flagged(out: &mut Vec<u8>, flag: bool, value: i32) {
    encode_flagged(out, flag, i64::from(value), 3, 4);
}

/// Decodes a `(value, flag)` pair written by [`encode_i32_flagged`].
pub fn decode_i32_flagged(r: &mut Reader<'_>) -> (i32, bool) {
    let (value, flag) = decode_flagged(r, 4);
    (value as i32, flag)
}

/// Number of bytes [`encode_i32_flagged`] produces for `value`.
pub fn encoded_len_i32_flagged(value: i32) -> usize {
    classed_len(bit_width(signed_magnitude(i64::from(value))), F_DATA_BITS, 3, 4)
}
