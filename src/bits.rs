// SPDX-License-Identifier: MIT

//! Bit accessors for HID reports.
//!
//! HID reports are little endian bit streams: bit `n` of a report is bit
//! `n % 8` of byte `n / 8`, fields are not byte aligned and may span several
//! bytes. Callers are expected to check the report length against the
//! preparsed data first, all functions here panic on out-of-bounds access
//! like slice indexing does.

/// Convenience function to be extract a single bit as bool from a value
pub(crate) fn bit(bits: u32, bit: u8) -> bool {
    debug_assert!(bit < 32);
    bits & (1 << bit) != 0
}

/// Returns the state of bit `bit` in `bytes`.
pub fn get_bit(bytes: &[u8], bit: usize) -> bool {
    bytes[bit / 8] & (1 << (bit % 8)) != 0
}

/// Sets bit `bit` in `bytes`.
pub fn set_bit(bytes: &mut [u8], bit: usize) {
    bytes[bit / 8] |= 1 << (bit % 8);
}

/// Clears bit `bit` in `bytes`.
pub fn clear_bit(bytes: &mut [u8], bit: usize) {
    bytes[bit / 8] &= !(1 << (bit % 8));
}

/// Reads `count` bits (at most 32) starting at bit `start`.
pub fn read_bits(bytes: &[u8], start: usize, count: usize) -> u32 {
    assert!(count <= 32, "Cannot read {count} bits into a u32");
    (0..count)
        .filter(|i| get_bit(bytes, start + i))
        .fold(0u32, |value, i| value | (1 << i))
}

/// Writes the low `count` bits (at most 32) of `value` starting at bit `start`.
/// Bits of `value` beyond `count` are ignored.
pub fn write_bits(bytes: &mut [u8], start: usize, count: usize, value: u32) {
    assert!(count <= 32, "Cannot write {count} bits from a u32");
    for i in 0..count {
        if value & (1 << i) != 0 {
            set_bit(bytes, start + i);
        } else {
            clear_bit(bytes, start + i);
        }
    }
}

/// Sign-extends the low `bits` bits of `value`.
pub fn sign_extend(value: u32, bits: usize) -> i32 {
    match bits {
        0 => 0,
        n if n >= 32 => value as i32,
        _ => {
            let shift = 32 - bits;
            ((value << shift) as i32) >> shift
        }
    }
}
