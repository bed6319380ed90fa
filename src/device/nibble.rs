// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Nibble packing used by the device pattern dump.
//!
//! The dump stores every value one nibble per byte. Single values use a
//! (high, low) byte pair. 16-bit step masks use four bytes with the two
//! byte pairs of each half swapped:
//!
//! ```text
//! bytes:  b0      b1      b2       b3
//! bits:   4..8    0..4    12..16   8..12
//! ```

/// Split a byte value into its (high, low) nibble pair
pub fn split_nibbles(value: u8) -> [u8; 2] {
    [value >> 4, value & 0x0F]
}

/// Join a (high, low) nibble pair.
///
/// The bytes are not masked: a corrupt high byte yields a value above 255,
/// which callers clamp.
pub fn join_nibbles(high: u8, low: u8) -> u16 {
    high as u16 * 16 + low as u16
}

/// Pack a 16-bit mask into four nibble bytes
pub fn pack_mask(mask: u16) -> [u8; 4] {
    [
        ((mask >> 4) & 0x0F) as u8,
        (mask & 0x0F) as u8,
        ((mask >> 12) & 0x0F) as u8,
        ((mask >> 8) & 0x0F) as u8,
    ]
}

/// Unpack four nibble bytes into a 16-bit mask.
///
/// Bytes are summed unmasked, as the device software does; only the low
/// 16 bits of the sum are kept.
pub fn unpack_mask(bytes: [u8; 4]) -> u16 {
    let [b0, b1, b2, b3] = bytes.map(u32::from);
    (b1 + (b0 << 4) + (b3 << 8) + (b2 << 12)) as u16
}

/// Whether bit `index` is set in `mask`
pub fn bit(mask: u16, index: usize) -> bool {
    mask & (1 << index) != 0
}

/// Build a mask from one flag per step
pub fn mask_from_flags<I>(flags: I) -> u16
where
    I: IntoIterator<Item = bool>,
{
    flags
        .into_iter()
        .take(16)
        .enumerate()
        .fold(0, |mask, (i, set)| if set { mask | (1 << i) } else { mask })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_nibbles() {
        assert_eq!(split_nibbles(0), [0, 0]);
        assert_eq!(split_nibbles(36), [2, 4]);
        assert_eq!(split_nibbles(103), [6, 7]);
        assert_eq!(split_nibbles(0xFF), [0x0F, 0x0F]);
    }

    #[test]
    fn test_join_nibbles() {
        assert_eq!(join_nibbles(2, 4), 36);
        assert_eq!(join_nibbles(2, 6), 38);
        assert_eq!(join_nibbles(0xFF, 0xFF), 4335);
    }

    #[test]
    fn test_split_join_all_bytes() {
        for value in 0..=u8::MAX {
            let [high, low] = split_nibbles(value);
            assert!(high < 16 && low < 16);
            assert_eq!(join_nibbles(high, low), value as u16);
        }
    }

    #[test]
    fn test_pack_mask_byte_order() {
        // Low byte 0x21 goes to b0/b1 as (2, 1); high byte 0x43 to b2/b3 as (4, 3)
        assert_eq!(pack_mask(0x4321), [0x2, 0x1, 0x4, 0x3]);
        assert_eq!(pack_mask(0x0001), [0x0, 0x1, 0x0, 0x0]);
        assert_eq!(pack_mask(0x0010), [0x1, 0x0, 0x0, 0x0]);
        assert_eq!(pack_mask(0x0100), [0x0, 0x0, 0x0, 0x1]);
        assert_eq!(pack_mask(0x1000), [0x0, 0x0, 0x1, 0x0]);
        assert_eq!(pack_mask(0xFFFF), [0xF, 0xF, 0xF, 0xF]);
    }

    #[test]
    fn test_unpack_mask_formula() {
        let (b0, b1, b2, b3) = (0x3u16, 0xAu16, 0x5u16, 0xCu16);
        let expected = b1 + (b0 << 4) + (b3 << 8) + (b2 << 12);
        assert_eq!(unpack_mask([0x3, 0xA, 0x5, 0xC]), expected);
        assert_eq!(unpack_mask([0x3, 0xA, 0x5, 0xC]), 0x5C3A);
    }

    #[test]
    fn test_unpack_mask_unmasked_bytes_overlap() {
        // A stray high bit in b1 spills into bit 4
        assert_eq!(unpack_mask([0x0, 0x10, 0x0, 0x0]), 0x0010);
    }

    #[test]
    fn test_mask_round_trip_exhaustive() {
        for mask in 0..=u16::MAX {
            let packed = pack_mask(mask);
            assert!(packed.iter().all(|&b| b < 16));
            assert_eq!(unpack_mask(packed), mask, "mask {:#06x}", mask);
        }
    }

    #[test]
    fn test_single_bits_land_in_expected_byte() {
        for index in 0..16 {
            let packed = pack_mask(1 << index);
            let byte = match index {
                0..=3 => 1,
                4..=7 => 0,
                8..=11 => 3,
                _ => 2,
            };
            assert_eq!(packed[byte], 1 << (index % 4), "bit {}", index);
            assert_eq!(packed.iter().filter(|&&b| b != 0).count(), 1);
        }
    }

    #[test]
    fn test_mask_from_flags() {
        assert_eq!(mask_from_flags([true, false, true]), 0b101);
        assert_eq!(mask_from_flags(std::iter::repeat(true).take(20)), 0xFFFF);
        assert_eq!(mask_from_flags([]), 0);
        assert!(bit(0b100, 2));
        assert!(!bit(0b100, 1));
    }
}
