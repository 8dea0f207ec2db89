//! Bit-field helpers for 32-bit instruction words.
//!
//! Bit indices run from the least significant bit (0) to the most
//! significant bit (31).

/// Extract `width` bits starting at `offset`, right-aligned and zero-extended.
///
/// `width` must be in `1..=32` and `offset + width` must not exceed 32.
#[inline]
pub fn get_bits(word: u32, offset: u32, width: u32) -> u32 {
    debug_assert!((1..=32).contains(&width), "invalid field width {width}");
    debug_assert!(offset + width <= 32, "field {offset}+{width} exceeds a word");

    let mask = if width == 32 { u32::MAX } else { (1 << width) - 1 };
    (word >> offset) & mask
}

/// Test a single bit.
#[inline]
pub fn get_bit(word: u32, n: u32) -> bool {
    get_bits(word, n, 1) != 0
}

/// The 4-bit condition field (bits 28-31).
#[inline]
pub fn get_cond(word: u32) -> u8 {
    get_bits(word, 28, 4) as u8
}

/// Rotate `value` right by `amount` bits. The amount is taken modulo 32.
#[inline]
pub fn rotate_right(amount: u32, value: u32) -> u32 {
    value.rotate_right(amount % 32)
}

/// Sign-extend the low `width` bits of `value` to a full 32-bit signed value.
#[inline]
pub fn sign_extend(value: u32, width: u32) -> i32 {
    let shift = 32 - width;
    ((value << shift) as i32) >> shift
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_get_bits_fields() {
        let word = 0xE3A0_0005;
        assert_eq!(get_bits(word, 28, 4), 0xE);
        assert_eq!(get_bits(word, 26, 2), 0b00);
        assert_eq!(get_bits(word, 21, 4), 0xD);
        assert_eq!(get_bits(word, 0, 8), 0x05);
        assert_eq!(get_bits(word, 0, 32), word);
    }

    #[test]
    fn test_get_bit() {
        assert!(get_bit(0x8000_0000, 31));
        assert!(!get_bit(0x8000_0000, 30));
        assert!(get_bit(1, 0));
    }

    #[test]
    fn test_get_cond() {
        assert_eq!(get_cond(0xE3A0_0005), 0xE);
        assert_eq!(get_cond(0x0A00_0000), 0x0);
        assert_eq!(get_cond(0xDA00_0000), 0xD);
    }

    #[test]
    fn test_rotate_right() {
        assert_eq!(rotate_right(0, 0xFF), 0xFF);
        assert_eq!(rotate_right(8, 0xFF), 0xFF00_0000);
        assert_eq!(rotate_right(30, 0x3F), 0xFC);
        assert_eq!(rotate_right(32, 0x1234), 0x1234);
    }

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0xFF_FFFF, 24), -1);
        assert_eq!(sign_extend(0x7F_FFFF, 24), 0x7F_FFFF);
        assert_eq!(sign_extend(0x80_0000, 24), -0x80_0000);
    }

    proptest! {
        #[test]
        fn prop_disjoint_fields_reassemble(word in any::<u32>(), split in 1u32..31) {
            let low = get_bits(word, 0, split);
            let high = get_bits(word, split, 32 - split);
            prop_assert_eq!((high << split) | low, word);
        }

        #[test]
        fn prop_single_bits_reassemble(word in any::<u32>()) {
            let rebuilt = (0..32).fold(0u32, |acc, n| acc | (u32::from(get_bit(word, n)) << n));
            prop_assert_eq!(rebuilt, word);
        }
    }
}
