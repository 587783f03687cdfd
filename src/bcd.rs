//! Packed binary-coded-decimal helpers.
//!
//! Every time, date and alarm register of the PCF8563 stores its value as two
//! BCD digits: the tens digit in the high nibble and the units digit in the
//! low nibble. Flag bits that share a register with the value must be masked
//! off before decoding (see [`RegAddr::value_mask`](crate::RegAddr::value_mask)).

/// Decodes a packed BCD byte into its integer value.
///
/// The nibbles are not validated: a nibble above 9 is taken at face value,
/// so `0x1A` decodes to `20`.
pub const fn decode_bcd(byte: u8) -> u8 {
    (byte >> 4) * 10 + (byte & 0x0F)
}

/// Encodes a value in `0..=99` as a packed BCD byte.
///
/// Returns `None` if the value does not fit in two decimal digits.
pub const fn encode_bcd(value: u8) -> Option<u8> {
    if value > 99 {
        return None;
    }
    Some(((value / 10) << 4) | (value % 10))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_bcd() {
        assert_eq!(decode_bcd(0x00), 0);
        assert_eq!(decode_bcd(0x09), 9);
        assert_eq!(decode_bcd(0x10), 10);
        assert_eq!(decode_bcd(0x59), 59);
        assert_eq!(decode_bcd(0x99), 99);
    }

    #[test]
    fn test_decode_bcd_invalid_nibble_passes_through() {
        assert_eq!(decode_bcd(0x1A), 20);
        assert_eq!(decode_bcd(0xF0), 150);
    }

    #[test]
    fn test_encode_bcd() {
        assert_eq!(encode_bcd(0), Some(0x00));
        assert_eq!(encode_bcd(7), Some(0x07));
        assert_eq!(encode_bcd(23), Some(0x23));
        assert_eq!(encode_bcd(99), Some(0x99));
    }

    #[test]
    fn test_encode_bcd_out_of_range() {
        assert_eq!(encode_bcd(100), None);
        assert_eq!(encode_bcd(u8::MAX), None);
    }

    #[test]
    fn test_encode_decode_inverse() {
        for n in 0..=99u8 {
            assert_eq!(encode_bcd(n).map(decode_bcd), Some(n), "value {}", n);
        }
        for tens in 0..=9u8 {
            for units in 0..=9u8 {
                let byte = (tens << 4) | units;
                assert_eq!(encode_bcd(decode_bcd(byte)), Some(byte), "byte {:#04x}", byte);
            }
        }
    }
}
