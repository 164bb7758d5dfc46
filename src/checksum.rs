// MIT License - Copyright (c) 2026 dsc2mqtt contributors
// DSC panel bridge

//! Additive checksum used on every frame in both directions.
//!
//! The checksum is the low byte of the sum of the raw byte values of the
//! command string (code + payload), written as two uppercase hex digits.

/// Compute the 2-character checksum for a command string.
pub fn compute(command: &[u8]) -> String {
    let sum = command.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    format!("{:02X}", sum)
}

/// Check a supplied checksum against the command bytes. Case-sensitive.
pub fn verify(command: &[u8], supplied: &[u8]) -> bool {
    compute(command).as_bytes() == supplied
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        // '0' = 0x30, so "000" sums to 0x90
        assert_eq!(compute(b"000"), "90");
        assert_eq!(compute(b"001"), "91");
        assert_eq!(compute(b"500"), "95");
        assert_eq!(compute(b"609008"), "37");
    }

    #[test]
    fn test_empty_is_zero_padded() {
        assert_eq!(compute(b""), "00");
        assert_eq!(compute(b"\x01"), "01");
    }

    #[test]
    fn test_wraps_to_low_byte() {
        // 0xFF + 0x02 = 0x101 -> 0x01
        assert_eq!(compute(&[0x7F, 0x7F, 0x03]), "01");
    }

    #[test]
    fn test_sums_raw_bytes_above_ascii() {
        // '8' + '4' + '9' = 0xA5, + 0x80 = 0x125 -> 0x25
        assert_eq!(compute(b"849\x80"), "25");
        assert_eq!(compute(&[0xFF, 0xFF]), "FE");
    }

    #[test]
    fn test_verify_round_trip() {
        for cmd in ["000", "001", "0101530102526", "609001", "610128", "849"] {
            let sum = compute(cmd.as_bytes());
            assert!(verify(cmd.as_bytes(), sum.as_bytes()), "round trip failed for {cmd}");
        }
    }

    #[test]
    fn test_verify_is_case_sensitive() {
        assert!(verify(b"609008", b"37"));
        assert!(!verify(b"849", b"a5"));
        assert!(verify(b"849", b"A5"));
        assert!(!verify(b"609008", b"38"));
    }
}
