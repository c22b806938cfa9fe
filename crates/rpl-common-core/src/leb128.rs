//! LEB128 variable-length integers.
//!
//! Seven bits per byte, least significant group first, high bit set on every
//! byte except the last. Used for tags, lengths, counts and indices in every
//! object payload, so that object sizes can be recovered without a side table.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Maximum encoded size of a `u64`.
pub const MAX_LEN: usize = 10;

/// Number of bytes needed to encode `value`.
#[inline]
pub fn size(mut value: u64) -> usize {
    let mut n = 1;
    while value >= 0x80 {
        value >>= 7;
        n += 1;
    }
    n
}

/// Append the encoding of `value` to `out`.
pub fn encode(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Decode a value at the start of `bytes`.
/// Returns the value and the number of bytes consumed, or `None` if the
/// encoding is truncated or does not fit in 64 bits.
pub fn decode(bytes: &[u8]) -> Option<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    for (i, &byte) in bytes.iter().enumerate().take(MAX_LEN) {
        let group = (byte & 0x7f) as u64;
        if shift == 63 && group > 1 {
            return None;
        }
        value |= group << shift;
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
        shift += 7;
    }
    None
}

/// Length of the encoding at the start of `bytes` without decoding it.
#[inline]
pub fn skip(bytes: &[u8]) -> Option<usize> {
    bytes
        .iter()
        .take(MAX_LEN)
        .position(|b| b & 0x80 == 0)
        .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_values_use_one_byte() {
        let mut buf = Vec::new();
        encode(&mut buf, 0);
        encode(&mut buf, 127);
        assert_eq!(buf, vec![0x00, 0x7f]);
        assert_eq!(size(127), 1);
        assert_eq!(size(128), 2);
    }

    #[test]
    fn test_known_encoding() {
        let mut buf = Vec::new();
        encode(&mut buf, 624485);
        assert_eq!(buf, vec![0xe5, 0x8e, 0x26]);
        assert_eq!(decode(&buf), Some((624485, 3)));
        assert_eq!(skip(&buf), Some(3));
    }

    #[test]
    fn test_extremes() {
        let mut buf = Vec::new();
        encode(&mut buf, u64::MAX);
        assert_eq!(buf.len(), MAX_LEN);
        assert_eq!(size(u64::MAX), MAX_LEN);
        assert_eq!(decode(&buf), Some((u64::MAX, MAX_LEN)));
    }

    #[test]
    fn test_truncated_input() {
        assert_eq!(decode(&[0x80, 0x80]), None);
        assert_eq!(skip(&[0xff]), None);
        assert_eq!(decode(&[]), None);
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        assert_eq!(decode(&[0x05, 0xff, 0xff]), Some((5, 1)));
    }
}
