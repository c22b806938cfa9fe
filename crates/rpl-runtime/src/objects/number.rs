//! Payload layouts of numeric objects.
//!
//! - machine integers: LEB128 magnitude, sign and base carried by the tag
//! - bignums: LEB128 byte count + little-endian magnitude bytes
//! - decimals: the BID bit pattern, little-endian, 4/8/16 bytes

use num_bigint::BigUint;
use rpl_common_core::{leb128, TypeId};

use super::{length_prefix, prefixed_size};
use crate::decimal::DecimalWidth;

pub fn encode_integer(out: &mut Vec<u8>, magnitude: u64) {
    leb128::encode(out, magnitude);
}

pub fn decode_integer(payload: &[u8]) -> Option<u64> {
    leb128::decode(payload).map(|(v, _)| v)
}

pub fn encode_bignum(out: &mut Vec<u8>, magnitude: &BigUint) {
    let bytes = magnitude.to_bytes_le();
    leb128::encode(out, bytes.len() as u64);
    out.extend_from_slice(&bytes);
}

pub fn decode_bignum(payload: &[u8]) -> Option<BigUint> {
    let (len, n) = length_prefix(payload)?;
    let bytes = payload.get(n..n.checked_add(len)?)?;
    Some(BigUint::from_bytes_le(bytes))
}

pub fn bignum_payload_size(payload: &[u8]) -> Option<usize> {
    prefixed_size(payload)
}

pub fn encode_decimal(out: &mut Vec<u8>, width: DecimalWidth, bits: u128) {
    let bytes = bits.to_le_bytes();
    out.extend_from_slice(&bytes[..width.bytes()]);
}

pub fn decode_decimal(payload: &[u8], width: DecimalWidth) -> Option<u128> {
    let bytes = payload.get(..width.bytes())?;
    let mut buf = [0u8; 16];
    buf[..bytes.len()].copy_from_slice(bytes);
    Some(u128::from_le_bytes(buf))
}

/// Payload size of a numeric or command tag, `None` for other kinds.
pub fn payload_size(ty: TypeId, payload: &[u8]) -> Option<usize> {
    if ty.is_integer() {
        leb128::skip(payload)
    } else if ty.is_bignum() {
        bignum_payload_size(payload)
    } else if let Some(width) = DecimalWidth::of(ty) {
        Some(width.bytes())
    } else if ty.is_command() {
        Some(0)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bignum_layout_is_little_endian() {
        let mut buf = Vec::new();
        encode_bignum(&mut buf, &BigUint::from(0x0102u32));
        assert_eq!(buf, vec![2, 0x02, 0x01]);
        assert_eq!(bignum_payload_size(&buf), Some(3));
        assert_eq!(decode_bignum(&buf), Some(BigUint::from(0x0102u32)));
    }

    #[test]
    fn test_decimal_layout_width() {
        let mut buf = Vec::new();
        encode_decimal(&mut buf, DecimalWidth::W32, 0x2280_0001);
        assert_eq!(buf, vec![0x01, 0x00, 0x80, 0x22]);
        assert_eq!(decode_decimal(&buf, DecimalWidth::W32), Some(0x2280_0001));
        assert_eq!(payload_size(TypeId::Decimal64, &[]), Some(8));
    }

    #[test]
    fn test_command_has_empty_payload() {
        assert_eq!(payload_size(TypeId::Add, &[]), Some(0));
        assert_eq!(payload_size(TypeId::Symbol, &[3, b'a', b'b', b'c']), None);
    }

    #[test]
    fn test_truncated_bignum() {
        assert_eq!(decode_bignum(&[4, 1, 2]), None);
    }
}
