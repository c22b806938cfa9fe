//! Decimal floating point.
//!
//! Values are stored in the BID interchange encoding at three widths. All
//! computation happens on the unpacked form (`Decimal`): a sign, an integer
//! coefficient and a power-of-ten exponent, rounded half-even to the width's
//! precision when packed back.
//!
//! - `arith`: add, sub, mul, div, modulo, remainder, compare
//! - `parse`: text to decimal, with SKIP/WARN/ERROR outcomes
//! - `format`: display formatting for the four display modes

use std::fmt;

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{ToPrimitive, Zero};
use rpl_common_core::{Settings, TypeId};

use crate::parser::ParseOutcome;

pub mod arith;
pub mod format;
pub mod parse;

// =============================================================================
// Widths
// =============================================================================

/// One of the three decimal interchange formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DecimalWidth {
    W32,
    W64,
    W128,
}

impl DecimalWidth {
    /// Coefficient digits
    pub const fn digits(self) -> usize {
        match self {
            DecimalWidth::W32 => 7,
            DecimalWidth::W64 => 16,
            DecimalWidth::W128 => 34,
        }
    }

    pub const fn bits(self) -> u32 {
        match self {
            DecimalWidth::W32 => 32,
            DecimalWidth::W64 => 64,
            DecimalWidth::W128 => 128,
        }
    }

    pub const fn bytes(self) -> usize {
        self.bits() as usize / 8
    }

    const fn exponent_bits(self) -> u32 {
        match self {
            DecimalWidth::W32 => 8,
            DecimalWidth::W64 => 10,
            DecimalWidth::W128 => 14,
        }
    }

    const fn bias(self) -> i64 {
        match self {
            DecimalWidth::W32 => 101,
            DecimalWidth::W64 => 398,
            DecimalWidth::W128 => 6176,
        }
    }

    /// Largest adjusted exponent, i.e. the `E` in `d.dddE<emax>`.
    pub const fn emax(self) -> i64 {
        match self {
            DecimalWidth::W32 => 96,
            DecimalWidth::W64 => 384,
            DecimalWidth::W128 => 6144,
        }
    }

    /// Smallest exponent applied to the integer coefficient.
    pub const fn min_q(self) -> i64 {
        -self.bias()
    }

    /// Largest exponent applied to the integer coefficient.
    pub const fn max_q(self) -> i64 {
        self.emax() - self.digits() as i64 + 1
    }

    fn max_coefficient(self) -> u128 {
        10u128.pow(self.digits() as u32) - 1
    }

    /// Width of a decimal tag.
    pub fn of(ty: TypeId) -> Option<Self> {
        match ty {
            TypeId::Decimal32 => Some(DecimalWidth::W32),
            TypeId::Decimal64 => Some(DecimalWidth::W64),
            TypeId::Decimal128 => Some(DecimalWidth::W128),
            _ => None,
        }
    }

    pub fn type_id(self) -> TypeId {
        match self {
            DecimalWidth::W32 => TypeId::Decimal32,
            DecimalWidth::W64 => TypeId::Decimal64,
            DecimalWidth::W128 => TypeId::Decimal128,
        }
    }

    /// Width selected by a precision setting: above 16 digits needs 128 bits,
    /// above 7 digits needs 64 bits.
    pub fn for_precision(precision: u16) -> Self {
        let precision = precision as usize;
        if precision > DecimalWidth::W64.digits() {
            DecimalWidth::W128
        } else if precision > DecimalWidth::W32.digits() {
            DecimalWidth::W64
        } else {
            DecimalWidth::W32
        }
    }

    /// Next wider format, used when a parse asks to be retried.
    pub fn wider(self) -> Option<Self> {
        match self {
            DecimalWidth::W32 => Some(DecimalWidth::W64),
            DecimalWidth::W64 => Some(DecimalWidth::W128),
            DecimalWidth::W128 => None,
        }
    }
}

// =============================================================================
// Unpacked form
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecimalClass {
    Finite,
    Infinite,
    NaN,
}

/// Unpacked decimal: `(-1)^negative * coefficient * 10^exponent`.
///
/// The coefficient is not normalized: `1.20` is `120E-2`, `1.2` is `12E-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    pub negative: bool,
    pub class: DecimalClass,
    pub coefficient: u128,
    pub exponent: i32,
}

impl Decimal {
    pub const ZERO: Decimal = Decimal::finite(false, 0, 0);
    pub const NAN: Decimal =
        Decimal { negative: false, class: DecimalClass::NaN, coefficient: 0, exponent: 0 };

    pub const fn finite(negative: bool, coefficient: u128, exponent: i32) -> Self {
        Decimal { negative, class: DecimalClass::Finite, coefficient, exponent }
    }

    pub const fn infinity(negative: bool) -> Self {
        Decimal { negative, class: DecimalClass::Infinite, coefficient: 0, exponent: 0 }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.class == DecimalClass::Finite
    }

    #[inline]
    pub fn is_nan(&self) -> bool {
        self.class == DecimalClass::NaN
    }

    #[inline]
    pub fn is_infinite(&self) -> bool {
        self.class == DecimalClass::Infinite
    }

    pub fn is_zero(&self) -> bool {
        self.is_finite() && self.coefficient == 0
    }

    /// Integer value with the given sign, rounded to the width.
    pub fn from_u64(negative: bool, value: u64, width: DecimalWidth) -> Self {
        round(negative, BigUint::from(value), 0, false, width)
    }

    /// Build from an arbitrary-precision magnitude, one byte at a time from
    /// the most significant end, rounding after every step.
    pub fn from_biguint(negative: bool, magnitude: &BigUint, width: DecimalWidth) -> Self {
        let radix = Decimal::from_u64(false, 256, width);
        let mut acc = Decimal::ZERO;
        for byte in magnitude.to_bytes_be() {
            let step = arith::mul(&acc, &radix, width);
            acc = arith::add(&step, &Decimal::from_u64(false, byte as u64, width), width);
        }
        if negative {
            acc = acc.neg();
        }
        acc
    }

    pub fn neg(&self) -> Self {
        Decimal { negative: !self.negative, ..*self }
    }

    pub fn abs(&self) -> Self {
        Decimal { negative: false, ..*self }
    }

    /// Round to the precision and exponent range of `width`.
    pub fn round_to(&self, width: DecimalWidth) -> Self {
        if !self.is_finite() || self.fits(width) {
            return *self;
        }
        round(self.negative, BigUint::from(self.coefficient), self.exponent as i64, false, width)
    }

    fn fits(&self, width: DecimalWidth) -> bool {
        let q = self.exponent as i64;
        self.coefficient <= width.max_coefficient() && q >= width.min_q() && q <= width.max_q()
    }

    /// Number of digits in the coefficient, 1 for zero.
    pub fn digit_count(&self) -> usize {
        count_digits_u128(self.coefficient)
    }

    // =========================================================================
    // BID encoding
    // =========================================================================

    /// Pack into the BID bit pattern of `width`, rounding first if needed.
    pub fn pack(&self, width: DecimalWidth) -> u128 {
        let k = width.bits();
        let sign = if self.negative { 1u128 << (k - 1) } else { 0 };
        match self.class {
            DecimalClass::Infinite => return sign | (0b11110u128 << (k - 6)),
            DecimalClass::NaN => return sign | (0b11111u128 << (k - 6)),
            DecimalClass::Finite => {}
        }

        let value = self.round_to(width);
        if !value.is_finite() {
            return value.pack(width);
        }
        let small_bits = k - 1 - width.exponent_bits();
        let biased = (value.exponent as i64 - width.min_q()) as u128;
        let c = value.coefficient;
        if c < (1u128 << small_bits) {
            sign | (biased << small_bits) | c
        } else {
            sign | (0b11u128 << (k - 3)) | (biased << (small_bits - 2)) | (c - (1u128 << small_bits))
        }
    }

    /// Unpack a BID bit pattern of `width`.
    pub fn unpack(bits: u128, width: DecimalWidth) -> Self {
        let k = width.bits();
        let ebits = width.exponent_bits();
        let negative = (bits >> (k - 1)) & 1 == 1;
        let top = (bits >> (k - 6)) & 0b11111;
        if top == 0b11111 {
            return Decimal { negative, ..Decimal::NAN };
        }
        if top == 0b11110 {
            return Decimal::infinity(negative);
        }

        let small_bits = k - 1 - ebits;
        let emask = (1u128 << ebits) - 1;
        let (biased, coefficient) = if (bits >> (k - 3)) & 0b11 == 0b11 {
            let low = bits & ((1u128 << (small_bits - 2)) - 1);
            ((bits >> (small_bits - 2)) & emask, (1u128 << small_bits) | low)
        } else {
            ((bits >> small_bits) & emask, bits & ((1u128 << small_bits) - 1))
        };

        // Non-canonical coefficients read as zero
        let coefficient = if coefficient > width.max_coefficient() { 0 } else { coefficient };
        let exponent = (biased as i64 + width.min_q()) as i32;
        Decimal::finite(negative, coefficient, exponent)
    }

    /// Native text form: `[+-]<coefficient>E[+-]<exponent>`, `+Inf`, `-Inf`
    /// or `NaN`. This is the input of the display formatter.
    pub fn to_native(&self) -> String {
        let sign = if self.negative { '-' } else { '+' };
        match self.class {
            DecimalClass::NaN => "NaN".to_string(),
            DecimalClass::Infinite => format!("{sign}Inf"),
            DecimalClass::Finite => format!("{}{}E{:+}", sign, self.coefficient, self.exponent),
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_native())
    }
}

// =============================================================================
// Rounding
// =============================================================================

pub(crate) fn pow10(n: usize) -> BigUint {
    BigUint::from(10u32).pow(n as u32)
}

pub(crate) fn count_digits(c: &BigUint) -> usize {
    match c.to_u128() {
        Some(small) => count_digits_u128(small),
        None => c.to_str_radix(10).len(),
    }
}

fn count_digits_u128(mut c: u128) -> usize {
    let mut n = 1;
    while c >= 10 {
        c /= 10;
        n += 1;
    }
    n
}

/// Round `coefficient * 10^exponent` half-even to `width`.
///
/// `sticky` tells that nonzero digits were already discarded below the
/// coefficient. Results below the subnormal range become zero, results above
/// the exponent range become infinite.
pub(crate) fn round(
    negative: bool,
    mut coefficient: BigUint,
    mut exponent: i64,
    sticky: bool,
    width: DecimalWidth,
) -> Decimal {
    let digits = width.digits();
    let ndigits = count_digits(&coefficient);

    let mut drop = ndigits.saturating_sub(digits) as i64;
    if exponent + drop < width.min_q() {
        drop = width.min_q() - exponent;
    }

    if drop > 0 {
        if drop as usize > ndigits {
            // Everything is below half an ulp
            return Decimal::finite(negative, 0, width.min_q() as i32);
        }
        let divisor = pow10(drop as usize);
        let (mut q, r) = coefficient.div_rem(&divisor);
        let twice = r << 1u32;
        let round_up = match twice.cmp(&divisor) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Equal => sticky || q.is_odd(),
            std::cmp::Ordering::Less => false,
        };
        if round_up {
            q += 1u32;
        }
        exponent += drop;
        if q == pow10(digits) {
            q = pow10(digits - 1);
            exponent += 1;
        }
        coefficient = q;
    }

    if exponent > width.max_q() {
        if coefficient.is_zero() {
            exponent = width.max_q();
        } else {
            let shift = (exponent - width.max_q()) as usize;
            if count_digits(&coefficient) + shift > digits {
                tracing::trace!(?width, "decimal overflow");
                return Decimal::infinity(negative);
            }
            coefficient *= pow10(shift);
            exponent = width.max_q();
        }
    }

    let c = coefficient.to_u128().unwrap_or_default();
    Decimal::finite(negative, c, exponent as i32)
}

// =============================================================================
// Typed widths
// =============================================================================

macro_rules! decimal_type {
    ($(#[$meta:meta])* $name:ident, $bits:ty, $width:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub $bits);

        impl $name {
            pub const WIDTH: DecimalWidth = $width;

            #[inline]
            pub fn from_bits(bits: $bits) -> Self {
                Self(bits)
            }

            #[inline]
            pub fn to_bits(self) -> $bits {
                self.0
            }

            pub fn unpack(self) -> Decimal {
                Decimal::unpack(self.0 as u128, Self::WIDTH)
            }

            pub fn pack(value: &Decimal) -> Self {
                Self(value.pack(Self::WIDTH) as $bits)
            }

            pub fn from_u64(negative: bool, value: u64) -> Self {
                Self::pack(&Decimal::from_u64(negative, value, Self::WIDTH))
            }

            pub fn from_bignum(negative: bool, magnitude: &BigUint) -> Self {
                Self::pack(&Decimal::from_biguint(negative, magnitude, Self::WIDTH))
            }

            pub fn parse(src: &str, settings: &Settings, precedence: i32) -> ParseOutcome<Self> {
                parse::parse(src, Self::WIDTH, settings, precedence).map(|d| Self::pack(&d))
            }

            pub fn render(self, settings: &Settings, editing: bool) -> String {
                format::format(&self.unpack(), Self::WIDTH, settings, editing)
            }

            pub fn add(self, other: Self) -> Self {
                Self::pack(&arith::add(&self.unpack(), &other.unpack(), Self::WIDTH))
            }

            pub fn sub(self, other: Self) -> Self {
                Self::pack(&arith::sub(&self.unpack(), &other.unpack(), Self::WIDTH))
            }

            pub fn mul(self, other: Self) -> Self {
                Self::pack(&arith::mul(&self.unpack(), &other.unpack(), Self::WIDTH))
            }

            pub fn div(self, other: Self) -> Self {
                Self::pack(&arith::div(&self.unpack(), &other.unpack(), Self::WIDTH))
            }

            pub fn modulo(self, other: Self) -> Self {
                Self::pack(&arith::modulo(&self.unpack(), &other.unpack(), Self::WIDTH))
            }

            pub fn remainder(self, other: Self) -> Self {
                Self::pack(&arith::remainder(&self.unpack(), &other.unpack(), Self::WIDTH))
            }

            pub fn neg(self) -> Self {
                Self::pack(&self.unpack().neg())
            }

            pub fn compare(self, other: Self) -> Option<std::cmp::Ordering> {
                arith::compare(&self.unpack(), &other.unpack())
            }

            pub fn is_zero(self) -> bool {
                self.unpack().is_zero()
            }

            pub fn is_nan(self) -> bool {
                self.unpack().is_nan()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.unpack().to_native())
            }
        }
    };
}

decimal_type!(
    /// 7-digit decimal, exponent range ±96.
    Decimal32, u32, DecimalWidth::W32
);
decimal_type!(
    /// 16-digit decimal, exponent range ±384.
    Decimal64, u64, DecimalWidth::W64
);
decimal_type!(
    /// 34-digit decimal, exponent range ±6144.
    Decimal128, u128, DecimalWidth::W128
);

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::One;

    fn one() -> BigUint {
        BigUint::one()
    }

    #[test]
    fn test_width_limits() {
        assert_eq!(DecimalWidth::W32.max_q(), 90);
        assert_eq!(DecimalWidth::W64.max_q(), 369);
        assert_eq!(DecimalWidth::W128.max_q(), 6111);
        assert_eq!(DecimalWidth::W128.min_q(), -6176);
        assert_eq!(DecimalWidth::for_precision(34), DecimalWidth::W128);
        assert_eq!(DecimalWidth::for_precision(12), DecimalWidth::W64);
        assert_eq!(DecimalWidth::for_precision(7), DecimalWidth::W32);
    }

    #[test]
    fn test_bid32_known_patterns() {
        // 1E0: biased exponent 101, coefficient 1
        assert_eq!(Decimal::finite(false, 1, 0).pack(DecimalWidth::W32), 0x3280_0001);
        assert_eq!(Decimal::finite(true, 1, 0).pack(DecimalWidth::W32), 0xB280_0001);
        assert_eq!(Decimal::infinity(false).pack(DecimalWidth::W32), 0x7800_0000);
        assert_eq!(Decimal::NAN.pack(DecimalWidth::W32), 0x7C00_0000);
    }

    #[test]
    fn test_large_coefficient_form() {
        // 9999999 does not fit the 23-bit small form of BID32
        let d = Decimal::finite(false, 9_999_999, -3);
        let bits = d.pack(DecimalWidth::W32);
        assert_eq!(bits >> 29 & 0b11, 0b11);
        assert_eq!(Decimal::unpack(bits, DecimalWidth::W32), d);
    }

    #[test]
    fn test_unpack_specials() {
        let inf = Decimal::infinity(true).pack(DecimalWidth::W64);
        assert!(Decimal::unpack(inf, DecimalWidth::W64).is_infinite());
        assert!(Decimal::unpack(inf, DecimalWidth::W64).negative);
        let nan = Decimal::NAN.pack(DecimalWidth::W128);
        assert!(Decimal::unpack(nan, DecimalWidth::W128).is_nan());
    }

    #[test]
    fn test_round_half_even() {
        let w = DecimalWidth::W32;
        assert_eq!(round(false, BigUint::from(12_345_675u32), 0, false, w), Decimal::finite(false, 1_234_568, 1));
        assert_eq!(round(false, BigUint::from(12_345_665u32), 0, false, w), Decimal::finite(false, 1_234_566, 1));
        assert_eq!(round(false, BigUint::from(12_345_665u32), 0, true, w), Decimal::finite(false, 1_234_567, 1));
        assert_eq!(round(false, BigUint::from(99_999_999u32), 0, false, w), Decimal::finite(false, 1_000_000, 2));
    }

    #[test]
    fn test_overflow_and_clamp() {
        let w = DecimalWidth::W32;
        assert_eq!(round(false, one(), 96, false, w), Decimal::finite(false, 1_000_000, 90));
        assert!(round(true, one(), 97, false, w).is_infinite());
        assert_eq!(round(false, one(), -200, false, w), Decimal::finite(false, 0, -101));
    }

    #[test]
    fn test_from_biguint_horner() {
        let n = BigUint::from(0x0102_0304u32);
        let d = Decimal::from_biguint(true, &n, DecimalWidth::W128);
        assert_eq!(d, Decimal::finite(true, 0x0102_0304, 0));

        let big = BigUint::from(u64::MAX) + 1u32;
        let d = Decimal::from_biguint(false, &big, DecimalWidth::W128);
        assert_eq!(d, Decimal::finite(false, 18_446_744_073_709_551_616, 0));

        // Rounded at every step, still 7 digits of the right magnitude
        let d = Decimal::from_biguint(false, &big, DecimalWidth::W32);
        assert_eq!(d.digit_count(), 7);
        assert_eq!(d.exponent, 13);
    }

    #[test]
    fn test_typed_round_trip() {
        let x = Decimal64::from_u64(true, 42);
        assert_eq!(x.unpack(), Decimal::finite(true, 42, 0));
        assert_eq!(x.to_string(), "-42E+0");
        assert_eq!(Decimal128::from_u64(false, 5).add(Decimal128::from_u64(false, 7)).to_string(), "+12E+0");
    }
}
