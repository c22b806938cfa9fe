//! Decimal arithmetic on the unpacked form.
//!
//! Operands are exact; every result is rounded once, half-even, to the
//! requested width. Division by zero yields an infinity (or NaN for `0/0`),
//! the caller decides whether that is an error.

use std::cmp::Ordering;

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::Zero;

use super::{count_digits, pow10, round, Decimal, DecimalWidth};

/// Magnitude of `d` scaled to exponent `to`, which must not exceed its own.
fn scaled(d: &Decimal, to: i64) -> BigUint {
    BigUint::from(d.coefficient) * pow10((d.exponent as i64 - to) as usize)
}

fn signed(negative: bool, magnitude: BigUint) -> BigInt {
    let sign = if magnitude.is_zero() {
        Sign::NoSign
    } else if negative {
        Sign::Minus
    } else {
        Sign::Plus
    };
    BigInt::from_biguint(sign, magnitude)
}

pub fn add(a: &Decimal, b: &Decimal, width: DecimalWidth) -> Decimal {
    if a.is_nan() || b.is_nan() {
        return Decimal::NAN;
    }
    match (a.is_infinite(), b.is_infinite()) {
        (true, true) if a.negative != b.negative => return Decimal::NAN,
        (true, _) => return *a,
        (_, true) => return *b,
        _ => {}
    }
    if a.is_zero() && b.is_zero() {
        let exponent = a.exponent.min(b.exponent);
        return Decimal::finite(a.negative && b.negative, 0, exponent);
    }
    if b.is_zero() {
        return a.round_to(width);
    }
    if a.is_zero() {
        return b.round_to(width);
    }

    // An operand far below the other only matters as a sticky digit
    let (hi, lo) = if a.exponent >= b.exponent { (a, b) } else { (b, a) };
    let floor = hi.exponent as i64 - width.digits() as i64 - 3;
    let lo = if (lo.exponent as i64) < floor && (lo.digit_count() as i64 + lo.exponent as i64) < floor {
        Decimal::finite(lo.negative, 1, floor as i32)
    } else {
        *lo
    };

    let exponent = (hi.exponent as i64).min(lo.exponent as i64);
    let sum = signed(hi.negative, scaled(hi, exponent)) + signed(lo.negative, scaled(&lo, exponent));
    let negative = match sum.sign() {
        Sign::Minus => true,
        Sign::Plus => false,
        // Exact cancellation gives +0
        Sign::NoSign => false,
    };
    round(negative, sum.magnitude().clone(), exponent, false, width)
}

pub fn sub(a: &Decimal, b: &Decimal, width: DecimalWidth) -> Decimal {
    add(a, &b.neg(), width)
}

pub fn mul(a: &Decimal, b: &Decimal, width: DecimalWidth) -> Decimal {
    let negative = a.negative != b.negative;
    if a.is_nan() || b.is_nan() {
        return Decimal::NAN;
    }
    if a.is_infinite() || b.is_infinite() {
        if a.is_zero() || b.is_zero() {
            return Decimal::NAN;
        }
        return Decimal::infinity(negative);
    }
    let product = BigUint::from(a.coefficient) * BigUint::from(b.coefficient);
    round(negative, product, a.exponent as i64 + b.exponent as i64, false, width)
}

pub fn div(a: &Decimal, b: &Decimal, width: DecimalWidth) -> Decimal {
    let negative = a.negative != b.negative;
    if a.is_nan() || b.is_nan() {
        return Decimal::NAN;
    }
    match (a.is_infinite(), b.is_infinite()) {
        (true, true) => return Decimal::NAN,
        (true, false) => return Decimal::infinity(negative),
        (false, true) => return Decimal::finite(negative, 0, width.min_q() as i32),
        (false, false) => {}
    }
    if b.is_zero() {
        return if a.is_zero() { Decimal::NAN } else { Decimal::infinity(negative) };
    }

    let ideal = a.exponent as i64 - b.exponent as i64;
    if a.is_zero() {
        return round(negative, BigUint::zero(), ideal, false, width);
    }

    let divisor = BigUint::from(b.coefficient);
    let dividend = BigUint::from(a.coefficient);
    // Enough quotient digits for the precision plus a rounding digit
    let shift = (width.digits() + 2 + count_digits(&divisor)).saturating_sub(count_digits(&dividend));
    let (mut q, r) = (dividend * pow10(shift)).div_rem(&divisor);
    let mut exponent = ideal - shift as i64;

    if r.is_zero() {
        // Exact: prefer the exponent closest to the ideal one
        let ten = BigUint::from(10u32);
        while exponent < ideal {
            let (next, digit) = q.div_rem(&ten);
            if !digit.is_zero() {
                break;
            }
            q = next;
            exponent += 1;
        }
        return round(negative, q, exponent, false, width);
    }
    round(negative, q, exponent, true, width)
}

/// Truncated-quotient remainder of the aligned magnitudes.
fn aligned_rem(a: &Decimal, b: &Decimal) -> (BigUint, BigUint, i64) {
    let exponent = (a.exponent as i64).min(b.exponent as i64);
    let x = scaled(a, exponent);
    let y = scaled(b, exponent);
    (x % &y, y, exponent)
}

fn special_rem(a: &Decimal, b: &Decimal) -> Option<Decimal> {
    if a.is_nan() || b.is_nan() || a.is_infinite() || b.is_zero() {
        return Some(Decimal::NAN);
    }
    if b.is_infinite() {
        return Some(*a);
    }
    None
}

/// Remainder with the sign of the dividend.
pub fn remainder(a: &Decimal, b: &Decimal, width: DecimalWidth) -> Decimal {
    if let Some(special) = special_rem(a, b) {
        return special;
    }
    let (r, _, exponent) = aligned_rem(a, b);
    round(a.negative, r, exponent, false, width)
}

/// Modulo with the sign of the divisor.
pub fn modulo(a: &Decimal, b: &Decimal, width: DecimalWidth) -> Decimal {
    if let Some(special) = special_rem(a, b) {
        return special;
    }
    let (r, y, exponent) = aligned_rem(a, b);
    if r.is_zero() {
        return round(false, r, exponent, false, width);
    }
    if a.negative != b.negative {
        return round(b.negative, y - r, exponent, false, width);
    }
    round(a.negative, r, exponent, false, width)
}

/// Numeric comparison, `None` when either side is NaN. Zeros compare equal
/// regardless of sign.
pub fn compare(a: &Decimal, b: &Decimal) -> Option<Ordering> {
    if a.is_nan() || b.is_nan() {
        return None;
    }
    let rank = |d: &Decimal| match (d.is_infinite(), d.negative) {
        (true, true) => -1,
        (true, false) => 1,
        _ => 0,
    };
    let (ra, rb) = (rank(a), rank(b));
    if ra != 0 || rb != 0 {
        return Some(ra.cmp(&rb));
    }
    let exponent = (a.exponent as i64).min(b.exponent as i64);
    let x = signed(a.negative, scaled(a, exponent));
    let y = signed(b.negative, scaled(b, exponent));
    Some(x.cmp(&y))
}
