//! Arithmetic on algebraic values.
//!
//! Both operands are promoted to the wider of their two kinds, then the
//! operation runs in that kind. Two cases move further up the ladder:
//! integer overflow widens to a bignum, and an inexact integer division
//! produces a decimal of the width selected by the precision setting.
//!
//! Based integers are unsigned 64-bit words and wrap around. Based bignums
//! cannot go negative.

use std::cmp::Ordering;

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};
use rpl_common_core::{Base, Settings};

use crate::algebraic::{Algebraic, NumericKind};
use crate::decimal::{arith, Decimal, DecimalWidth};
use crate::error::{Result, RuntimeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

pub fn add(a: &Algebraic, b: &Algebraic, settings: &Settings) -> Result<Algebraic> {
    binary(BinaryOp::Add, a, b, settings)
}

pub fn sub(a: &Algebraic, b: &Algebraic, settings: &Settings) -> Result<Algebraic> {
    binary(BinaryOp::Sub, a, b, settings)
}

pub fn mul(a: &Algebraic, b: &Algebraic, settings: &Settings) -> Result<Algebraic> {
    binary(BinaryOp::Mul, a, b, settings)
}

pub fn div(a: &Algebraic, b: &Algebraic, settings: &Settings) -> Result<Algebraic> {
    binary(BinaryOp::Div, a, b, settings)
}

/// Apply `op` after aligning both operands on the wider kind.
pub fn binary(op: BinaryOp, a: &Algebraic, b: &Algebraic, settings: &Settings) -> Result<Algebraic> {
    let kind = a.kind().max(b.kind());
    let x = a.promote_to(kind)?;
    let y = b.promote_to(kind)?;
    if op == BinaryOp::Div && y.is_zero() {
        return Err(RuntimeError::DivideByZero);
    }

    match kind {
        NumericKind::Integer => integer_op(op, &x, &y, settings),
        NumericKind::Bignum => bignum_op(op, &x, &y, settings),
        _ => {
            let (dx, width) = x.as_decimal().ok_or(RuntimeError::TypeError)?;
            let (dy, _) = y.as_decimal().ok_or(RuntimeError::TypeError)?;
            Ok(Algebraic::from_decimal(width, &decimal_op(op, &dx, &dy, width)))
        }
    }
}

fn decimal_op(op: BinaryOp, x: &Decimal, y: &Decimal, width: DecimalWidth) -> Decimal {
    match op {
        BinaryOp::Add => arith::add(x, y, width),
        BinaryOp::Sub => arith::sub(x, y, width),
        BinaryOp::Mul => arith::mul(x, y, width),
        BinaryOp::Div => arith::div(x, y, width),
    }
}

/// Base of a result: the first operand's if it is based, else the second's.
fn result_base(x: &Algebraic, y: &Algebraic) -> Base {
    match (x.base(), y.base()) {
        (Some(b), _) if b.is_based() => b,
        (_, Some(b)) => b,
        _ => Base::Plain,
    }
}

/// Inexact plain division: redo it in the decimal kind picked by precision.
fn divide_as_decimal(x: &Algebraic, y: &Algebraic, settings: &Settings) -> Result<Algebraic> {
    let (dx, kind) = x.auto_promote(settings)?;
    let dy = y.promote_to(kind)?;
    binary(BinaryOp::Div, &dx, &dy, settings)
}

// =============================================================================
// Machine integers
// =============================================================================

fn wrap(v: i128) -> u64 {
    v.rem_euclid(1i128 << 64) as u64
}

fn integer_op(op: BinaryOp, x: &Algebraic, y: &Algebraic, settings: &Settings) -> Result<Algebraic> {
    let (Some(vx), Some(vy)) = (x.as_i128(), y.as_i128()) else {
        return Err(RuntimeError::TypeError);
    };
    let base = result_base(x, y);

    if base.is_based() {
        let (ux, uy) = (wrap(vx), wrap(vy));
        let word = match op {
            BinaryOp::Add => ux.wrapping_add(uy),
            BinaryOp::Sub => ux.wrapping_sub(uy),
            BinaryOp::Mul => ux.wrapping_mul(uy),
            BinaryOp::Div => ux.checked_div(uy).ok_or(RuntimeError::DivideByZero)?,
        };
        return Ok(Algebraic::based(word, base));
    }

    let exact = match op {
        BinaryOp::Add => vx.checked_add(vy),
        BinaryOp::Sub => vx.checked_sub(vy),
        BinaryOp::Mul => vx.checked_mul(vy),
        BinaryOp::Div => {
            if vy == 0 {
                return Err(RuntimeError::DivideByZero);
            }
            if vx % vy != 0 {
                return divide_as_decimal(x, y, settings);
            }
            vx.checked_div(vy)
        }
    };
    match exact {
        Some(v) => Ok(Algebraic::from_i128(v)),
        None => {
            tracing::trace!(?op, "integer overflow, widening to bignum");
            bignum_op(op, &x.promote_to(NumericKind::Bignum)?, &y.promote_to(NumericKind::Bignum)?, settings)
        }
    }
}

// =============================================================================
// Bignums
// =============================================================================

fn signed_bignum(value: &Algebraic) -> Result<BigInt> {
    match value {
        Algebraic::Bignum { negative, magnitude, .. } => {
            let sign = if *negative { Sign::Minus } else { Sign::Plus };
            Ok(BigInt::from_biguint(sign, magnitude.clone()))
        }
        _ => Err(RuntimeError::TypeError),
    }
}

fn bignum_op(op: BinaryOp, x: &Algebraic, y: &Algebraic, settings: &Settings) -> Result<Algebraic> {
    let (bx, by) = (signed_bignum(x)?, signed_bignum(y)?);
    let base = result_base(x, y);

    let result = match op {
        BinaryOp::Add => bx + by,
        BinaryOp::Sub => bx - by,
        BinaryOp::Mul => bx * by,
        BinaryOp::Div => {
            if by.is_zero() {
                return Err(RuntimeError::DivideByZero);
            }
            let (q, r) = bx.div_rem(&by);
            if !r.is_zero() && !base.is_based() {
                return divide_as_decimal(x, y, settings);
            }
            q
        }
    };

    if base.is_based() && result.is_negative() {
        return Err(RuntimeError::Overflow);
    }
    Ok(Algebraic::Bignum {
        negative: result.is_negative(),
        magnitude: result.magnitude().clone(),
        base,
    })
}

// =============================================================================
// Unary operations and comparison
// =============================================================================

pub fn neg(value: &Algebraic) -> Result<Algebraic> {
    Ok(match value {
        Algebraic::Integer { magnitude, base, .. } if base.is_based() => {
            Algebraic::based(magnitude.wrapping_neg(), *base)
        }
        Algebraic::Integer { negative, magnitude, base } => Algebraic::Integer {
            negative: !negative && *magnitude != 0,
            magnitude: *magnitude,
            base: *base,
        },
        Algebraic::Bignum { magnitude, base, .. } if base.is_based() => {
            if !magnitude.is_zero() {
                return Err(RuntimeError::Overflow);
            }
            value.clone()
        }
        Algebraic::Bignum { negative, magnitude, base } => Algebraic::Bignum {
            negative: !negative && !magnitude.is_zero(),
            magnitude: magnitude.clone(),
            base: *base,
        },
        Algebraic::Decimal32(d) => Algebraic::Decimal32(d.neg()),
        Algebraic::Decimal64(d) => Algebraic::Decimal64(d.neg()),
        Algebraic::Decimal128(d) => Algebraic::Decimal128(d.neg()),
    })
}

/// Compare two values after promotion. NaN does not compare.
pub fn compare(a: &Algebraic, b: &Algebraic) -> Result<Ordering> {
    let kind = a.kind().max(b.kind());
    let x = a.promote_to(kind)?;
    let y = b.promote_to(kind)?;
    match kind {
        NumericKind::Integer => match (x.as_i128(), y.as_i128()) {
            (Some(vx), Some(vy)) => Ok(vx.cmp(&vy)),
            _ => Err(RuntimeError::TypeError),
        },
        NumericKind::Bignum => Ok(signed_bignum(&x)?.cmp(&signed_bignum(&y)?)),
        _ => {
            let (dx, _) = x.as_decimal().ok_or(RuntimeError::TypeError)?;
            let (dy, _) = y.as_decimal().ok_or(RuntimeError::TypeError)?;
            arith::compare(&dx, &dy).ok_or(RuntimeError::TypeError)
        }
    }
}

pub fn is_zero(value: &Algebraic) -> bool {
    value.is_zero()
}

fn saturate(negative: bool, magnitude: &BigUint) -> i32 {
    let limit = if negative { 1u64 << 31 } else { i32::MAX as u64 };
    let m = magnitude.to_u64().unwrap_or(u64::MAX).min(limit) as i64;
    (if negative { -m } else { m }) as i32
}

/// Convert to an `i32`, truncating decimals toward zero and saturating at
/// the bounds of the type.
pub fn as_i32(value: &Algebraic) -> Result<i32> {
    match value {
        Algebraic::Integer { negative, magnitude, .. } => Ok(saturate(*negative, &BigUint::from(*magnitude))),
        Algebraic::Bignum { negative, magnitude, .. } => Ok(saturate(*negative, magnitude)),
        _ => {
            let (d, _) = value.as_decimal().ok_or(RuntimeError::TypeError)?;
            if d.is_nan() {
                return Err(RuntimeError::TypeError);
            }
            if d.is_infinite() {
                return Ok(if d.negative { i32::MIN } else { i32::MAX });
            }
            let coefficient = BigUint::from(d.coefficient);
            let magnitude = if d.exponent >= 0 {
                if d.coefficient != 0 && d.exponent > 10 {
                    return Ok(if d.negative { i32::MIN } else { i32::MAX });
                }
                coefficient * BigUint::from(10u32).pow(d.exponent as u32)
            } else if d.exponent < -40 {
                BigUint::zero()
            } else {
                coefficient / BigUint::from(10u32).pow(d.exponent.unsigned_abs())
            };
            Ok(saturate(d.negative, &magnitude))
        }
    }
}
