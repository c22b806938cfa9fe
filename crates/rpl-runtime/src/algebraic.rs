//! Numeric tower.
//!
//! `Algebraic` is the closed set of numeric values the arithmetic works on.
//! Kinds are ordered from narrowest to widest:
//!
//! ```text
//! Integer < Bignum < Decimal32 < Decimal64 < Decimal128
//! ```
//!
//! `promote_to` only ever widens. Narrowing between decimal widths goes
//! through `truncate_to`, which rounds.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use rpl_common_core::{leb128, Base, Settings, TypeId};

use crate::decimal::{Decimal, Decimal128, Decimal32, Decimal64, DecimalWidth};
use crate::error::{Result, RuntimeError};
use crate::integer;
use crate::objects::number;

// =============================================================================
// Kinds
// =============================================================================

/// Position of a value on the numeric ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumericKind {
    Integer,
    Bignum,
    Decimal32,
    Decimal64,
    Decimal128,
}

impl NumericKind {
    /// Kind of a numeric tag.
    pub fn of(ty: TypeId) -> Option<Self> {
        if ty.is_integer() {
            Some(NumericKind::Integer)
        } else if ty.is_bignum() {
            Some(NumericKind::Bignum)
        } else {
            DecimalWidth::of(ty).map(NumericKind::decimal)
        }
    }

    pub fn decimal(width: DecimalWidth) -> Self {
        match width {
            DecimalWidth::W32 => NumericKind::Decimal32,
            DecimalWidth::W64 => NumericKind::Decimal64,
            DecimalWidth::W128 => NumericKind::Decimal128,
        }
    }

    pub fn width(self) -> Option<DecimalWidth> {
        match self {
            NumericKind::Decimal32 => Some(DecimalWidth::W32),
            NumericKind::Decimal64 => Some(DecimalWidth::W64),
            NumericKind::Decimal128 => Some(DecimalWidth::W128),
            NumericKind::Integer | NumericKind::Bignum => None,
        }
    }

    /// Decimal kind selected by the precision setting.
    pub fn for_precision(precision: u16) -> Self {
        NumericKind::decimal(DecimalWidth::for_precision(precision))
    }
}

// =============================================================================
// Values
// =============================================================================

/// A numeric value.
///
/// Integers carry a sign and a magnitude. Based integers (`#1Ah`) are
/// unsigned and keep their base through promotion.
#[derive(Debug, Clone, PartialEq)]
pub enum Algebraic {
    Integer { negative: bool, magnitude: u64, base: Base },
    Bignum { negative: bool, magnitude: BigUint, base: Base },
    Decimal32(Decimal32),
    Decimal64(Decimal64),
    Decimal128(Decimal128),
}

impl Algebraic {
    pub fn from_i64(value: i64) -> Self {
        Algebraic::Integer {
            negative: value < 0,
            magnitude: value.unsigned_abs(),
            base: Base::Plain,
        }
    }

    /// Plain integer, or a bignum when the magnitude exceeds 64 bits.
    pub fn from_i128(value: i128) -> Self {
        let negative = value < 0;
        let magnitude = value.unsigned_abs();
        match u64::try_from(magnitude) {
            Ok(m) => Algebraic::Integer { negative, magnitude: m, base: Base::Plain },
            Err(_) => Algebraic::Bignum {
                negative,
                magnitude: BigUint::from(magnitude),
                base: Base::Plain,
            },
        }
    }

    pub fn based(magnitude: u64, base: Base) -> Self {
        Algebraic::Integer { negative: false, magnitude, base }
    }

    /// Wrap an unpacked decimal at the given width.
    pub fn from_decimal(width: DecimalWidth, value: &Decimal) -> Self {
        match width {
            DecimalWidth::W32 => Algebraic::Decimal32(Decimal32::pack(value)),
            DecimalWidth::W64 => Algebraic::Decimal64(Decimal64::pack(value)),
            DecimalWidth::W128 => Algebraic::Decimal128(Decimal128::pack(value)),
        }
    }

    pub fn kind(&self) -> NumericKind {
        match self {
            Algebraic::Integer { .. } => NumericKind::Integer,
            Algebraic::Bignum { .. } => NumericKind::Bignum,
            Algebraic::Decimal32(_) => NumericKind::Decimal32,
            Algebraic::Decimal64(_) => NumericKind::Decimal64,
            Algebraic::Decimal128(_) => NumericKind::Decimal128,
        }
    }

    /// Base of an integer value, `None` for decimals.
    pub fn base(&self) -> Option<Base> {
        match self {
            Algebraic::Integer { base, .. } | Algebraic::Bignum { base, .. } => Some(*base),
            _ => None,
        }
    }

    pub fn is_based(&self) -> bool {
        self.base().is_some_and(Base::is_based)
    }

    /// Unpacked decimal and its width, `None` for integers.
    pub fn as_decimal(&self) -> Option<(Decimal, DecimalWidth)> {
        match self {
            Algebraic::Decimal32(d) => Some((d.unpack(), DecimalWidth::W32)),
            Algebraic::Decimal64(d) => Some((d.unpack(), DecimalWidth::W64)),
            Algebraic::Decimal128(d) => Some((d.unpack(), DecimalWidth::W128)),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Algebraic::Integer { magnitude, .. } => *magnitude == 0,
            Algebraic::Bignum { magnitude, .. } => magnitude.is_zero(),
            _ => self.as_decimal().is_some_and(|(d, _)| d.is_zero()),
        }
    }

    // =========================================================================
    // Promotion
    // =========================================================================

    /// Convert to a wider kind. Fails when no widening rule exists, which
    /// includes every narrowing and any conversion of a based integer to a
    /// decimal.
    pub fn promote_to(&self, target: NumericKind) -> Result<Algebraic> {
        let from = self.kind();
        if from == target {
            return Ok(self.clone());
        }
        let promoted = match (self, target) {
            (Algebraic::Integer { negative, magnitude, base }, NumericKind::Bignum) => {
                Some(Algebraic::Bignum {
                    negative: *negative,
                    magnitude: BigUint::from(*magnitude),
                    base: *base,
                })
            }
            (Algebraic::Integer { negative, magnitude, base: Base::Plain }, _) => target
                .width()
                .map(|w| Algebraic::from_decimal(w, &Decimal::from_u64(*negative, *magnitude, w))),
            (Algebraic::Bignum { negative, magnitude, base: Base::Plain }, _) => target
                .width()
                .map(|w| Algebraic::from_decimal(w, &Decimal::from_biguint(*negative, magnitude, w))),
            _ => match (self.as_decimal(), target.width()) {
                (Some((d, src)), Some(dst)) if dst > src => Some(Algebraic::from_decimal(dst, &d)),
                _ => None,
            },
        };
        promoted.ok_or_else(|| {
            tracing::debug!(?from, to = ?target, "no promotion rule");
            RuntimeError::InvalidPromotion { from, to: target }
        })
    }

    /// Promote to the decimal width selected by `precision`. A decimal wider
    /// than that width is not narrowed: this fails with `InvalidPromotion`,
    /// and `truncate_to` is the way down.
    pub fn auto_promote(&self, settings: &Settings) -> Result<(Algebraic, NumericKind)> {
        let target = NumericKind::for_precision(settings.precision);
        Ok((self.promote_to(target)?, target))
    }

    /// Widen a machine integer to a bignum of the same base and sign.
    /// Returns the resulting tag, unchanged for anything else.
    pub fn promote_to_bignum(&self) -> (Algebraic, TypeId) {
        let promoted = match self {
            Algebraic::Integer { negative, magnitude, base } => Algebraic::Bignum {
                negative: *negative,
                magnitude: BigUint::from(*magnitude),
                base: *base,
            },
            other => other.clone(),
        };
        let ty = promoted.type_id();
        (promoted, ty)
    }

    /// Narrow a decimal to a smaller width, rounding half-even.
    pub fn truncate_to(&self, target: NumericKind) -> Result<Algebraic> {
        let from = self.kind();
        match (self.as_decimal(), target.width()) {
            (Some((d, src)), Some(dst)) if dst <= src => Ok(Algebraic::from_decimal(dst, &d.round_to(dst))),
            _ => {
                tracing::debug!(?from, to = ?target, "no truncation rule");
                Err(RuntimeError::InvalidPromotion { from, to: target })
            }
        }
    }

    // =========================================================================
    // Object encoding
    // =========================================================================

    pub fn type_id(&self) -> TypeId {
        match self {
            Algebraic::Integer { negative, magnitude, base } => {
                TypeId::integer(*base, *negative && *magnitude != 0)
            }
            Algebraic::Bignum { negative, magnitude, base } => {
                TypeId::bignum(*base, *negative && !magnitude.is_zero())
            }
            Algebraic::Decimal32(_) => TypeId::Decimal32,
            Algebraic::Decimal64(_) => TypeId::Decimal64,
            Algebraic::Decimal128(_) => TypeId::Decimal128,
        }
    }

    /// Append the object payload.
    pub fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Algebraic::Integer { magnitude, .. } => number::encode_integer(out, *magnitude),
            Algebraic::Bignum { magnitude, .. } => number::encode_bignum(out, magnitude),
            Algebraic::Decimal32(d) => number::encode_decimal(out, DecimalWidth::W32, d.to_bits() as u128),
            Algebraic::Decimal64(d) => number::encode_decimal(out, DecimalWidth::W64, d.to_bits() as u128),
            Algebraic::Decimal128(d) => number::encode_decimal(out, DecimalWidth::W128, d.to_bits()),
        }
    }

    /// Append the whole object, tag included.
    pub fn encode_object(&self, out: &mut Vec<u8>) {
        leb128::encode(out, self.type_id().as_u16() as u64);
        self.encode(out);
    }

    /// Read a numeric object payload, `None` for other tags or bad payloads.
    pub fn decode(ty: TypeId, payload: &[u8]) -> Option<Algebraic> {
        let negative = ty.is_negative();
        if ty.is_integer() {
            let magnitude = number::decode_integer(payload)?;
            return Some(Algebraic::Integer { negative, magnitude, base: ty.base()? });
        }
        if ty.is_bignum() {
            let magnitude = number::decode_bignum(payload)?;
            return Some(Algebraic::Bignum { negative, magnitude, base: ty.base()? });
        }
        let width = DecimalWidth::of(ty)?;
        let bits = number::decode_decimal(payload, width)?;
        Some(match width {
            DecimalWidth::W32 => Algebraic::Decimal32(Decimal32::from_bits(bits as u32)),
            DecimalWidth::W64 => Algebraic::Decimal64(Decimal64::from_bits(bits as u64)),
            DecimalWidth::W128 => Algebraic::Decimal128(Decimal128::from_bits(bits)),
        })
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    pub fn render(&self, settings: &Settings, editing: bool) -> String {
        match self {
            Algebraic::Integer { negative, magnitude, base } => {
                integer::render(*negative, &BigUint::from(*magnitude), *base, settings)
            }
            Algebraic::Bignum { negative, magnitude, base } => {
                integer::render(*negative, magnitude, *base, settings)
            }
            Algebraic::Decimal32(d) => d.render(settings, editing),
            Algebraic::Decimal64(d) => d.render(settings, editing),
            Algebraic::Decimal128(d) => d.render(settings, editing),
        }
    }

    /// Signed value of an integer, when it fits an `i128`.
    pub(crate) fn as_i128(&self) -> Option<i128> {
        let (negative, magnitude) = match self {
            Algebraic::Integer { negative, magnitude, .. } => (*negative, *magnitude as i128),
            Algebraic::Bignum { negative, magnitude, .. } => (*negative, magnitude.to_i128()?),
            _ => return None,
        };
        Some(if negative { -magnitude } else { magnitude })
    }
}
