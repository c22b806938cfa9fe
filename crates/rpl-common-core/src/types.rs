//! Object type tags shared by the heap, the collector and the numeric code.

use num_enum::TryFromPrimitive;

/// Type tag written in front of every heap object.
///
/// The tag is stored as LEB128, so the numeric value is part of the object
/// encoding: never renumber an existing variant.
///
/// Tags below `FIRST_USER_TYPE_ID` are built-in kinds with a fixed payload
/// layout. Tags at or above it belong to kinds registered by the embedding
/// system, which must describe their payload size at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u16)]
pub enum TypeId {
    // Machine integers (LEB128 magnitude)
    Integer = 1,
    NegInteger = 2,
    HexInteger = 3,
    DecInteger = 4,
    OctInteger = 5,
    BinInteger = 6,
    BasedInteger = 7,

    // Arbitrary-precision integers (length + little-endian magnitude)
    Bignum = 8,
    NegBignum = 9,
    HexBignum = 10,
    DecBignum = 11,
    OctBignum = 12,
    BinBignum = 13,
    BasedBignum = 14,

    // Decimal floating point (BID interchange encoding)
    Decimal32 = 15,
    Decimal64 = 16,
    Decimal128 = 17,

    // Non-numeric kinds
    Symbol = 18,
    Text = 19,
    List = 20,
    Program = 21,
    Locals = 22,
    Local = 23,

    // Arithmetic commands (empty payload)
    Add = 24,
    Sub = 25,
    Mul = 26,
    Div = 27,
    Neg = 28,
}

/// First tag reserved for kinds registered by the embedding system.
/// Tags below this are builtin kinds (TypeId enum values).
pub const FIRST_USER_TYPE_ID: u16 = 128;

/// Radix attached to an integer object.
///
/// `Plain` integers are signed decimal values. The other bases are unsigned
/// and keep their radix across promotion so that rendering is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Base {
    Plain,
    Hex,
    Dec,
    Oct,
    Bin,
    /// Radix taken from the settings at render time.
    Based,
}

impl Base {
    pub fn is_based(self) -> bool {
        self != Base::Plain
    }

    /// Fixed radix of this base, `None` for `Plain` and `Based`.
    pub fn radix(self) -> Option<u32> {
        match self {
            Base::Hex => Some(16),
            Base::Dec => Some(10),
            Base::Oct => Some(8),
            Base::Bin => Some(2),
            Base::Plain | Base::Based => None,
        }
    }
}

impl TypeId {
    /// Create a TypeId from its raw tag.
    #[inline]
    pub fn from_u16(v: u16) -> Option<Self> {
        Self::try_from(v).ok()
    }

    #[inline]
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::NegInteger => "neg_integer",
            Self::HexInteger => "hex_integer",
            Self::DecInteger => "dec_integer",
            Self::OctInteger => "oct_integer",
            Self::BinInteger => "bin_integer",
            Self::BasedInteger => "based_integer",
            Self::Bignum => "bignum",
            Self::NegBignum => "neg_bignum",
            Self::HexBignum => "hex_bignum",
            Self::DecBignum => "dec_bignum",
            Self::OctBignum => "oct_bignum",
            Self::BinBignum => "bin_bignum",
            Self::BasedBignum => "based_bignum",
            Self::Decimal32 => "decimal32",
            Self::Decimal64 => "decimal64",
            Self::Decimal128 => "decimal128",
            Self::Symbol => "symbol",
            Self::Text => "text",
            Self::List => "list",
            Self::Program => "program",
            Self::Locals => "locals",
            Self::Local => "local",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Neg => "neg",
        }
    }

    /// Is this a fixed-width machine integer?
    pub fn is_integer(self) -> bool {
        (Self::Integer as u16..=Self::BasedInteger as u16).contains(&(self as u16))
    }

    /// Is this an arbitrary-precision integer?
    pub fn is_bignum(self) -> bool {
        (Self::Bignum as u16..=Self::BasedBignum as u16).contains(&(self as u16))
    }

    pub fn is_decimal(self) -> bool {
        matches!(self, Self::Decimal32 | Self::Decimal64 | Self::Decimal128)
    }

    /// Is this one of the numeric kinds handled by the numeric tower?
    pub fn is_algebraic(self) -> bool {
        self.is_integer() || self.is_bignum() || self.is_decimal()
    }

    pub fn is_command(self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Neg)
    }

    /// Negative plain integer or bignum?
    pub fn is_negative(self) -> bool {
        matches!(self, Self::NegInteger | Self::NegBignum)
    }

    /// Base of an integer or bignum tag, `None` for other kinds.
    pub fn base(self) -> Option<Base> {
        match self {
            Self::Integer | Self::NegInteger | Self::Bignum | Self::NegBignum => Some(Base::Plain),
            Self::HexInteger | Self::HexBignum => Some(Base::Hex),
            Self::DecInteger | Self::DecBignum => Some(Base::Dec),
            Self::OctInteger | Self::OctBignum => Some(Base::Oct),
            Self::BinInteger | Self::BinBignum => Some(Base::Bin),
            Self::BasedInteger | Self::BasedBignum => Some(Base::Based),
            _ => None,
        }
    }

    /// Tag of a machine integer with the given base and sign.
    /// Based integers are unsigned, so `negative` only matters for `Plain`.
    pub fn integer(base: Base, negative: bool) -> Self {
        match base {
            Base::Plain if negative => Self::NegInteger,
            Base::Plain => Self::Integer,
            Base::Hex => Self::HexInteger,
            Base::Dec => Self::DecInteger,
            Base::Oct => Self::OctInteger,
            Base::Bin => Self::BinInteger,
            Base::Based => Self::BasedInteger,
        }
    }

    /// Tag of a bignum with the given base and sign.
    pub fn bignum(base: Base, negative: bool) -> Self {
        match base {
            Base::Plain if negative => Self::NegBignum,
            Base::Plain => Self::Bignum,
            Base::Hex => Self::HexBignum,
            Base::Dec => Self::DecBignum,
            Base::Oct => Self::OctBignum,
            Base::Bin => Self::BinBignum,
            Base::Based => Self::BasedBignum,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trip() {
        for raw in 1..=28u16 {
            let ty = TypeId::from_u16(raw).unwrap();
            assert_eq!(ty.as_u16(), raw);
        }
        assert!(TypeId::from_u16(0).is_none());
        assert!(TypeId::from_u16(FIRST_USER_TYPE_ID).is_none());
    }

    #[test]
    fn test_classification() {
        assert!(TypeId::HexInteger.is_integer());
        assert!(!TypeId::HexInteger.is_bignum());
        assert!(TypeId::BasedBignum.is_bignum());
        assert!(TypeId::Decimal64.is_algebraic());
        assert!(!TypeId::Symbol.is_algebraic());
        assert!(TypeId::Div.is_command());
        assert!(TypeId::NegBignum.is_negative());
    }

    #[test]
    fn test_base_mapping() {
        for base in [Base::Plain, Base::Hex, Base::Dec, Base::Oct, Base::Bin, Base::Based] {
            assert_eq!(TypeId::integer(base, false).base(), Some(base));
            assert_eq!(TypeId::bignum(base, false).base(), Some(base));
        }
        assert_eq!(TypeId::integer(Base::Plain, true), TypeId::NegInteger);
        assert_eq!(TypeId::integer(Base::Hex, true), TypeId::HexInteger);
        assert_eq!(TypeId::Symbol.base(), None);
    }
}
