//! Runtime errors.

use thiserror::Error;

use crate::algebraic::NumericKind;

/// Runtime result type
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Why a parser rejected its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// More digits than the decimal width can represent
    MantissaTooLong,
    /// Exponent marker without exponent digits
    ExponentMissing,
    /// Exponent outside the range of the decimal width
    ExponentRange,
    /// Not a number at all
    InvalidNumber,
    /// Based integer without a valid base suffix or with invalid digits
    InvalidBasedNumber,
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            ParseErrorKind::MantissaTooLong => "too many digits",
            ParseErrorKind::ExponentMissing => "malformed exponent",
            ParseErrorKind::ExponentRange => "exponent out of range",
            ParseErrorKind::InvalidNumber => "invalid number",
            ParseErrorKind::InvalidBasedNumber => "invalid based number",
        };
        f.write_str(msg)
    }
}

/// Runtime errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("out of memory allocating {requested} bytes")]
    OutOfMemory { requested: usize },

    #[error("heap corrupted at offset {offset}")]
    HeapCorrupted { offset: usize },

    #[error("invalid object")]
    InvalidObject,

    #[error("bad argument type")]
    TypeError,

    #[error("cannot promote {from:?} to {to:?}")]
    InvalidPromotion { from: NumericKind, to: NumericKind },

    #[error("invalid local variable {index}")]
    LocalOutOfScope { index: usize },

    #[error("local variable cannot be stored in a global")]
    LocalEscapesScope,

    #[error("too few arguments")]
    StackUnderflow,

    #[error("divide by zero")]
    DivideByZero,

    #[error("numeric overflow")]
    Overflow,

    #[error("interrupted")]
    Interrupted,

    #[error("undefined name {0}")]
    UndefinedName(String),

    #[error("invalid plot range")]
    InvalidPlotRange,

    #[error("{kind} at offset {offset}")]
    Parse { kind: ParseErrorKind, offset: usize },

    #[error("kind {0} is already registered or reserved")]
    KindConflict(u16),
}

impl RuntimeError {
    /// Fatal errors abort the whole evaluation instead of the current operation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RuntimeError::OutOfMemory { .. } | RuntimeError::HeapCorrupted { .. })
    }
}
