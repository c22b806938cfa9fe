//! Number parsing driver.
//!
//! Each parser answers with a `ParseOutcome`: a value, `Skip` when the text
//! is not for this parser, `Warn` when a wider representation should be
//! tried, or `Error` when the text is malformed.

use rpl_common_core::Settings;

use crate::algebraic::Algebraic;
use crate::decimal::{parse as decimal_parse, DecimalWidth};
use crate::error::{ParseErrorKind, Result, RuntimeError};
use crate::integer;

/// What went wrong, and where in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseDiagnostic {
    pub kind: ParseErrorKind,
    /// Byte offset in the source
    pub offset: usize,
}

impl ParseDiagnostic {
    pub fn new(kind: ParseErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

impl From<ParseDiagnostic> for RuntimeError {
    fn from(d: ParseDiagnostic) -> Self {
        RuntimeError::Parse { kind: d.kind, offset: d.offset }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    /// Parsed `value` from the bytes before `end`
    Ok { value: T, end: usize },
    /// Not this kind of object
    Skip,
    /// Recoverable, retry with a wider representation
    Warn(ParseDiagnostic),
    /// Malformed input
    Error(ParseDiagnostic),
}

impl<T> ParseOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ParseOutcome<U> {
        match self {
            ParseOutcome::Ok { value, end } => ParseOutcome::Ok { value: f(value), end },
            ParseOutcome::Skip => ParseOutcome::Skip,
            ParseOutcome::Warn(d) => ParseOutcome::Warn(d),
            ParseOutcome::Error(d) => ParseOutcome::Error(d),
        }
    }

    /// `Ok(None)` for `Skip`, an error for `Warn` and `Error`.
    pub fn into_result(self) -> Result<Option<(T, usize)>> {
        match self {
            ParseOutcome::Ok { value, end } => Ok(Some((value, end))),
            ParseOutcome::Skip => Ok(None),
            ParseOutcome::Warn(d) | ParseOutcome::Error(d) => Err(d.into()),
        }
    }
}

/// Parse a number at the start of `src`: an integer, a based integer or a
/// decimal. Decimals start at the width selected by the precision setting
/// and move to wider ones while the parser asks for it.
pub fn parse_number(src: &str, settings: &Settings, precedence: i32) -> ParseOutcome<Algebraic> {
    match integer::parse(src, settings, precedence) {
        ParseOutcome::Skip => {}
        other => return other,
    }

    let mut width = DecimalWidth::for_precision(settings.precision);
    loop {
        match decimal_parse::parse(src, width, settings, precedence) {
            ParseOutcome::Warn(d) => match width.wider() {
                Some(wider) => {
                    tracing::trace!(from = ?width, to = ?wider, "retrying decimal parse");
                    width = wider;
                }
                None => return ParseOutcome::Error(d),
            },
            other => return other.map(|value| Algebraic::from_decimal(width, &value)),
        }
    }
}
