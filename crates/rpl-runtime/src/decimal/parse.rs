//! Decimal literal parsing.
//!
//! Grammar: `[sign] digits [mark digits] [exponent-marker [sign] digits]`
//! where the mark is `.`, `,` or the configured decimal mark, and the
//! exponent marker is `e`, `E` or the configured exponent glyph. `inf`, `∞`
//! and `NaN` are accepted in place of the digits, in any case.

use num_bigint::BigUint;
use rpl_common_core::Settings;

use super::{round, Decimal, DecimalWidth};
use crate::error::ParseErrorKind;
use crate::parser::{ParseDiagnostic, ParseOutcome};

/// Spellings of the special values, matched case-insensitively.
const SPECIALS: [(&str, bool); 3] = [("inf", true), ("∞", true), ("nan", false)];

fn is_mark(c: char, settings: &Settings) -> bool {
    c == '.' || c == ',' || c == settings.decimal_mark
}

fn is_exponent_marker(c: char, settings: &Settings) -> bool {
    c == 'e' || c == 'E' || c == settings.exponent_char
}

/// Parse a decimal literal at the start of `src` for the given width.
///
/// A negative `precedence` means the text is inside an expression, where a
/// leading sign is an infix operator rather than part of the number.
pub fn parse(
    src: &str,
    width: DecimalWidth,
    settings: &Settings,
    precedence: i32,
) -> ParseOutcome<Decimal> {
    let mut chars = src.char_indices().peekable();
    let mut negative = false;

    if let Some(&(_, c @ ('+' | '-'))) = chars.peek() {
        if precedence < 0 {
            return ParseOutcome::Skip;
        }
        negative = c == '-';
        chars.next();
    }
    let digits_start = chars.peek().map_or(src.len(), |&(i, _)| i);

    // Mantissa
    let mut mantissa = String::new();
    let mut fraction_digits = 0i64;
    let mut excess_offset = None;
    let mut seen_mark = false;
    while let Some(&(i, c)) = chars.peek() {
        if c.is_ascii_digit() {
            if mantissa.len() == width.digits() && excess_offset.is_none() {
                excess_offset = Some(i);
            }
            mantissa.push(c);
            if seen_mark {
                fraction_digits += 1;
            }
        } else if is_mark(c, settings) && !seen_mark {
            seen_mark = true;
        } else {
            break;
        }
        chars.next();
    }
    let mut end = chars.peek().map_or(src.len(), |&(i, _)| i);

    if mantissa.is_empty() {
        let rest = &src[digits_start..];
        for (spelling, infinite) in SPECIALS {
            let matches = rest
                .get(..spelling.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(spelling));
            if matches {
                let value = if infinite { Decimal::infinity(negative) } else { Decimal::NAN };
                tracing::trace!(?value, "special decimal");
                return ParseOutcome::Ok { value, end: digits_start + spelling.len() };
            }
        }
        return ParseOutcome::Skip;
    }

    if mantissa.len() >= width.digits() {
        let offset = excess_offset.unwrap_or(end);
        tracing::debug!(digits = mantissa.len(), ?width, "mantissa too long, retry wider");
        return ParseOutcome::Warn(ParseDiagnostic::new(ParseErrorKind::MantissaTooLong, offset));
    }

    // Exponent
    let mut exponent = 0i64;
    if let Some(&(_, c)) = chars.peek() {
        if is_exponent_marker(c, settings) {
            chars.next();
            let mut exp_negative = false;
            if let Some(&(_, s @ ('+' | '-'))) = chars.peek() {
                exp_negative = s == '-';
                chars.next();
            }
            let mut exp_digits = 0usize;
            while let Some(&(_, d)) = chars.peek() {
                let Some(v) = d.to_digit(10) else { break };
                exponent = (exponent * 10 + v as i64).min(i32::MAX as i64);
                exp_digits += 1;
                chars.next();
            }
            end = chars.peek().map_or(src.len(), |&(i, _)| i);
            if exp_digits == 0 {
                tracing::debug!(offset = end, "exponent marker without digits");
                return ParseOutcome::Error(ParseDiagnostic::new(ParseErrorKind::ExponentMissing, end));
            }
            if exp_negative {
                exponent = -exponent;
            }
            let emax = width.emax();
            if exponent < -(emax - 1) || exponent > emax {
                tracing::debug!(exponent, ?width, "exponent out of range, retry wider");
                return ParseOutcome::Warn(ParseDiagnostic::new(ParseErrorKind::ExponentRange, end));
            }
        }
    }

    let coefficient = mantissa.parse::<BigUint>().unwrap_or_default();
    let value = round(negative, coefficient, exponent - fraction_digits, false, width);
    ParseOutcome::Ok { value, end }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(src: &str, width: DecimalWidth) -> (Decimal, usize) {
        match parse(src, width, &Settings::default(), 0) {
            ParseOutcome::Ok { value, end } => (value, end),
            other => panic!("{src}: {other:?}"),
        }
    }

    #[test]
    fn test_plain_and_fraction() {
        assert_eq!(ok("123", DecimalWidth::W128), (Decimal::finite(false, 123, 0), 3));
        assert_eq!(ok("-1.25", DecimalWidth::W128), (Decimal::finite(true, 125, -2), 5));
        assert_eq!(ok("1,5 ", DecimalWidth::W128), (Decimal::finite(false, 15, -1), 3));
        assert_eq!(ok(".5", DecimalWidth::W32), (Decimal::finite(false, 5, -1), 2));
    }

    #[test]
    fn test_exponent() {
        assert_eq!(ok("1.5E3", DecimalWidth::W64), (Decimal::finite(false, 15, 2), 5));
        assert_eq!(ok("2e-3 x", DecimalWidth::W64), (Decimal::finite(false, 2, -3), 4));
        let settings = Settings { exponent_char: '⁳', ..Settings::default() };
        match parse("4⁳2", DecimalWidth::W64, &settings, 0) {
            ParseOutcome::Ok { value, end } => {
                assert_eq!(value, Decimal::finite(false, 4, 2));
                assert_eq!(end, "4⁳2".len());
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn test_missing_exponent_is_error() {
        let out = parse("1e", DecimalWidth::W128, &Settings::default(), 0);
        assert_eq!(out, ParseOutcome::Error(ParseDiagnostic::new(ParseErrorKind::ExponentMissing, 2)));
        let out = parse("1E+ ", DecimalWidth::W128, &Settings::default(), 0);
        assert!(matches!(out, ParseOutcome::Error(d) if d.kind == ParseErrorKind::ExponentMissing));
    }

    #[test]
    fn test_long_mantissa_warns() {
        let forty = "1234567890123456789012345678901234567890";
        let out = parse(forty, DecimalWidth::W32, &Settings::default(), 0);
        assert_eq!(out, ParseOutcome::Warn(ParseDiagnostic::new(ParseErrorKind::MantissaTooLong, 7)));
        // Exactly the width's digit count also asks for more precision
        assert!(matches!(parse("1234567", DecimalWidth::W32, &Settings::default(), 0), ParseOutcome::Warn(_)));
        assert!(matches!(parse("123456", DecimalWidth::W32, &Settings::default(), 0), ParseOutcome::Ok { .. }));
    }

    #[test]
    fn test_exponent_range_warns() {
        let out = parse("1E97", DecimalWidth::W32, &Settings::default(), 0);
        assert!(matches!(out, ParseOutcome::Warn(d) if d.kind == ParseErrorKind::ExponentRange));
        let out = parse("1E-96", DecimalWidth::W32, &Settings::default(), 0);
        assert!(matches!(out, ParseOutcome::Warn(_)));
        assert_eq!(ok("1E96", DecimalWidth::W32).0, Decimal::finite(false, 1_000_000, 90));
    }

    #[test]
    fn test_specials() {
        assert_eq!(ok("inf", DecimalWidth::W64), (Decimal::infinity(false), 3));
        assert_eq!(ok("-∞", DecimalWidth::W64), (Decimal::infinity(true), 1 + "∞".len()));
        assert!(ok("NaN", DecimalWidth::W64).0.is_nan());
        assert!(ok("nan", DecimalWidth::W64).0.is_nan());
    }

    #[test]
    fn test_skip() {
        let s = Settings::default();
        assert_eq!(parse("abc", DecimalWidth::W128, &s, 0), ParseOutcome::Skip);
        assert_eq!(parse("+3", DecimalWidth::W128, &s, -1), ParseOutcome::Skip);
        assert_eq!(parse(".", DecimalWidth::W128, &s, 0), ParseOutcome::Skip);
        assert!(matches!(parse("+3", DecimalWidth::W128, &s, 0), ParseOutcome::Ok { end: 2, .. }));
    }
}
