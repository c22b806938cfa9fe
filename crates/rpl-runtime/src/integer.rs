//! Integer literals.
//!
//! Plain integers are written `123` or `-42`. Based integers are written
//! `#` + digits + base suffix: `#1Ah`, `#26d`, `#17o`, `#101b`. Without a
//! suffix, the radix comes from the settings. Literals too large for 64 bits
//! become bignums.

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use rpl_common_core::{Base, Settings};

use crate::algebraic::Algebraic;
use crate::error::ParseErrorKind;
use crate::parser::{ParseDiagnostic, ParseOutcome};

fn suffix(radix: u32) -> char {
    match radix {
        2 => 'b',
        8 => 'o',
        10 => 'd',
        _ => 'h',
    }
}

fn base_of_suffix(c: char) -> Option<Base> {
    match c.to_ascii_lowercase() {
        'h' => Some(Base::Hex),
        'd' => Some(Base::Dec),
        'o' => Some(Base::Oct),
        'b' => Some(Base::Bin),
        _ => None,
    }
}

fn radix(base: Base, settings: &Settings) -> u32 {
    base.radix().unwrap_or(settings.based_radix)
}

pub fn render(negative: bool, magnitude: &BigUint, base: Base, settings: &Settings) -> String {
    if base == Base::Plain {
        let sign = if negative { "-" } else { "" };
        return format!("{}{}", sign, magnitude);
    }
    let radix = radix(base, settings);
    let digits = magnitude.to_str_radix(radix).to_uppercase();
    format!("#{}{}", digits, suffix(radix))
}

fn value(negative: bool, magnitude: BigUint, base: Base) -> Algebraic {
    match magnitude.to_u64() {
        Some(m) => Algebraic::Integer { negative, magnitude: m, base },
        None => Algebraic::Bignum { negative, magnitude, base },
    }
}

/// Parse an integer literal at the start of `src`.
///
/// Returns `Skip` for anything that is not an integer, including digit
/// strings continued by a decimal mark or an exponent.
pub fn parse(src: &str, settings: &Settings, precedence: i32) -> ParseOutcome<Algebraic> {
    if let Some(rest) = src.strip_prefix('#') {
        return parse_based(rest, settings);
    }

    let mut negative = false;
    let mut start = 0;
    if let Some(c @ ('+' | '-')) = src.chars().next() {
        if precedence < 0 {
            return ParseOutcome::Skip;
        }
        negative = c == '-';
        start = 1;
    }
    let digits_len = src[start..].bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return ParseOutcome::Skip;
    }
    let end = start + digits_len;
    if let Some(next) = src[end..].chars().next() {
        let decimal = next == '.'
            || next == ','
            || next == 'e'
            || next == 'E'
            || next == settings.decimal_mark
            || next == settings.exponent_char;
        if decimal {
            return ParseOutcome::Skip;
        }
    }

    let Ok(magnitude) = src[start..end].parse::<BigUint>() else {
        return ParseOutcome::Error(ParseDiagnostic::new(ParseErrorKind::InvalidNumber, start));
    };
    ParseOutcome::Ok { value: value(negative, magnitude, Base::Plain), end }
}

fn parse_based(rest: &str, settings: &Settings) -> ParseOutcome<Algebraic> {
    let run = rest.bytes().take_while(u8::is_ascii_alphanumeric).count();
    let end = 1 + run;
    if run == 0 {
        return ParseOutcome::Error(ParseDiagnostic::new(ParseErrorKind::InvalidBasedNumber, 1));
    }
    let word = &rest[..run];

    // A trailing base letter is a suffix, not a digit
    let (digits, base) = match word.chars().last().and_then(base_of_suffix) {
        Some(base) if run > 1 => (&word[..run - 1], base),
        _ => (word, Base::Based),
    };
    let radix = radix(base, settings);
    match BigUint::parse_bytes(digits.as_bytes(), radix) {
        Some(magnitude) => ParseOutcome::Ok { value: value(false, magnitude, base), end },
        None => {
            tracing::debug!(word, radix, "invalid based number");
            ParseOutcome::Error(ParseDiagnostic::new(ParseErrorKind::InvalidBasedNumber, 1))
        }
    }
}
