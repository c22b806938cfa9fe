//! Display formatting of decimal values.
//!
//! The formatter works on the native text form `[+-]<coefficient>E<exp>`,
//! where the coefficient is an unnormalized integer (`123.0` may come as
//! `1230E-1`). It follows calculator display conventions:
//!
//! - `Normal`: up to `displayed` significant digits. Zeros are only added to
//!   reach the separator, which is then shown (`1230000.`). Switches to
//!   scientific notation at `1E<max_nonsci>` for large values, and for small
//!   values as soon as leading zeros would hide significant digits.
//! - `Fix`: `displayed` digits after the separator.
//! - `Sci`: one digit before the separator, `displayed` after it.
//! - `Eng`: like `Sci`, with the exponent a multiple of 3.
//!
//! Rounding is done on the displayed digits. A carry out of the first digit
//! restarts the formatting with `1E<exp+1>`.

use rpl_common_core::{DisplayMode, Settings};

use super::{Decimal, DecimalWidth};

/// Format a decimal for display. `editing` selects the full-precision form
/// used when a value is brought back into the command line.
pub fn format(value: &Decimal, width: DecimalWidth, settings: &Settings, editing: bool) -> String {
    format_native(&value.to_native(), width.digits(), settings, editing)
}

/// Format a value given in native text form. `max_digits` is the precision
/// of the value's width.
pub fn format_native(native: &str, max_digits: usize, settings: &Settings, editing: bool) -> String {
    let layout = if editing {
        Layout {
            mode: DisplayMode::Normal,
            digits: max_digits as i32,
            max_nonsci: max_digits as i32,
        }
    } else {
        Layout {
            mode: settings.display_mode,
            digits: settings.displayed as i32,
            max_nonsci: settings.max_nonsci as i32,
        }
    };

    let mut native = native.to_string();
    let mut restarts = 0;
    loop {
        match layout.attempt(&native, settings) {
            Attempt::Done(text) => return text,
            Attempt::Overflow { restart, partial } => {
                if restarts >= max_digits {
                    return partial;
                }
                tracing::trace!(%restart, "rounding carried past the first digit");
                restarts += 1;
                native = restart;
            }
        }
    }
}

enum Attempt {
    Done(String),
    /// Rounding carried out of the leading digit
    Overflow { restart: String, partial: String },
}

struct Layout {
    mode: DisplayMode,
    digits: i32,
    max_nonsci: i32,
}

impl Layout {
    fn attempt(&self, native: &str, settings: &Settings) -> Attempt {
        let Some(epos) = native.find('E') else {
            return Attempt::Done(special(native));
        };

        let head = &native[..epos];
        let (negative, mantissa) = match head.as_bytes().first() {
            Some(b'-') => (true, &head[1..]),
            Some(b'+') => (false, &head[1..]),
            _ => (false, head),
        };
        let input: Vec<char> = mantissa.chars().collect();
        if input.is_empty() || !input.iter().all(|c| c.is_ascii_digit()) {
            return Attempt::Done(native.to_string());
        }
        let bidexp: i32 = native[epos + 1..].parse().unwrap_or(0);

        let mut mexp = input.len() as i32 - 1;
        let mut realexp = bidexp + mexp;

        // Drop trailing zeros of the coefficient, keeping one digit
        let mut last = input.len();
        while last > 1 && input[last - 1] == '0' {
            last -= 1;
            mexp -= 1;
        }
        if last == 1 && input[0] == '0' {
            realexp = 0;
        }

        let mark = settings.decimal_mark;
        let sigmode = self.mode == DisplayMode::Normal;
        let engmode = self.mode == DisplayMode::Eng;

        // Position of the separator, counted in digits from the left
        let mut decpos = 1;
        let mut hasexp = self.mode.always_scientific();
        if !hasexp {
            if realexp < 0 {
                hasexp = mexp - realexp - 1 >= self.digits.min(self.max_nonsci);
            } else {
                hasexp = realexp >= self.max_nonsci;
                if !hasexp {
                    decpos = realexp + 1;
                }
            }
        }

        let mut decimals = self.digits;
        let mut out = String::new();
        let mut separator = false;
        if negative {
            out.push('-');
        }

        if !hasexp && realexp < 0 {
            out.push('0');
            decpos -= 1;
            out.push(mark);
            separator = true;
            for _ in realexp + 1..0 {
                out.push('0');
                decimals -= 1;
            }
        }

        let mut dispexp = realexp;
        if engmode {
            let offset = if dispexp >= 0 { dispexp % 3 } else { (dispexp - 2) % 3 + 2 };
            decpos += offset;
            dispexp -= offset;
            decimals += 1;
        }

        // Significant digits
        let mut i = 0;
        while i < last && (decimals > 0 || (decpos > 0 && !sigmode)) {
            out.push(input[i]);
            i += 1;
            decpos -= 1;
            if decpos < 0 || sigmode || engmode {
                decimals -= 1;
            }
            if decpos == 0 && (settings.show_decimal || (i < last && (sigmode || decimals > 0))) {
                out.push(mark);
                separator = true;
            }
        }

        if i < last && input[i] >= '5' && !round_up(&mut out) {
            let sign = if negative { '-' } else { '+' };
            return Attempt::Overflow {
                restart: format!("{}1E{}", sign, realexp + 1),
                partial: out,
            };
        }

        // Trailing zeros
        let mut padding = if sigmode {
            decpos.max(0)
        } else if self.mode == DisplayMode::Fix && decpos > 0 {
            self.digits + decpos
        } else {
            decimals.max(0)
        };
        if decpos == 0 && padding > 0 && !separator {
            out.push(mark);
        }
        while padding > 0 {
            out.push('0');
            decpos -= 1;
            padding -= 1;
            if decpos == 0 && (padding > 0 || sigmode || settings.show_decimal) {
                out.push(mark);
            }
        }

        if hasexp {
            out.push(settings.exponent_char);
            out.push_str(&dispexp.to_string());
        }
        Attempt::Done(out)
    }
}

/// Propagate a rounding carry from the last displayed digit leftwards.
/// Returns `false` when the carry runs past the first digit.
fn round_up(out: &mut String) -> bool {
    let mut chars: Vec<char> = out.chars().collect();
    let mut carried = true;
    for c in chars.iter_mut().rev() {
        if !c.is_ascii_digit() {
            continue;
        }
        if *c == '9' {
            *c = '0';
        } else {
            *c = char::from(*c as u8 + 1);
            carried = false;
            break;
        }
    }
    *out = chars.into_iter().collect();
    !carried
}

fn special(native: &str) -> String {
    if native.eq_ignore_ascii_case("+inf") || native.eq_ignore_ascii_case("inf") {
        "∞".to_string()
    } else if native.eq_ignore_ascii_case("-inf") {
        "-∞".to_string()
    } else {
        native.to_string()
    }
}
