//! Precision and display settings.
//!
//! The core only reads these. They are passed explicitly to promotion,
//! parsing and formatting so that each call can be configured on its own.

/// How decimal values are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisplayMode {
    /// Standard mode: `displayed` counts significant digits.
    #[default]
    Normal,
    /// Fixed mode: `displayed` digits after the decimal separator.
    Fix,
    /// Scientific mode: one digit before the separator, `displayed` after.
    Sci,
    /// Engineering mode: like `Sci`, exponent is a multiple of 3.
    Eng,
}

impl DisplayMode {
    /// Does this mode always display an exponent?
    pub fn always_scientific(self) -> bool {
        matches!(self, DisplayMode::Sci | DisplayMode::Eng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Number of digits used for computations, selects the decimal width
    pub precision: u16,
    pub display_mode: DisplayMode,
    /// Digits shown, interpreted according to `display_mode`
    pub displayed: u16,
    /// Positive exponent at which standard mode switches to scientific
    pub max_nonsci: u16,
    /// Show the decimal separator even when no digit follows it
    pub show_decimal: bool,
    pub decimal_mark: char,
    pub exponent_char: char,
    /// Radix used by `Base::Based` integers (2, 8, 10 or 16)
    pub based_radix: u32,
}

impl Settings {
    pub const fn new() -> Self {
        Self {
            precision: 34,
            display_mode: DisplayMode::Normal,
            displayed: 12,
            max_nonsci: 12,
            show_decimal: false,
            decimal_mark: '.',
            exponent_char: 'E',
            based_radix: 16,
        }
    }

    pub fn with_mode(mut self, mode: DisplayMode, displayed: u16) -> Self {
        self.display_mode = mode;
        self.displayed = displayed;
        self
    }

    pub fn with_precision(mut self, precision: u16) -> Self {
        self.precision = precision;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}
