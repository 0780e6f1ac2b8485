use core::fmt;
use core::str::FromStr;

/// An exact decimal number with a fixed scale.
///
/// The value is `units / 10^scale`. `Decimal { units: -123, scale: 2 }` is
/// `-1.23`. Equality is structural; use [`Decimal::numerically_eq`] or
/// compare [`Decimal::normalized`] forms for numeric identity (`1.20` and
/// `1.2` differ structurally but not numerically).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    units: i128,
    scale: u8,
}

impl Decimal {
    pub const ZERO: Self = Self { units: 0, scale: 0 };

    #[must_use]
    pub const fn new(units: i128, scale: u8) -> Self {
        Self { units, scale }
    }

    #[must_use]
    pub const fn units(&self) -> i128 {
        self.units
    }

    /// Number of fractional digits.
    #[must_use]
    pub const fn scale(&self) -> u8 {
        self.scale
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.units == 0
    }

    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.units < 0
    }

    /// Canonical form: trailing zero fractional digits dropped.
    #[must_use]
    pub fn normalized(self) -> Self {
        let mut units = self.units;
        let mut scale = self.scale;
        while scale > 0 && units % 10 == 0 {
            units /= 10;
            scale -= 1;
        }
        Self { units, scale }
    }

    /// Numeric identity, regardless of scale representation.
    #[must_use]
    pub fn numerically_eq(self, other: Self) -> bool {
        self.normalized() == other.normalized()
    }

    /// Lossy projection onto a binary float.
    #[must_use]
    pub fn to_f64(self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let units = self.units as f64;
        units / 10f64.powi(i32::from(self.scale))
    }
}

impl From<i128> for Decimal {
    fn from(units: i128) -> Self {
        Self { units, scale: 0 }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.units);
        }

        let digits = self.units.unsigned_abs().to_string();
        let scale = usize::from(self.scale);
        let sign = if self.units < 0 { "-" } else { "" };

        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            write!(f, "{sign}{int_part}.{frac_part}")
        } else {
            // Not enough digits for the integer part; pad with zeros.
            write!(f, "{sign}0.{digits:0>scale$}")
        }
    }
}

/// Error returned when parsing a [`Decimal`] from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDecimalError;

impl fmt::Display for ParseDecimalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid decimal literal")
    }
}

impl std::error::Error for ParseDecimalError {}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    /// Parses `[-]digits[.digits]`. No exponent, no thousands separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, rest) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (int_part, frac_part) = match rest.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (rest, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(ParseDecimalError);
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseDecimalError);
        }
        if rest.contains('.') && (int_part.is_empty() || frac_part.is_empty()) {
            return Err(ParseDecimalError);
        }

        let scale = u8::try_from(frac_part.len()).map_err(|_| ParseDecimalError)?;

        let mut units: i128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            units = units
                .checked_mul(10)
                .and_then(|u| u.checked_add(i128::from(b - b'0')))
                .ok_or(ParseDecimalError)?;
        }
        if negative {
            units = -units;
        }

        Ok(Self { units, scale })
    }
}
