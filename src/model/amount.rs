//! Monetary amounts as they arrive from the expense store.
//!
//! Values are entered by hand or imported from spreadsheets, so they may carry a dollar sign and
//! thousands separators. `Amount` parses all of those spellings into a `Decimal` and remembers
//! which spelling was used so that it can be written back the same way.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Debug, Display, Formatter};
use std::iter::Sum;
use std::str::FromStr;

/// Whether a dollar sign and/or thousands separators were present when the amount was parsed.
///
/// # Examples
///  - `AmountFormat{ dollar: true, commas: true }` -> `$1,240.00`
///  - `AmountFormat{ dollar: false, commas: false }` -> `1240.00`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AmountFormat {
    dollar: bool,
    commas: bool,
}

impl Default for AmountFormat {
    fn default() -> Self {
        DISPLAY_FORMAT
    }
}

/// The format used for everything we print: `$1,240.00`.
const DISPLAY_FORMAT: AmountFormat = AmountFormat {
    dollar: true,
    commas: true,
};

/// A dollar amount.
///
/// Formatting is significant for equality, so compare `value()` when only the number matters.
///
/// ```
/// # use finny::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("1240").unwrap();
/// let b = Amount::from_str("$1,240.00").unwrap();
/// assert_ne!(a, b);
/// assert_eq!(a.value(), b.value());
/// assert_eq!(b.to_string(), "$1,240.00");
/// ```
///
/// Text that is not a number is an error for `from_str`, but `coerce` treats it as zero:
///
/// ```
/// # use finny::model::Amount;
/// # use rust_decimal::Decimal;
/// assert!("twelve".parse::<Amount>().is_err());
/// assert_eq!(Amount::coerce("twelve").value(), Decimal::ZERO);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    value: Decimal,
    format: AmountFormat,
}

impl Amount {
    /// Creates an `Amount` that displays as `$1,240.00`.
    pub const fn new(value: Decimal) -> Self {
        Self {
            value,
            format: DISPLAY_FORMAT,
        }
    }

    /// Parses `s` leniently: anything that is not a number becomes zero.
    pub fn coerce(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.value.is_sign_negative() && !self.value.is_zero()
    }

    /// Returns the same value with the default `$1,240.00` display format.
    pub fn for_display(self) -> Self {
        Self::new(self.value)
    }
}

/// Error returned when a string is not a number, even after removing `$` and `,`.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (dollar, digits) = match unsigned.strip_prefix('$') {
            Some(rest) => (true, rest),
            None => (false, unsigned),
        };

        let without_commas = digits.replace(',', "");
        let commas = without_commas.len() < digits.len();

        let magnitude = Decimal::from_str(&without_commas).map_err(AmountError)?;
        let value = if negative { -magnitude } else { magnitude };
        Ok(Amount {
            value,
            format: AmountFormat { dollar, commas },
        })
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let dollar = if self.format.dollar { "$" } else { "" };
        let magnitude = self.value.abs();

        if self.format.commas {
            write!(
                f,
                "{sign}{dollar}{}",
                format_num::format_num!(",.2", magnitude.to_f64().unwrap_or_default())
            )
        } else {
            write!(f, "{sign}{dollar}{:.2}", magnitude)
        }
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        Amount::new(iter.fold(Decimal::ZERO, |acc, a| acc.saturating_add(a.value)))
    }
}
