//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(8, 2)`: at most six digits before the
//! decimal point and two after it.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("enter a number")]
    Invalid,
    /// The amount is below zero.
    #[error("ensure this value is greater than or equal to 0")]
    Negative,
    /// More than [`Price::DECIMAL_PLACES`] digits after the decimal point.
    #[error("ensure that there are no more than {max} decimal places")]
    TooManyDecimalPlaces {
        /// Maximum allowed decimal places.
        max: u32,
    },
    /// More than [`Price::MAX_WHOLE_DIGITS`] digits before the decimal point.
    #[error("ensure that there are no more than {max} digits before the decimal point")]
    TooManyWholeDigits {
        /// Maximum allowed whole digits.
        max: u32,
    },
}

/// A product price in the shop currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Total number of significant digits a price may have.
    pub const MAX_DIGITS: u32 = 8;
    /// Digits after the decimal point.
    pub const DECIMAL_PLACES: u32 = 2;
    /// Digits before the decimal point.
    pub const MAX_WHOLE_DIGITS: u32 = Self::MAX_DIGITS - Self::DECIMAL_PLACES;

    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Validate a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative or does not fit `NUMERIC(8, 2)`.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }

        let normalized = amount.normalize();
        if normalized.scale() > Self::DECIMAL_PLACES {
            return Err(PriceError::TooManyDecimalPlaces {
                max: Self::DECIMAL_PLACES,
            });
        }

        let whole_limit = Decimal::from(10_i64.pow(Self::MAX_WHOLE_DIGITS));
        if normalized.trunc() >= whole_limit {
            return Err(PriceError::TooManyWholeDigits {
                max: Self::MAX_WHOLE_DIGITS,
            });
        }

        let mut amount = normalized;
        amount.rescale(Self::DECIMAL_PLACES);
        Ok(Self(amount))
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| PriceError::Invalid)?;
        Self::new(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_rescales() {
        let price: Price = "19.9".parse().unwrap();
        assert_eq!(price.to_string(), "19.90");
        assert_eq!(price.amount(), Decimal::new(1990, 2));
    }

    #[test]
    fn trailing_zeros_do_not_count_as_decimal_places() {
        assert!("5.000".parse::<Price>().is_ok());
    }

    #[test]
    fn rejects_too_many_decimal_places() {
        assert_eq!(
            "1.999".parse::<Price>(),
            Err(PriceError::TooManyDecimalPlaces { max: 2 })
        );
    }

    #[test]
    fn rejects_too_many_whole_digits() {
        assert!("999999.99".parse::<Price>().is_ok());
        assert_eq!(
            "1000000".parse::<Price>(),
            Err(PriceError::TooManyWholeDigits { max: 6 })
        );
    }

    #[test]
    fn rejects_negative_and_garbage() {
        assert_eq!("-1".parse::<Price>(), Err(PriceError::Negative));
        assert_eq!("ten".parse::<Price>(), Err(PriceError::Invalid));
        assert_eq!("".parse::<Price>(), Err(PriceError::Invalid));
    }
}
