//! Percentage discount.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Discount`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscountError {
    /// The input is not a whole number.
    #[error("enter a whole number")]
    Invalid,
    /// The value is outside `0..=100`.
    #[error("ensure this value is between 0 and {max}")]
    OutOfRange {
        /// Largest allowed percentage.
        max: i16,
    },
}

/// A product discount as a whole percentage (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Discount(i16);

impl Discount {
    /// Largest discount percentage.
    pub const MAX: i16 = 100;

    /// No discount.
    pub const NONE: Self = Self(0);

    /// Validate a percentage.
    ///
    /// # Errors
    ///
    /// Returns `DiscountError::OutOfRange` if the value is not in `0..=100`.
    pub const fn new(percent: i16) -> Result<Self, DiscountError> {
        if percent < 0 || percent > Self::MAX {
            return Err(DiscountError::OutOfRange { max: Self::MAX });
        }
        Ok(Self(percent))
    }

    /// Get the percentage.
    #[must_use]
    pub const fn percent(&self) -> i16 {
        self.0
    }
}

impl FromStr for Discount {
    type Err = DiscountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let percent = s.trim().parse::<i16>().map_err(|_| DiscountError::Invalid)?;
        Self::new(percent)
    }
}

impl fmt::Display for Discount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
