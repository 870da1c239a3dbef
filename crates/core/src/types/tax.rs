//! Tax rate applied to a cart subtotal.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`TaxRate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TaxRateError {
    /// The rate is outside `0..=1`.
    #[error("tax rate must be between 0 and 1 (got {0})")]
    OutOfRange(Decimal),
    /// The input is not a decimal number.
    #[error("tax rate is not a decimal number: {0}")]
    Parse(String),
}

/// A tax rate expressed as a fraction (`0.11` is 11%).
///
/// Deployments that do not charge tax use [`TaxRate::ZERO`], which keeps the
/// summary formula uniform: `total = subtotal + subtotal * rate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// No tax.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Decimal places kept in computed tax amounts.
    pub const AMOUNT_SCALE: u32 = 2;

    /// Create a tax rate from a fraction.
    ///
    /// # Errors
    ///
    /// Returns [`TaxRateError::OutOfRange`] unless `0 <= rate <= 1`.
    pub fn new(rate: Decimal) -> Result<Self, TaxRateError> {
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(TaxRateError::OutOfRange(rate));
        }
        Ok(Self(rate))
    }

    /// The underlying fraction.
    #[must_use]
    pub const fn rate(&self) -> Decimal {
        self.0
    }

    /// Tax owed on `subtotal`, rounded half away from zero to two places.
    #[must_use]
    pub fn apply(&self, subtotal: Decimal) -> Decimal {
        (subtotal * self.0)
            .round_dp_with_strategy(Self::AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl TryFrom<Decimal> for TaxRate {
    type Error = TaxRateError;

    fn try_from(rate: Decimal) -> Result<Self, Self::Error> {
        Self::new(rate)
    }
}

impl From<TaxRate> for Decimal {
    fn from(rate: TaxRate) -> Self {
        rate.0
    }
}

impl FromStr for TaxRate {
    type Err = TaxRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rate = Decimal::from_str(s.trim()).map_err(|e| TaxRateError::Parse(e.to_string()))?;
        Self::new(rate)
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", (self.0 * Decimal::ONE_HUNDRED).normalize())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rate_adds_nothing() {
        assert_eq!(TaxRate::ZERO.apply(Decimal::from(20_000)), Decimal::ZERO);
    }

    #[test]
    fn test_apply_rounds_half_away_from_zero() {
        let rate: TaxRate = "0.1".parse().unwrap();
        // 0.05 * 0.1 = 0.005 -> 0.01
        assert_eq!(rate.apply(Decimal::new(5, 2)), Decimal::new(1, 2));
    }

    #[test]
    fn test_apply_standard_rate() {
        let rate: TaxRate = "0.11".parse().unwrap();
        assert_eq!(rate.apply(Decimal::from(20_000)), Decimal::from(2_200));
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            "1.5".parse::<TaxRate>(),
            Err(TaxRateError::OutOfRange(_))
        ));
        assert!(matches!(
            "-0.1".parse::<TaxRate>(),
            Err(TaxRateError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            "eleven".parse::<TaxRate>(),
            Err(TaxRateError::Parse(_))
        ));
    }

    #[test]
    fn test_display_as_percent() {
        let rate: TaxRate = "0.11".parse().unwrap();
        assert_eq!(rate.to_string(), "11%");
    }
}
