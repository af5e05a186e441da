//! Moving average indicators.

use rust_decimal::Decimal;
use smabot_core::error::IndicatorError;
use smabot_core::traits::Indicator;

/// Simple Moving Average (SMA).
///
/// Calculates the arithmetic mean of the last N values.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    /// Create a new SMA, rejecting a zero period.
    pub fn try_new(period: usize) -> Result<Self, IndicatorError> {
        if period == 0 {
            return Err(IndicatorError::InvalidParameter(
                "Period must be greater than 0".into(),
            ));
        }
        Ok(Self { period })
    }

    /// Mean of the trailing `period` values.
    pub fn last(&self, data: &[Decimal]) -> Result<Decimal, IndicatorError> {
        self.validate_data(data)?;
        let window = &data[data.len() - self.period..];
        let sum = checked_sum(window).ok_or_else(|| {
            IndicatorError::Overflow(format!("sum of {} values exceeds Decimal range", self.period))
        })?;
        sum.checked_div(Decimal::from(self.period))
            .ok_or_else(|| IndicatorError::Overflow("mean out of Decimal range".into()))
    }
}

/// Sum of `values`, or `None` when it does not fit in a `Decimal`.
pub fn checked_sum(values: &[Decimal]) -> Option<Decimal> {
    values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
}

impl Indicator for Sma {
    type Output = Decimal;

    fn calculate(&self, data: &[Decimal]) -> Vec<Decimal> {
        if data.len() < self.period {
            return vec![];
        }

        let mut result = Vec::with_capacity(data.len() - self.period + 1);
        let period = Decimal::from(self.period);

        // Output stops at the first window whose sum does not fit
        let Some(mut sum) = checked_sum(&data[..self.period]) else {
            return result;
        };
        result.push(sum / period);

        // Sliding window; decimal addition keeps the running sum exact
        for i in self.period..data.len() {
            match sum
                .checked_sub(data[i - self.period])
                .and_then(|s| s.checked_add(data[i]))
            {
                Some(next) => sum = next,
                None => break,
            }
            result.push(sum / period);
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sma() {
        let sma = Sma::new(3);
        let data = vec![dec!(1), dec!(2), dec!(3), dec!(4), dec!(5)];
        let result = sma.calculate(&data);

        assert_eq!(result, vec![dec!(2), dec!(3), dec!(4)]);
    }

    #[test]
    fn test_sma_insufficient_data() {
        let sma = Sma::new(5);
        let data = vec![dec!(1), dec!(2), dec!(3)];

        assert!(sma.calculate(&data).is_empty());
        assert_eq!(
            sma.last(&data),
            Err(IndicatorError::InsufficientData {
                required: 5,
                available: 3
            })
        );
    }

    #[test]
    fn test_sma_last_uses_trailing_window() {
        let sma = Sma::new(2);
        let data = vec![dec!(100), dec!(1.10), dec!(1.20)];

        assert_eq!(sma.last(&data), Ok(dec!(1.15)));
        assert_eq!(sma.calculate(&data).last().copied(), sma.last(&data).ok());
    }

    #[test]
    fn test_sma_exact_on_forex_prices() {
        // 0.1 + 0.2 style drift would break equality in floating point
        let sma = Sma::new(3);
        let data = vec![dec!(1.1), dec!(1.2), dec!(1.3)];

        assert_eq!(sma.last(&data), Ok(dec!(1.2)));
    }

    #[test]
    fn test_sum_overflow_is_an_error() {
        let half = Decimal::MAX / dec!(2) + Decimal::ONE;
        let sma = Sma::new(2);

        assert!(matches!(
            sma.last(&[half, half]),
            Err(IndicatorError::Overflow(_))
        ));
        assert!(sma.calculate(&[half, half]).is_empty());
        assert_eq!(checked_sum(&[half, half]), None);

        // Windows before the overflowing one are still produced
        let values = [dec!(1), dec!(1), half, half];
        assert_eq!(sma.calculate(&values).len(), 2);
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(matches!(
            Sma::try_new(0),
            Err(IndicatorError::InvalidParameter(_))
        ));
        assert_eq!(Sma::try_new(10).unwrap().period(), 10);
    }
}
