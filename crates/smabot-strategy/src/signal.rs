//! SMA signal engine.
//!
//! Compares the close of the most recent completed bar with the simple
//! moving average of the window's closes: above is a buy, below is a sell,
//! equal is flat.

use rust_decimal::Decimal;
use smabot_core::error::SignalError;
use smabot_core::types::{Bar, Direction, Signal};
use smabot_indicators::{checked_sum, Sma};
use std::cmp::Ordering;

/// Compute the signal for a window of bars, oldest first.
///
/// Every bar in `bars` is averaged. Pure and deterministic.
pub fn compute_signal(bars: &[Bar]) -> Result<Signal, SignalError> {
    let last = bars.last().ok_or(SignalError::InsufficientData {
        required: 1,
        available: 0,
    })?;

    let closes: Vec<Decimal> = bars.iter().map(|b| b.close).collect();
    let sum = checked_sum(&closes).ok_or_else(|| {
        SignalError::Overflow(format!("sum of {} closes exceeds Decimal range", closes.len()))
    })?;
    let moving_average = Sma::try_new(closes.len())?.last(&closes)?;

    let direction = direction(last.close, sum, closes.len(), moving_average);

    Ok(Signal {
        direction,
        last_close: last.close,
        moving_average,
        window: closes.len(),
        bar_time: last.timestamp,
    })
}

/// Decide the direction without going through the rounded average where possible.
///
/// `last > sum / n` is evaluated as `last * n > sum`, which is exact in decimal
/// arithmetic, so a close sitting exactly on the average is always flat.
fn direction(last_close: Decimal, sum: Decimal, n: usize, moving_average: Decimal) -> Direction {
    let ordering = match last_close.checked_mul(Decimal::from(n)) {
        Some(scaled) => scaled.cmp(&sum),
        None => last_close.cmp(&moving_average),
    };

    match ordering {
        Ordering::Greater => Direction::Buy,
        Ordering::Less => Direction::Sell,
        Ordering::Equal => Direction::Flat,
    }
}

/// Signal engine bound to a fixed SMA window.
#[derive(Debug, Clone)]
pub struct SignalEngine {
    window: usize,
}

impl SignalEngine {
    /// Create an engine averaging `window` bars.
    pub fn new(window: usize) -> Result<Self, SignalError> {
        if window == 0 {
            return Err(SignalError::InvalidWindow(
                "SMA window must be greater than 0".into(),
            ));
        }
        Ok(Self { window })
    }

    /// Configured window size.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Evaluate the trailing `window` bars of `bars`.
    ///
    /// Fails with `InsufficientData` when fewer than `window` bars are given.
    pub fn evaluate(&self, bars: &[Bar]) -> Result<Signal, SignalError> {
        if bars.len() < self.window {
            return Err(SignalError::InsufficientData {
                required: self.window,
                available: bars.len(),
            });
        }
        compute_signal(&bars[bars.len() - self.window..])
    }
}
