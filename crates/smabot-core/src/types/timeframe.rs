//! Timeframe definitions for market data.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timeframe for bars/candles, named the way the terminal names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Timeframe {
    /// 1 minute bars
    #[default]
    M1,
    /// 5 minute bars
    M5,
    /// 15 minute bars
    M15,
    /// 30 minute bars
    M30,
    /// 1 hour bars
    H1,
    /// 4 hour bars
    H4,
    /// Daily bars
    D1,
    /// Weekly bars
    W1,
    /// Monthly bars
    MN1,
}

impl Timeframe {
    /// Get the duration of the timeframe in seconds.
    pub fn as_secs(&self) -> u64 {
        match self {
            Timeframe::M1 => 60,
            Timeframe::M5 => 300,
            Timeframe::M15 => 900,
            Timeframe::M30 => 1800,
            Timeframe::H1 => 3600,
            Timeframe::H4 => 14400,
            Timeframe::D1 => 86400,
            Timeframe::W1 => 604800,
            Timeframe::MN1 => 2592000, // Approximate (30 days)
        }
    }

    /// Get the duration of the timeframe in milliseconds.
    pub fn as_millis(&self) -> u64 {
        self.as_secs() * 1000
    }

    /// Check if this is an intraday timeframe.
    pub fn is_intraday(&self) -> bool {
        self.as_secs() < Timeframe::D1.as_secs()
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
            Timeframe::W1 => "W1",
            Timeframe::MN1 => "MN1",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "1M" is the one spelling where case matters.
        if s == "1M" {
            return Ok(Timeframe::MN1);
        }
        match s.to_lowercase().as_str() {
            "m1" | "1m" | "1min" | "minute" => Ok(Timeframe::M1),
            "m5" | "5m" | "5min" => Ok(Timeframe::M5),
            "m15" | "15m" | "15min" => Ok(Timeframe::M15),
            "m30" | "30m" | "30min" => Ok(Timeframe::M30),
            "h1" | "1h" | "1hour" | "hour" => Ok(Timeframe::H1),
            "h4" | "4h" | "4hour" => Ok(Timeframe::H4),
            "d1" | "1d" | "day" | "daily" => Ok(Timeframe::D1),
            "w1" | "1w" | "week" | "weekly" => Ok(Timeframe::W1),
            "mn1" | "mn" | "month" | "monthly" => Ok(Timeframe::MN1),
            _ => Err(format!("Invalid timeframe: {}", s)),
        }
    }
}
