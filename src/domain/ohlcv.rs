//! OHLCV bar representation.

use chrono::NaiveDateTime;
use std::fmt;

/// Bar period granularity, keyed the way the data platform names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Day,
    Week,
    Min120,
    Min15,
    Min5,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            Period::Day => "1d",
            Period::Week => "1w",
            Period::Min120 => "120m",
            Period::Min15 => "15m",
            Period::Min5 => "5m",
        };
        write!(f, "{}", key)
    }
}

/// One OHLCV sample for a symbol at a given period granularity.
///
/// `amount` is the turnover value of the bar (price x shares traded),
/// used by the sector heat ranker.
#[derive(Debug, Clone)]
pub struct Bar {
    pub code: String,
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub amount: f64,
}

impl Bar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Close-to-close change ratio against a previous bar.
    /// None when the previous close is zero or not finite.
    pub fn change_from(&self, prev: &Bar) -> Option<f64> {
        if prev.close == 0.0 || !prev.close.is_finite() || !self.close.is_finite() {
            return None;
        }
        Some(self.close / prev.close - 1.0)
    }
}
