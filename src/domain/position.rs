//! Per-position exit state machine.
//!
//! The session tracks one [`PositionRecord`] per held symbol. Every tick the
//! record's high-water mark ratchets on the latest close, then the exit rules
//! run in a fixed order: drawdown take-profit, hard stop, no-profit timeout.
//! The first rule that fires wins and the whole position is closed.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::HashMap;

/// Lower bound of the randomized no-profit holding window, in days.
pub const HOLD_WINDOW_MIN_DAYS: i64 = 7;
/// Upper bound of the randomized no-profit holding window, in days.
pub const HOLD_WINDOW_MAX_DAYS: i64 = 10;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Profit target reached, then price fell back from the high-water mark.
    DrawdownTakeProfit,
    /// Loss beyond the hard stop threshold.
    HardStop,
    /// Held past the randomized window without ever turning a profit.
    NoProfitTimeout,
}

impl ExitReason {
    pub fn order_tag(self) -> &'static str {
        match self {
            ExitReason::DrawdownTakeProfit => "drawdown_stop",
            ExitReason::HardStop => "hard_stop_loss",
            ExitReason::NoProfitTimeout => "no_profit_clear",
        }
    }
}

/// Thresholds for the exit rules, sourced from session parameters.
#[derive(Debug, Clone, Copy)]
pub struct ExitRules {
    /// Return at which the drawdown take-profit arms, e.g. 0.05.
    pub take_profit: f64,
    /// Pullback from the high-water mark that fires the armed take-profit.
    pub drawdown: f64,
    /// Loss magnitude that fires the hard stop, e.g. 0.03.
    pub stop_loss: f64,
}

/// State carried for one held symbol across ticks.
#[derive(Debug, Clone)]
pub struct PositionRecord {
    pub entry_price: f64,
    pub entry_date: Option<NaiveDate>,
    pub high_water: f64,
}

impl PositionRecord {
    /// A freshly opened position. An unknown entry price is recorded as 0.0
    /// and disables the price-based exit rules until corrected.
    pub fn new(entry_price: f64, entry_date: Option<NaiveDate>) -> Self {
        Self {
            entry_price,
            entry_date,
            high_water: entry_price,
        }
    }

    /// Ratchet the high-water mark. Never lowers it.
    pub fn observe(&mut self, close: f64) {
        if close > self.high_water {
            self.high_water = close;
        }
    }

    /// Evaluate the exit rules against the latest close. The no-profit
    /// window is redrawn from the rng on every evaluation, so a position
    /// that survives one tick may still be closed on the next at the same
    /// age.
    pub fn evaluate_exit(
        &self,
        close: f64,
        today: NaiveDate,
        rules: &ExitRules,
        rng: &mut StdRng,
    ) -> Option<ExitReason> {
        if self.entry_price > 0.0 {
            let ret = close / self.entry_price - 1.0;

            if ret >= rules.take_profit && self.high_water > 0.0 {
                let pullback = (self.high_water - close) / self.high_water;
                if pullback >= rules.drawdown {
                    return Some(ExitReason::DrawdownTakeProfit);
                }
            }

            if ret <= -rules.stop_loss {
                return Some(ExitReason::HardStop);
            }
        }

        if let Some(entry_date) = self.entry_date {
            let held = (today - entry_date).num_days();
            let window = rng.gen_range(HOLD_WINDOW_MIN_DAYS..=HOLD_WINDOW_MAX_DAYS);
            if held > window && self.entry_price > 0.0 && close <= self.entry_price {
                return Some(ExitReason::NoProfitTimeout);
            }
        }

        None
    }
}

/// All tracked positions, keyed by symbol code.
#[derive(Debug, Default)]
pub struct PositionBook {
    records: HashMap<String, PositionRecord>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: &str) -> Option<&PositionRecord> {
        self.records.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.records.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn codes(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    pub fn insert(&mut self, code: &str, record: PositionRecord) {
        self.records.insert(code.to_string(), record);
    }

    /// Track a holding reported by the broker that the book has not seen.
    /// Existing records are left untouched so the ratchet survives restarts
    /// of the data feed, not of the process.
    pub fn adopt(&mut self, code: &str, record: PositionRecord) {
        self.records.entry(code.to_string()).or_insert(record);
    }

    pub fn remove(&mut self, code: &str) {
        self.records.remove(code);
    }

    /// Drop records for symbols the broker no longer reports.
    pub fn retain_held(&mut self, held: &HashMap<String, i64>) {
        self.records
            .retain(|code, _| held.get(code).copied().unwrap_or(0) > 0);
    }

    pub fn observe(&mut self, code: &str, close: f64) {
        if let Some(record) = self.records.get_mut(code) {
            record.observe(close);
        }
    }
}
