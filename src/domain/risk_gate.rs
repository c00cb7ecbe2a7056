//! Market-wide risk assessment over the benchmark index.
//!
//! The gate reads daily benchmark bars and produces a [`RiskLevel`] that the
//! session uses to deleverage holdings and to block new entries. Trend and
//! liquidity checks combine with max-of semantics so a liquidity warning can
//! only ever raise the level.

use crate::domain::indicator::sma;
use crate::domain::ohlcv::Bar;
use crate::ports::log::LogPort;

/// Benchmark day-over-day drop that, below MA60, marks systemic risk.
const SEVERE_DROP_THRESHOLD: f64 = -0.03;

/// Volume shrinkage over three sessions that flags a liquidity warning.
const VOLUME_CONTRACTION_THRESHOLD: f64 = -0.2;

/// Market risk ladder, worst last so `max` picks the worse level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum RiskLevel {
    #[default]
    Low,
    Elevated,
    Severe,
}

impl RiskLevel {
    /// Fraction of every position to shed at this level.
    pub fn deleverage_ratio(self) -> f64 {
        match self {
            RiskLevel::Low => 0.0,
            RiskLevel::Elevated => 0.3,
            RiskLevel::Severe => 0.5,
        }
    }
}

/// Assess market risk from daily benchmark bars, oldest first.
///
/// Severe requires the close under MA60 with a one-day drop beyond 3%;
/// Elevated is the close under MA20. A moving average that cannot be
/// computed from the available history never triggers its condition. On top
/// of the trend level, a three-session volume contraction beyond 20% raises
/// the result to at least Elevated.
pub fn assess(bars: &[Bar], log: &dyn LogPort) -> RiskLevel {
    if bars.is_empty() {
        return RiskLevel::Low;
    }
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let current = closes[closes.len() - 1];

    let mut level = RiskLevel::Low;

    if let Ok(ma60) = sma(&closes, 60) {
        if bars.len() >= 2 {
            let prev = closes[closes.len() - 2];
            if prev > 0.0 && current < ma60 && current / prev - 1.0 < SEVERE_DROP_THRESHOLD {
                level = RiskLevel::Severe;
                log.log("risk: benchmark under MA60 with a sharp one-day drop");
            }
        }
    }
    if level == RiskLevel::Low {
        if let Ok(ma20) = sma(&closes, 20) {
            if current < ma20 {
                level = RiskLevel::Elevated;
            }
        }
    }

    if bars.len() >= 3 {
        let base = bars[bars.len() - 3].volume;
        if base > 0 {
            let vol_change = bars[bars.len() - 1].volume as f64 / base as f64 - 1.0;
            if vol_change < VOLUME_CONTRACTION_THRESHOLD {
                level = level.max(RiskLevel::Elevated);
                log.log("risk: benchmark volume contracting over three sessions");
            }
        }
    }

    level
}

/// Buy permission: the benchmark close sits above its MA20. False whenever
/// the average cannot be computed.
pub fn buy_permitted(bars: &[Bar]) -> bool {
    if bars.is_empty() {
        return false;
    }
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    match sma(&closes, 20) {
        Ok(ma20) => closes[closes.len() - 1] > ma20,
        Err(_) => false,
    }
}
