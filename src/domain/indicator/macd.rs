//! MACD histogram score.
//!
//! MACD line = EMA(12) - EMA(26); signal = EMA(9) of the MACD line. The
//! latest two histogram values classify into one of four tiers:
//! bullish cross 0.8, bearish cross 0.2, histogram positive 0.6, else 0.4.

use super::ema::ema;

const FAST: usize = 12;
const SLOW: usize = 26;
const SIGNAL: usize = 9;

/// MACD tier score for `closes`. None when there is not enough history for
/// a signal line and two histogram readings (SLOW + SIGNAL samples).
pub fn macd_score(closes: &[f64]) -> Option<f64> {
    if closes.len() < SLOW + SIGNAL {
        return None;
    }

    let ema_fast = ema(closes, FAST);
    let ema_slow = ema(closes, SLOW);

    // Both EMAs are valid from index SLOW - 1 onward.
    let macd_line: Vec<f64> = (SLOW - 1..closes.len())
        .map(|i| ema_fast[i] - ema_slow[i])
        .collect();

    let signal_line = ema(&macd_line, SIGNAL);
    if signal_line.len() < SIGNAL + 1 {
        return None;
    }

    let n = macd_line.len();
    let curr = macd_line[n - 1] - signal_line[n - 1];
    let prev = macd_line[n - 2] - signal_line[n - 2];

    let score = if prev <= 0.0 && curr > 0.0 {
        0.8
    } else if prev >= 0.0 && curr < 0.0 {
        0.2
    } else if curr > 0.0 {
        0.6
    } else {
        0.4
    };
    Some(score)
}
