//! Bollinger band position score.
//!
//! Band = MA20 +/- 2 x stdev20. Price above the upper band scores 0.3
//! (overbought), below the lower band 0.9 (oversold, rebound candidate),
//! above the middle 0.6, else 0.7.

use super::{sma, stddev};

/// Position score for `closes`. None with fewer than 20 samples.
pub fn bollinger_score(closes: &[f64]) -> Option<f64> {
    if closes.len() < 20 {
        return None;
    }

    let middle = sma(closes, 20).ok()?;
    let sd = stddev(closes, 20).ok()?;
    let upper = middle + 2.0 * sd;
    let lower = middle - 2.0 * sd;
    let price = closes[closes.len() - 1];

    let score = if price > upper {
        0.3
    } else if price < lower {
        0.9
    } else if price > middle {
        0.6
    } else {
        0.7
    };
    Some(score)
}
