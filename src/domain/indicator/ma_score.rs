//! Moving-average alignment score.
//!
//! Compares MA5, MA10 and MA20 of the trailing 20 closes:
//! full bullish order 1.0, partial bullish (MA5 leading both but MA10 not
//! yet above MA20) 0.8, single pairwise bullish 0.5, full bearish order 0.1,
//! mixed 0.3.

use super::sma;

/// Alignment score for `closes`. None with fewer than 20 samples.
pub fn ma_alignment_score(closes: &[f64]) -> Option<f64> {
    if closes.len() < 20 {
        return None;
    }

    let ma5 = sma(closes, 5).ok()?;
    let ma10 = sma(closes, 10).ok()?;
    let ma20 = sma(closes, 20).ok()?;

    let score = if ma5 > ma10 && ma10 > ma20 {
        1.0
    } else if ma5 > ma10 && ma5 > ma20 {
        0.8
    } else if ma5 > ma10 || ma10 > ma20 {
        0.5
    } else if ma5 < ma10 && ma10 < ma20 {
        0.1
    } else {
        0.3
    };
    Some(score)
}
