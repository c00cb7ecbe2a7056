//! CCI (Commodity Channel Index).
//!
//! Typical price = (high + low + close) / 3; CCI is the deviation of the
//! latest typical price from its rolling mean, scaled by 0.015 x the mean
//! absolute deviation. Zero mean deviation yields a 0 reading rather than a
//! fault.

use crate::domain::ohlcv::Bar;

/// Latest CCI over `bars`. None with fewer than `period` samples.
pub fn cci(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period {
        return None;
    }

    let tp: Vec<f64> = bars.iter().map(|b| b.typical_price()).collect();
    let window = &tp[tp.len() - period..];
    let mean = window.iter().sum::<f64>() / period as f64;
    let mean_dev = window.iter().map(|v| (v - mean).abs()).sum::<f64>() / period as f64;

    if mean_dev == 0.0 {
        return Some(0.0);
    }
    Some((tp[tp.len() - 1] - mean) / (0.015 * mean_dev))
}
