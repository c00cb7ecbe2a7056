//! EMA (Exponential Moving Average).
//!
//! Seeded with the simple average of the first `period` values, then
//! recursively smoothed with k = 2 / (period + 1).

/// Full EMA series over `values`. The first `period - 1` slots are zero
/// (warm-up); index `period - 1` holds the seed. Empty when the input is
/// shorter than `period`.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = vec![0.0; values.len()];
    out[period - 1] = values[..period].iter().sum::<f64>() / period as f64;

    for i in period..values.len() {
        out[i] = values[i] * k + out[i - 1] * (1.0 - k);
    }
    out
}
