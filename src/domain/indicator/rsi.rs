//! RSI (Relative Strength Index).
//!
//! Wilder's smoothing for average gain/loss:
//! - First average: simple mean of gains/losses over the first `period` deltas
//! - Subsequent: avg = (prev_avg * (period - 1) + current) / period
//!
//! RSI = 100 - (100 / (1 + avg_gain / avg_loss)); 100 when avg_loss == 0.

/// Latest RSI over `values`. None with fewer than `period + 1` samples
/// (a delta series of at least `period` is required).
pub fn rsi(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period + 1 {
        return None;
    }

    let mut gains: Vec<f64> = Vec::with_capacity(values.len() - 1);
    let mut losses: Vec<f64> = Vec::with_capacity(values.len() - 1);
    for pair in values.windows(2) {
        let change = pair[1] - pair[0];
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;

    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
    }

    if avg_loss == 0.0 {
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rsi_needs_period_plus_one_samples() {
        let values: Vec<f64> = (0..14).map(|i| 100.0 + i as f64).collect();
        assert!(rsi(&values, 14).is_none());

        let values: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        assert!(rsi(&values, 14).is_some());
    }

    #[test]
    fn rsi_zero_period_is_none() {
        assert!(rsi(&[100.0, 101.0], 0).is_none());
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let values: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let rsi = rsi(&values, 14).unwrap();
        assert!((rsi - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let values: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let rsi = rsi(&values, 14).unwrap();
        assert!(rsi.abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_increasing_series_converges_high() {
        let values: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 0.5).collect();
        let rsi = rsi(&values, 14).unwrap();
        assert!(rsi > 99.0, "RSI {} should converge toward 100", rsi);
    }

    #[test]
    fn rsi_decreasing_series_converges_low() {
        let values: Vec<f64> = (0..60).map(|i| 100.0 - i as f64 * 0.5).collect();
        let rsi = rsi(&values, 14).unwrap();
        assert!(rsi < 1.0, "RSI {} should converge toward 0", rsi);
    }

    #[test]
    fn rsi_flat_series_is_100() {
        // no losses at all, avg_loss == 0
        let values = vec![100.0; 20];
        assert_eq!(rsi(&values, 14), Some(100.0));
    }

    proptest! {
        #[test]
        fn rsi_always_in_range(values in proptest::collection::vec(1.0f64..1000.0, 15..120)) {
            if let Some(rsi) = rsi(&values, 14) {
                prop_assert!((0.0..=100.0).contains(&rsi), "RSI {} out of range", rsi);
            }
        }
    }
}
