//! Technical indicator library.
//!
//! Pure functions over ordered price/volume sequences (oldest first). Most
//! indicators signal "not enough history" with `None` rather than an error;
//! callers treat absence as a non-vote, never as a failed gate. Composite
//! score functions return values in roughly [0, 1] so they can be blended
//! with equal weights by the selector.

pub mod bollinger;
pub mod cci;
pub mod ema;
pub mod kdj;
pub mod ma_score;
pub mod macd;
pub mod rsi;

pub use bollinger::bollinger_score;
pub use cci::cci;
pub use ema::ema;
pub use kdj::{kdj, KdjSeries};
pub use ma_score::ma_alignment_score;
pub use macd::macd_score;
pub use rsi::rsi;

/// Indicator-level error: distinct from the session error type because a
/// short series is a per-symbol condition, not a session fault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndicatorError {
    #[error("insufficient data: have {have} samples, need {need}")]
    InsufficientData { have: usize, need: usize },
}

/// Simple moving average of the trailing `window` values.
pub fn sma(values: &[f64], window: usize) -> Result<f64, IndicatorError> {
    if window == 0 || values.len() < window {
        return Err(IndicatorError::InsufficientData {
            have: values.len(),
            need: window.max(1),
        });
    }
    let tail = &values[values.len() - window..];
    Ok(tail.iter().sum::<f64>() / window as f64)
}

/// Population standard deviation of the trailing `window` values.
pub fn stddev(values: &[f64], window: usize) -> Result<f64, IndicatorError> {
    let mean = sma(values, window)?;
    let tail = &values[values.len() - window..];
    let variance = tail.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / window as f64;
    Ok(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sma_trailing_window() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(sma(&values, 3).unwrap(), 4.0);
        assert_relative_eq!(sma(&values, 5).unwrap(), 3.0);
    }

    #[test]
    fn sma_insufficient() {
        let values = vec![1.0, 2.0];
        assert_eq!(
            sma(&values, 3),
            Err(IndicatorError::InsufficientData { have: 2, need: 3 })
        );
    }

    #[test]
    fn sma_zero_window() {
        assert!(sma(&[1.0, 2.0], 0).is_err());
    }

    #[test]
    fn stddev_constant_series_is_zero() {
        let values = vec![5.0; 20];
        assert_relative_eq!(stddev(&values, 20).unwrap(), 0.0);
    }

    #[test]
    fn stddev_known_value() {
        // population stddev of [2, 4, 4, 4, 5, 5, 7, 9] is 2
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(stddev(&values, 8).unwrap(), 2.0);
    }
}
