//! KDJ stochastic oscillator.
//!
//! RSV per bar = (close - lowest low) / (highest high - lowest low) x 100
//! over a trailing window of N bars, 0 when the range is zero. K and D are
//! recursively smoothed from an initial 50 with weights (M - 1)/M and 1/M;
//! J = 3K - 2D.

/// Full K/D/J series, aligned with the input bars.
#[derive(Debug, Clone, PartialEq)]
pub struct KdjSeries {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
    pub j: Vec<f64>,
}

impl KdjSeries {
    /// K crossed above D on the latest bar with D still depressed (< 20).
    pub fn golden_cross(&self) -> bool {
        let n = self.k.len();
        if n < 2 {
            return false;
        }
        self.k[n - 2] <= self.d[n - 2] && self.k[n - 1] > self.d[n - 1] && self.d[n - 1] < 20.0
    }

    /// K crossed below D on the latest bar with D still elevated (> 80).
    pub fn dead_cross(&self) -> bool {
        let n = self.k.len();
        if n < 2 {
            return false;
        }
        self.k[n - 2] >= self.d[n - 2] && self.k[n - 1] < self.d[n - 1] && self.d[n - 1] > 80.0
    }
}

/// KDJ over parallel high/low/close series. None when the inputs are shorter
/// than `n` or of unequal length.
pub fn kdj(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    n: usize,
    m1: usize,
    m2: usize,
) -> Option<KdjSeries> {
    if n == 0 || m1 == 0 || m2 == 0 {
        return None;
    }
    if highs.len() != lows.len() || lows.len() != closes.len() || closes.len() < n {
        return None;
    }

    let mut rsv = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        if i < n - 1 {
            rsv.push(0.0);
            continue;
        }
        let window = i + 1 - n..=i;
        let hn = highs[window.clone()].iter().cloned().fold(f64::MIN, f64::max);
        let ln = lows[window].iter().cloned().fold(f64::MAX, f64::min);
        if hn == ln {
            rsv.push(0.0);
        } else {
            rsv.push((closes[i] - ln) / (hn - ln) * 100.0);
        }
    }

    let mut k = Vec::with_capacity(rsv.len());
    let mut prev_k = 50.0;
    k.push(prev_k);
    for &r in &rsv[1..] {
        prev_k = (m1 - 1) as f64 / m1 as f64 * prev_k + r / m1 as f64;
        k.push(prev_k);
    }

    let mut d = Vec::with_capacity(k.len());
    let mut prev_d = 50.0;
    d.push(prev_d);
    for &kv in &k[1..] {
        prev_d = (m2 - 1) as f64 / m2 as f64 * prev_d + kv / m2 as f64;
        d.push(prev_d);
    }

    let j = k.iter().zip(&d).map(|(kv, dv)| 3.0 * kv - 2.0 * dv).collect();

    Some(KdjSeries { k, d, j })
}
