//! Multi-stage stock selection.
//!
//! For each hot sector the pipeline narrows the constituents through
//! eligibility, liquidity and technical-score filters, then applies a
//! quality ladder that relaxes its conditions until some tier produces at
//! least one symbol. Results from all hot sectors are merged in heat-rank
//! order and truncated to the portfolio size.

use crate::domain::indicator::{
    bollinger_score, cci, kdj, ma_alignment_score, macd_score, rsi, sma,
};
use crate::domain::ohlcv::{Bar, Period};
use crate::domain::sector::{SectorHeatEntry, SectorTable};
use crate::ports::log::LogPort;
use crate::ports::market_data::MarketDataPort;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Listing age below this many days marks a symbol as too new.
pub const MIN_LISTING_AGE_DAYS: i64 = 60;

/// Share of the market-cap ranking kept by the liquidity filter.
const LIQUIDITY_KEEP_RATIO: f64 = 0.8;

/// Share of the technical-score ranking kept, with a floor so thin sectors
/// still field candidates.
const SCORE_KEEP_RATIO: f64 = 0.2;
const SCORE_KEEP_FLOOR: usize = 20;

/// Relaxed-tier acceptance threshold for the composite technical score.
const COMPOSITE_THRESHOLD: f64 = 0.5;

/// Transient per-candidate score used while ranking.
#[derive(Debug, Clone)]
struct CandidateScore {
    code: String,
    score: f64,
}

/// Which quality-ladder tier produced the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityTier {
    Strict,
    Relaxed,
    Basic,
    None,
}

/// Run the full selection pipeline over the hot sectors.
pub fn select_stocks(
    data: &dyn MarketDataPort,
    table: &SectorTable,
    hot: &[SectorHeatEntry],
    today: NaiveDate,
    portfolio_size: usize,
    log: &dyn LogPort,
) -> Vec<String> {
    let mut selected: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for entry in hot {
        let Some(key) = table.key_of(&entry.name) else {
            log.log(&format!("selector: sector {} has no platform key", entry.name));
            continue;
        };
        let members = match data.sector_members(key) {
            Ok(m) if !m.is_empty() => m,
            Ok(_) => continue,
            Err(e) => {
                log.log(&format!("selector: {} members unavailable: {}", entry.name, e));
                continue;
            }
        };

        let eligible = filter_eligible(data, &members, today);
        let liquid = filter_by_market_cap(data, eligible);
        let ranked = rank_by_technical_score(data, liquid);
        let (tier, picks) = quality_ladder(data, &ranked);

        log.log(&format!(
            "selector: {} -> {} picks via {:?}",
            entry.name,
            picks.len(),
            tier
        ));

        for code in picks {
            if seen.insert(code.clone()) {
                selected.push(code);
            }
            if selected.len() >= portfolio_size {
                return selected;
            }
        }
    }

    selected
}

/// Drop special-treatment names and recently listed symbols.
fn filter_eligible(data: &dyn MarketDataPort, codes: &[String], today: NaiveDate) -> Vec<String> {
    codes
        .iter()
        .filter(|code| {
            if let Some(name) = data.symbol_name(code) {
                if name.contains("ST") {
                    return false;
                }
            }
            if let Some(listed) = data.listing_date(code) {
                if (today - listed).num_days() < MIN_LISTING_AGE_DAYS {
                    return false;
                }
            }
            true
        })
        .cloned()
        .collect()
}

/// Keep the top share of symbols by float market cap. Symbols with unknown
/// cap or price are dropped; they cannot be ranked.
fn filter_by_market_cap(data: &dyn MarketDataPort, codes: Vec<String>) -> Vec<String> {
    let bar_map = match data.bars(&codes, Period::Day, 1) {
        Ok(m) => m,
        Err(_) => return Vec::new(),
    };

    let mut caps: Vec<CandidateScore> = codes
        .into_iter()
        .filter_map(|code| {
            let close = bar_map.get(&code)?.last()?.close;
            let float_cap = data.float_cap(&code)?;
            Some(CandidateScore {
                code,
                score: float_cap * close,
            })
        })
        .collect();

    sort_descending(&mut caps);
    let keep = (caps.len() as f64 * LIQUIDITY_KEEP_RATIO).ceil() as usize;
    caps.truncate(keep);
    caps.into_iter().map(|c| c.code).collect()
}

/// Rank by the coarse technical score and keep the top share (with floor).
fn rank_by_technical_score(data: &dyn MarketDataPort, codes: Vec<String>) -> Vec<String> {
    let bar_map = match data.bars(&codes, Period::Day, 60) {
        Ok(m) => m,
        Err(_) => return Vec::new(),
    };

    let mut scores: Vec<CandidateScore> = codes
        .into_iter()
        .filter_map(|code| {
            let bars = bar_map.get(&code)?;
            let score = coarse_technical_score(bars)?;
            (score > 0.0).then_some(CandidateScore { code, score })
        })
        .collect();

    sort_descending(&mut scores);
    let keep = ((scores.len() as f64 * SCORE_KEEP_RATIO) as usize).max(SCORE_KEEP_FLOOR);
    scores.truncate(keep);
    scores.into_iter().map(|c| c.code).collect()
}

/// Momentum over ~20 bars plus RSI-closeness-to-50, averaged.
/// None with fewer than 30 bars.
fn coarse_technical_score(bars: &[Bar]) -> Option<f64> {
    if bars.len() < 30 {
        return None;
    }
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let base = closes[closes.len() - 20];
    if base == 0.0 {
        return None;
    }
    let momentum = closes[closes.len() - 1] / base - 1.0;
    let momentum_score = (momentum / 0.2).clamp(0.0, 1.0);

    let rsi_score = rsi(&closes, 14).map(|r| 1.0 - (r - 50.0).abs() / 50.0)?;

    Some((momentum_score + rsi_score) / 2.0)
}

/// Quality ladder: strict, then relaxed, then basic. The first tier that
/// yields at least one symbol wins; candidate order is preserved.
fn quality_ladder(data: &dyn MarketDataPort, candidates: &[String]) -> (QualityTier, Vec<String>) {
    let bar_map = match data.bars(candidates, Period::Day, 60) {
        Ok(m) => m,
        Err(_) => return (QualityTier::None, Vec::new()),
    };

    let strict: Vec<String> = candidates
        .iter()
        .filter(|code| {
            bar_map
                .get(*code)
                .is_some_and(|bars| money_flow(bars) && long_ma_alignment(bars))
        })
        .cloned()
        .collect();
    if !strict.is_empty() {
        return (QualityTier::Strict, strict);
    }

    let relaxed: Vec<String> = candidates
        .iter()
        .filter(|code| {
            bar_map
                .get(*code)
                .and_then(|bars| composite_technical_score(bars))
                .is_some_and(|s| s > COMPOSITE_THRESHOLD)
        })
        .cloned()
        .collect();
    if !relaxed.is_empty() {
        return (QualityTier::Relaxed, relaxed);
    }

    let basic: Vec<String> = candidates
        .iter()
        .filter(|code| {
            bar_map
                .get(*code)
                .is_some_and(|bars| money_flow(bars) || long_ma_alignment(bars))
        })
        .cloned()
        .collect();
    if basic.is_empty() {
        (QualityTier::None, basic)
    } else {
        (QualityTier::Basic, basic)
    }
}

/// Sustained buying pressure proxy: price and volume both rose on each of
/// the last two daily steps (three consecutive rising bars).
pub fn money_flow(bars: &[Bar]) -> bool {
    if bars.len() < 3 {
        return false;
    }
    let tail = &bars[bars.len() - 3..];
    tail.windows(2).all(|pair| {
        pair[1].close > pair[0].close && pair[1].volume > pair[0].volume
    })
}

/// MA5 > MA20 > MA60 over daily closes. Requires 60 bars.
pub fn long_ma_alignment(bars: &[Bar]) -> bool {
    if bars.len() < 60 {
        return false;
    }
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    match (sma(&closes, 5), sma(&closes, 20), sma(&closes, 60)) {
        (Ok(ma5), Ok(ma20), Ok(ma60)) => ma5 > ma20 && ma20 > ma60,
        _ => false,
    }
}

/// Equal-weight blend of whichever indicator scores are computable.
/// RSI, CCI and KDJ readings are mapped onto [0, 1] band scores; the MACD,
/// MA alignment and Bollinger scores are already in that range.
pub fn composite_technical_score(bars: &[Bar]) -> Option<f64> {
    if bars.len() < 14 {
        return None;
    }
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let mut total = 0.0;
    let mut count = 0usize;

    if let Some(r) = rsi(&closes, 14) {
        total += if (30.0..=70.0).contains(&r) {
            1.0
        } else if (20.0..=80.0).contains(&r) {
            0.5
        } else {
            0.0
        };
        count += 1;
    }

    if let Some(c) = cci(bars, 14) {
        total += if (-100.0..=100.0).contains(&c) {
            1.0
        } else if c > 100.0 {
            0.75
        } else {
            0.25
        };
        count += 1;
    }

    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    if let Some(series) = kdj(&highs, &lows, &closes, 9, 3, 3) {
        total += if series.golden_cross() {
            1.0
        } else if series.dead_cross() {
            0.0
        } else {
            0.5
        };
        count += 1;
    }

    if let Some(s) = macd_score(&closes) {
        total += s;
        count += 1;
    }
    if let Some(s) = ma_alignment_score(&closes) {
        total += s;
        count += 1;
    }
    if let Some(s) = bollinger_score(&closes) {
        total += s;
        count += 1;
    }

    (count > 0).then(|| total / count as f64)
}

fn sort_descending(scores: &mut [CandidateScore]) {
    scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}
