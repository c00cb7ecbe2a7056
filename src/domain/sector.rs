//! Sector heat ranking.
//!
//! Each configured sector is scored from a bounded sample of its members:
//! average daily price change, average daily volume change and total
//! turnover blend into a composite heat score. The top sectors become the
//! tick's "hot" set, fully replacing the previous tick's ranking.

use crate::ports::log::LogPort;
use crate::ports::market_data::MarketDataPort;
use crate::domain::ohlcv::Period;
use std::cmp::Ordering;

/// Sample at most this many members per sector to bound query fan-out.
pub const SECTOR_SAMPLE_CAP: usize = 50;

/// How many top-ranked sectors are retained as "hot".
pub const HOT_SECTOR_COUNT: usize = 5;

const PRICE_WEIGHT: f64 = 0.4;
const VOLUME_WEIGHT: f64 = 0.3;
const TURNOVER_WEIGHT: f64 = 0.3;

/// Display name -> platform sector key, in configuration order.
///
/// Injected rather than hard-coded: the table mixes true classification
/// sectors with thematic baskets, and which ones to track is a product
/// decision, not engine logic.
#[derive(Debug, Clone, Default)]
pub struct SectorTable {
    entries: Vec<(String, String)>,
}

impl SectorTable {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn key_of(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, k)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, k)| (n.as_str(), k.as_str()))
    }
}

/// One ranked sector. Scores are always finite; non-finite composites are
/// dropped before ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorHeatEntry {
    pub name: String,
    pub score: f64,
}

/// Rank all configured sectors and return the hot subset, best first.
///
/// Sectors with no members, no valid samples or a non-finite score are
/// skipped; a data error for one sector never aborts the ranking.
pub fn rank_sectors(
    data: &dyn MarketDataPort,
    table: &SectorTable,
    log: &dyn LogPort,
) -> Vec<SectorHeatEntry> {
    let mut scored: Vec<SectorHeatEntry> = Vec::new();

    for (name, key) in table.iter() {
        let members = match data.sector_members(key) {
            Ok(m) if !m.is_empty() => m,
            Ok(_) => {
                log.log(&format!("sector {}: no members", name));
                continue;
            }
            Err(e) => {
                log.log(&format!("sector {}: membership lookup failed: {}", name, e));
                continue;
            }
        };

        let sample: Vec<String> = members
            .into_iter()
            .take(SECTOR_SAMPLE_CAP)
            .collect();

        match score_sector(data, &sample) {
            Some(score) if score.is_finite() => {
                scored.push(SectorHeatEntry {
                    name: name.to_string(),
                    score,
                });
            }
            Some(score) => {
                log.log(&format!("sector {}: non-finite score {}", name, score));
            }
            None => {
                log.log(&format!("sector {}: no valid samples", name));
            }
        }
    }

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(HOT_SECTOR_COUNT);

    if !scored.is_empty() {
        let ranking: Vec<String> = scored
            .iter()
            .map(|e| format!("{}({:.3})", e.name, e.score))
            .collect();
        log.log(&format!("hot sectors: {}", ranking.join(" > ")));
    }

    scored
}

/// Composite score for one sector sample, or None when no member produced a
/// valid price-change observation.
fn score_sector(data: &dyn MarketDataPort, sample: &[String]) -> Option<f64> {
    let bar_map = data.bars(sample, Period::Day, 5).ok()?;

    let mut total_price_change = 0.0;
    let mut total_volume_change = 0.0;
    let mut total_turnover = 0.0;
    let mut valid = 0usize;

    for code in sample {
        let Some(bars) = bar_map.get(code) else {
            continue;
        };
        if bars.len() < 2 {
            continue;
        }

        let prev = &bars[bars.len() - 2];
        let curr = &bars[bars.len() - 1];
        let Some(price_change) = curr.change_from(prev) else {
            continue;
        };
        total_price_change += price_change;

        if prev.volume > 0 {
            total_volume_change += curr.volume as f64 / prev.volume as f64 - 1.0;
        }
        if curr.amount.is_finite() {
            total_turnover += curr.amount;
        }
        valid += 1;
    }

    if valid == 0 {
        return None;
    }

    let avg_price_change = total_price_change / valid as f64;
    let avg_volume_change = total_volume_change / valid as f64;

    // turnover is expressed in units of 1e8 so the three terms stay comparable
    Some(
        PRICE_WEIGHT * avg_price_change
            + VOLUME_WEIGHT * avg_volume_change
            + TURNOVER_WEIGHT * (total_turnover / 1e8),
    )
}
