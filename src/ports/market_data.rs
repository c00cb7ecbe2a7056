//! Market data access port.

use crate::domain::error::HeattraderError;
use crate::domain::ohlcv::{Bar, Period};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Read-only access to bar data, sector membership and symbol metadata.
///
/// `bars` returns the trailing `count` bars per symbol as of the data
/// source's current time. Unknown or data-less symbols are omitted from the
/// map, never reported as an error; callers treat omission as
/// "skip this symbol for this tick".
pub trait MarketDataPort {
    fn bars(
        &self,
        codes: &[String],
        period: Period,
        count: usize,
    ) -> Result<HashMap<String, Vec<Bar>>, HeattraderError>;

    /// Constituents of a platform sector key. May be empty.
    fn sector_members(&self, sector_key: &str) -> Result<Vec<String>, HeattraderError>;

    fn symbol_name(&self, code: &str) -> Option<String>;

    fn listing_date(&self, code: &str) -> Option<NaiveDate>;

    /// Free-float shares outstanding.
    fn float_cap(&self, code: &str) -> Option<f64>;
}

/// Convenience for the common single-symbol query.
pub fn bars_for(
    data: &dyn MarketDataPort,
    code: &str,
    period: Period,
    count: usize,
) -> Result<Vec<Bar>, HeattraderError> {
    let mut map = data.bars(&[code.to_string()], period, count)?;
    map.remove(code)
        .ok_or_else(|| HeattraderError::NoData { code: code.to_string() })
}
