//! Order execution and account reporting port.

use crate::domain::error::HeattraderError;
use chrono::NaiveDate;
use std::collections::HashMap;

/// How an order should be priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    /// Fixed-price order at the hinted price.
    Fix,
    /// Close out whatever quantity remains, price hint ignored.
    CloseAll,
}

/// A single order request. Negative quantity sells.
#[derive(Debug, Clone)]
pub struct OrderIntent {
    pub code: String,
    pub quantity: i64,
    pub kind: OrderKind,
    pub price_hint: f64,
    /// Which decision stage produced the order, for log attribution.
    pub tag: &'static str,
}

/// Broker's verdict on an order.
#[derive(Debug, Clone)]
pub struct OrderOutcome {
    pub accepted: bool,
    pub message: String,
}

/// Entry detail for an open position, when the broker can supply it.
#[derive(Debug, Clone)]
pub struct PositionDetail {
    pub open_price: f64,
    pub open_date: Option<NaiveDate>,
}

/// Account-level snapshot used by the exposure gate.
#[derive(Debug, Clone)]
pub struct AccountSummary {
    pub total_assets: f64,
    pub available_cash: f64,
    pub holdings_value: f64,
}

pub trait BrokerPort {
    /// Current holdings: code -> share quantity. Empty map when flat.
    fn holdings(&self) -> Result<HashMap<String, i64>, HeattraderError>;

    /// Best-effort entry detail; None when the broker cannot report it.
    fn position_detail(&self, code: &str) -> Option<PositionDetail>;

    /// Account snapshot; None when unavailable this tick.
    fn account(&self) -> Option<AccountSummary>;

    fn place_order(&self, order: &OrderIntent) -> OrderOutcome;
}
