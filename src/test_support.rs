//! In-memory fake ports for unit tests.

use crate::domain::error::HeattraderError;
use crate::domain::ohlcv::{Bar, Period};
use crate::ports::broker::{
    AccountSummary, BrokerPort, OrderIntent, OrderOutcome, PositionDetail,
};
use crate::ports::market_data::MarketDataPort;
use chrono::{Duration, NaiveDate};
use std::cell::RefCell;
use std::collections::HashMap;

pub fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
}

pub fn make_bar(code: &str, day_offset: i64, close: f64, volume: i64) -> Bar {
    let date = base_date() + Duration::days(day_offset);
    Bar {
        code: code.to_string(),
        time: date.and_hms_opt(15, 0, 0).unwrap(),
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume,
        amount: close * volume as f64,
    }
}

/// Scriptable market data source.
#[derive(Default)]
pub struct FakeMarketData {
    bars: HashMap<(String, Period), Vec<Bar>>,
    sectors: HashMap<String, Vec<String>>,
    names: HashMap<String, String>,
    listing_dates: HashMap<String, NaiveDate>,
    float_caps: HashMap<String, f64>,
    pub fail_sectors: bool,
}

impl FakeMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sector(&mut self, key: &str, members: &[&str]) {
        self.sectors.insert(
            key.to_string(),
            members.iter().map(|m| m.to_string()).collect(),
        );
    }

    pub fn add_bars(&mut self, code: &str, period: Period, bars: Vec<Bar>) {
        self.bars.insert((code.to_string(), period), bars);
    }

    /// Daily bars from a close series, ending at the base date, with a flat
    /// volume of 1000 shares per bar.
    pub fn add_daily_closes(&mut self, code: &str, closes: &[f64]) {
        let n = closes.len() as i64;
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| make_bar(code, i as i64 - (n - 1), c, 1_000))
            .collect();
        self.add_bars(code, Period::Day, bars);
    }

    /// Overwrite volumes (and turnover) of an existing daily series.
    pub fn set_volumes(&mut self, code: &str, volumes: &[i64]) {
        let bars = self
            .bars
            .get_mut(&(code.to_string(), Period::Day))
            .expect("daily bars must exist before set_volumes");
        assert_eq!(bars.len(), volumes.len());
        for (bar, &v) in bars.iter_mut().zip(volumes) {
            bar.volume = v;
            bar.amount = bar.close * v as f64;
        }
    }

    pub fn set_name(&mut self, code: &str, name: &str) {
        self.names.insert(code.to_string(), name.to_string());
    }

    pub fn set_listing_date(&mut self, code: &str, date: NaiveDate) {
        self.listing_dates.insert(code.to_string(), date);
    }

    pub fn set_float_cap(&mut self, code: &str, cap: f64) {
        self.float_caps.insert(code.to_string(), cap);
    }
}

impl MarketDataPort for FakeMarketData {
    fn bars(
        &self,
        codes: &[String],
        period: Period,
        count: usize,
    ) -> Result<HashMap<String, Vec<Bar>>, HeattraderError> {
        let mut out = HashMap::new();
        for code in codes {
            if let Some(bars) = self.bars.get(&(code.clone(), period)) {
                let start = bars.len().saturating_sub(count);
                out.insert(code.clone(), bars[start..].to_vec());
            }
        }
        Ok(out)
    }

    fn sector_members(&self, sector_key: &str) -> Result<Vec<String>, HeattraderError> {
        if self.fail_sectors {
            return Err(HeattraderError::DataSource {
                reason: "sector service down".into(),
            });
        }
        Ok(self.sectors.get(sector_key).cloned().unwrap_or_default())
    }

    fn symbol_name(&self, code: &str) -> Option<String> {
        self.names.get(code).cloned()
    }

    fn listing_date(&self, code: &str) -> Option<NaiveDate> {
        self.listing_dates.get(code).copied()
    }

    fn float_cap(&self, code: &str) -> Option<f64> {
        self.float_caps.get(code).copied()
    }
}

/// Broker fake that fills accepted orders into its own holdings map.
pub struct FakeBroker {
    pub holdings: RefCell<HashMap<String, i64>>,
    pub details: HashMap<String, PositionDetail>,
    pub orders: RefCell<Vec<OrderIntent>>,
    pub account: Option<AccountSummary>,
    pub reject_all: bool,
    pub fail_holdings: bool,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self {
            holdings: RefCell::new(HashMap::new()),
            details: HashMap::new(),
            orders: RefCell::new(Vec::new()),
            account: Some(AccountSummary {
                total_assets: 1_000_000.0,
                available_cash: 1_000_000.0,
                holdings_value: 0.0,
            }),
            reject_all: false,
            fail_holdings: false,
        }
    }

    pub fn hold(&mut self, code: &str, qty: i64, open_price: f64, open_date: NaiveDate) {
        self.holdings.borrow_mut().insert(code.to_string(), qty);
        self.details.insert(
            code.to_string(),
            PositionDetail {
                open_price,
                open_date: Some(open_date),
            },
        );
    }

    pub fn order_tags(&self) -> Vec<&'static str> {
        self.orders.borrow().iter().map(|o| o.tag).collect()
    }
}

impl BrokerPort for FakeBroker {
    fn holdings(&self) -> Result<HashMap<String, i64>, HeattraderError> {
        if self.fail_holdings {
            return Err(HeattraderError::DataSource {
                reason: "broker session down".into(),
            });
        }
        Ok(self.holdings.borrow().clone())
    }

    fn position_detail(&self, code: &str) -> Option<PositionDetail> {
        self.details.get(code).cloned()
    }

    fn account(&self) -> Option<AccountSummary> {
        self.account.clone()
    }

    fn place_order(&self, order: &OrderIntent) -> OrderOutcome {
        // attempts are recorded even when rejected, so tests can count retries
        self.orders.borrow_mut().push(order.clone());
        if self.reject_all {
            return OrderOutcome {
                accepted: false,
                message: "rejected by test broker".into(),
            };
        }
        let mut holdings = self.holdings.borrow_mut();
        let entry = holdings.entry(order.code.clone()).or_insert(0);
        *entry += order.quantity;
        if *entry <= 0 {
            holdings.remove(&order.code);
        }
        OrderOutcome {
            accepted: true,
            message: "filled".into(),
        }
    }
}
