#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use heattrader::domain::error::HeattraderError;
pub use heattrader::domain::ohlcv::{Bar, Period};
use heattrader::domain::params::SessionParams;
use heattrader::domain::position::ExitRules;
use heattrader::domain::sector::SectorTable;
use heattrader::domain::t_trade::TRules;
use heattrader::ports::broker::{
    AccountSummary, BrokerPort, OrderIntent, OrderOutcome, PositionDetail,
};
use heattrader::ports::market_data::MarketDataPort;
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

pub fn default_params() -> SessionParams {
    SessionParams {
        portfolio_size: 5,
        reselect_interval: 10,
        benchmark: "000300.SH".to_string(),
        max_exposure: 0.8,
        lot_size: 100,
        exit: ExitRules {
            take_profit: 0.05,
            drawdown: 0.02,
            stop_loss: 0.03,
        },
        t: TRules {
            lot: 100,
            sleeve_stop: 0.015,
        },
        sectors: SectorTable::new(vec![("alpha".into(), "KEY-A".into())]),
    }
}

/// Scriptable market data source; fields are public so tests can reshape
/// the world between ticks.
#[derive(Default)]
pub struct MockMarketData {
    pub bars: HashMap<(String, Period), Vec<Bar>>,
    pub sectors: HashMap<String, Vec<String>>,
    pub names: HashMap<String, String>,
    pub listing_dates: HashMap<String, NaiveDate>,
    pub float_caps: HashMap<String, f64>,
    pub fail_sectors: bool,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sector(&mut self, key: &str, members: &[&str]) {
        self.sectors.insert(
            key.to_string(),
            members.iter().map(|m| m.to_string()).collect(),
        );
    }

    pub fn add_daily_closes(&mut self, code: &str, closes: &[f64]) {
        let n = closes.len() as i64;
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| make_bar(code, i as i64 - (n - 1), c, 1_000))
            .collect();
        self.bars.insert((code.to_string(), Period::Day), bars);
    }

    /// Append one daily bar, as the next trading day would.
    pub fn push_daily_close(&mut self, code: &str, close: f64) {
        let key = (code.to_string(), Period::Day);
        let bars = self.bars.entry(key).or_default();
        let offset = bars
            .last()
            .map(|b| (b.time.date() - base_date()).num_days() + 1)
            .unwrap_or(0);
        bars.push(make_bar(code, offset, close, 1_000));
    }

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

    pub fn set_intraday(&mut self, code: &str, period: Period, closes: &[f64]) {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| make_bar(code, i as i64, c, 500))
            .collect();
        self.bars.insert((code.to_string(), period), bars);
    }

    /// A liquid symbol in a steady uptrend, eligible for every filter.
    pub fn add_strong_symbol(&mut self, code: &str) {
        let closes: Vec<f64> = (0..60).map(|i| 10.0 + i as f64 * 0.02).collect();
        self.add_daily_closes(code, &closes);
        let volumes: Vec<i64> = (0..60).map(|i| 10_000 + i * 100).collect();
        self.set_volumes(code, &volumes);
        self.float_caps.insert(code.to_string(), 1e9);
        self.listing_dates
            .insert(code.to_string(), base_date() - Duration::days(1000));
    }

    /// Benchmark comfortably above both its MA20 and MA60.
    pub fn calm_benchmark(&mut self) {
        let closes: Vec<f64> = (0..60).map(|i| 3000.0 + i as f64 * 5.0).collect();
        self.add_daily_closes("000300.SH", &closes);
    }

    /// Benchmark crashing under its MA60 with a one-day drop beyond 3%.
    pub fn crashing_benchmark(&mut self) {
        let mut closes = vec![3000.0; 59];
        closes.push(2800.0);
        self.add_daily_closes("000300.SH", &closes);
    }
}

impl MarketDataPort for MockMarketData {
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

/// Broker mock that fills accepted orders into its own holdings map.
pub struct MockBroker {
    pub holdings: RefCell<HashMap<String, i64>>,
    pub details: HashMap<String, PositionDetail>,
    pub orders: RefCell<Vec<OrderIntent>>,
    pub account: Option<AccountSummary>,
    pub reject_all: bool,
}

impl MockBroker {
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

    pub fn quantity(&self, code: &str) -> i64 {
        self.holdings.borrow().get(code).copied().unwrap_or(0)
    }

    pub fn order_tags(&self) -> Vec<&'static str> {
        self.orders.borrow().iter().map(|o| o.tag).collect()
    }
}

impl BrokerPort for MockBroker {
    fn holdings(&self) -> Result<HashMap<String, i64>, HeattraderError> {
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
