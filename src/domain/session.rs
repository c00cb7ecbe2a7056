//! Tick orchestration.
//!
//! [`Session`] owns all cross-tick state and drives the decision stages in a
//! fixed order each tick: risk assessment, sector ranking, reselection,
//! rotation exits, entries, the intraday overlay, position exits and
//! deleveraging. A failure inside one stage is logged and the remaining
//! stages still run; one bad data fetch must not silence the stops.

use crate::domain::error::HeattraderError;
use crate::domain::ohlcv::Period;
use crate::domain::params::SessionParams;
use crate::domain::position::{PositionBook, PositionRecord};
use crate::domain::risk_gate::{self, RiskLevel};
use crate::domain::sector::{self, SectorHeatEntry};
use crate::domain::selector;
use crate::domain::t_trade::{self, TBook};
use crate::ports::broker::{BrokerPort, OrderIntent, OrderKind};
use crate::ports::log::LogPort;
use crate::ports::market_data::{bars_for, MarketDataPort};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

/// Five-session return below which a holding is rotated out.
const ROTATION_RETURN_FLOOR: f64 = -0.02;

/// Day-over-day gain at which a symbol counts as limit-up and is not chased.
const LIMIT_UP_THRESHOLD: f64 = 0.099;
/// Special-treatment names hit their band at half the regular move.
const LIMIT_UP_THRESHOLD_ST: f64 = 0.049;

/// Cross-tick strategy state plus the decision loop.
pub struct Session {
    params: SessionParams,
    positions: PositionBook,
    sleeves: TBook,
    hot_sectors: Vec<SectorHeatEntry>,
    selected: Vec<String>,
    risk_level: RiskLevel,
    tick: u64,
    rng: StdRng,
}

impl Session {
    /// A fresh session. `seed` pins the randomized holding window for
    /// reproducible runs; None draws from the OS.
    pub fn new(params: SessionParams, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            params,
            positions: PositionBook::new(),
            sleeves: TBook::new(),
            hot_sectors: Vec::new(),
            selected: Vec::new(),
            risk_level: RiskLevel::Low,
            tick: 0,
            rng,
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    pub fn hot_sectors(&self) -> &[SectorHeatEntry] {
        &self.hot_sectors
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn positions(&self) -> &PositionBook {
        &self.positions
    }

    /// Run one full decision cycle. Stage failures are logged and skipped;
    /// the tick counter advances regardless.
    pub fn run_tick(
        &mut self,
        data: &dyn MarketDataPort,
        broker: &dyn BrokerPort,
        today: NaiveDate,
        log: &dyn LogPort,
    ) {
        log.log(&format!("tick {} start ({})", self.tick, today));

        if let Err(e) = self.assess_market(data, log) {
            log.log(&format!("risk stage failed: {}", e));
        }

        self.hot_sectors = sector::rank_sectors(data, &self.params.sectors, log);

        // the market-level stages above need no holdings; only the
        // position stages are skipped when the broker is unreachable
        let held = match self.sync_books(broker, today) {
            Ok(held) => held,
            Err(e) => {
                log.log(&format!(
                    "tick {}: holdings unavailable, position stages skipped: {}",
                    self.tick, e
                ));
                self.tick += 1;
                return;
            }
        };

        if self.should_reselect(&held) {
            self.selected = selector::select_stocks(
                data,
                &self.params.sectors,
                &self.hot_sectors,
                today,
                self.params.portfolio_size,
                log,
            );
            log.log(&format!("selection pool: {:?}", self.selected));
        }

        if let Err(e) = self.rotation_exits(data, broker, &held, log) {
            log.log(&format!("rotation stage failed: {}", e));
        }

        if let Err(e) = self.enter_positions(data, broker, today, log) {
            log.log(&format!("entry stage failed: {}", e));
        }

        if let Err(e) = self.overlay_trades(data, broker, log) {
            log.log(&format!("overlay stage failed: {}", e));
        }

        if let Err(e) = self.position_exits(data, broker, today, log) {
            log.log(&format!("exit stage failed: {}", e));
        }

        self.deleverage(broker, log);

        self.tick += 1;
    }

    /// Reconcile the books with what the broker actually holds.
    fn sync_books(
        &mut self,
        broker: &dyn BrokerPort,
        today: NaiveDate,
    ) -> Result<HashMap<String, i64>, HeattraderError> {
        let held = broker.holdings()?;
        for code in held.keys() {
            if !self.positions.contains(code) {
                let record = match broker.position_detail(code) {
                    Some(detail) => PositionRecord::new(detail.open_price, detail.open_date),
                    None => PositionRecord::new(0.0, Some(today)),
                };
                self.positions.adopt(code, record);
            }
        }
        self.positions.retain_held(&held);
        self.sleeves.retain_held(&held);
        Ok(held)
    }

    fn assess_market(
        &mut self,
        data: &dyn MarketDataPort,
        log: &dyn LogPort,
    ) -> Result<(), HeattraderError> {
        let bars = bars_for(data, &self.params.benchmark, Period::Day, 60)?;
        let level = risk_gate::assess(&bars, log);
        if level != self.risk_level {
            log.log(&format!(
                "market risk level {:?} -> {:?}",
                self.risk_level, level
            ));
        }
        self.risk_level = level;
        Ok(())
    }

    fn should_reselect(&self, held: &HashMap<String, i64>) -> bool {
        self.tick == 0 || self.tick % self.params.reselect_interval == 0 || held.is_empty()
    }

    /// Close holdings that turned stale: a five-session slide beyond the
    /// floor, or a home sector that fell out of the hot set.
    fn rotation_exits(
        &mut self,
        data: &dyn MarketDataPort,
        broker: &dyn BrokerPort,
        held: &HashMap<String, i64>,
        log: &dyn LogPort,
    ) -> Result<(), HeattraderError> {
        for (code, &qty) in held {
            if qty <= 0 {
                continue;
            }
            let mut should_sell = false;

            if let Ok(bars) = bars_for(data, code, Period::Day, 5) {
                if bars.len() >= 5 && bars[0].close > 0.0 {
                    let recent = bars[bars.len() - 1].close / bars[0].close - 1.0;
                    if recent < ROTATION_RETURN_FLOOR {
                        should_sell = true;
                        log.log(&format!("{}: five-session return {:.2}%", code, recent * 100.0));
                    }
                }
            }

            if !self.in_hot_sector(data, code) {
                should_sell = true;
                log.log(&format!("{}: home sector no longer hot", code));
            }

            if should_sell {
                self.close_position(broker, code, qty, "strategy", log);
            }
        }
        Ok(())
    }

    fn in_hot_sector(&self, data: &dyn MarketDataPort, code: &str) -> bool {
        for entry in &self.hot_sectors {
            let Some(key) = self.params.sectors.key_of(&entry.name) else {
                continue;
            };
            if let Ok(members) = data.sector_members(key) {
                if members.iter().any(|m| m == code) {
                    return true;
                }
            }
        }
        false
    }

    /// Buy selected symbols not yet held, guarded by market permission, the
    /// exposure ceiling and the limit-up band.
    fn enter_positions(
        &mut self,
        data: &dyn MarketDataPort,
        broker: &dyn BrokerPort,
        today: NaiveDate,
        log: &dyn LogPort,
    ) -> Result<(), HeattraderError> {
        if self.selected.is_empty() {
            return Ok(());
        }

        let benchmark = bars_for(data, &self.params.benchmark, Period::Day, 20)?;
        if !risk_gate::buy_permitted(&benchmark) {
            log.log("entries blocked: benchmark under its MA20");
            return Ok(());
        }

        let Some(account) = broker.account() else {
            log.log("entries skipped: no account snapshot");
            return Ok(());
        };
        if account.total_assets <= 0.0 {
            return Ok(());
        }

        let held = broker.holdings()?;
        let allocation = account.available_cash / self.params.portfolio_size as f64;

        for code in self.selected.clone() {
            if held.contains_key(&code) {
                continue;
            }
            if account.holdings_value / account.total_assets >= self.params.max_exposure {
                log.log("entries stopped: exposure ceiling reached");
                break;
            }

            let bars = match bars_for(data, &code, Period::Day, 2) {
                Ok(b) => b,
                Err(e) => {
                    log.log(&format!("{}: no entry price: {}", code, e));
                    continue;
                }
            };
            let Some(last) = bars.last() else { continue };
            let price = last.close;
            if price <= 0.0 {
                continue;
            }

            if self.is_limit_up(data, &code, &bars) {
                log.log(&format!("{}: at or near limit-up, not chasing", code));
                continue;
            }

            let lot = self.params.lot_size;
            let quantity = (allocation / price / lot as f64) as i64 * lot;
            if quantity <= 0 {
                continue;
            }

            let order = OrderIntent {
                code: code.clone(),
                quantity,
                kind: OrderKind::Fix,
                price_hint: price,
                tag: "strategy",
            };
            let outcome = broker.place_order(&order);
            if outcome.accepted {
                self.positions
                    .insert(&code, PositionRecord::new(price, Some(today)));
                log.log(&format!("bought {} x{} at {:.2}", code, quantity, price));
            } else {
                log.log(&format!("buy {} rejected: {}", code, outcome.message));
            }
        }
        Ok(())
    }

    fn is_limit_up(
        &self,
        data: &dyn MarketDataPort,
        code: &str,
        daily_bars: &[crate::domain::ohlcv::Bar],
    ) -> bool {
        if daily_bars.len() < 2 {
            return false;
        }
        let prev = &daily_bars[daily_bars.len() - 2];
        let curr = &daily_bars[daily_bars.len() - 1];
        let Some(change) = curr.change_from(prev) else {
            return false;
        };
        let is_st = data
            .symbol_name(code)
            .is_some_and(|name| name.contains("ST"));
        let threshold = if is_st {
            LIMIT_UP_THRESHOLD_ST
        } else {
            LIMIT_UP_THRESHOLD
        };
        change >= threshold
    }

    /// Work the trading sleeves against short-period momentum.
    fn overlay_trades(
        &mut self,
        data: &dyn MarketDataPort,
        broker: &dyn BrokerPort,
        log: &dyn LogPort,
    ) -> Result<(), HeattraderError> {
        let held = broker.holdings()?;
        for (code, &qty) in &held {
            if qty <= 0 {
                continue;
            }
            let Ok(bars_5m) = bars_for(data, code, Period::Min5, 20) else {
                continue;
            };
            let Some(last) = bars_5m.last() else { continue };
            let price = last.close;

            let closes_15m: Vec<f64> = match bars_for(data, code, Period::Min15, 20) {
                Ok(bars) => bars.iter().map(|b| b.close).collect(),
                Err(_) => Vec::new(),
            };

            let sleeve = self.sleeves.sleeve_mut(code, qty);
            let Some(decision) =
                t_trade::evaluate(code, sleeve, price, &closes_15m, &self.params.t)
            else {
                continue;
            };
            let outcome = broker.place_order(&decision.order);
            if outcome.accepted {
                // sleeve bookkeeping tracks fills, not intents
                decision.commit(sleeve);
                log.log(&format!(
                    "{} {} x{} at {:.2}",
                    decision.order.tag, decision.order.code, decision.order.quantity, price
                ));
            } else {
                log.log(&format!(
                    "{} {} rejected: {}",
                    decision.order.tag, decision.order.code, outcome.message
                ));
            }
        }
        Ok(())
    }

    /// Ratchet the high-water marks and run the exit rules per position.
    fn position_exits(
        &mut self,
        data: &dyn MarketDataPort,
        broker: &dyn BrokerPort,
        today: NaiveDate,
        log: &dyn LogPort,
    ) -> Result<(), HeattraderError> {
        let held = broker.holdings()?;
        for (code, &qty) in &held {
            if qty <= 0 {
                continue;
            }
            let bars = match bars_for(data, code, Period::Day, 1) {
                Ok(b) => b,
                Err(_) => continue,
            };
            let Some(last) = bars.last() else { continue };
            let close = last.close;

            self.positions.observe(code, close);
            let Some(record) = self.positions.get(code) else {
                continue;
            };
            if let Some(reason) =
                record.evaluate_exit(close, today, &self.params.exit, &mut self.rng)
            {
                log.log(&format!("{}: exit {:?} at {:.2}", code, reason, close));
                self.close_position(broker, code, qty, reason.order_tag(), log);
            }
        }
        Ok(())
    }

    /// Shed a fraction of every holding when market risk is raised.
    fn deleverage(&mut self, broker: &dyn BrokerPort, log: &dyn LogPort) {
        let ratio = self.risk_level.deleverage_ratio();
        if ratio <= 0.0 {
            return;
        }
        let held = match broker.holdings() {
            Ok(h) => h,
            Err(e) => {
                log.log(&format!("deleverage skipped: {}", e));
                return;
            }
        };
        for (code, &qty) in &held {
            let reduce = (qty as f64 * ratio) as i64;
            if reduce <= 0 {
                continue;
            }
            let order = OrderIntent {
                code: code.clone(),
                quantity: -reduce,
                kind: OrderKind::Fix,
                price_hint: 0.0,
                tag: "risk_avoidance",
            };
            let outcome = broker.place_order(&order);
            if outcome.accepted {
                log.log(&format!(
                    "risk {:?}: reduced {} by {}",
                    self.risk_level, code, reduce
                ));
            } else {
                log.log(&format!("deleverage {} rejected: {}", code, outcome.message));
            }
        }
    }

    fn close_position(
        &mut self,
        broker: &dyn BrokerPort,
        code: &str,
        qty: i64,
        tag: &'static str,
        log: &dyn LogPort,
    ) {
        let order = OrderIntent {
            code: code.to_string(),
            quantity: -qty,
            kind: OrderKind::CloseAll,
            price_hint: 0.0,
            tag,
        };
        let outcome = broker.place_order(&order);
        if outcome.accepted {
            self.positions.remove(code);
            self.sleeves.remove(code);
            log.log(&format!("closed {} x{} ({})", code, qty, tag));
        } else {
            log.log(&format!("close {} rejected: {}", code, outcome.message));
        }
    }
}
