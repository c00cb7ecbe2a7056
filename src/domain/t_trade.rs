//! Intraday round-trip overlay on existing holdings.
//!
//! Each held symbol is split once into a base sleeve, which the overlay
//! never touches, and a trading sleeve worked in board lots against
//! short-period momentum. An overbought 15-minute RSI sells one lot, an
//! oversold one buys one lot, and a move beyond the sleeve stop from the
//! last trade price flattens the trading sleeve entirely.
//!
//! Evaluation proposes an order without touching the sleeve; the caller
//! commits the bookkeeping only once the broker accepts, so a rejected
//! order is re-proposed on a later tick against the unchanged holding.

use crate::domain::indicator::rsi;
use crate::ports::broker::{OrderIntent, OrderKind};
use std::collections::HashMap;

/// RSI period applied to the 15-minute closes.
pub const T_RSI_PERIOD: usize = 14;
const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;

/// Tuning knobs for the overlay, sourced from session parameters.
#[derive(Debug, Clone, Copy)]
pub struct TRules {
    /// Shares per overlay trade. Always a whole board lot.
    pub lot: i64,
    /// Move from the last trade price that flattens the sleeve, e.g. 0.015.
    pub sleeve_stop: f64,
}

/// Sleeve state for one held symbol.
#[derive(Debug, Clone)]
pub struct TSleeve {
    /// Untouchable core holding.
    pub base_qty: i64,
    /// Shares available to the overlay. Never negative.
    pub t_qty: i64,
    /// Price of the sleeve's last trade; 0.0 until first observed.
    pub last_price: f64,
}

impl TSleeve {
    /// Split a holding evenly; the base sleeve takes the rounding share.
    pub fn split(total_qty: i64) -> Self {
        let t_qty = total_qty / 2;
        Self {
            base_qty: total_qty - t_qty,
            t_qty,
            last_price: 0.0,
        }
    }
}

/// A proposed overlay order plus the sleeve bookkeeping that becomes true
/// once the broker fills it.
#[derive(Debug, Clone)]
pub struct TDecision {
    pub order: OrderIntent,
    new_t_qty: i64,
    new_last_price: f64,
}

impl TDecision {
    /// Record a filled order against the sleeve. Never call this for a
    /// rejected order; the sleeve must keep matching live holdings.
    pub fn commit(&self, sleeve: &mut TSleeve) {
        sleeve.t_qty = self.new_t_qty;
        sleeve.last_price = self.new_last_price;
    }
}

/// Evaluate the overlay for one symbol.
///
/// `price` is the latest 5-minute close; `closes_15m` the 15-minute close
/// history. At most one order is proposed per tick: a lot trade on an RSI
/// extreme (which resets the stop reference, so the stop cannot also fire),
/// otherwise a sleeve flatten when the move from the last trade price
/// exceeds the stop. The sleeve itself is not modified beyond first-sight
/// initialization of the reference price.
pub fn evaluate(
    code: &str,
    sleeve: &mut TSleeve,
    price: f64,
    closes_15m: &[f64],
    rules: &TRules,
) -> Option<TDecision> {
    if price <= 0.0 {
        return None;
    }
    if sleeve.last_price == 0.0 {
        sleeve.last_price = price;
    }

    if let Some(r) = rsi(closes_15m, T_RSI_PERIOD) {
        if r > RSI_OVERBOUGHT && sleeve.t_qty >= rules.lot {
            return Some(TDecision {
                order: OrderIntent {
                    code: code.to_string(),
                    quantity: -rules.lot,
                    kind: OrderKind::Fix,
                    price_hint: price,
                    tag: "t_trade",
                },
                new_t_qty: sleeve.t_qty - rules.lot,
                new_last_price: price,
            });
        }
        if r < RSI_OVERSOLD {
            return Some(TDecision {
                order: OrderIntent {
                    code: code.to_string(),
                    quantity: rules.lot,
                    kind: OrderKind::Fix,
                    price_hint: price,
                    tag: "t_trade",
                },
                new_t_qty: sleeve.t_qty + rules.lot,
                new_last_price: price,
            });
        }
    }

    let change = price / sleeve.last_price - 1.0;
    if change.abs() > rules.sleeve_stop && sleeve.t_qty > 0 {
        return Some(TDecision {
            order: OrderIntent {
                code: code.to_string(),
                quantity: -sleeve.t_qty,
                kind: OrderKind::CloseAll,
                price_hint: 0.0,
                tag: if change < 0.0 {
                    "t_stop_loss"
                } else {
                    "t_take_profit"
                },
            },
            new_t_qty: 0,
            new_last_price: sleeve.last_price,
        });
    }

    None
}

/// Sleeve records across ticks, keyed by symbol code.
#[derive(Debug, Default)]
pub struct TBook {
    sleeves: HashMap<String, TSleeve>,
}

impl TBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeve for a holding, splitting it on first sight.
    pub fn sleeve_mut(&mut self, code: &str, total_qty: i64) -> &mut TSleeve {
        self.sleeves
            .entry(code.to_string())
            .or_insert_with(|| TSleeve::split(total_qty))
    }

    pub fn get(&self, code: &str) -> Option<&TSleeve> {
        self.sleeves.get(code)
    }

    pub fn remove(&mut self, code: &str) {
        self.sleeves.remove(code);
    }

    /// Drop sleeves for symbols no longer held.
    pub fn retain_held(&mut self, held: &HashMap<String, i64>) {
        self.sleeves
            .retain(|code, _| held.get(code).copied().unwrap_or(0) > 0);
    }
}
