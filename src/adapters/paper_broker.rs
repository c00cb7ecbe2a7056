//! In-process paper broker.
//!
//! Fills every order instantly at the hinted price, tracks cash and
//! holdings, and remembers entry price and date per position. Close-all
//! orders fall back to the position's last known price when no hint is
//! given.

use crate::domain::error::HeattraderError;
use crate::ports::broker::{
    AccountSummary, BrokerPort, OrderIntent, OrderOutcome, PositionDetail,
};
use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashMap;

struct Holding {
    quantity: i64,
    open_price: f64,
    open_date: Option<NaiveDate>,
    last_price: f64,
}

pub struct PaperBroker {
    cash: RefCell<f64>,
    holdings: RefCell<HashMap<String, Holding>>,
    today: RefCell<Option<NaiveDate>>,
    fills: RefCell<Vec<OrderIntent>>,
}

impl PaperBroker {
    pub fn new(starting_cash: f64) -> Self {
        Self {
            cash: RefCell::new(starting_cash),
            holdings: RefCell::new(HashMap::new()),
            today: RefCell::new(None),
            fills: RefCell::new(Vec::new()),
        }
    }

    /// Date stamped onto new positions.
    pub fn set_today(&self, date: NaiveDate) {
        *self.today.borrow_mut() = Some(date);
    }

    pub fn cash(&self) -> f64 {
        *self.cash.borrow()
    }

    pub fn fill_count(&self) -> usize {
        self.fills.borrow().len()
    }

    fn holdings_value(&self) -> f64 {
        self.holdings
            .borrow()
            .values()
            .map(|h| h.quantity as f64 * h.last_price)
            .sum()
    }

    fn reject(reason: &str) -> OrderOutcome {
        OrderOutcome {
            accepted: false,
            message: reason.to_string(),
        }
    }
}

impl BrokerPort for PaperBroker {
    fn holdings(&self) -> Result<HashMap<String, i64>, HeattraderError> {
        Ok(self
            .holdings
            .borrow()
            .iter()
            .map(|(code, h)| (code.clone(), h.quantity))
            .collect())
    }

    fn position_detail(&self, code: &str) -> Option<PositionDetail> {
        self.holdings.borrow().get(code).map(|h| PositionDetail {
            open_price: h.open_price,
            open_date: h.open_date,
        })
    }

    fn account(&self) -> Option<AccountSummary> {
        let holdings_value = self.holdings_value();
        let cash = *self.cash.borrow();
        Some(AccountSummary {
            total_assets: cash + holdings_value,
            available_cash: cash,
            holdings_value,
        })
    }

    fn place_order(&self, order: &OrderIntent) -> OrderOutcome {
        if order.quantity == 0 {
            return Self::reject("zero quantity");
        }

        let mut holdings = self.holdings.borrow_mut();
        let mut cash = self.cash.borrow_mut();

        if order.quantity > 0 {
            if order.price_hint <= 0.0 {
                return Self::reject("buy requires a price");
            }
            let cost = order.quantity as f64 * order.price_hint;
            if cost > *cash {
                return Self::reject("insufficient cash");
            }
            *cash -= cost;
            let entry = holdings.entry(order.code.clone()).or_insert(Holding {
                quantity: 0,
                open_price: order.price_hint,
                open_date: *self.today.borrow(),
                last_price: order.price_hint,
            });
            entry.quantity += order.quantity;
            entry.last_price = order.price_hint;
        } else {
            let sell_qty = -order.quantity;
            let Some(holding) = holdings.get_mut(&order.code) else {
                return Self::reject("no position to sell");
            };
            if sell_qty > holding.quantity {
                return Self::reject("sell exceeds position");
            }
            let price = if order.price_hint > 0.0 {
                order.price_hint
            } else {
                holding.last_price
            };
            *cash += sell_qty as f64 * price;
            holding.quantity -= sell_qty;
            holding.last_price = price;
            if holding.quantity == 0 {
                holdings.remove(&order.code);
            }
        }

        self.fills.borrow_mut().push(order.clone());
        OrderOutcome {
            accepted: true,
            message: "filled".to_string(),
        }
    }
}
