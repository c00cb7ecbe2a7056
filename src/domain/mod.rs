//! Core strategy logic, free of I/O.

pub mod error;
pub mod indicator;
pub mod ohlcv;
pub mod params;
pub mod position;
pub mod risk_gate;
pub mod sector;
pub mod selector;
pub mod session;
pub mod t_trade;
