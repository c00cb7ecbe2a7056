//! Port traits for external collaborators.

pub mod broker;
pub mod config;
pub mod log;
pub mod market_data;
