//! Concrete adapter implementations for ports.

pub mod csv_data;
pub mod file_config;
pub mod paper_broker;
pub mod stderr_log;
