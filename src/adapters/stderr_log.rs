//! Timestamped stderr logging adapter.

use crate::ports::log::LogPort;
use chrono::Local;

pub struct StderrLog;

impl LogPort for StderrLog {
    fn log(&self, message: &str) {
        eprintln!("[{}] {}", Local::now().format("%Y-%m-%d %H:%M:%S"), message);
    }
}
