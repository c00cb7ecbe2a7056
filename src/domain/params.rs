//! Session parameters loaded from configuration.

use crate::domain::error::HeattraderError;
use crate::domain::position::ExitRules;
use crate::domain::sector::SectorTable;
use crate::domain::t_trade::TRules;
use crate::ports::config::ConfigPort;

/// All tunables for one trading session, validated once at startup.
#[derive(Debug, Clone)]
pub struct SessionParams {
    /// Maximum simultaneous holdings.
    pub portfolio_size: usize,
    /// Ticks between full reselection runs.
    pub reselect_interval: u64,
    /// Benchmark index code for the market risk gate.
    pub benchmark: String,
    /// Ceiling on holdings value as a share of total assets.
    pub max_exposure: f64,
    /// Shares per board lot for order sizing.
    pub lot_size: i64,
    pub exit: ExitRules,
    pub t: TRules,
    pub sectors: SectorTable,
}

impl SessionParams {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, HeattraderError> {
        let params = Self {
            portfolio_size: config.get_i64("strategy", "portfolio_size", 5) as usize,
            reselect_interval: config.get_i64("strategy", "reselect_interval", 10) as u64,
            benchmark: config
                .get_str("strategy", "benchmark")
                .unwrap_or_else(|| "000300.SH".to_string()),
            max_exposure: config.get_f64("strategy", "max_exposure", 0.8),
            lot_size: config.get_i64("strategy", "lot_size", 100),
            exit: ExitRules {
                take_profit: config.get_f64("risk", "take_profit", 0.05),
                drawdown: config.get_f64("risk", "drawdown", 0.02),
                stop_loss: config.get_f64("risk", "stop_loss", 0.03),
            },
            t: TRules {
                lot: config.get_i64("t_trade", "lot", 100),
                sleeve_stop: config.get_f64("t_trade", "sleeve_stop", 0.015),
            },
            sectors: SectorTable::new(config.section_pairs("sectors")),
        };
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> Result<(), HeattraderError> {
        fn invalid(section: &str, key: &str, reason: &str) -> HeattraderError {
            HeattraderError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: reason.to_string(),
            }
        }

        if self.portfolio_size == 0 {
            return Err(invalid("strategy", "portfolio_size", "must be at least 1"));
        }
        if self.reselect_interval == 0 {
            return Err(invalid("strategy", "reselect_interval", "must be at least 1"));
        }
        if self.benchmark.is_empty() {
            return Err(invalid("strategy", "benchmark", "must name an index code"));
        }
        if !(0.0..=1.0).contains(&self.max_exposure) {
            return Err(invalid("strategy", "max_exposure", "must be within [0, 1]"));
        }
        if self.lot_size <= 0 {
            return Err(invalid("strategy", "lot_size", "must be positive"));
        }
        for (section, key, value) in [
            ("risk", "take_profit", self.exit.take_profit),
            ("risk", "drawdown", self.exit.drawdown),
            ("risk", "stop_loss", self.exit.stop_loss),
            ("t_trade", "sleeve_stop", self.t.sleeve_stop),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(section, key, "must be a positive fraction"));
            }
        }
        if self.t.lot <= 0 {
            return Err(invalid("t_trade", "lot", "must be positive"));
        }
        if self.sectors.is_empty() {
            return Err(invalid(
                "sectors",
                "*",
                "at least one sector must be configured",
            ));
        }
        Ok(())
    }
}
