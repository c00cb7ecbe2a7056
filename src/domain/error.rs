//! Domain error types.

/// Top-level error type for heattrader.
#[derive(Debug, thiserror::Error)]
pub enum HeattraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {code}")]
    NoData { code: String },

    #[error("insufficient data for {code}: have {have} bars, need {need}")]
    InsufficientData {
        code: String,
        have: usize,
        need: usize,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("order rejected for {code}: {reason}")]
    OrderRejected { code: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&HeattraderError> for std::process::ExitCode {
    fn from(err: &HeattraderError) -> Self {
        let code: u8 = match err {
            HeattraderError::Io(_) => 1,
            HeattraderError::ConfigParse { .. }
            | HeattraderError::ConfigMissing { .. }
            | HeattraderError::ConfigInvalid { .. } => 2,
            HeattraderError::DataSource { .. } => 3,
            HeattraderError::OrderRejected { .. } => 4,
            HeattraderError::NoData { .. } | HeattraderError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
