//! Domain error types.

/// Row-level parse failure. Non-fatal: the offending line is skipped and
/// counted, the import continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("incomplete row: expected at least 12 fields, got {found}")]
    IncompleteRow { found: usize },

    #[error("malformed {field}: {value:?}")]
    MalformedField { field: &'static str, value: String },
}

/// Top-level error type for stockpile.
#[derive(Debug, thiserror::Error)]
pub enum StockpileError {
    #[error("store connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("store query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("store constraint violation: {reason}")]
    ConstraintViolation { reason: String },

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

    #[error("run cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&StockpileError> for std::process::ExitCode {
    fn from(err: &StockpileError) -> Self {
        let code: u8 = match err {
            StockpileError::Io(_) => 1,
            StockpileError::ConfigParse { .. }
            | StockpileError::ConfigMissing { .. }
            | StockpileError::ConfigInvalid { .. } => 2,
            StockpileError::ConnectionFailed { .. }
            | StockpileError::QueryFailed { .. }
            | StockpileError::ConstraintViolation { .. } => 3,
            StockpileError::Cancelled => 4,
        };
        std::process::ExitCode::from(code)
    }
}
