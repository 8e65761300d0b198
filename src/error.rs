use crate::schema::StatementKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RatioEngineError {
    #[error("Insufficient data: the income statement has no usable periods after alignment")]
    InsufficientData,

    #[error("Malformed table: row '{label}' has {found} values but the period axis has {expected}")]
    MalformedTable {
        label: String,
        expected: usize,
        found: usize,
    },

    #[error("Balance sheet identity violation in {period}: Assets ({assets}) != Liabilities ({liabilities}) + Equity ({equity})")]
    BalanceIdentityViolation {
        period: String,
        assets: f64,
        liabilities: f64,
        equity: f64,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid analysis request: {0}")]
    InvalidRequest(String),

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Provider failed to fetch {kind:?} statement for {ticker}: {message}")]
    Provider {
        ticker: String,
        kind: StatementKind,
        message: String,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RatioEngineError>;
