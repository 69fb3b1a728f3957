use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WalletError {
    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Insufficient {symbol} balance: required {required}, available {available}")]
    InsufficientBalance {
        symbol: String,
        required: Decimal,
        available: Decimal,
    },

    #[error("Amount must not be negative: {0}")]
    NegativeAmount(Decimal),

    #[error("Invalid rate for {symbol}: {rate}")]
    InvalidRate { symbol: String, rate: Decimal },
}

/// Failures reported by a rate provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateError {
    #[error("Rate provider unavailable: {0}")]
    Unavailable(String),

    #[error("Rate provider timed out after {0} ms")]
    Timeout(u64),

    #[error("Malformed rate data: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, WalletError>;
