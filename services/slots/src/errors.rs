use rust_decimal::Decimal;
use shared::errors::ServiceError;
use wallet::WalletError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Insufficient {symbol} balance: required {required}, available {available}")]
    InsufficientBalance {
        symbol: String,
        required: Decimal,
        available: Decimal,
    },

    #[error("Invalid bet {stake}: {reason}")]
    InvalidBet { stake: Decimal, reason: String },

    #[error("A spin is already in progress")]
    ConcurrentSpin,

    #[error("Unexpected {event} while {phase}")]
    UnexpectedEvent { phase: String, event: String },

    #[error("Spin {spin_id} could not be settled: {reason}")]
    SettlementFailed { spin_id: String, reason: String },
}

impl SessionError {
    pub fn invalid_bet(stake: Decimal, reason: impl Into<String>) -> Self {
        SessionError::InvalidBet {
            stake,
            reason: reason.into(),
        }
    }

    pub fn to_service_error(&self) -> ServiceError {
        match self {
            SessionError::UnknownAsset(symbol) => ServiceError::unknown_asset(symbol),
            SessionError::InsufficientBalance {
                required, available, ..
            } => ServiceError::insufficient_balance(required, available),
            SessionError::InvalidBet { stake, reason } => {
                ServiceError::invalid_bet(stake, reason.as_str())
            }
            SessionError::ConcurrentSpin => ServiceError::spin_in_progress(),
            SessionError::UnexpectedEvent { phase, event } => {
                ServiceError::unexpected_transition(phase, event)
            }
            SessionError::SettlementFailed { spin_id, reason } => {
                ServiceError::internal(format!("Spin settlement failed: {}", reason))
                    .with_context(format!("spin_id: {}", spin_id))
            }
        }
    }

    /// Validation and not-found failures are shown to the player; the rest are only logged.
    pub fn is_user_facing(&self) -> bool {
        self.to_service_error().category.is_user_facing()
    }
}

impl From<WalletError> for SessionError {
    fn from(error: WalletError) -> Self {
        match error {
            WalletError::UnknownAsset(symbol) => SessionError::UnknownAsset(symbol),
            WalletError::InsufficientBalance {
                symbol,
                required,
                available,
            } => SessionError::InsufficientBalance {
                symbol,
                required,
                available,
            },
            WalletError::NegativeAmount(amount) => {
                SessionError::invalid_bet(amount, "amount must not be negative")
            }
            // An asset without a usable rate cannot be played.
            WalletError::InvalidRate { symbol, .. } => SessionError::UnknownAsset(symbol),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
