/// Shared error types for the slot session and wallet crates
///
/// Design:
/// - Standardized error codes for consistent handling at the session boundary
/// - Categorized by error domain (Validation, NotFound, Conflict, Internal)
/// - The category decides log level and whether a notification is shown
///
/// Usage:
/// - Crate-level `thiserror` enums convert into ServiceError at the boundary
/// - Error codes follow pattern: <CATEGORY>_<SPECIFIC>_<DETAIL>
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error categories that map to logging severity and user visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// The request itself was invalid (bad stake, not enough funds)
    Validation,

    /// A referenced asset or rate does not exist
    NotFound,

    /// The request collided with work already in progress
    Conflict,

    /// Programming errors and broken invariants
    Internal,
}

impl ErrorCategory {
    /// Map error category to log level
    pub fn log_level(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "info",
            ErrorCategory::NotFound => "warn",
            ErrorCategory::Conflict => "debug",
            ErrorCategory::Internal => "error",
        }
    }

    /// Whether errors of this category are surfaced to the player as a toast
    pub fn is_user_facing(&self) -> bool {
        match self {
            ErrorCategory::Validation | ErrorCategory::NotFound => true,
            ErrorCategory::Conflict | ErrorCategory::Internal => false,
        }
    }
}

/// Standard error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    // Validation errors
    pub const VALIDATION_INVALID_BET: ErrorCode = ErrorCode("VALIDATION_INVALID_BET");
    pub const VALIDATION_INSUFFICIENT_BALANCE: ErrorCode =
        ErrorCode("VALIDATION_INSUFFICIENT_BALANCE");
    pub const VALIDATION_NEGATIVE_AMOUNT: ErrorCode = ErrorCode("VALIDATION_NEGATIVE_AMOUNT");

    // Resource errors
    pub const NOT_FOUND_ASSET: ErrorCode = ErrorCode("NOT_FOUND_ASSET");

    // Conflict errors
    pub const CONFLICT_SPIN_IN_PROGRESS: ErrorCode = ErrorCode("CONFLICT_SPIN_IN_PROGRESS");

    // Internal errors
    pub const INTERNAL_UNEXPECTED: ErrorCode = ErrorCode("INTERNAL_UNEXPECTED");
    pub const INTERNAL_INVALID_RATE: ErrorCode = ErrorCode("INTERNAL_INVALID_RATE");
    pub const INTERNAL_STATE_TRANSITION: ErrorCode = ErrorCode("INTERNAL_STATE_TRANSITION");

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Standardized error structure
///
/// Provides:
/// - Structured error codes for programmatic handling
/// - Human-readable messages (used verbatim as notification text)
/// - Optional context for debugging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceError {
    /// Error category (determines log level and visibility)
    pub category: ErrorCategory,

    /// Structured error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context (amounts, symbols)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ServiceError {
    pub fn new(category: ErrorCategory, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            category,
            code: code.as_str().to_string(),
            message: message.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    // Validation error constructors
    pub fn invalid_bet(stake: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCategory::Validation,
            ErrorCode::VALIDATION_INVALID_BET,
            format!("Invalid bet: {}", stake),
        )
        .with_context(reason)
    }

    pub fn insufficient_balance(required: impl fmt::Display, available: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Validation,
            ErrorCode::VALIDATION_INSUFFICIENT_BALANCE,
            "Insufficient balance",
        )
        .with_context(format!("required: {}, available: {}", required, available))
    }

    pub fn negative_amount(amount: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Validation,
            ErrorCode::VALIDATION_NEGATIVE_AMOUNT,
            format!("Amount must not be negative: {}", amount),
        )
    }

    // Resource not found constructors
    pub fn unknown_asset(symbol: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::NotFound,
            ErrorCode::NOT_FOUND_ASSET,
            format!("Unknown asset: {}", symbol),
        )
    }

    // Conflict constructors
    pub fn spin_in_progress() -> Self {
        Self::new(
            ErrorCategory::Conflict,
            ErrorCode::CONFLICT_SPIN_IN_PROGRESS,
            "A spin is already in progress",
        )
    }

    // Internal error constructors
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Internal, ErrorCode::INTERNAL_UNEXPECTED, message)
    }

    pub fn invalid_rate(symbol: impl fmt::Display, rate: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Internal,
            ErrorCode::INTERNAL_INVALID_RATE,
            format!("Rate must be positive for {}", symbol),
        )
        .with_context(format!("rate: {}", rate))
    }

    pub fn unexpected_transition(phase: impl fmt::Display, event: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Internal,
            ErrorCode::INTERNAL_STATE_TRANSITION,
            "Unexpected spin state transition",
        )
        .with_context(format!("phase: {}, event: {}", phase, event))
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "[{}] {}: {}", self.code, self.message, context)
        } else {
            write!(f, "[{}] {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ServiceError {}

// Convenience type alias
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_visibility() {
        assert!(ErrorCategory::Validation.is_user_facing());
        assert!(ErrorCategory::NotFound.is_user_facing());
        assert!(!ErrorCategory::Conflict.is_user_facing());
        assert!(!ErrorCategory::Internal.is_user_facing());
    }

    #[test]
    fn test_error_category_log_levels() {
        assert_eq!(ErrorCategory::Conflict.log_level(), "debug");
        assert_eq!(ErrorCategory::Internal.log_level(), "error");
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(
            ErrorCode::VALIDATION_INVALID_BET.to_string(),
            "VALIDATION_INVALID_BET"
        );
    }

    #[test]
    fn test_service_error_creation() {
        let error = ServiceError::unknown_asset("DOGE");
        assert_eq!(error.category, ErrorCategory::NotFound);
        assert_eq!(error.code, "NOT_FOUND_ASSET");
        assert!(error.message.contains("DOGE"));
    }

    #[test]
    fn test_service_error_with_context() {
        let error = ServiceError::insufficient_balance("1.5", "0.25");
        assert!(error.context.is_some());
        assert!(error.to_string().contains("available: 0.25"));
    }

    #[test]
    fn test_error_serialization() {
        let error = ServiceError::spin_in_progress();
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("CONFLICT_SPIN_IN_PROGRESS"));
        assert!(json.contains("CONFLICT"));
        assert!(!json.contains("context"));
    }
}
