/// Type-safe wrappers for domain primitives
///
/// These types enforce validation at construction time and keep amount
/// precision rules in one place.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::constants::*;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Asset symbol length out of range: {length} chars (min {min}, max {max})")]
    SymbolLength { length: usize, min: usize, max: usize },

    #[error("Invalid asset symbol: {0}")]
    InvalidSymbol(String),
}

const MIN_SYMBOL_LENGTH: usize = 2;
const MAX_SYMBOL_LENGTH: usize = 10;

/// Ticker-style asset identifier (`ETH`, `USDT`, ...).
///
/// Always upper-case ASCII alphanumerics, so lookups are exact string matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetSymbol(String);

impl AssetSymbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }

}

impl TryFrom<String> for AssetSymbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();

        if normalized.len() < MIN_SYMBOL_LENGTH || normalized.len() > MAX_SYMBOL_LENGTH {
            return Err(ValidationError::SymbolLength {
                length: normalized.len(),
                min: MIN_SYMBOL_LENGTH,
                max: MAX_SYMBOL_LENGTH,
            });
        }

        if !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::InvalidSymbol(value));
        }

        Ok(Self(normalized))
    }
}

impl TryFrom<&str> for AssetSymbol {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}

impl From<AssetSymbol> for String {
    fn from(symbol: AssetSymbol) -> Self {
        symbol.0
    }
}

impl PartialEq<str> for AssetSymbol {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl std::fmt::Display for AssetSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier attached to each resolved spin (and plinko drop) for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpinId(Uuid);

impl SpinId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SpinId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SpinId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Direction of a rate conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionDirection {
    /// asset units -> fiat (amount × rate)
    ToFiat,
    /// fiat -> asset units (amount ÷ rate)
    ToAsset,
}

/// Round to asset precision (8 dp, half away from zero).
pub fn to_asset_precision(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(ASSET_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to fiat precision (2 dp, half away from zero).
pub fn to_fiat_precision(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(FIAT_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

/// True when `amount` carries no more fractional digits than asset precision allows.
pub fn fits_asset_precision(amount: Decimal) -> bool {
    amount.normalize().scale() <= ASSET_DECIMALS
}
