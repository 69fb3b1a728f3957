//! Exchange-rate table
//!
//! Rates are USD per unit of an asset. Readers take an immutable snapshot once
//! per operation; the refresher swaps whole snapshots in behind a lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::errors::{RateError, Result, WalletError};

/// Fallback table used until (and whenever) a provider has nothing better.
pub fn default_rates() -> HashMap<String, Decimal> {
    HashMap::from([
        ("BTC".to_string(), Decimal::from(30_000)),
        ("ETH".to_string(), Decimal::from(2_000)),
        ("LTC".to_string(), Decimal::from(100)),
        ("TRX".to_string(), Decimal::new(7, 2)),
        ("XRP".to_string(), Decimal::new(5, 1)),
        ("USDT".to_string(), Decimal::ONE),
        ("USDC".to_string(), Decimal::ONE),
    ])
}

/// Immutable view of the rate table at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct RateSnapshot {
    rates: HashMap<String, Decimal>,
    updated_at: DateTime<Utc>,
}

impl RateSnapshot {
    /// Build a snapshot, rejecting any non-positive rate.
    pub fn new(rates: HashMap<String, Decimal>) -> Result<Self> {
        if let Some((symbol, rate)) = rates.iter().find(|(_, rate)| **rate <= Decimal::ZERO) {
            return Err(WalletError::InvalidRate {
                symbol: symbol.clone(),
                rate: *rate,
            });
        }

        Ok(Self {
            rates,
            updated_at: Utc::now(),
        })
    }

    pub fn with_defaults() -> Self {
        Self {
            rates: default_rates(),
            updated_at: Utc::now(),
        }
    }

    /// USD price of one unit of `symbol`.
    pub fn rate(&self, symbol: &str) -> Result<Decimal> {
        self.rates
            .get(symbol)
            .copied()
            .ok_or_else(|| WalletError::UnknownAsset(symbol.to_string()))
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Overlay `fetched` on top of this snapshot.
    ///
    /// Symbols that are missing from `fetched`, or that carry a non-positive
    /// rate, keep their current value. Returns the new snapshot and the number
    /// of rates taken from `fetched`.
    pub fn merged_with(&self, fetched: &HashMap<String, Decimal>) -> (Self, usize) {
        let mut rates = self.rates.clone();
        let mut applied = 0;

        for (symbol, rate) in fetched {
            if *rate <= Decimal::ZERO {
                tracing::warn!(symbol = %symbol, rate = %rate, "Ignoring non-positive rate");
                continue;
            }
            rates.insert(symbol.clone(), *rate);
            applied += 1;
        }

        (
            Self {
                rates,
                updated_at: Utc::now(),
            },
            applied,
        )
    }
}

/// Shared, refreshable rate table.
///
/// Cloning is cheap; all clones observe the same current snapshot.
#[derive(Clone)]
pub struct RateTable {
    current: Arc<RwLock<Arc<RateSnapshot>>>,
}

impl RateTable {
    pub fn new(snapshot: RateSnapshot) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(RateSnapshot::with_defaults())
    }

    /// Current snapshot. Callers hold on to it for the whole operation.
    pub async fn snapshot(&self) -> Arc<RateSnapshot> {
        self.current.read().await.clone()
    }

    /// Merge freshly fetched rates into the table.
    pub async fn apply(&self, fetched: &HashMap<String, Decimal>) -> usize {
        let mut current = self.current.write().await;
        let (merged, applied) = current.merged_with(fetched);
        *current = Arc::new(merged);
        applied
    }
}

/// Source of exchange rates (USD per unit), refreshed out-of-band.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_rates(&self) -> std::result::Result<HashMap<String, Decimal>, RateError>;
}

/// Provider that always answers with a fixed table.
pub struct StaticRateProvider {
    rates: HashMap<String, Decimal>,
}

impl StaticRateProvider {
    pub fn new(rates: HashMap<String, Decimal>) -> Self {
        Self { rates }
    }
}

impl Default for StaticRateProvider {
    fn default() -> Self {
        Self::new(default_rates())
    }
}

#[async_trait]
impl RateProvider for StaticRateProvider {
    async fn fetch_rates(&self) -> std::result::Result<HashMap<String, Decimal>, RateError> {
        Ok(self.rates.clone())
    }
}
