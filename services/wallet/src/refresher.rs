//! Background exchange-rate refresher
//!
//! Periodically pulls rates from a provider and merges them into the shared
//! table. A failed refresh never clears the table; the previous rates stay in
//! force until a fetch succeeds.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use shared::{MAX_RATE_FETCH_RETRIES, RATE_BREAKER_FAILURE_THRESHOLD, RATE_BREAKER_RESET_SECS};

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerError};
use crate::errors::RateError;
use crate::rates::{RateProvider, RateTable};
use crate::retry_strategy::RetryStrategy;

pub type RefreshError = CircuitBreakerError<RateError>;

pub struct RateRefresher {
    provider: Arc<dyn RateProvider>,
    table: RateTable,
    circuit_breaker: CircuitBreaker,
    retry_strategy: RetryStrategy,
    interval: Duration,
}

impl RateRefresher {
    pub fn new(provider: Arc<dyn RateProvider>, table: RateTable, interval: Duration) -> Self {
        Self {
            provider,
            table,
            circuit_breaker: CircuitBreaker::new(
                RATE_BREAKER_FAILURE_THRESHOLD,
                Duration::from_secs(RATE_BREAKER_RESET_SECS),
            ),
            retry_strategy: RetryStrategy::new(MAX_RATE_FETCH_RETRIES),
            interval,
        }
    }

    pub fn with_retry_strategy(mut self, retry_strategy: RetryStrategy) -> Self {
        self.retry_strategy = retry_strategy;
        self
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: CircuitBreaker) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    /// Fetch once (with retries) and merge into the table.
    ///
    /// Returns the number of rates that were taken from the provider.
    pub async fn refresh_once(&self) -> Result<usize, RefreshError> {
        let fetched = self
            .circuit_breaker
            .call(|| self.fetch_with_retry())
            .await?;

        let applied = self.table.apply(&fetched).await;
        info!(applied, fetched = fetched.len(), "Exchange rates updated");
        Ok(applied)
    }

    async fn fetch_with_retry(&self) -> Result<HashMap<String, Decimal>, RateError> {
        let provider = &self.provider;
        let strategy = &self.retry_strategy;
        let attempts = AtomicU32::new(0);
        let attempts = &attempts;

        backoff::future::retry(strategy.create_backoff(), || async move {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            match provider.fetch_rates().await {
                Ok(rates) => Ok(rates),
                Err(e) if strategy.is_retryable_error(&e) && strategy.should_retry(attempt) => {
                    debug!(attempt, error = %e, "Rate fetch failed, retrying");
                    Err(backoff::Error::transient(e))
                }
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        })
        .await
    }

    /// Refresh on every tick until `cancel` fires. The first tick is immediate.
    pub async fn run(self, cancel: CancellationToken) {
        info!(interval_seconds = self.interval.as_secs(), "Rate refresher starting");

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.refresh_once().await {
                Ok(_) => {}
                Err(CircuitBreakerError::Open) => {
                    warn!("Rate circuit breaker is open, keeping previous rates");
                    metrics::counter!("wallet_rate_refresh_skipped_total").increment(1);
                }
                Err(CircuitBreakerError::OperationFailed(e)) => {
                    warn!(error = %e, "Rate refresh failed, keeping previous rates");
                    metrics::counter!("wallet_rate_refresh_failures_total").increment(1);
                }
            }
        }

        info!("Rate refresher stopped");
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}
