use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Guards the rate provider: after `failure_threshold` consecutive failures
/// calls are refused until `reset_timeout` has passed, then one probe is let
/// through (half-open).
#[derive(Clone)]
pub struct CircuitBreaker {
    failure_count: Arc<AtomicU64>,
    last_failure_time: Arc<RwLock<Option<Instant>>>,
    state: Arc<RwLock<CircuitState>>,
    failure_threshold: u64,
    reset_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u64, reset_timeout: Duration) -> Self {
        Self {
            failure_count: Arc::new(AtomicU64::new(0)),
            last_failure_time: Arc::new(RwLock::new(None)),
            state: Arc::new(RwLock::new(CircuitState::Closed)),
            failure_threshold,
            reset_timeout,
        }
    }

    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.allow_request().await {
            return Err(CircuitBreakerError::Open);
        }

        match operation().await {
            Ok(result) => {
                self.on_success().await;
                Ok(result)
            }
            Err(error) => {
                self.on_failure().await;
                Err(CircuitBreakerError::OperationFailed(error))
            }
        }
    }

    async fn allow_request(&self) -> bool {
        let mut state = self.state.write().await;
        if *state != CircuitState::Open {
            return true;
        }

        let last_failure = *self.last_failure_time.read().await;
        match last_failure {
            Some(last_time) if last_time.elapsed() >= self.reset_timeout => {
                *state = CircuitState::HalfOpen;
                tracing::info!("Rate circuit breaker transitioning to HalfOpen");
                true
            }
            _ => false,
        }
    }

    async fn on_success(&self) {
        self.failure_count.store(0, Ordering::SeqCst);
        let mut state = self.state.write().await;
        if *state == CircuitState::HalfOpen {
            *state = CircuitState::Closed;
            tracing::info!("Rate circuit breaker closed after successful fetch");
        }
    }

    async fn on_failure(&self) {
        let failures = self.failure_count.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_failure_time.write().await = Some(Instant::now());

        let mut state = self.state.write().await;
        if failures >= self.failure_threshold || *state == CircuitState::HalfOpen {
            if *state != CircuitState::Open {
                tracing::warn!(failures, "Rate circuit breaker opened");
            }
            *state = CircuitState::Open;
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.state.read().await.clone()
    }

    pub async fn is_open(&self) -> bool {
        *self.state.read().await == CircuitState::Open
    }
}

#[derive(Debug)]
pub enum CircuitBreakerError<E> {
    Open,
    OperationFailed(E),
}

impl<E: std::fmt::Display> std::fmt::Display for CircuitBreakerError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitBreakerError::Open => write!(f, "Circuit breaker is open"),
            CircuitBreakerError::OperationFailed(e) => write!(f, "Operation failed: {}", e),
        }
    }
}

impl<E: std::error::Error> std::error::Error for CircuitBreakerError<E> {}
