//! Common fixtures for session integration tests
#![allow(dead_code)]

use rust_decimal::Decimal;
use slots::config::SessionConfig;
use slots::engine::{RandomSource, ScriptedRandom, SeededRandom};
use slots::SessionController;
use std::str::FromStr;
use std::sync::Arc;
use wallet::{Ledger, RateTable};

/// Sample that lands in the "any loss" class, followed by reels [1, 2, 3].
pub const LOSS: [f64; 4] = [0.9, 0.2, 0.4, 0.6];
/// Sample for [0, 0, 0].
pub const JACKPOT: [f64; 1] = [0.005];
/// Sample for [5, 5, 5].
pub const BONUS: [f64; 1] = [0.27];

pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).expect("valid decimal literal")
}

/// Session config with no delays, so tests never sleep.
pub fn instant_config() -> SessionConfig {
    SessionConfig {
        spin_delay_ms: 0,
        tip_delay_ms: 0,
        ..SessionConfig::default()
    }
}

pub struct TestSession {
    pub session: Arc<SessionController>,
    pub rates: RateTable,
}

impl TestSession {
    /// Default rates, `amount` of `symbol` (which is selected), and the given randomness.
    pub fn funded(symbol: &str, amount: &str, random: impl RandomSource + 'static) -> Self {
        Self::with_config(instant_config(), symbol, amount, random)
    }

    pub fn with_config(
        config: SessionConfig,
        symbol: &str,
        amount: &str,
        random: impl RandomSource + 'static,
    ) -> Self {
        let mut ledger = Ledger::with_starting_assets().expect("starting assets");
        ledger.credit(symbol, dec(amount)).expect("credit starting balance");
        ledger.select_asset(symbol).expect("select funded asset");

        let rates = RateTable::with_defaults();
        let session = Arc::new(SessionController::new(
            config,
            rates.clone(),
            ledger,
            Box::new(random),
        ));
        Self { session, rates }
    }

    /// Reels scripted sample by sample, wrapping around.
    pub fn scripted(symbol: &str, amount: &str, samples: Vec<f64>) -> Self {
        Self::funded(symbol, amount, ScriptedRandom::new(samples))
    }

    pub fn seeded(symbol: &str, amount: &str, seed: u64) -> Self {
        Self::funded(symbol, amount, SeededRandom::from_seed(seed))
    }

    pub async fn balance(&self, symbol: &str) -> Decimal {
        self.session.balance(symbol).await.expect("known asset")
    }
}

/// Concatenate scripted samples.
pub fn script(parts: &[&[f64]]) -> Vec<f64> {
    parts.iter().flat_map(|part| part.iter().copied()).collect()
}
