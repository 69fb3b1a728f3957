use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    DEFAULT_ASSET, DEFAULT_AUTOPLAY_INTERVAL_MS, DEFAULT_MAX_BET_FIAT, DEFAULT_RATE_REFRESH_SECS,
    DEFAULT_SPIN_DELAY_MS, DEFAULT_TIP_DELAY_MS,
};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub session: SessionConfig,
    pub autoplay: AutoPlayConfig,
    pub rates: RatesConfig,
    pub metrics_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Max bet in USD, converted to asset units per play.
    pub max_bet_fiat: Decimal,
    pub spin_delay_ms: u64,
    pub default_asset: String,
    pub turbo: bool,
    pub tip_enabled: bool,
    pub tip_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutoPlayConfig {
    pub interval_ms: u64,
    pub max_spins: Option<u32>,
    /// Stake per auto-play spin in USD.
    pub stake_fiat: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RatesConfig {
    pub refresh_seconds: u64,
}

impl SessionConfig {
    pub fn spin_delay(&self) -> Duration {
        Duration::from_millis(self.spin_delay_ms)
    }

    pub fn tip_delay(&self) -> Duration {
        Duration::from_millis(self.tip_delay_ms)
    }
}

impl AutoPlayConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            session: SessionConfig {
                max_bet_fiat: env::var("MAX_BET_FIAT")
                    .unwrap_or_else(|_| DEFAULT_MAX_BET_FIAT.to_string())
                    .parse()?,
                spin_delay_ms: env::var("SPIN_DELAY_MS")
                    .unwrap_or_else(|_| DEFAULT_SPIN_DELAY_MS.to_string())
                    .parse()?,
                default_asset: env::var("DEFAULT_ASSET")
                    .unwrap_or_else(|_| DEFAULT_ASSET.to_string()),
                turbo: env::var("TURBO")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()?,
                tip_enabled: env::var("TIP_ENABLED")
                    .unwrap_or_else(|_| "true".to_string())
                    .parse()?,
                tip_delay_ms: env::var("TIP_DELAY_MS")
                    .unwrap_or_else(|_| DEFAULT_TIP_DELAY_MS.to_string())
                    .parse()?,
            },
            autoplay: AutoPlayConfig {
                interval_ms: env::var("AUTOPLAY_INTERVAL_MS")
                    .unwrap_or_else(|_| DEFAULT_AUTOPLAY_INTERVAL_MS.to_string())
                    .parse()?,
                max_spins: env::var("AUTOPLAY_MAX_SPINS")
                    .ok()
                    .map(|value| value.parse())
                    .transpose()?,
                stake_fiat: env::var("AUTOPLAY_STAKE_FIAT")
                    .unwrap_or_else(|_| "1.00".to_string())
                    .parse()?,
            },
            rates: RatesConfig {
                refresh_seconds: env::var("RATE_REFRESH_SECONDS")
                    .unwrap_or_else(|_| DEFAULT_RATE_REFRESH_SECS.to_string())
                    .parse()?,
            },
            metrics_port: env::var("METRICS_PORT")
                .unwrap_or_else(|_| "9090".to_string())
                .parse()?,
        })
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_bet_fiat: Decimal::from(DEFAULT_MAX_BET_FIAT),
            spin_delay_ms: DEFAULT_SPIN_DELAY_MS,
            default_asset: DEFAULT_ASSET.to_string(),
            turbo: false,
            tip_enabled: true,
            tip_delay_ms: DEFAULT_TIP_DELAY_MS,
        }
    }
}

impl Default for AutoPlayConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_AUTOPLAY_INTERVAL_MS,
            max_spins: None,
            stake_fiat: Decimal::ONE,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            autoplay: AutoPlayConfig::default(),
            rates: RatesConfig {
                refresh_seconds: DEFAULT_RATE_REFRESH_SECS,
            },
            metrics_port: 9090,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.session.max_bet_fiat, Decimal::from(10));
        assert_eq!(config.session.spin_delay(), Duration::from_secs(2));
        assert_eq!(config.session.default_asset, "ETH");
        assert!(!config.session.turbo);
        assert!(config.session.tip_enabled);
        assert_eq!(config.autoplay.interval(), Duration::from_secs(3));
        assert_eq!(config.autoplay.max_spins, None);
        assert_eq!(config.rates.refresh_seconds, 300);
        assert_eq!(config.metrics_port, 9090);
    }
}
