/// Shared constants for the slot session and wallet crates
///
/// This module centralizes the fixed tables and tuning defaults so the engine,
/// the ledger and the driver binary never disagree about them.

/// Fractional digits kept for balances denominated in asset units.
pub const ASSET_DECIMALS: u32 = 8;

/// Fractional digits used when an amount is expressed in fiat (USD).
pub const FIAT_DECIMALS: u32 = 2;

/// Number of reels in a spin.
pub const REEL_COUNT: usize = 3;

/// Size of the reel symbol set (indices 0..SYMBOL_COUNT).
pub const SYMBOL_COUNT: u8 = 6;

/// The premium symbol. Three of them is the jackpot.
pub const PREMIUM_SYMBOL: u8 = 0;

/// The bonus symbol. Three of them starts (or extends) a bonus round.
pub const BONUS_SYMBOL: u8 = 5;

/// Free spins granted by a bonus trigger, and added again by each re-trigger.
pub const BONUS_FREE_SPINS: u32 = 10;

/// Upper bound on rejection-sampling attempts for a single draw.
///
/// With a win probability near one half this is never reached by a fair source.
pub const MAX_REJECTION_ATTEMPTS: usize = 1_000;

/// Default max bet, in whole USD, converted to asset units per play.
pub const DEFAULT_MAX_BET_FIAT: u64 = 10;

/// Default delay between a debit and the outcome being resolved.
pub const DEFAULT_SPIN_DELAY_MS: u64 = 2_000;

/// Default auto-play cadence.
pub const DEFAULT_AUTOPLAY_INTERVAL_MS: u64 = 3_000;

/// Default interval between exchange-rate refreshes (5 minutes).
pub const DEFAULT_RATE_REFRESH_SECS: u64 = 300;

/// Delay before the introductory tip lands.
pub const DEFAULT_TIP_DELAY_MS: u64 = 2_000;

/// Introductory tip range in whole USD, `[min, max)`.
pub const TIP_MIN_FIAT: u64 = 20;
pub const TIP_MAX_FIAT: u64 = 100;

/// Assets eligible for the introductory tip.
pub const TIP_ELIGIBLE_ASSETS: [&str; 3] = ["TRX", "XRP", "LTC"];

/// Asset selected when a session starts.
pub const DEFAULT_ASSET: &str = "ETH";

/// Starting asset set: (symbol, display name). Order is preserved for display.
pub const STARTING_ASSETS: [(&str, &str); 7] = [
    ("ETH", "Ethereum"),
    ("BTC", "Bitcoin"),
    ("USDT", "Tether"),
    ("USDC", "USD Coin"),
    ("XRP", "Ripple"),
    ("LTC", "Litecoin"),
    ("TRX", "TRON"),
];

/// Consecutive provider failures before the rate circuit breaker opens.
pub const RATE_BREAKER_FAILURE_THRESHOLD: u64 = 5;

/// Seconds an open rate circuit breaker waits before a half-open probe.
pub const RATE_BREAKER_RESET_SECS: u64 = 60;

/// Maximum attempts for a single rate refresh before giving up until the next tick.
pub const MAX_RATE_FETCH_RETRIES: u32 = 3;
