pub mod circuit_breaker;
pub mod errors;
pub mod ledger;
pub mod rates;
pub mod refresher;
pub mod retry_strategy;
pub mod tip;

pub use errors::{RateError, WalletError};
pub use ledger::{AssetBalance, Ledger};
pub use rates::{default_rates, RateProvider, RateSnapshot, RateTable, StaticRateProvider};
pub use refresher::RateRefresher;
pub use tip::{grant_introductory_tip, TipReceipt};
