pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod notifications;
pub mod plinko;
pub mod session;

pub use config::Config;
pub use domain::{BonusState, ReelOutcome, SpinMode, SpinRequest, SpinResult, WinRule};
pub use errors::SessionError;
pub use notifications::{Notification, NotificationKind};
pub use plinko::PlinkoResult;
pub use session::{AutoPlayHandle, AutoPlayStop, SessionController};
