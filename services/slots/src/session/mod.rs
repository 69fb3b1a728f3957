pub mod autoplay;
pub mod controller;
pub mod machine;

pub use autoplay::{AutoPlayHandle, AutoPlayStop};
pub use controller::SessionController;
pub use machine::{Phase, SpinEffect, SpinEvent, SpinMachine, StakeLimits};
