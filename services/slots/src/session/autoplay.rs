//! Auto-play: repeated spins on a fixed cadence until cancelled, capped, or
//! refused.

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::controller::SessionController;
use crate::errors::SessionError;

/// Why an auto-play run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum AutoPlayStop {
    Cancelled,
    /// A play was refused; the refusal was already announced by the session.
    Rejected(SessionError),
    /// The configured spin cap was reached.
    Completed { spins: u32 },
}

pub struct AutoPlayHandle {
    cancel: CancellationToken,
    task: JoinHandle<AutoPlayStop>,
}

impl AutoPlayHandle {
    /// Ask the run to stop. A spin already in flight still settles.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Token that stops the run when cancelled, for wiring to shutdown signals.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the run to end.
    pub async fn join(self) -> AutoPlayStop {
        match self.task.await {
            Ok(stop) => stop,
            Err(e) => {
                error!(error = %e, "Auto-play task failed");
                AutoPlayStop::Cancelled
            }
        }
    }
}

pub(crate) fn spawn(
    session: Arc<SessionController>,
    stake: Decimal,
    interval: Duration,
    max_spins: Option<u32>,
) -> AutoPlayHandle {
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run(session, stake, interval, max_spins, cancel.clone()));
    AutoPlayHandle { cancel, task }
}

async fn run(
    session: Arc<SessionController>,
    stake: Decimal,
    interval: Duration,
    max_spins: Option<u32>,
    cancel: CancellationToken,
) -> AutoPlayStop {
    info!(stake = %stake, interval_ms = interval.as_millis() as u64, ?max_spins, "Auto-play started");
    metrics::counter!("slots_autoplay_runs_total").increment(1);

    let mut spins: u32 = 0;
    let stop = loop {
        if max_spins.is_some_and(|max| spins >= max) {
            break AutoPlayStop::Completed { spins };
        }
        if cancel.is_cancelled() {
            break AutoPlayStop::Cancelled;
        }

        let tick_started = Instant::now();

        // A play is never abandoned half way; cancellation is only observed between spins.
        match session.play(stake).await {
            Ok(_) => spins += 1,
            Err(SessionError::ConcurrentSpin) => {
                debug!("Manual spin in flight, skipping auto-play tick");
            }
            Err(e) => break AutoPlayStop::Rejected(e),
        }

        let cadence = session.spin_mode().scale(interval);
        tokio::select! {
            _ = cancel.cancelled() => break AutoPlayStop::Cancelled,
            _ = tokio::time::sleep(cadence.saturating_sub(tick_started.elapsed())) => {}
        }
    };

    info!(spins, stop = ?stop, "Auto-play stopped");
    stop
}
