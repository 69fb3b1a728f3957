//! Session controller
//!
//! Owns one player's ledger, spin machine and random stream behind a single
//! lock. A play is split in two critical sections around the resolution delay:
//! validate and debit, then draw and settle. While the lock is released the
//! machine sits in `Spinning`, so a second play is refused instead of queued.
//!
//! The delay and the settlement run on a spawned task. Dropping the `play`
//! future only stops waiting for the result; the spin still settles.

use rust_decimal::{Decimal, RoundingStrategy};
use shared::{
    to_asset_precision, AssetSymbol, ConversionDirection, SpinId, ASSET_DECIMALS, FIAT_DECIMALS,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};
use wallet::{AssetBalance, Ledger, RateSnapshot, RateTable, TipReceipt};

use super::autoplay::{self, AutoPlayHandle};
use super::machine::{
    validate_stake, CreditKind, SpinEffect, SpinEvent, SpinMachine, StakeLimits,
};
use crate::config::{AutoPlayConfig, SessionConfig};
use crate::domain::{BonusState, SpinMode, SpinRequest, SpinResult};
use crate::engine::{draw_reels, RandomSource, SeededRandom};
use crate::errors::{Result, SessionError};
use crate::notifications::{Notification, NotificationHub};
use crate::plinko::{drop_ball, slot_multiplier, PlinkoResult};

struct SessionState {
    machine: SpinMachine,
    ledger: Ledger,
    random: Box<dyn RandomSource>,
}

pub struct SessionController {
    state: Arc<Mutex<SessionState>>,
    rates: RateTable,
    config: SessionConfig,
    turbo: AtomicBool,
    notifications: NotificationHub,
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        rates: RateTable,
        ledger: Ledger,
        random: Box<dyn RandomSource>,
    ) -> Self {
        let turbo = AtomicBool::new(config.turbo);
        Self {
            state: Arc::new(Mutex::new(SessionState {
                machine: SpinMachine::new(),
                ledger,
                random,
            })),
            rates,
            config,
            turbo,
            notifications: NotificationHub::default(),
        }
    }

    /// A fresh session over the starting asset set, seeded from OS entropy.
    pub fn with_starting_assets(config: SessionConfig, rates: RateTable) -> Result<Self> {
        let mut ledger = Ledger::with_starting_assets()?;
        ledger.select_asset(&config.default_asset)?;
        Ok(Self::new(
            config,
            rates,
            ledger,
            Box::new(SeededRandom::from_entropy()),
        ))
    }

    /// Play one spin on the selected asset (a free spin while a bonus round is active).
    pub async fn play(&self, stake: Decimal) -> Result<SpinResult> {
        let spin_id = SpinId::new();
        let rates = self.rates.snapshot().await;
        let mode = self.spin_mode();

        {
            let mut state = self.state.lock().await;
            if !state.machine.is_idle() {
                return Err(self.reject(SessionError::ConcurrentSpin));
            }

            let asset = state.ledger.selected_symbol().clone();
            let limits = if state.machine.bonus().is_some() {
                StakeLimits::default()
            } else {
                self.stake_limits(&state.ledger, &asset, &rates)
                    .map_err(|e| self.reject(e))?
            };

            let event = SpinEvent::Play {
                asset,
                request: SpinRequest { stake, mode },
                limits,
            };
            let (spinning, effects) = state.machine.apply(event).map_err(|e| self.reject(e))?;
            execute(&mut state.ledger, &effects).map_err(|e| self.reject(e))?;
            state.machine = spinning;

            debug!(spin_id = %spin_id, stake = %stake, mode = ?mode, "Spin started");
        }

        let settlement = Settlement {
            spin_id,
            state: Arc::clone(&self.state),
            notifications: self.notifications.clone(),
            rates,
            delay: mode.scale(self.config.spin_delay()),
        };
        match tokio::spawn(settlement.run()).await {
            Ok(settled) => settled,
            Err(e) => Err(reject(
                &self.notifications,
                SessionError::SettlementFailed {
                    spin_id: spin_id.to_string(),
                    reason: e.to_string(),
                },
            )),
        }
    }

    /// Drop a plinko ball, staked like a paid spin.
    pub async fn drop_plinko(&self, stake: Decimal) -> Result<PlinkoResult> {
        let rates = self.rates.snapshot().await;
        let mut state = self.state.lock().await;
        if !state.machine.is_idle() {
            return Err(self.reject(SessionError::ConcurrentSpin));
        }

        let asset = state.ledger.selected_symbol().clone();
        let limits = self
            .stake_limits(&state.ledger, &asset, &rates)
            .map_err(|e| self.reject(e))?;
        validate_stake(&asset, stake, &limits).map_err(|e| self.reject(e))?;

        state
            .ledger
            .debit(asset.as_str(), stake)
            .map_err(|e| self.reject(e.into()))?;
        let (path, slot) = drop_ball(&mut *state.random);
        let multiplier = slot_multiplier(slot);
        let payout = to_asset_precision(stake * multiplier);
        let balance_after = state
            .ledger
            .credit(asset.as_str(), payout)
            .map_err(|e| self.reject(e.into()))?;

        let display_fiat = state.ledger.display_fiat();
        drop(state);

        let result = PlinkoResult {
            drop_id: SpinId::new(),
            asset,
            stake,
            path,
            slot,
            multiplier,
            payout,
            balance_after,
        };

        info!(
            drop_id = %result.drop_id,
            asset = %result.asset,
            slot,
            multiplier = %multiplier,
            payout = %payout,
            "Plinko drop settled"
        );
        metrics::counter!("slots_plinko_drops_total").increment(1);

        let message = format!(
            "Plinko landed in slot {} ({}x): {}",
            slot,
            multiplier.normalize(),
            format_amount(display_fiat, &result.asset, payout, &rates)
        );
        self.notifications.emit(if payout >= stake {
            Notification::success(message)
        } else {
            Notification::error(message)
        });

        Ok(result)
    }

    /// Credit the one-off introductory tip after the configured delay.
    ///
    /// Returns `Ok(None)` when tips are disabled or this session already got one.
    pub async fn grant_introductory_tip(&self) -> Result<Option<TipReceipt>> {
        if !self.config.tip_enabled {
            debug!("Introductory tip disabled");
            return Ok(None);
        }
        if self.state.lock().await.ledger.introductory_tip_granted() {
            return Ok(None);
        }

        tokio::time::sleep(self.config.tip_delay()).await;
        let rates = self.rates.snapshot().await;

        let receipt = {
            let mut state = self.state.lock().await;
            let mut rng = rand::thread_rng();
            wallet::grant_introductory_tip(&mut state.ledger, &rates, &mut rng)?
        };

        if let Some(receipt) = &receipt {
            self.notifications.emit(Notification::success(format!(
                "You were tipped ${} in {}",
                receipt.fiat_amount, receipt.symbol
            )));
        }
        Ok(receipt)
    }

    pub fn start_autoplay(self: &Arc<Self>, stake: Decimal, config: &AutoPlayConfig) -> AutoPlayHandle {
        autoplay::spawn(Arc::clone(self), stake, config.interval(), config.max_spins)
    }

    pub async fn balance(&self, symbol: &str) -> Result<Decimal> {
        Ok(self.state.lock().await.ledger.balance(symbol)?)
    }

    pub async fn balances(&self) -> Vec<AssetBalance> {
        self.state.lock().await.ledger.balances().to_vec()
    }

    pub async fn selected_asset(&self) -> AssetSymbol {
        self.state.lock().await.ledger.selected_symbol().clone()
    }

    pub async fn select_asset(&self, symbol: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state
            .ledger
            .select_asset(symbol)
            .map_err(|e| self.reject(e.into()))
    }

    /// Selected balance as shown to the player, in fiat or asset units.
    pub async fn display_balance(&self) -> Result<String> {
        let rates = self.rates.snapshot().await;
        let state = self.state.lock().await;
        let symbol = state.ledger.selected_symbol().clone();
        Ok(state.ledger.display_balance(symbol.as_str(), &rates)?)
    }

    pub async fn set_display_fiat(&self, display_fiat: bool) {
        self.state.lock().await.ledger.set_display_fiat(display_fiat);
    }

    /// Max bet for the selected asset, in its units, at current rates.
    pub async fn max_bet(&self) -> Result<Decimal> {
        let rates = self.rates.snapshot().await;
        let state = self.state.lock().await;
        self.max_bet_for(state.ledger.selected_symbol(), &rates)
    }

    pub fn set_turbo(&self, turbo: bool) {
        self.turbo.store(turbo, Ordering::SeqCst);
        info!(turbo, "Turbo mode changed");
    }

    pub fn spin_mode(&self) -> SpinMode {
        SpinMode::from_turbo(self.turbo.load(Ordering::SeqCst))
    }

    pub async fn bonus(&self) -> Option<BonusState> {
        self.state.lock().await.machine.bonus().cloned()
    }

    pub async fn is_idle(&self) -> bool {
        self.state.lock().await.machine.is_idle()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// Rounded toward zero so the ceiling never exceeds the fiat max bet.
    fn max_bet_for(&self, asset: &AssetSymbol, rates: &RateSnapshot) -> Result<Decimal> {
        let rate = rates.rate(asset.as_str())?;
        Ok((self.config.max_bet_fiat / rate)
            .round_dp_with_strategy(ASSET_DECIMALS, RoundingStrategy::ToZero))
    }

    fn stake_limits(
        &self,
        ledger: &Ledger,
        asset: &AssetSymbol,
        rates: &RateSnapshot,
    ) -> Result<StakeLimits> {
        Ok(StakeLimits {
            balance: ledger.balance(asset.as_str())?,
            max_bet: self.max_bet_for(asset, rates)?,
        })
    }

    fn reject(&self, error: SessionError) -> SessionError {
        reject(&self.notifications, error)
    }
}

/// Second half of a play: wait out the resolution delay, then draw and settle.
struct Settlement {
    spin_id: SpinId,
    state: Arc<Mutex<SessionState>>,
    notifications: NotificationHub,
    rates: Arc<RateSnapshot>,
    delay: Duration,
}

impl Settlement {
    async fn run(self) -> Result<SpinResult> {
        // Declared before the lock guard so it drops after it.
        let mut recovery = SpinRecovery {
            spin_id: self.spin_id,
            state: Arc::clone(&self.state),
            notifications: self.notifications.clone(),
            armed: true,
        };

        tokio::time::sleep(self.delay).await;

        let mut state = self.state.lock().await;
        let outcome = draw_reels(&mut *state.random);
        let ledger_before = state.ledger.clone();

        let settled = state
            .machine
            .apply(SpinEvent::Resolve(outcome))
            .and_then(|(resolved, effects)| {
                execute(&mut state.ledger, &effects)?;
                let result = build_result(self.spin_id, &resolved, &effects, &state.ledger)?;
                let (idle, _) = resolved.apply(SpinEvent::Finish)?;
                Ok((idle, result, effects))
            });

        let (idle, result, effects) = match settled {
            Ok(settled) => settled,
            Err(e) => {
                state.ledger = ledger_before;
                abandon_spin(self.spin_id, &mut state, &self.notifications);
                recovery.armed = false;
                return Err(reject(
                    &self.notifications,
                    SessionError::SettlementFailed {
                        spin_id: self.spin_id.to_string(),
                        reason: e.to_string(),
                    },
                ));
            }
        };
        state.machine = idle;
        recovery.armed = false;

        let notification =
            spin_notification(&result, &effects, state.ledger.display_fiat(), &self.rates);
        drop(state);

        record_spin(&result, &effects);
        self.notifications.emit(notification);
        Ok(result)
    }
}

/// Returns the session to `Idle` and refunds the stake if a settlement task
/// unwinds before finishing.
struct SpinRecovery {
    spin_id: SpinId,
    state: Arc<Mutex<SessionState>>,
    notifications: NotificationHub,
    armed: bool,
}

impl Drop for SpinRecovery {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        error!(spin_id = %self.spin_id, "Spin settlement interrupted");

        if let Ok(mut state) = self.state.try_lock() {
            abandon_spin(self.spin_id, &mut state, &self.notifications);
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let spin_id = self.spin_id;
        let state = Arc::clone(&self.state);
        let notifications = self.notifications.clone();
        handle.spawn(async move {
            abandon_spin(spin_id, &mut *state.lock().await, &notifications);
        });
    }
}

/// Drop the spin in flight, crediting back a paid stake.
fn abandon_spin(spin_id: SpinId, state: &mut SessionState, notifications: &NotificationHub) {
    if let Some(spin) = state.machine.active_spin().cloned() {
        if !spin.free_spin {
            match state.ledger.credit(spin.asset.as_str(), spin.stake) {
                Ok(balance) => {
                    warn!(
                        spin_id = %spin_id,
                        asset = %spin.asset,
                        stake = %spin.stake,
                        balance = %balance,
                        "Stake refunded for unsettled spin"
                    );
                    notifications.emit(Notification::error(format!(
                        "Spin could not be settled, {} {} refunded",
                        spin.stake, spin.asset
                    )));
                }
                Err(e) => error!(spin_id = %spin_id, error = %e, "Stake refund failed"),
            }
        }
    }
    state.machine = state.machine.reset();
    metrics::counter!("slots_spins_abandoned_total").increment(1);
}

/// Log, count and (when the player should see it) announce a refused request.
fn reject(notifications: &NotificationHub, error: SessionError) -> SessionError {
    let service_error = error.to_service_error();
    match service_error.category.log_level() {
        "error" => error!(code = %service_error.code, error = %error, "Session request failed"),
        "warn" => warn!(code = %service_error.code, error = %error, "Session request refused"),
        "info" => info!(code = %service_error.code, error = %error, "Session request refused"),
        _ => debug!(code = %service_error.code, error = %error, "Session request refused"),
    }
    metrics::counter!("slots_requests_rejected_total", "code" => service_error.code.clone())
        .increment(1);

    if service_error.category.is_user_facing() {
        notifications.emit(Notification::error(error.to_string()));
    }
    error
}

fn record_spin(result: &SpinResult, effects: &[SpinEffect]) {
    let mode = match result.mode {
        SpinMode::Normal => "normal",
        SpinMode::Turbo => "turbo",
    };
    metrics::counter!(
        "slots_spins_total",
        "mode" => mode,
        "free_spin" => if result.free_spin { "true" } else { "false" }
    )
    .increment(1);
    if result.outcome.is_win {
        metrics::counter!("slots_wins_total").increment(1);
    }
    if effects
        .iter()
        .any(|effect| matches!(effect, SpinEffect::BonusEntered { .. }))
    {
        metrics::counter!("slots_bonus_triggers_total").increment(1);
    }

    info!(
        spin_id = %result.spin_id,
        asset = %result.asset,
        reels = ?result.outcome.reels,
        multiplier = %result.outcome.multiplier,
        free_spin = result.free_spin,
        payout = %result.payout,
        bonus_payout = %result.bonus_payout,
        balance_after = %result.balance_after,
        "Spin settled"
    );
}

/// Apply ledger effects in order. Bonus bookkeeping effects carry no ledger change.
fn execute(ledger: &mut Ledger, effects: &[SpinEffect]) -> Result<()> {
    for effect in effects {
        match effect {
            SpinEffect::Debit { asset, amount } => {
                ledger.debit(asset.as_str(), *amount)?;
            }
            SpinEffect::Credit { asset, amount, .. } => {
                ledger.credit(asset.as_str(), *amount)?;
            }
            SpinEffect::BonusEntered { .. }
            | SpinEffect::BonusExtended { .. }
            | SpinEffect::BonusEnded { .. } => {}
        }
    }
    Ok(())
}

fn build_result(
    spin_id: SpinId,
    resolved: &SpinMachine,
    effects: &[SpinEffect],
    ledger: &Ledger,
) -> Result<SpinResult> {
    let (spin, outcome) = resolved
        .resolution()
        .ok_or_else(|| SessionError::UnexpectedEvent {
            phase: resolved.phase().to_string(),
            event: "resolve".to_string(),
        })?;

    let mut payout = Decimal::ZERO;
    let mut bonus_payout = Decimal::ZERO;
    for effect in effects {
        if let SpinEffect::Credit { amount, kind, .. } = effect {
            match kind {
                CreditKind::Win => payout += *amount,
                CreditKind::BonusLumpSum => bonus_payout += *amount,
            }
        }
    }

    Ok(SpinResult {
        spin_id,
        asset: spin.asset.clone(),
        mode: spin.mode,
        stake: spin.stake,
        free_spin: spin.free_spin,
        outcome: outcome.clone(),
        payout,
        bonus_payout,
        balance_after: ledger.balance(spin.asset.as_str())?,
        bonus: resolved.bonus().cloned(),
    })
}

fn format_amount(display_fiat: bool, symbol: &AssetSymbol, amount: Decimal, rates: &RateSnapshot) -> String {
    if display_fiat {
        if let Ok(fiat) = Ledger::convert(amount, symbol.as_str(), ConversionDirection::ToFiat, rates) {
            return format!("${:.*}", FIAT_DECIMALS as usize, fiat);
        }
    }
    format!("{:.*} {}", ASSET_DECIMALS as usize, amount, symbol)
}

fn spin_notification(
    result: &SpinResult,
    effects: &[SpinEffect],
    display_fiat: bool,
    rates: &RateSnapshot,
) -> Notification {
    let amount = |value: Decimal| format_amount(display_fiat, &result.asset, value, rates);

    for effect in effects {
        match effect {
            SpinEffect::BonusEntered { spins } => {
                return Notification::success(format!(
                    "Bonus round! {} free spins, and {} on this spin",
                    spins,
                    amount(result.payout)
                ));
            }
            SpinEffect::BonusExtended { spins_remaining } => {
                return Notification::success(format!(
                    "Bonus re-triggered: {} free spins left",
                    spins_remaining
                ));
            }
            SpinEffect::BonusEnded { lump_sum, .. } if *lump_sum > Decimal::ZERO => {
                return Notification::success(format!(
                    "Bonus round over: you won {}",
                    amount(*lump_sum)
                ));
            }
            SpinEffect::BonusEnded { .. } => {
                return Notification::error("Bonus round over: no winnings this time");
            }
            _ => {}
        }
    }

    let multiplier = result.outcome.multiplier.normalize();
    if result.free_spin {
        let remaining = result
            .bonus
            .as_ref()
            .map(|bonus| bonus.spins_remaining)
            .unwrap_or(0);
        if result.outcome.is_win {
            Notification::success(format!("Free spin hit {}x ({} left)", multiplier, remaining))
        } else {
            Notification::error(format!("Free spin missed ({} left)", remaining))
        }
    } else if result.outcome.is_win {
        Notification::success(format!(
            "You won {} ({}x)",
            amount(result.payout),
            multiplier
        ))
    } else {
        Notification::error(format!("No win, {} lost", amount(result.stake)))
    }
}
