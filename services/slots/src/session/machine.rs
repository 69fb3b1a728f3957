//! Spin state machine
//!
//! `Idle -> Spinning -> Resolved -> Idle`, with the bonus round carried
//! alongside. Transitions are pure: `apply` returns the next machine and the
//! ledger effects it implies, and the caller decides whether to commit them.

use rust_decimal::Decimal;
use shared::{fits_asset_precision, to_asset_precision, AssetSymbol, ASSET_DECIMALS, BONUS_FREE_SPINS};
use std::fmt;

use crate::domain::{BonusState, ReelOutcome, SpinMode, SpinRequest};
use crate::errors::{Result, SessionError};

/// The spin currently in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSpin {
    pub asset: AssetSymbol,
    pub stake: Decimal,
    pub free_spin: bool,
    pub mode: SpinMode,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Phase {
    #[default]
    Idle,
    Spinning(ActiveSpin),
    Resolved {
        spin: ActiveSpin,
        outcome: ReelOutcome,
    },
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Spinning(_) => write!(f, "spinning"),
            Phase::Resolved { .. } => write!(f, "resolved"),
        }
    }
}

/// What a paid stake is checked against, read from the ledger and the rate
/// snapshot of the current play.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StakeLimits {
    pub balance: Decimal,
    /// Max bet in units of the staked asset.
    pub max_bet: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpinEvent {
    Play {
        asset: AssetSymbol,
        request: SpinRequest,
        limits: StakeLimits,
    },
    Resolve(ReelOutcome),
    Finish,
}

impl SpinEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SpinEvent::Play { .. } => "play",
            SpinEvent::Resolve(_) => "resolve",
            SpinEvent::Finish => "finish",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditKind {
    Win,
    BonusLumpSum,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpinEffect {
    Debit {
        asset: AssetSymbol,
        amount: Decimal,
    },
    Credit {
        asset: AssetSymbol,
        amount: Decimal,
        kind: CreditKind,
    },
    BonusEntered {
        spins: u32,
    },
    BonusExtended {
        spins_remaining: u32,
    },
    BonusEnded {
        asset: AssetSymbol,
        lump_sum: Decimal,
        accumulated_multiplier: Decimal,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpinMachine {
    phase: Phase,
    bonus: Option<BonusState>,
}

impl SpinMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn bonus(&self) -> Option<&BonusState> {
        self.bonus.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// The spin being played or just resolved.
    pub fn active_spin(&self) -> Option<&ActiveSpin> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Spinning(spin) | Phase::Resolved { spin, .. } => Some(spin),
        }
    }

    /// The spin and its outcome, once resolved.
    pub fn resolution(&self) -> Option<(&ActiveSpin, &ReelOutcome)> {
        match &self.phase {
            Phase::Resolved { spin, outcome } => Some((spin, outcome)),
            _ => None,
        }
    }

    /// Drop the spin in flight and return to `Idle`. The bonus round is kept.
    pub fn reset(&self) -> SpinMachine {
        self.with_phase(Phase::Idle)
    }

    pub fn apply(&self, event: SpinEvent) -> Result<(SpinMachine, Vec<SpinEffect>)> {
        match (&self.phase, event) {
            (Phase::Idle, SpinEvent::Play {
                asset,
                request,
                limits,
            }) => self.start(asset, request, limits),
            (Phase::Spinning(spin), SpinEvent::Resolve(outcome)) => {
                Ok(self.resolve(spin.clone(), outcome))
            }
            (Phase::Resolved { .. }, SpinEvent::Finish) => Ok((
                SpinMachine {
                    phase: Phase::Idle,
                    bonus: self.bonus.clone(),
                },
                Vec::new(),
            )),
            (_, SpinEvent::Play { .. }) => Err(SessionError::ConcurrentSpin),
            (phase, event) => Err(SessionError::UnexpectedEvent {
                phase: phase.to_string(),
                event: event.name().to_string(),
            }),
        }
    }

    fn start(
        &self,
        asset: AssetSymbol,
        request: SpinRequest,
        limits: StakeLimits,
    ) -> Result<(SpinMachine, Vec<SpinEffect>)> {
        // During a bonus round every play is a free spin on the entry asset.
        if let Some(bonus) = &self.bonus {
            let spin = ActiveSpin {
                asset: bonus.entry_asset.clone(),
                stake: Decimal::ZERO,
                free_spin: true,
                mode: request.mode,
            };
            return Ok((self.with_phase(Phase::Spinning(spin)), Vec::new()));
        }

        validate_stake(&asset, request.stake, &limits)?;

        let spin = ActiveSpin {
            asset: asset.clone(),
            stake: request.stake,
            free_spin: false,
            mode: request.mode,
        };
        let effects = vec![SpinEffect::Debit {
            asset,
            amount: request.stake,
        }];
        Ok((self.with_phase(Phase::Spinning(spin)), effects))
    }

    fn resolve(&self, spin: ActiveSpin, outcome: ReelOutcome) -> (SpinMachine, Vec<SpinEffect>) {
        let mut effects = Vec::new();
        let mut bonus = self.bonus.clone();

        if spin.free_spin {
            let mut ended = false;
            if let Some(state) = bonus.as_mut() {
                if outcome.triggers_bonus {
                    // Re-trigger: more spins, this one is not consumed and its multiplier is not banked.
                    state.spins_remaining += BONUS_FREE_SPINS;
                    effects.push(SpinEffect::BonusExtended {
                        spins_remaining: state.spins_remaining,
                    });
                } else {
                    state.spins_remaining = state.spins_remaining.saturating_sub(1);
                    state.accumulated_multiplier += outcome.multiplier;

                    if state.spins_remaining == 0 {
                        let lump_sum =
                            to_asset_precision(state.accumulated_multiplier * state.entry_stake);
                        if lump_sum > Decimal::ZERO {
                            effects.push(SpinEffect::Credit {
                                asset: state.entry_asset.clone(),
                                amount: lump_sum,
                                kind: CreditKind::BonusLumpSum,
                            });
                        }
                        effects.push(SpinEffect::BonusEnded {
                            asset: state.entry_asset.clone(),
                            lump_sum,
                            accumulated_multiplier: state.accumulated_multiplier,
                        });
                        ended = true;
                    }
                }
            }
            if ended {
                bonus = None;
            }
        } else {
            if outcome.is_win {
                effects.push(SpinEffect::Credit {
                    asset: spin.asset.clone(),
                    amount: to_asset_precision(spin.stake * outcome.multiplier),
                    kind: CreditKind::Win,
                });
            }
            if outcome.triggers_bonus {
                bonus = Some(BonusState {
                    spins_remaining: BONUS_FREE_SPINS,
                    accumulated_multiplier: Decimal::ZERO,
                    entry_stake: spin.stake,
                    entry_asset: spin.asset.clone(),
                });
                effects.push(SpinEffect::BonusEntered {
                    spins: BONUS_FREE_SPINS,
                });
            }
        }

        (
            SpinMachine {
                phase: Phase::Resolved { spin, outcome },
                bonus,
            },
            effects,
        )
    }

    fn with_phase(&self, phase: Phase) -> SpinMachine {
        SpinMachine {
            phase,
            bonus: self.bonus.clone(),
        }
    }
}

/// Paid-stake checks, in order: positive, within max bet, representable at
/// asset precision, covered by the balance.
pub fn validate_stake(asset: &AssetSymbol, stake: Decimal, limits: &StakeLimits) -> Result<()> {
    if stake <= Decimal::ZERO {
        return Err(SessionError::invalid_bet(stake, "stake must be positive"));
    }
    if stake > limits.max_bet {
        return Err(SessionError::invalid_bet(
            stake,
            format!("stake exceeds max bet of {} {}", limits.max_bet, asset),
        ));
    }
    if !fits_asset_precision(stake) {
        return Err(SessionError::invalid_bet(
            stake,
            format!("stake has more than {} fractional digits", ASSET_DECIMALS),
        ));
    }
    if stake > limits.balance {
        return Err(SessionError::InsufficientBalance {
            symbol: asset.to_string(),
            required: stake,
            available: limits.balance,
        });
    }
    Ok(())
}
