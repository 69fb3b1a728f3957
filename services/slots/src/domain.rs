use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{AssetSymbol, SpinId, REEL_COUNT};
use std::time::Duration;

/// Three symbol indices, left to right.
pub type Reels = [u8; REEL_COUNT];

/// Timing mode. Never affects odds or payouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinMode {
    #[default]
    Normal,
    Turbo,
}

impl SpinMode {
    pub fn from_turbo(turbo: bool) -> Self {
        if turbo {
            SpinMode::Turbo
        } else {
            SpinMode::Normal
        }
    }

    /// Scale a base delay for this mode. Turbo halves it.
    pub fn scale(&self, base: Duration) -> Duration {
        match self {
            SpinMode::Normal => base,
            SpinMode::Turbo => base / 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinRequest {
    /// Native units of the selected asset. Ignored during a bonus round.
    pub stake: Decimal,
    pub mode: SpinMode,
}

/// Which payout rule matched a set of reels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinRule {
    /// Three premium symbols.
    Jackpot,
    /// Three bonus symbols.
    BonusTriple,
    /// Three of any other symbol.
    Triple,
    /// Two equal neighbours.
    AdjacentPair,
    /// Symbols 0, 1 and 2 in any order.
    Straight,
    /// A premium symbol somewhere, nothing better.
    PremiumScatter,
    NoWin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelOutcome {
    pub reels: Reels,
    pub is_win: bool,
    pub multiplier: Decimal,
    pub triggers_bonus: bool,
    pub rule: WinRule,
}

/// An active bonus round. Absent (`None`) when no bonus is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusState {
    pub spins_remaining: u32,
    pub accumulated_multiplier: Decimal,
    /// Stake of the paid spin that started the round; the lump sum is paid on it.
    pub entry_stake: Decimal,
    pub entry_asset: AssetSymbol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinResult {
    pub spin_id: SpinId,
    pub asset: AssetSymbol,
    pub mode: SpinMode,
    /// Zero for free spins.
    pub stake: Decimal,
    pub free_spin: bool,
    pub outcome: ReelOutcome,
    /// Credited by this spin (paid spins only).
    pub payout: Decimal,
    /// Lump sum credited because the bonus round ended on this spin.
    pub bonus_payout: Decimal,
    pub balance_after: Decimal,
    pub bonus: Option<BonusState>,
}

impl SpinResult {
    pub fn total_credited(&self) -> Decimal {
        self.payout + self.bonus_payout
    }
}
