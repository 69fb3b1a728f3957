//! Plinko drop: a ball bounces left or right off each of 16 peg rows and lands
//! in the slot given by its number of right bounces.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{AssetSymbol, SpinId};

use crate::engine::random::{pick, RandomSource};

pub const PLINKO_ROWS: usize = 16;
pub const PLINKO_SLOTS: usize = PLINKO_ROWS + 1;

/// Slot multipliers as (mantissa, scale), edges first.
const SLOT_MULTIPLIERS: [(i64, u32); PLINKO_SLOTS] = [
    (1000, 0),
    (130, 0),
    (26, 0),
    (9, 0),
    (4, 0),
    (2, 0),
    (2, 1),
    (2, 1),
    (2, 1),
    (2, 1),
    (2, 1),
    (2, 0),
    (4, 0),
    (9, 0),
    (26, 0),
    (130, 0),
    (1000, 0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bounce {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlinkoResult {
    pub drop_id: SpinId,
    pub asset: AssetSymbol,
    pub stake: Decimal,
    pub path: Vec<Bounce>,
    pub slot: usize,
    pub multiplier: Decimal,
    pub payout: Decimal,
    pub balance_after: Decimal,
}

/// Multiplier for a landing slot. Out-of-range slots pay nothing.
pub fn slot_multiplier(slot: usize) -> Decimal {
    SLOT_MULTIPLIERS
        .get(slot)
        .map(|(mantissa, scale)| Decimal::new(*mantissa, *scale))
        .unwrap_or(Decimal::ZERO)
}

/// Bounce the ball down the board. Returns the path and the landing slot.
pub fn drop_ball<R: RandomSource + ?Sized>(random: &mut R) -> (Vec<Bounce>, usize) {
    let path: Vec<Bounce> = (0..PLINKO_ROWS)
        .map(|_| {
            if pick(random, 2) == 1 {
                Bounce::Right
            } else {
                Bounce::Left
            }
        })
        .collect();
    let slot = path.iter().filter(|bounce| **bounce == Bounce::Right).count();
    (path, slot)
}
