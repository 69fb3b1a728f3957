//! Reel drawing
//!
//! One uniform sample picks an outcome class by cumulative threshold; the class
//! then decides which reels are produced. The two open-ended classes (any win,
//! any loss) are filled by rejection sampling against the payout rules.

use shared::{BONUS_SYMBOL, MAX_REJECTION_ATTEMPTS, PREMIUM_SYMBOL, SYMBOL_COUNT};

use super::random::{pick, RandomSource};
use super::rules;
use crate::domain::{ReelOutcome, Reels};

/// Outcome classes, with the upper bound of each in the cumulative table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeClass {
    Jackpot,
    Triple,
    AdjacentPair,
    Straight,
    Bonus,
    AnyWin,
    AnyLoss,
}

const CLASS_THRESHOLDS: [(f64, OutcomeClass); 7] = [
    (0.01, OutcomeClass::Jackpot),
    (0.03, OutcomeClass::Triple),
    (0.15, OutcomeClass::AdjacentPair),
    (0.25, OutcomeClass::Straight),
    (0.30, OutcomeClass::Bonus),
    (0.50, OutcomeClass::AnyWin),
    (1.00, OutcomeClass::AnyLoss),
];

const STRAIGHT_PERMUTATIONS: [Reels; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

const FALLBACK_WIN: Reels = [0, 3, 4];
const FALLBACK_LOSS: Reels = [1, 2, 3];

pub fn classify_sample(sample: f64) -> OutcomeClass {
    CLASS_THRESHOLDS
        .iter()
        .find(|(upper, _)| sample < *upper)
        .map(|(_, class)| *class)
        .unwrap_or(OutcomeClass::AnyLoss)
}

/// Draw one set of reels and evaluate it.
pub fn draw_reels<R: RandomSource + ?Sized>(random: &mut R) -> ReelOutcome {
    let class = classify_sample(random.next_f64());

    let reels = match class {
        OutcomeClass::Jackpot => [PREMIUM_SYMBOL; 3],
        OutcomeClass::Triple => {
            let symbol = 1 + pick(random, 4) as u8;
            [symbol; 3]
        }
        OutcomeClass::AdjacentPair => adjacent_pair(random),
        OutcomeClass::Straight => STRAIGHT_PERMUTATIONS[pick(random, STRAIGHT_PERMUTATIONS.len())],
        OutcomeClass::Bonus => [BONUS_SYMBOL; 3],
        OutcomeClass::AnyWin => rejection_sample(random, true),
        OutcomeClass::AnyLoss => rejection_sample(random, false),
    };

    rules::evaluate(reels)
}

fn random_symbol<R: RandomSource + ?Sized>(random: &mut R) -> u8 {
    pick(random, SYMBOL_COUNT as usize) as u8
}

/// Two equal neighbours, at 0–1 or 1–2, and a third reel that differs from them.
fn adjacent_pair<R: RandomSource + ?Sized>(random: &mut R) -> Reels {
    let matched = random_symbol(random);
    let pair_on_left = pick(random, 2) == 0;

    let other = pick(random, SYMBOL_COUNT as usize - 1) as u8;
    let other = if other >= matched { other + 1 } else { other };

    if pair_on_left {
        [matched, matched, other]
    } else {
        [other, matched, matched]
    }
}

fn rejection_sample<R: RandomSource + ?Sized>(random: &mut R, want_win: bool) -> Reels {
    for _ in 0..MAX_REJECTION_ATTEMPTS {
        let reels = [
            random_symbol(random),
            random_symbol(random),
            random_symbol(random),
        ];
        if rules::is_win(reels) == want_win {
            return reels;
        }
    }

    let fallback = if want_win { FALLBACK_WIN } else { FALLBACK_LOSS };
    tracing::warn!(
        want_win,
        attempts = MAX_REJECTION_ATTEMPTS,
        reels = ?fallback,
        "Rejection sampling exhausted, using fallback reels"
    );
    fallback
}
