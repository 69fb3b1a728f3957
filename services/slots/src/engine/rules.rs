//! Payout rules, checked in priority order; the first match decides.

use rust_decimal::Decimal;
use shared::{BONUS_SYMBOL, PREMIUM_SYMBOL};

use crate::domain::{ReelOutcome, Reels, WinRule};

pub fn evaluate(reels: Reels) -> ReelOutcome {
    let (rule, multiplier) = classify(reels);
    ReelOutcome {
        reels,
        is_win: multiplier > Decimal::ZERO,
        multiplier,
        triggers_bonus: reels.iter().all(|symbol| *symbol == BONUS_SYMBOL),
        rule,
    }
}

pub fn is_win(reels: Reels) -> bool {
    classify(reels).0 != WinRule::NoWin
}

fn classify(reels: Reels) -> (WinRule, Decimal) {
    let [left, middle, right] = reels;

    if left == middle && middle == right {
        return match middle {
            PREMIUM_SYMBOL => (WinRule::Jackpot, Decimal::from(100)),
            BONUS_SYMBOL => (WinRule::BonusTriple, Decimal::from(50)),
            _ => (WinRule::Triple, Decimal::from(20)),
        };
    }

    // Either neighbour pair shares the middle symbol.
    if left == middle || middle == right {
        let multiplier = if middle == PREMIUM_SYMBOL { 5 } else { 3 };
        return (WinRule::AdjacentPair, Decimal::from(multiplier));
    }

    let mut sorted = reels;
    sorted.sort_unstable();
    if sorted == [0, 1, 2] {
        return (WinRule::Straight, Decimal::from(10));
    }

    if reels.contains(&PREMIUM_SYMBOL) {
        return (WinRule::PremiumScatter, Decimal::from(2));
    }

    (WinRule::NoWin, Decimal::ZERO)
}
