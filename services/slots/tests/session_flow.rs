/// Integration tests for the session controller: staking, payouts, bonus
/// rounds, concurrency and the supplementary games.
mod common;

use common::{dec, instant_config, script, TestSession, BONUS, JACKPOT, LOSS};
use rust_decimal::Decimal;
use slots::config::{AutoPlayConfig, SessionConfig};
use slots::engine::RandomSource;
use slots::{AutoPlayStop, NotificationKind, SessionError, SpinMode};
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_losing_spin_deducts_exactly_the_stake() {
    let ctx = TestSession::scripted("ETH", "1", LOSS.to_vec());
    let mut notifications = ctx.session.subscribe();

    let result = assert_ok!(ctx.session.play(dec("0.004")).await);

    assert_eq!(result.outcome.reels, [1, 2, 3]);
    assert!(!result.outcome.is_win);
    assert_eq!(result.payout, Decimal::ZERO);
    assert_eq!(result.balance_after, dec("0.996"));
    assert_eq!(ctx.balance("ETH").await, dec("0.996"));
    assert!(ctx.session.is_idle().await);

    let notification = notifications.recv().await.unwrap();
    assert_eq!(notification.kind, NotificationKind::Error);
}

#[tokio::test]
async fn test_jackpot_pays_100x() {
    let ctx = TestSession::scripted("ETH", "1", JACKPOT.to_vec());
    let mut notifications = ctx.session.subscribe();

    let result = assert_ok!(ctx.session.play(dec("0.001")).await);

    assert_eq!(result.outcome.reels, [0, 0, 0]);
    assert_eq!(result.outcome.multiplier, Decimal::from(100));
    assert_eq!(result.payout, dec("0.1"));
    assert_eq!(ctx.balance("ETH").await, dec("1.099"));
    assert_eq!(notifications.recv().await.unwrap().kind, NotificationKind::Success);
}

#[tokio::test]
async fn test_max_bet_is_ten_dollars_in_asset_units() {
    // ETH at 2000 USD: max bet is 0.005 ETH.
    let ctx = TestSession::scripted("ETH", "1", LOSS.to_vec());
    assert_eq!(assert_ok!(ctx.session.max_bet().await), dec("0.005"));

    let err = assert_err!(ctx.session.play(dec("0.006")).await);
    assert!(matches!(err, SessionError::InvalidBet { .. }));
    assert_eq!(ctx.balance("ETH").await, dec("1"));

    assert_ok!(ctx.session.play(dec("0.004")).await);
    assert_eq!(ctx.balance("ETH").await, dec("0.996"));
}

#[tokio::test]
async fn test_invalid_stakes_leave_balance_untouched() {
    let ctx = TestSession::scripted("ETH", "0.001", LOSS.to_vec());
    let mut notifications = ctx.session.subscribe();

    for stake in ["0", "-0.001", "0.000000001"] {
        let err = assert_err!(ctx.session.play(dec(stake)).await);
        assert!(matches!(err, SessionError::InvalidBet { .. }), "{stake}: {err:?}");
    }
    let err = assert_err!(ctx.session.play(dec("0.002")).await);
    assert!(matches!(err, SessionError::InsufficientBalance { .. }));

    assert_eq!(ctx.balance("ETH").await, dec("0.001"));
    assert!(ctx.session.is_idle().await);

    // Every refusal is shown to the player.
    for _ in 0..4 {
        assert_eq!(notifications.recv().await.unwrap().kind, NotificationKind::Error);
    }
}

#[tokio::test]
async fn test_bonus_round_with_no_wins_pays_nothing_extra() {
    let samples = script(&[&BONUS, &LOSS, &LOSS, &LOSS, &LOSS, &LOSS, &LOSS, &LOSS, &LOSS, &LOSS, &LOSS]);
    let ctx = TestSession::scripted("ETH", "1", samples);

    let entry = assert_ok!(ctx.session.play(dec("0.002")).await);
    assert!(entry.outcome.triggers_bonus);
    assert_eq!(entry.payout, dec("0.1"));
    assert_eq!(entry.bonus.as_ref().unwrap().spins_remaining, 10);
    let after_entry = ctx.balance("ETH").await;
    assert_eq!(after_entry, dec("1.098"));

    for spin in 1..=10u32 {
        let result = assert_ok!(ctx.session.play(dec("0.002")).await);
        assert!(result.free_spin);
        assert_eq!(result.stake, Decimal::ZERO);
        assert_eq!(result.balance_after, after_entry);
        match &result.bonus {
            Some(bonus) => assert_eq!(bonus.spins_remaining, 10 - spin),
            None => {
                assert_eq!(spin, 10);
                assert_eq!(result.bonus_payout, Decimal::ZERO);
            }
        }
    }

    assert!(ctx.session.bonus().await.is_none());
    assert_eq!(ctx.balance("ETH").await, after_entry);
}

#[tokio::test]
async fn test_bonus_lump_sum_goes_to_entry_asset() {
    let samples = script(&[&BONUS, &JACKPOT, &LOSS, &LOSS, &LOSS, &LOSS, &LOSS, &LOSS, &LOSS, &LOSS, &LOSS]);
    let ctx = TestSession::scripted("ETH", "1", samples);

    assert_ok!(ctx.session.play(dec("0.002")).await);
    ctx.session.select_asset("BTC").await.unwrap();

    let mut last = None;
    for _ in 0..10 {
        last = Some(assert_ok!(ctx.session.play(dec("0.0001")).await));
    }
    let last = last.unwrap();

    assert_eq!(last.asset.as_str(), "ETH");
    assert_eq!(last.bonus_payout, dec("0.2"));
    assert!(last.bonus.is_none());
    // 1 - 0.002 + 0.1 (entry win) + 100 x 0.002 (lump sum)
    assert_eq!(ctx.balance("ETH").await, dec("1.298"));
    assert_eq!(ctx.balance("BTC").await, Decimal::ZERO);
}

#[tokio::test]
async fn test_retrigger_adds_ten_spins() {
    let samples = script(&[&BONUS, &LOSS, &LOSS, &LOSS, &LOSS, &LOSS, &LOSS, &LOSS, &BONUS]);
    let ctx = TestSession::scripted("ETH", "1", samples);

    assert_ok!(ctx.session.play(dec("0.002")).await);
    for _ in 0..7 {
        assert_ok!(ctx.session.play(dec("0.002")).await);
    }
    assert_eq!(ctx.session.bonus().await.unwrap().spins_remaining, 3);
    let balance = ctx.balance("ETH").await;

    let retrigger = assert_ok!(ctx.session.play(dec("0.002")).await);

    let bonus = retrigger.bonus.unwrap();
    assert_eq!(bonus.spins_remaining, 13);
    assert_eq!(bonus.accumulated_multiplier, Decimal::ZERO);
    assert_eq!(retrigger.payout, Decimal::ZERO);
    assert_eq!(ctx.balance("ETH").await, balance);
}

#[tokio::test]
async fn test_second_play_during_spin_is_refused_quietly() {
    let config = SessionConfig {
        spin_delay_ms: 200,
        ..instant_config()
    };
    let ctx = TestSession::with_config(
        config,
        "ETH",
        "1",
        slots::engine::ScriptedRandom::new(LOSS),
    );
    let mut notifications = ctx.session.subscribe();

    let first = tokio::spawn({
        let session = ctx.session.clone();
        async move { session.play(dec("0.001")).await }
    });
    while ctx.session.is_idle().await {
        tokio::task::yield_now().await;
    }

    let err = assert_err!(ctx.session.play(dec("0.001")).await);
    assert_eq!(err, SessionError::ConcurrentSpin);
    assert!(!err.is_user_facing());
    assert!(matches!(notifications.try_recv(), Err(TryRecvError::Empty)));

    let first = first.await.unwrap();
    assert_ok!(first);
    assert_eq!(ctx.balance("ETH").await, dec("0.999"));
}

#[tokio::test]
async fn test_dropped_play_still_settles() {
    let config = SessionConfig {
        spin_delay_ms: 200,
        ..instant_config()
    };
    let ctx = TestSession::with_config(
        config,
        "ETH",
        "1",
        slots::engine::ScriptedRandom::new(LOSS),
    );

    let abandoned = tokio::time::timeout(Duration::from_millis(50), ctx.session.play(dec("0.001"))).await;
    assert!(abandoned.is_err());
    assert!(!ctx.session.is_idle().await);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(ctx.session.is_idle().await);
    assert_eq!(ctx.balance("ETH").await, dec("0.999"));

    assert_ok!(ctx.session.play(dec("0.001")).await);
    assert_eq!(ctx.balance("ETH").await, dec("0.998"));
}

struct BrokenRandom;

impl RandomSource for BrokenRandom {
    fn next_f64(&mut self) -> f64 {
        panic!("random source unavailable");
    }
}

#[tokio::test]
async fn test_failed_settlement_refunds_stake() {
    let ctx = TestSession::funded("ETH", "1", BrokenRandom);
    let mut notifications = ctx.session.subscribe();

    let err = assert_err!(ctx.session.play(dec("0.004")).await);
    assert!(matches!(err, SessionError::SettlementFailed { .. }));
    assert!(!err.is_user_facing());

    assert!(ctx.session.is_idle().await);
    assert_eq!(ctx.balance("ETH").await, dec("1"));

    let notification = notifications.recv().await.unwrap();
    assert_eq!(notification.kind, NotificationKind::Error);
    assert!(notification.message.contains("refunded"));
    assert!(matches!(notifications.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_max_bet_never_rounds_above_ten_dollars() {
    // TRX at 0.07 USD: 10 / 0.07 = 142.857142857..., truncated at 8 dp.
    let ctx = TestSession::scripted("TRX", "200", LOSS.to_vec());
    assert_eq!(assert_ok!(ctx.session.max_bet().await), dec("142.85714285"));

    let err = assert_err!(ctx.session.play(dec("142.85714286")).await);
    assert!(matches!(err, SessionError::InvalidBet { .. }));
    assert_eq!(ctx.balance("TRX").await, dec("200"));

    assert_ok!(ctx.session.play(dec("142.85714285")).await);
    assert_eq!(ctx.balance("TRX").await, dec("57.14285715"));
}

#[tokio::test]
async fn test_turbo_does_not_change_outcomes() {
    let normal = TestSession::seeded("ETH", "1", 2024);
    let turbo = TestSession::seeded("ETH", "1", 2024);
    turbo.session.set_turbo(true);

    for _ in 0..50 {
        let a = assert_ok!(normal.session.play(dec("0.001")).await);
        let b = assert_ok!(turbo.session.play(dec("0.001")).await);
        assert_eq!(a.mode, SpinMode::Normal);
        assert_eq!(b.mode, SpinMode::Turbo);
        assert_eq!(a.outcome, b.outcome);
        assert_eq!(a.balance_after, b.balance_after);
    }
}

#[tokio::test]
async fn test_autoplay_stops_on_insufficient_balance() {
    let ctx = TestSession::scripted("ETH", "0.003", LOSS.to_vec());
    let config = AutoPlayConfig {
        interval_ms: 0,
        ..AutoPlayConfig::default()
    };

    let handle = ctx.session.start_autoplay(dec("0.001"), &config);
    let stop = tokio::time::timeout(Duration::from_secs(5), handle.join())
        .await
        .expect("auto-play stops by itself");

    assert!(matches!(
        stop,
        AutoPlayStop::Rejected(SessionError::InsufficientBalance { .. })
    ));
    assert_eq!(ctx.balance("ETH").await, Decimal::ZERO);
}

#[tokio::test]
async fn test_autoplay_respects_spin_cap() {
    let ctx = TestSession::scripted("ETH", "1", LOSS.to_vec());
    let config = AutoPlayConfig {
        interval_ms: 0,
        max_spins: Some(5),
        ..AutoPlayConfig::default()
    };

    let stop = ctx.session.start_autoplay(dec("0.001"), &config).join().await;

    assert_eq!(stop, AutoPlayStop::Completed { spins: 5 });
    assert_eq!(ctx.balance("ETH").await, dec("0.995"));
}

#[tokio::test]
async fn test_autoplay_cancel_between_spins() {
    let ctx = TestSession::scripted("ETH", "1", LOSS.to_vec());
    let config = AutoPlayConfig {
        interval_ms: 60_000,
        ..AutoPlayConfig::default()
    };

    let handle = ctx.session.start_autoplay(dec("0.001"), &config);
    while ctx.balance("ETH").await == dec("1") {
        tokio::task::yield_now().await;
    }
    handle.stop();

    let stop = tokio::time::timeout(Duration::from_secs(5), handle.join())
        .await
        .expect("cancellation interrupts the wait");
    assert_eq!(stop, AutoPlayStop::Cancelled);
    assert!(ctx.session.is_idle().await);
}

#[tokio::test]
async fn test_introductory_tip_granted_once() {
    let ctx = TestSession::scripted("ETH", "0", LOSS.to_vec());
    let mut notifications = ctx.session.subscribe();

    let receipt = assert_ok!(ctx.session.grant_introductory_tip().await).expect("first tip");
    assert!(["TRX", "XRP", "LTC"].contains(&receipt.symbol.as_str()));
    assert!(receipt.fiat_amount >= Decimal::from(20) && receipt.fiat_amount < Decimal::from(100));
    assert_eq!(ctx.balance(receipt.symbol.as_str()).await, receipt.asset_amount);
    assert_eq!(notifications.recv().await.unwrap().kind, NotificationKind::Success);

    assert!(assert_ok!(ctx.session.grant_introductory_tip().await).is_none());
}

#[tokio::test]
async fn test_introductory_tip_can_be_disabled() {
    let config = SessionConfig {
        tip_enabled: false,
        ..instant_config()
    };
    let ctx = TestSession::with_config(config, "ETH", "0", slots::engine::ScriptedRandom::new(LOSS));

    assert!(assert_ok!(ctx.session.grant_introductory_tip().await).is_none());
}

#[tokio::test]
async fn test_plinko_edge_slot_pays_1000x() {
    // Every bounce goes left.
    let ctx = TestSession::scripted("ETH", "1", vec![0.1]);

    let result = assert_ok!(ctx.session.drop_plinko(dec("0.001")).await);

    assert_eq!(result.slot, 0);
    assert_eq!(result.multiplier, Decimal::from(1_000));
    assert_eq!(result.payout, dec("1"));
    assert_eq!(ctx.balance("ETH").await, dec("1.999"));
}

#[tokio::test]
async fn test_plinko_is_staked_like_a_spin() {
    let ctx = TestSession::scripted("ETH", "0.004", vec![0.1, 0.9]);

    let err = assert_err!(ctx.session.drop_plinko(dec("0.006")).await);
    assert!(matches!(err, SessionError::InvalidBet { .. }));
    let err = assert_err!(ctx.session.drop_plinko(dec("0.005")).await);
    assert!(matches!(err, SessionError::InsufficientBalance { .. }));

    // Alternating bounces land in the middle slot, 0.2x.
    let result = assert_ok!(ctx.session.drop_plinko(dec("0.004")).await);
    assert_eq!(result.slot, 8);
    assert_eq!(result.payout, dec("0.0008"));
    assert_eq!(ctx.balance("ETH").await, dec("0.0008"));
}

#[tokio::test]
async fn test_display_balance_in_fiat() {
    let ctx = TestSession::scripted("ETH", "0.0025", LOSS.to_vec());

    assert_eq!(assert_ok!(ctx.session.display_balance().await), "0.00250000 ETH");
    ctx.session.set_display_fiat(true).await;
    assert_eq!(assert_ok!(ctx.session.display_balance().await), "$5.00");
}

#[tokio::test]
async fn test_select_unknown_asset() {
    let ctx = TestSession::scripted("ETH", "1", LOSS.to_vec());
    let mut notifications = ctx.session.subscribe();

    let err = assert_err!(ctx.session.select_asset("DOGE").await);
    assert_eq!(err, SessionError::UnknownAsset("DOGE".to_string()));
    assert_eq!(ctx.session.selected_asset().await.as_str(), "ETH");
    assert_eq!(notifications.recv().await.unwrap().kind, NotificationKind::Error);
}

#[tokio::test]
async fn test_rate_refresh_changes_max_bet_for_next_play() {
    let ctx = TestSession::scripted("ETH", "1", LOSS.to_vec());
    ctx.rates
        .apply(&[("ETH".to_string(), Decimal::from(1_000))].into_iter().collect())
        .await;

    assert_eq!(assert_ok!(ctx.session.max_bet().await), dec("0.01"));
    assert_ok!(ctx.session.play(dec("0.008")).await);
}
