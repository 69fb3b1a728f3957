use anyhow::Result;
use shared::ConversionDirection;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wallet::{Ledger, RateRefresher, RateTable, StaticRateProvider};

use slots::{Config, SessionController};

#[tokio::main]
async fn main() -> Result<()> {
    // Structured logging, JSON unless LOG_FORMAT says otherwise
    let use_json = std::env::var("LOG_FORMAT")
        .unwrap_or_else(|_| "json".to_string())
        .eq_ignore_ascii_case("json");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "slots=info,wallet=info".into());

    if use_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!(
        service = "slots",
        version = env!("CARGO_PKG_VERSION"),
        log_format = if use_json { "json" } else { "text" },
        "Starting slot session"
    );

    let config = Config::load()?;
    info!(
        max_bet_fiat = %config.session.max_bet_fiat,
        spin_delay_ms = config.session.spin_delay_ms,
        autoplay_interval_ms = config.autoplay.interval_ms,
        turbo = config.session.turbo,
        "Configuration loaded"
    );

    start_metrics_exporter(config.metrics_port)?;

    // Rates: built-in table, refreshed in the background
    let shutdown = CancellationToken::new();
    let rates = RateTable::with_defaults();
    let refresher_handle = RateRefresher::new(
        Arc::new(StaticRateProvider::default()),
        rates.clone(),
        Duration::from_secs(config.rates.refresh_seconds),
    )
    .spawn(shutdown.child_token());

    let session = Arc::new(SessionController::with_starting_assets(
        config.session.clone(),
        rates.clone(),
    )?);

    let mut notifications = session.subscribe();
    let notification_handle = tokio::spawn(async move {
        loop {
            match notifications.recv().await {
                Ok(notification) => info!(
                    kind = ?notification.kind,
                    message = %notification.message,
                    "Notification"
                ),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Notification log lagging"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    // The tip is the only way a fresh session gets a balance; play on whatever it landed on.
    if let Some(receipt) = session.grant_introductory_tip().await? {
        session.select_asset(receipt.symbol.as_str()).await?;
    }

    let selected = session.selected_asset().await;
    let snapshot = rates.snapshot().await;
    let stake = Ledger::convert(
        config.autoplay.stake_fiat,
        selected.as_str(),
        ConversionDirection::ToAsset,
        &snapshot,
    )?;
    let balance = session.display_balance().await?;
    info!(asset = %selected, stake = %stake, balance = %balance, "Starting auto-play");

    let autoplay = session.start_autoplay(stake, &config.autoplay);
    let autoplay_cancel = autoplay.cancel_token();
    let signal_handle = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            autoplay_cancel.cancel();
        }
    });

    let stop = autoplay.join().await;
    info!(stop = ?stop, "Auto-play finished");

    // Graceful shutdown
    signal_handle.abort();
    shutdown.cancel();
    if let Err(e) = refresher_handle.await {
        warn!(error = %e, "Rate refresher did not stop cleanly");
    }

    for entry in session.balances().await {
        info!(asset = %entry.symbol, balance = %entry.balance, "Final balance");
    }
    notification_handle.abort();

    info!("Slot session stopped");
    Ok(())
}

fn start_metrics_exporter(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    info!("Slots metrics listening on {}", addr);
    Ok(())
}
