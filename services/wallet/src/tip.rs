//! Introductory tip: a one-off scripted credit that gives a new session
//! something to play with.

use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{AssetSymbol, ConversionDirection, TIP_ELIGIBLE_ASSETS, TIP_MAX_FIAT, TIP_MIN_FIAT};

use crate::errors::{Result, WalletError};
use crate::ledger::Ledger;
use crate::rates::RateSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TipReceipt {
    pub symbol: AssetSymbol,
    pub fiat_amount: Decimal,
    pub asset_amount: Decimal,
}

/// Credit a random whole-dollar amount in `[TIP_MIN_FIAT, TIP_MAX_FIAT)` to one
/// of the eligible assets.
///
/// Returns `Ok(None)` if this ledger already received its tip.
pub fn grant_introductory_tip<R: Rng + ?Sized>(
    ledger: &mut Ledger,
    rates: &RateSnapshot,
    rng: &mut R,
) -> Result<Option<TipReceipt>> {
    if ledger.introductory_tip_granted() {
        tracing::debug!("Introductory tip already granted");
        return Ok(None);
    }

    let fiat_amount = Decimal::from(rng.gen_range(TIP_MIN_FIAT..TIP_MAX_FIAT));
    let picked = TIP_ELIGIBLE_ASSETS[rng.gen_range(0..TIP_ELIGIBLE_ASSETS.len())];
    let symbol = AssetSymbol::try_from(picked)
        .map_err(|_| WalletError::UnknownAsset(picked.to_string()))?;

    let asset_amount =
        Ledger::convert(fiat_amount, symbol.as_str(), ConversionDirection::ToAsset, rates)?;
    ledger.credit(symbol.as_str(), asset_amount)?;
    ledger.mark_introductory_tip_granted();

    tracing::info!(
        symbol = %symbol,
        fiat_amount = %fiat_amount,
        asset_amount = %asset_amount,
        "Introductory tip granted"
    );
    metrics::counter!("wallet_tips_granted_total").increment(1);

    Ok(Some(TipReceipt {
        symbol,
        fiat_amount,
        asset_amount,
    }))
}
