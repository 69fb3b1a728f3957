//! Per-session balance ledger
//!
//! Balances only ever change through `credit` and `debit`. The selected asset
//! is stored by symbol and read through the same entry, so there is no second
//! copy of the selected balance to go stale.

use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    to_asset_precision, to_fiat_precision, AssetSymbol, ConversionDirection, ASSET_DECIMALS,
    DEFAULT_ASSET, FIAT_DECIMALS, STARTING_ASSETS,
};

use crate::errors::{Result, WalletError};
use crate::rates::RateSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetBalance {
    pub symbol: AssetSymbol,
    pub name: String,
    pub balance: Decimal,
}

#[derive(Debug, Clone)]
pub struct Ledger {
    balances: Vec<AssetBalance>,
    selected: AssetSymbol,
    display_fiat: bool,
    introductory_tip_granted: bool,
}

impl Ledger {
    /// Build a ledger over `assets`, all starting at zero.
    ///
    /// `selected` must name one of the assets.
    pub fn new(assets: Vec<(AssetSymbol, String)>, selected: &str) -> Result<Self> {
        let mut balances: Vec<AssetBalance> = Vec::with_capacity(assets.len());
        for (symbol, name) in assets {
            if balances.iter().any(|entry| entry.symbol == symbol) {
                tracing::warn!(symbol = %symbol, "Duplicate asset ignored");
                continue;
            }
            balances.push(AssetBalance {
                symbol,
                name,
                balance: Decimal::ZERO,
            });
        }

        let selected = balances
            .iter()
            .find(|entry| entry.symbol == *selected)
            .map(|entry| entry.symbol.clone())
            .ok_or_else(|| WalletError::UnknownAsset(selected.to_string()))?;

        Ok(Self {
            balances,
            selected,
            display_fiat: false,
            introductory_tip_granted: false,
        })
    }

    /// The fixed starting asset set, ETH selected.
    pub fn with_starting_assets() -> Result<Self> {
        let assets = STARTING_ASSETS
            .iter()
            .filter_map(|(symbol, name)| {
                AssetSymbol::try_from(*symbol)
                    .ok()
                    .map(|symbol| (symbol, name.to_string()))
            })
            .collect();

        Self::new(assets, DEFAULT_ASSET)
    }

    fn entry(&self, symbol: &str) -> Result<&AssetBalance> {
        self.balances
            .iter()
            .find(|entry| entry.symbol == *symbol)
            .ok_or_else(|| WalletError::UnknownAsset(symbol.to_string()))
    }

    fn entry_mut(&mut self, symbol: &str) -> Result<&mut AssetBalance> {
        self.balances
            .iter_mut()
            .find(|entry| entry.symbol == *symbol)
            .ok_or_else(|| WalletError::UnknownAsset(symbol.to_string()))
    }

    pub fn balance(&self, symbol: &str) -> Result<Decimal> {
        Ok(self.entry(symbol)?.balance)
    }

    pub fn balances(&self) -> &[AssetBalance] {
        &self.balances
    }

    /// Add `amount` (rounded to asset precision) to `symbol`. Returns the new balance.
    pub fn credit(&mut self, symbol: &str, amount: Decimal) -> Result<Decimal> {
        if amount < Decimal::ZERO {
            return Err(WalletError::NegativeAmount(amount));
        }

        let entry = self.entry_mut(symbol)?;
        entry.balance = to_asset_precision(entry.balance + to_asset_precision(amount));

        tracing::debug!(symbol = %symbol, amount = %amount, balance = %entry.balance, "Credited");
        Ok(entry.balance)
    }

    /// Subtract `amount` from `symbol`. Rejected, with the balance untouched, if
    /// it would go negative. Returns the new balance.
    pub fn debit(&mut self, symbol: &str, amount: Decimal) -> Result<Decimal> {
        if amount < Decimal::ZERO {
            return Err(WalletError::NegativeAmount(amount));
        }

        let amount = to_asset_precision(amount);
        let entry = self.entry_mut(symbol)?;
        if amount > entry.balance {
            return Err(WalletError::InsufficientBalance {
                symbol: symbol.to_string(),
                required: amount,
                available: entry.balance,
            });
        }

        entry.balance -= amount;

        tracing::debug!(symbol = %symbol, amount = %amount, balance = %entry.balance, "Debited");
        Ok(entry.balance)
    }

    pub fn select_asset(&mut self, symbol: &str) -> Result<()> {
        let symbol = self.entry(symbol)?.symbol.clone();
        tracing::info!(from = %self.selected, to = %symbol, "Selected asset changed");
        self.selected = symbol;
        Ok(())
    }

    pub fn selected(&self) -> Result<&AssetBalance> {
        self.entry(self.selected.as_str())
    }

    pub fn selected_symbol(&self) -> &AssetSymbol {
        &self.selected
    }

    pub fn display_fiat(&self) -> bool {
        self.display_fiat
    }

    pub fn set_display_fiat(&mut self, display_fiat: bool) {
        self.display_fiat = display_fiat;
    }

    pub fn introductory_tip_granted(&self) -> bool {
        self.introductory_tip_granted
    }

    pub(crate) fn mark_introductory_tip_granted(&mut self) {
        self.introductory_tip_granted = true;
    }

    /// Convert between asset units and fiat using `rates`.
    ///
    /// ToFiat rounds to 2 dp, ToAsset to 8 dp. No side effects.
    pub fn convert(
        amount: Decimal,
        symbol: &str,
        direction: ConversionDirection,
        rates: &RateSnapshot,
    ) -> Result<Decimal> {
        let rate = rates.rate(symbol)?;
        match direction {
            ConversionDirection::ToFiat => Ok(to_fiat_precision(amount * rate)),
            ConversionDirection::ToAsset => Ok(to_asset_precision(amount / rate)),
        }
    }

    /// Balance rendered for display: `$12.34` in fiat mode, `0.01234567 ETH` otherwise.
    pub fn display_balance(&self, symbol: &str, rates: &RateSnapshot) -> Result<String> {
        let entry = self.entry(symbol)?;
        if self.display_fiat {
            let fiat = Self::convert(entry.balance, symbol, ConversionDirection::ToFiat, rates)?;
            Ok(format!("${:.*}", FIAT_DECIMALS as usize, fiat))
        } else {
            Ok(format!(
                "{:.*} {}",
                ASSET_DECIMALS as usize, entry.balance, entry.symbol
            ))
        }
    }
}
