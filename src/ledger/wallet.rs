use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::{CurrencyCode, RateTable};
use crate::errors::{DomainError, Result};

/// A named money-holding account with its own currency and running balance.
///
/// The balance is always expressed in the wallet's own currency and equals
/// the initial balance plus the signed effects of every applied transaction;
/// it is never itself converted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Wallet {
    pub id: Uuid,
    pub name: String,
    pub currency: CurrencyCode,
    pub balance: Decimal,
    #[serde(default)]
    pub is_default: bool,
    pub icon: String,
    pub color: String,
}

impl Wallet {
    pub fn new(
        name: impl Into<String>,
        currency: CurrencyCode,
        initial_balance: Decimal,
        icon: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            currency,
            balance: initial_balance,
            is_default: false,
            icon: icon.into(),
            color: color.into(),
        }
    }
}

/// Partial wallet update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct WalletPatch {
    pub name: Option<String>,
    pub currency: Option<CurrencyCode>,
    pub balance: Option<Decimal>,
    pub is_default: Option<bool>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

/// One slice of the converted balance distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletSlice {
    pub wallet_id: Uuid,
    pub name: String,
    pub value: Decimal,
    /// Currency `value` is expressed in: the display currency when a rate
    /// was available, otherwise the wallet's own.
    pub currency: CurrencyCode,
    pub fill: String,
    /// False when no rate was known and the original amount is shown
    /// un-converted.
    pub converted: bool,
}

/// Owns the wallet collection. Vec order is the display order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletLedger {
    wallets: Vec<Wallet>,
}

impl WalletLedger {
    /// Adds a wallet after validating its name and currency code.
    pub fn add(
        &mut self,
        name: &str,
        currency: &str,
        initial_balance: Decimal,
        icon: &str,
        color: &str,
    ) -> Result<Uuid> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::Validation("wallet name is empty".into()));
        }
        let code = CurrencyCode::parse(currency)?;
        let mut wallet = Wallet::new(trimmed, code, initial_balance, icon, color);
        // First wallet becomes the default one.
        wallet.is_default = self.wallets.is_empty();
        let id = wallet.id;
        self.wallets.push(wallet);
        Ok(id)
    }

    pub fn get(&self, id: Uuid) -> Option<&Wallet> {
        self.wallets.iter().find(|wallet| wallet.id == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Wallet> {
        self.wallets.iter_mut().find(|wallet| wallet.id == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    pub fn by_name(&self, name: &str) -> Option<&Wallet> {
        let normalized = name.trim().to_lowercase();
        self.wallets
            .iter()
            .find(|wallet| wallet.name.trim().to_lowercase() == normalized)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Wallet> {
        self.wallets.iter()
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    /// Internal balance primitive: adds a signed delta in the transaction's
    /// own currency. All transaction apply/reverse paths funnel through here.
    pub(crate) fn apply_delta(&mut self, id: Uuid, delta: Decimal) -> Result<()> {
        let wallet = self
            .get_mut(id)
            .ok_or(DomainError::WalletNotFound(id))?;
        wallet.balance += delta;
        Ok(())
    }

    /// Applies a partial update.
    ///
    /// Known limitation awaiting product clarification: changing `currency`
    /// only relabels the wallet going forward; past transactions keep the
    /// currency they were recorded in and the balance is not converted.
    pub fn update(&mut self, id: Uuid, patch: WalletPatch) -> Result<()> {
        if !self.contains(id) {
            return Err(DomainError::WalletNotFound(id));
        }
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(DomainError::Validation("wallet name is empty".into()));
            }
        }
        // Only one wallet may carry the default flag.
        if patch.is_default == Some(true) {
            for wallet in &mut self.wallets {
                wallet.is_default = false;
            }
        }
        let wallet = self.get_mut(id).expect("existence checked above");
        if let Some(name) = patch.name {
            wallet.name = name.trim().to_string();
        }
        if let Some(currency) = patch.currency {
            wallet.currency = currency;
        }
        if let Some(balance) = patch.balance {
            wallet.balance = balance;
        }
        if let Some(is_default) = patch.is_default {
            wallet.is_default = is_default;
        }
        if let Some(icon) = patch.icon {
            wallet.icon = icon;
        }
        if let Some(color) = patch.color {
            wallet.color = color;
        }
        Ok(())
    }

    /// Removes the wallet. Whether referencing transactions are blocked,
    /// orphaned or cascaded is the caller's decision, not enforced here.
    pub fn remove(&mut self, id: Uuid) -> Result<Wallet> {
        let index = self
            .wallets
            .iter()
            .position(|wallet| wallet.id == id)
            .ok_or(DomainError::WalletNotFound(id))?;
        Ok(self.wallets.remove(index))
    }

    /// Reorders the display order. `ordered_ids` must be a permutation of
    /// the current wallet ids; no financial effect.
    pub fn reorder(&mut self, ordered_ids: &[Uuid]) -> Result<()> {
        if ordered_ids.len() != self.wallets.len() {
            return Err(DomainError::Validation(
                "reorder list does not match wallet count".into(),
            ));
        }
        let mut deduped: Vec<Uuid> = ordered_ids.to_vec();
        deduped.sort();
        deduped.dedup();
        if deduped.len() != ordered_ids.len() {
            return Err(DomainError::Validation(
                "reorder list contains duplicate ids".into(),
            ));
        }
        let mut reordered = Vec::with_capacity(self.wallets.len());
        for id in ordered_ids {
            let index = self
                .wallets
                .iter()
                .position(|wallet| wallet.id == *id)
                .ok_or(DomainError::WalletNotFound(*id))?;
            reordered.push(self.wallets[index].clone());
        }
        self.wallets = reordered;
        Ok(())
    }

    /// Converted balance per wallet, sorted descending by value.
    ///
    /// The single place wallet balances cross currencies; conversion goes
    /// through [`RateTable::convert`]. A missing rate yields the original
    /// amount flagged `converted: false` instead of failing the aggregate.
    pub fn distribution(&self, display: &CurrencyCode, rates: &RateTable) -> Vec<WalletSlice> {
        let mut slices: Vec<WalletSlice> = self
            .wallets
            .iter()
            .map(|wallet| match rates.convert(wallet.balance, &wallet.currency, display) {
                Ok(value) => WalletSlice {
                    wallet_id: wallet.id,
                    name: wallet.name.clone(),
                    value,
                    currency: display.clone(),
                    fill: wallet.color.clone(),
                    converted: true,
                },
                Err(_) => WalletSlice {
                    wallet_id: wallet.id,
                    name: wallet.name.clone(),
                    value: wallet.balance,
                    currency: wallet.currency.clone(),
                    fill: wallet.color.clone(),
                    converted: false,
                },
            })
            .collect();
        slices.sort_by(|a, b| b.value.cmp(&a.value));
        slices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ledger_with_two_wallets() -> (WalletLedger, Uuid, Uuid) {
        let mut ledger = WalletLedger::default();
        let cash = ledger
            .add("Cash", "USD", dec!(100), "wallet", "#336699")
            .expect("add cash");
        let bank = ledger
            .add("Bank", "EUR", dec!(200), "bank", "#993366")
            .expect("add bank");
        (ledger, cash, bank)
    }

    #[test]
    fn first_wallet_becomes_default() {
        let (ledger, cash, bank) = ledger_with_two_wallets();
        assert!(ledger.get(cash).unwrap().is_default);
        assert!(!ledger.get(bank).unwrap().is_default);
    }

    #[test]
    fn add_rejects_blank_name_and_bad_currency() {
        let mut ledger = WalletLedger::default();
        assert!(ledger.add("  ", "USD", dec!(0), "w", "#fff").is_err());
        assert!(ledger.add("Cash", "DOLLARS", dec!(0), "w", "#fff").is_err());
    }

    #[test]
    fn reorder_requires_a_permutation() {
        let (mut ledger, cash, bank) = ledger_with_two_wallets();
        ledger.reorder(&[bank, cash]).expect("valid permutation");
        let order: Vec<Uuid> = ledger.iter().map(|w| w.id).collect();
        assert_eq!(order, vec![bank, cash]);

        assert!(ledger.reorder(&[bank]).is_err());
        assert!(ledger.reorder(&[bank, bank]).is_err());
    }

    #[test]
    fn distribution_flags_unconvertible_wallets() {
        let (ledger, _, bank) = ledger_with_two_wallets();
        let mut rates = RateTable::new();
        rates.set_rate(
            &CurrencyCode::new("EUR"),
            &CurrencyCode::new("USD"),
            dec!(1.25),
        );
        let display = CurrencyCode::new("USD");
        let slices = ledger.distribution(&display, &rates);
        assert_eq!(slices.len(), 2);
        // EUR 200 converts to USD 250 and sorts first.
        assert_eq!(slices[0].wallet_id, bank);
        assert_eq!(slices[0].value, dec!(250.00));
        assert!(slices[0].converted);

        let empty = RateTable::new();
        let slices = ledger.distribution(&display, &empty);
        let eur_slice = slices.iter().find(|s| s.wallet_id == bank).unwrap();
        assert!(!eur_slice.converted);
        assert_eq!(eur_slice.value, dec!(200));
        assert_eq!(eur_slice.currency, CurrencyCode::new("EUR"));
    }
}
