//! The façade owning the whole financial state snapshot.
//!
//! All mutation funnels through [`FinanceStore`] commands so invariants are
//! enforced at a single choke point. Derived queries recompute from the
//! snapshot on every read; nothing is cached. Commands are all-or-nothing:
//! every failure path returns before the first mutation, and each
//! successful command emits exactly one change notification, composite
//! mutations included.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::{CurrencyCode, RateTable};
use crate::errors::{DomainError, Result};
use crate::ledger::{
    BudgetEntry, BudgetEntryPatch, BudgetProjector, BudgetStatus, Category, Debt, DebtDirection,
    DebtPayment, DebtTracker, NewDebt, Transaction, TransactionKind, TransactionUpdate, Wallet,
    WalletLedger, WalletPatch, WalletSlice,
};
use crate::period::{DateRange, FilterPeriod};
use crate::time::{Clock, SystemClock};

const CURRENT_SCHEMA_VERSION: u8 = 1;

/// Process-wide user preferences, honored at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub primary_display_currency: CurrencyCode,
    pub filter_period: FilterPeriod,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            primary_display_currency: CurrencyCode::default(),
            filter_period: FilterPeriod::default(),
        }
    }
}

/// The complete serializable state snapshot. Reloading a serialized
/// snapshot reconstructs identical derived query results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceState {
    #[serde(default = "FinanceState::schema_version_default")]
    pub schema_version: u8,
    #[serde(default)]
    pub wallets: WalletLedger,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub budgets: BudgetProjector,
    #[serde(default)]
    pub debts: DebtTracker,
    #[serde(default)]
    pub settings: Settings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FinanceState {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            wallets: WalletLedger::default(),
            transactions: Vec::new(),
            budgets: BudgetProjector::default(),
            debts: DebtTracker::default(),
            settings: Settings::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}

impl Default for FinanceState {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by [`FinanceStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn Fn(&FinanceState)>;

/// Command/query surface composing the wallet ledger, budget projector,
/// debt tracker, currency converter and period resolver.
///
/// An explicit instance passed through the call graph; there is no ambient
/// global store.
pub struct FinanceStore {
    state: FinanceState,
    rates: RateTable,
    clock: Box<dyn Clock>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl FinanceStore {
    pub fn new(rates: RateTable) -> Self {
        Self::with_clock(FinanceState::new(), rates, Box::new(SystemClock))
    }

    /// Rebuilds a store from a reloaded snapshot.
    pub fn from_state(state: FinanceState, rates: RateTable) -> Self {
        Self::with_clock(state, rates, Box::new(SystemClock))
    }

    pub fn with_clock(state: FinanceState, rates: RateTable, clock: Box<dyn Clock>) -> Self {
        Self {
            state,
            rates,
            clock,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Read-only view of the owned snapshot, e.g. for persistence.
    pub fn state(&self) -> &FinanceState {
        &self.state
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    // --- subscriptions -----------------------------------------------------

    /// Registers a change listener, invoked once per successful command.
    pub fn subscribe(&mut self, listener: impl Fn(&FinanceState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    fn commit(&mut self) {
        self.state.touch();
        for (_, listener) in &self.subscribers {
            listener(&self.state);
        }
    }

    // --- wallet commands ---------------------------------------------------

    pub fn add_wallet(
        &mut self,
        name: &str,
        currency: &str,
        initial_balance: Decimal,
        icon: &str,
        color: &str,
    ) -> Result<Uuid> {
        let id = self
            .state
            .wallets
            .add(name, currency, initial_balance, icon, color)?;
        tracing::debug!(wallet = %id, "wallet added");
        self.commit();
        Ok(id)
    }

    pub fn update_wallet(&mut self, id: Uuid, patch: WalletPatch) -> Result<()> {
        self.state.wallets.update(id, patch)?;
        self.commit();
        Ok(())
    }

    /// Removes the wallet. Its transactions are left in place; whether to
    /// block, warn or clean up is the UI's call.
    pub fn delete_wallet(&mut self, id: Uuid) -> Result<()> {
        self.state.wallets.remove(id)?;
        tracing::debug!(wallet = %id, "wallet deleted");
        self.commit();
        Ok(())
    }

    pub fn reorder_wallets(&mut self, ordered_ids: &[Uuid]) -> Result<()> {
        self.state.wallets.reorder(ordered_ids)?;
        self.commit();
        Ok(())
    }

    // --- transaction commands ----------------------------------------------

    /// Records a transaction and applies its signed effect to the owning
    /// wallet in the same step.
    pub fn add_transaction(&mut self, txn: Transaction) -> Result<Uuid> {
        if txn.amount < Decimal::ZERO {
            return Err(DomainError::Validation(
                "transaction amount must be non-negative; the sign lives in its kind".into(),
            ));
        }
        if !self.state.wallets.contains(txn.wallet_id) {
            return Err(DomainError::WalletNotFound(txn.wallet_id));
        }
        let id = txn.id;
        let delta = txn.signed_amount();
        let wallet_id = txn.wallet_id;
        self.state.transactions.push(txn);
        self.state
            .wallets
            .apply_delta(wallet_id, delta)
            .expect("wallet existence checked above");
        tracing::debug!(transaction = %id, wallet = %wallet_id, "transaction added");
        self.commit();
        Ok(id)
    }

    /// Edits a transaction atomically: the old effect is reversed on the
    /// old wallet and the new effect applied to the (possibly different)
    /// new wallet with no observable intermediate state.
    pub fn update_transaction(&mut self, id: Uuid, update: TransactionUpdate) -> Result<()> {
        if update.amount < Decimal::ZERO {
            return Err(DomainError::Validation(
                "transaction amount must be non-negative; the sign lives in its kind".into(),
            ));
        }
        let index = self
            .state
            .transactions
            .iter()
            .position(|txn| txn.id == id)
            .ok_or(DomainError::TransactionNotFound(id))?;
        let old_wallet = self.state.transactions[index].wallet_id;
        let old_effect = self.state.transactions[index].signed_amount();
        if !self.state.wallets.contains(old_wallet) {
            return Err(DomainError::WalletNotFound(old_wallet));
        }
        if !self.state.wallets.contains(update.wallet_id) {
            return Err(DomainError::WalletNotFound(update.wallet_id));
        }

        let new_wallet = update.wallet_id;
        let new_effect = update.kind.signed(update.amount);
        {
            let txn = &mut self.state.transactions[index];
            txn.date = update.date;
            txn.description = update.description;
            txn.amount = update.amount;
            txn.currency = update.currency;
            txn.kind = update.kind;
            txn.category = update.category;
            txn.wallet_id = update.wallet_id;
            txn.notes = update.notes;
        }
        self.state
            .wallets
            .apply_delta(old_wallet, -old_effect)
            .expect("old wallet checked above");
        self.state
            .wallets
            .apply_delta(new_wallet, new_effect)
            .expect("new wallet checked above");
        tracing::debug!(transaction = %id, "transaction updated");
        self.commit();
        Ok(())
    }

    /// Deletes a transaction, reversing its effect on the owning wallet.
    /// Transactions orphaned by a wallet deletion are removed without a
    /// reversal; there is no balance left to correct.
    pub fn delete_transaction(&mut self, id: Uuid) -> Result<()> {
        let index = self
            .state
            .transactions
            .iter()
            .position(|txn| txn.id == id)
            .ok_or(DomainError::TransactionNotFound(id))?;
        let wallet_id = self.state.transactions[index].wallet_id;
        let effect = self.state.transactions[index].signed_amount();
        self.state.transactions.remove(index);
        if self.state.wallets.contains(wallet_id) {
            self.state
                .wallets
                .apply_delta(wallet_id, -effect)
                .expect("wallet presence checked above");
        }
        tracing::debug!(transaction = %id, "transaction deleted");
        self.commit();
        Ok(())
    }

    // --- budget commands ---------------------------------------------------

    pub fn add_budget_entry(&mut self, entry: BudgetEntry) -> Result<Uuid> {
        let id = self.state.budgets.add(entry)?;
        self.commit();
        Ok(id)
    }

    pub fn update_budget_entry(&mut self, id: Uuid, patch: BudgetEntryPatch) -> Result<()> {
        self.state.budgets.update(id, patch)?;
        self.commit();
        Ok(())
    }

    pub fn delete_budget_entry(&mut self, id: Uuid) -> Result<()> {
        self.state.budgets.remove(id)?;
        self.commit();
        Ok(())
    }

    // --- debt commands -----------------------------------------------------

    pub fn add_debt(&mut self, data: NewDebt) -> Result<Uuid> {
        let id = self.state.debts.add(data)?;
        tracing::debug!(debt = %id, "debt added");
        self.commit();
        Ok(id)
    }

    pub fn delete_debt(&mut self, id: Uuid) -> Result<()> {
        self.state.debts.remove(id)?;
        self.commit();
        Ok(())
    }

    pub fn cancel_debt(&mut self, id: Uuid) -> Result<()> {
        self.state.debts.cancel(id)?;
        self.commit();
        Ok(())
    }

    /// Records a debt payment, converted into the debt's currency.
    ///
    /// With a wallet attached, the payment is mirrored as a wallet
    /// transaction in the same logical state transition: an expense for
    /// debts the user owes, an income for debts owed to the user. Both the
    /// log append and the wallet effect happen atomically under a single
    /// notification.
    pub fn record_debt_payment(
        &mut self,
        debt_id: Uuid,
        amount: Decimal,
        currency: CurrencyCode,
        date: NaiveDate,
        wallet_id: Option<Uuid>,
    ) -> Result<Uuid> {
        let (debt_currency, debt_title, direction) = {
            let debt = self
                .state
                .debts
                .get(debt_id)
                .ok_or(DomainError::DebtNotFound(debt_id))?;
            (
                debt.currency.clone(),
                debt.title.clone(),
                debt.kind.direction(),
            )
        };
        let converted = self.rates.convert(amount, &currency, &debt_currency)?;
        self.state.debts.check_payment(debt_id, converted)?;
        if let Some(wallet) = wallet_id {
            if !self.state.wallets.contains(wallet) {
                return Err(DomainError::WalletNotFound(wallet));
            }
        }

        let payment = DebtPayment {
            id: Uuid::new_v4(),
            debt_id,
            amount,
            currency: currency.clone(),
            date,
            wallet_id,
        };
        let payment_id = self
            .state
            .debts
            .apply_payment(payment, converted)
            .expect("payment checked above");

        if let Some(wallet) = wallet_id {
            let kind = match direction {
                DebtDirection::Owed => TransactionKind::Expense,
                DebtDirection::Receivable => TransactionKind::Income,
            };
            let txn = Transaction::new(
                date,
                format!("Debt payment: {}", debt_title),
                amount,
                currency,
                kind,
                Category::DebtPayment,
                wallet,
            );
            let delta = txn.signed_amount();
            self.state.transactions.push(txn);
            self.state
                .wallets
                .apply_delta(wallet, delta)
                .expect("wallet checked above");
        }
        tracing::debug!(debt = %debt_id, payment = %payment_id, "debt payment recorded");
        self.commit();
        Ok(payment_id)
    }

    // --- settings and rates ------------------------------------------------

    pub fn set_primary_display_currency(&mut self, currency: &str) -> Result<()> {
        let code = CurrencyCode::parse(currency)?;
        self.state.settings.primary_display_currency = code;
        self.commit();
        Ok(())
    }

    pub fn set_filter_period(&mut self, period: FilterPeriod) {
        self.state.settings.filter_period = period;
        self.commit();
    }

    pub fn set_rate(&mut self, from: &CurrencyCode, to: &CurrencyCode, rate: Decimal) {
        self.rates.set_rate(from, to, rate);
        self.commit();
    }

    /// Swaps in a refreshed rate table from the external rate boundary.
    pub fn replace_rates(
        &mut self,
        rates: impl IntoIterator<Item = (CurrencyCode, CurrencyCode, Decimal)>,
    ) {
        self.rates.replace_all(rates);
        self.commit();
    }

    // --- queries -----------------------------------------------------------

    pub fn wallet_by_id(&self, id: Uuid) -> Option<&Wallet> {
        self.state.wallets.get(id)
    }

    pub fn wallets(&self) -> impl Iterator<Item = &Wallet> {
        self.state.wallets.iter()
    }

    /// Converted balance per wallet in the *current* display currency,
    /// sorted descending.
    pub fn wallet_balance_distribution(&self) -> Vec<WalletSlice> {
        self.state
            .wallets
            .distribution(&self.state.settings.primary_display_currency, &self.rates)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.state.transactions
    }

    pub fn transactions_by_wallet(&self, wallet_id: Uuid) -> Vec<&Transaction> {
        self.state
            .transactions
            .iter()
            .filter(|txn| txn.wallet_id == wallet_id)
            .collect()
    }

    pub fn transactions_by_date(&self, date: NaiveDate) -> Vec<&Transaction> {
        self.state
            .transactions
            .iter()
            .filter(|txn| txn.date == date)
            .collect()
    }

    pub fn transactions_by_wallet_name(&self, name: &str) -> Vec<&Transaction> {
        match self.state.wallets.by_name(name) {
            Some(wallet) => self.transactions_by_wallet(wallet.id),
            None => Vec::new(),
        }
    }

    /// Resolves a named period against today's date.
    pub fn date_range_for_period(&self, period: FilterPeriod) -> DateRange {
        period.resolve(self.clock.today())
    }

    /// The interval selected by the user's current filter period.
    pub fn current_period_range(&self) -> DateRange {
        self.date_range_for_period(self.state.settings.filter_period)
    }

    pub fn budget_entry(&self, id: Uuid) -> Option<&BudgetEntry> {
        self.state.budgets.get(id)
    }

    pub fn budget_entries(&self) -> impl Iterator<Item = &BudgetEntry> {
        self.state.budgets.iter()
    }

    /// Actual spend/income against the entry over the period, in the
    /// entry's currency.
    pub fn actual_spending_for_budget(
        &self,
        entry_id: Uuid,
        period: FilterPeriod,
    ) -> Result<Decimal> {
        let entry = self
            .state
            .budgets
            .get(entry_id)
            .ok_or(DomainError::BudgetEntryNotFound(entry_id))?;
        let range = self.date_range_for_period(period);
        self.state
            .budgets
            .actual_amount(entry, &self.state.transactions, &range, &self.rates)
    }

    /// `actual - (limit ?? amount)`; positive on an expense entry means
    /// overspend.
    pub fn budget_deviation(&self, entry_id: Uuid, period: FilterPeriod) -> Result<Decimal> {
        let entry = self
            .state
            .budgets
            .get(entry_id)
            .ok_or(DomainError::BudgetEntryNotFound(entry_id))?;
        let actual = self.actual_spending_for_budget(entry_id, period)?;
        Ok(BudgetProjector::deviation(entry, actual))
    }

    /// Actual-vs-planned for every active entry occurring in the period.
    pub fn budget_overview(&self, period: FilterPeriod) -> Result<Vec<BudgetStatus>> {
        let range = self.date_range_for_period(period);
        self.state
            .budgets
            .overview(&self.state.transactions, &range, &self.rates)
    }

    pub fn debt_by_id(&self, id: Uuid) -> Option<&Debt> {
        self.state.debts.get(id)
    }

    pub fn debts_i_owe(&self, include_cancelled: bool) -> Vec<&Debt> {
        self.state.debts.debts_i_owe(include_cancelled)
    }

    pub fn debts_owed_to_me(&self, include_cancelled: bool) -> Vec<&Debt> {
        self.state.debts.debts_owed_to_me(include_cancelled)
    }

    pub fn payments_for_debt(&self, debt_id: Uuid) -> Vec<&DebtPayment> {
        self.state.debts.payments_for(debt_id)
    }

    /// Days until the debt's due date as of today; negative when overdue.
    pub fn debt_due_in_days(&self, debt_id: Uuid) -> Result<Option<i64>> {
        let debt = self
            .state
            .debts
            .get(debt_id)
            .ok_or(DomainError::DebtNotFound(debt_id))?;
        Ok(debt.days_until_due(self.clock.today()))
    }

    /// Plain-text financial context handed to an external assistant
    /// collaborator. The engine never ingests anything back.
    pub fn context_summary(&self) -> String {
        let display = &self.state.settings.primary_display_currency;
        let mut converted_total = Decimal::ZERO;
        let mut unconverted = 0usize;
        for slice in self.wallet_balance_distribution() {
            if slice.converted {
                converted_total += slice.value;
            } else {
                unconverted += 1;
            }
        }
        let open_debts = self
            .state
            .debts
            .iter()
            .filter(|debt| {
                debt.status != crate::ledger::DebtStatus::Cancelled
                    && debt.status != crate::ledger::DebtStatus::Paid
            })
            .count();
        let active_budgets = self.state.budgets.active_entries().count();
        let mut summary = format!(
            "{} wallets totaling {} {} across {} transactions; {} active budget entries; {} open debts.",
            self.state.wallets.len(),
            converted_total,
            display,
            self.state.transactions.len(),
            active_budgets,
            open_debts,
        );
        if unconverted > 0 {
            summary.push_str(&format!(
                " {} wallet(s) excluded from the total: no rate into {}.",
                unconverted, display
            ));
        }
        summary
    }
}
