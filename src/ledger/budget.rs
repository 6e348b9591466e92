use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::{CurrencyCode, RateTable};
use crate::errors::{DomainError, Result};
use crate::ledger::transaction::{Category, Transaction, TransactionKind};
use crate::period::{days_in_month, first_of_month, shift_month, DateRange};

/// Recurrence of a budget entry. Monthly entries carry their day of month
/// by construction, so the "day iff monthly" invariant cannot be violated
/// by a well-typed value; the `[1, 31]` bound is still validated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Monthly { day_of_month: u32 },
    Once,
}

/// A recurring or one-off planned income/expense used as a comparison
/// baseline against actual transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetEntry {
    pub id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub kind: TransactionKind,
    pub category: Category,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    /// Spending ceiling; only meaningful for monthly expense entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Decimal>,
    /// When set, only transactions against this wallet count as actuals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_id: Option<Uuid>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl BudgetEntry {
    pub fn new(
        description: impl Into<String>,
        amount: Decimal,
        currency: CurrencyCode,
        kind: TransactionKind,
        category: Category,
        frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            amount,
            currency,
            kind,
            category,
            frequency,
            start_date,
            limit: None,
            wallet_id: None,
            is_active: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(DomainError::Validation(
                "budget entry description is empty".into(),
            ));
        }
        if self.amount < Decimal::ZERO {
            return Err(DomainError::Validation(
                "budget entry amount must be non-negative".into(),
            ));
        }
        if let Frequency::Monthly { day_of_month } = self.frequency {
            if !(1..=31).contains(&day_of_month) {
                return Err(DomainError::Validation(format!(
                    "day_of_month {} is outside [1, 31]",
                    day_of_month
                )));
            }
        }
        if self.limit.is_some()
            && !(self.kind == TransactionKind::Expense
                && matches!(self.frequency, Frequency::Monthly { .. }))
        {
            return Err(DomainError::Validation(
                "limit is only meaningful for monthly expense entries".into(),
            ));
        }
        Ok(())
    }

    /// The single occurrence of this entry inside `range`, if any.
    ///
    /// A monthly entry occurs once per calendar month from `start_date`
    /// onward, on its day of month clamped to the last day of shorter
    /// months. A once entry occurs exactly on `start_date`.
    pub fn occurrence_in(&self, range: &DateRange) -> Option<NaiveDate> {
        match self.frequency {
            Frequency::Once => range.contains(self.start_date).then_some(self.start_date),
            Frequency::Monthly { day_of_month } => {
                let from = self.start_date.max(range.start);
                let mut cursor = first_of_month(from);
                while cursor < range.end {
                    let day = day_of_month.min(days_in_month(cursor.year(), cursor.month()));
                    let occurrence = NaiveDate::from_ymd_opt(cursor.year(), cursor.month(), day)
                        .expect("clamped day is valid");
                    if occurrence >= self.start_date && range.contains(occurrence) {
                        return Some(occurrence);
                    }
                    cursor = shift_month(cursor, 1);
                }
                None
            }
        }
    }

    /// Baseline the actual spend is compared against.
    pub fn planned_amount(&self) -> Decimal {
        self.limit.unwrap_or(self.amount)
    }
}

/// Patch for a budget entry edit; `None` leaves the field untouched. The
/// double options clear `limit`/`wallet_id` with `Some(None)`.
#[derive(Debug, Clone, Default)]
pub struct BudgetEntryPatch {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<CurrencyCode>,
    pub kind: Option<TransactionKind>,
    pub category: Option<Category>,
    pub frequency: Option<Frequency>,
    pub start_date: Option<NaiveDate>,
    pub limit: Option<Option<Decimal>>,
    pub wallet_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
}

/// Actual-vs-planned projection for one entry over one period.
#[derive(Debug, Clone)]
pub struct BudgetStatus {
    pub entry_id: Uuid,
    pub description: String,
    pub occurrence: NaiveDate,
    pub actual: Decimal,
    pub planned: Decimal,
    /// `actual - planned`; positive on an expense entry means overspend.
    pub deviation: Decimal,
}

/// Owns budget entries and computes actual spend/income against them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetProjector {
    entries: Vec<BudgetEntry>,
}

impl BudgetProjector {
    /// Adds a validated entry.
    pub fn add(&mut self, entry: BudgetEntry) -> Result<Uuid> {
        entry.validate()?;
        let id = entry.id;
        self.entries.push(entry);
        Ok(id)
    }

    pub fn get(&self, id: Uuid) -> Option<&BudgetEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Entries included in aggregate views. Deactivated entries stay
    /// individually queryable through [`BudgetProjector::get`].
    pub fn active_entries(&self) -> impl Iterator<Item = &BudgetEntry> {
        self.entries.iter().filter(|entry| entry.is_active)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BudgetEntry> {
        self.entries.iter()
    }

    /// Applies a patch, re-validating the result before committing it.
    pub fn update(&mut self, id: Uuid, patch: BudgetEntryPatch) -> Result<()> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(DomainError::BudgetEntryNotFound(id))?;
        let mut updated = self.entries[index].clone();
        if let Some(description) = patch.description {
            updated.description = description;
        }
        if let Some(amount) = patch.amount {
            updated.amount = amount;
        }
        if let Some(currency) = patch.currency {
            updated.currency = currency;
        }
        if let Some(kind) = patch.kind {
            updated.kind = kind;
        }
        if let Some(category) = patch.category {
            updated.category = category;
        }
        if let Some(frequency) = patch.frequency {
            updated.frequency = frequency;
        }
        if let Some(start_date) = patch.start_date {
            updated.start_date = start_date;
        }
        if let Some(limit) = patch.limit {
            updated.limit = limit;
        }
        if let Some(wallet_id) = patch.wallet_id {
            updated.wallet_id = wallet_id;
        }
        if let Some(is_active) = patch.is_active {
            updated.is_active = is_active;
        }
        updated.validate()?;
        self.entries[index] = updated;
        Ok(())
    }

    /// Hard delete, distinct from deactivating via `is_active`.
    pub fn remove(&mut self, id: Uuid) -> Result<()> {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        if self.entries.len() == before {
            return Err(DomainError::BudgetEntryNotFound(id));
        }
        Ok(())
    }

    /// Sums the transactions matching `entry` (category, kind, optional
    /// wallet scope) dated inside `range`, each converted into the entry's
    /// currency. A missing rate fails the whole sum; a partial total would
    /// be silently wrong.
    pub fn actual_amount(
        &self,
        entry: &BudgetEntry,
        transactions: &[Transaction],
        range: &DateRange,
        rates: &RateTable,
    ) -> Result<Decimal> {
        let mut total = Decimal::ZERO;
        for txn in transactions {
            if txn.kind != entry.kind || txn.category != entry.category {
                continue;
            }
            if let Some(wallet_id) = entry.wallet_id {
                if txn.wallet_id != wallet_id {
                    continue;
                }
            }
            if !range.contains(txn.date) {
                continue;
            }
            total += rates.convert(txn.amount, &txn.currency, &entry.currency)?;
        }
        Ok(total)
    }

    /// `actual - planned`. The sign convention is load-bearing: positive on
    /// an expense entry means overspend.
    pub fn deviation(entry: &BudgetEntry, actual: Decimal) -> Decimal {
        actual - entry.planned_amount()
    }

    /// Projects every active entry with an occurrence inside `range`.
    pub fn overview(
        &self,
        transactions: &[Transaction],
        range: &DateRange,
        rates: &RateTable,
    ) -> Result<Vec<BudgetStatus>> {
        let mut statuses = Vec::new();
        for entry in self.active_entries() {
            let Some(occurrence) = entry.occurrence_in(range) else {
                continue;
            };
            let actual = self.actual_amount(entry, transactions, range, rates)?;
            statuses.push(BudgetStatus {
                entry_id: entry.id,
                description: entry.description.clone(),
                occurrence,
                actual,
                planned: entry.planned_amount(),
                deviation: Self::deviation(entry, actual),
            });
        }
        Ok(statuses)
    }
}
