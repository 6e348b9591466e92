use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::CurrencyCode;

/// Direction of a transaction's effect on its wallet. The stored amount is
/// always non-negative; the sign lives here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// Applies this kind's sign to an amount: income adds, expense subtracts.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            TransactionKind::Income => amount,
            TransactionKind::Expense => -amount,
        }
    }
}

/// Spending/income category. Known categories are closed variants so
/// projections can match exhaustively; anything unrecognized round-trips
/// through `Other` without loss.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Groceries,
    Dining,
    Transport,
    Housing,
    Utilities,
    Health,
    Entertainment,
    Shopping,
    Education,
    Travel,
    Salary,
    Investment,
    Gift,
    DebtPayment,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Groceries => "groceries",
            Category::Dining => "dining",
            Category::Transport => "transport",
            Category::Housing => "housing",
            Category::Utilities => "utilities",
            Category::Health => "health",
            Category::Entertainment => "entertainment",
            Category::Shopping => "shopping",
            Category::Education => "education",
            Category::Travel => "travel",
            Category::Salary => "salary",
            Category::Investment => "investment",
            Category::Gift => "gift",
            Category::DebtPayment => "debt_payment",
            Category::Other(label) => label,
        }
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "groceries" => Category::Groceries,
            "dining" => Category::Dining,
            "transport" => Category::Transport,
            "housing" => Category::Housing,
            "utilities" => Category::Utilities,
            "health" => Category::Health,
            "entertainment" => Category::Entertainment,
            "shopping" => Category::Shopping,
            "education" => Category::Education,
            "travel" => Category::Travel,
            "salary" => Category::Salary,
            "investment" => Category::Investment,
            "gift" => Category::Gift,
            "debt_payment" => Category::DebtPayment,
            _ => Category::Other(value),
        }
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

/// A single dated income or expense event against exactly one wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub date: NaiveDate,
    pub description: String,
    /// Non-negative by invariant; see [`TransactionKind::signed`].
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub kind: TransactionKind,
    pub category: Category,
    pub wallet_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Transaction {
    pub fn new(
        date: NaiveDate,
        description: impl Into<String>,
        amount: Decimal,
        currency: CurrencyCode,
        kind: TransactionKind,
        category: Category,
        wallet_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            description: description.into(),
            amount,
            currency,
            kind,
            category,
            wallet_id,
            notes: None,
        }
    }

    /// Signed effect on the owning wallet, in the transaction's currency.
    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.amount)
    }
}

/// Full replacement values for a transaction edit. The id is immutable;
/// everything else, wallet included, may change in one atomic step.
#[derive(Debug, Clone)]
pub struct TransactionUpdate {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub kind: TransactionKind,
    pub category: Category,
    pub wallet_id: Uuid,
    pub notes: Option<String>,
}

impl TransactionUpdate {
    /// Seeds an update from the current record so callers only change the
    /// fields they care about.
    pub fn from_existing(txn: &Transaction) -> Self {
        Self {
            date: txn.date,
            description: txn.description.clone(),
            amount: txn.amount,
            currency: txn.currency.clone(),
            kind: txn.kind,
            category: txn.category.clone(),
            wallet_id: txn.wallet_id,
            notes: txn.notes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_category_round_trips_through_other() {
        let category = Category::from("pet supplies".to_string());
        assert!(matches!(category, Category::Other(_)));
        assert_eq!(category.as_str(), "pet supplies");

        let known = Category::from("Groceries".to_string());
        assert_eq!(known, Category::Groceries);
    }

    #[test]
    fn signed_amount_follows_kind() {
        let amount = Decimal::new(500, 1);
        assert_eq!(TransactionKind::Income.signed(amount), amount);
        assert_eq!(TransactionKind::Expense.signed(amount), -amount);
    }
}
