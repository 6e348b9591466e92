use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::CurrencyCode;
use crate::errors::{DomainError, Result};

/// Classification of a tracked obligation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DebtKind {
    IOwe,
    OwedToMe,
    Personal,
    CreditCard,
    Loan,
    Mortgage,
    Other,
}

/// Who pays whom when a payment is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebtDirection {
    /// The user owes; payments leave the user's wallet.
    Owed,
    /// Owed to the user; payments arrive into the user's wallet.
    Receivable,
}

impl DebtKind {
    /// Everything except `OwedToMe` is an obligation of the user.
    pub fn direction(&self) -> DebtDirection {
        match self {
            DebtKind::OwedToMe => DebtDirection::Receivable,
            _ => DebtDirection::Owed,
        }
    }
}

/// Payoff state. Payment-driven states are a pure function of
/// `paid_amount` vs `amount` ([`DebtStatus::from_amounts`]); `Cancelled`
/// is terminal and reachable only by explicit user action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    Pending,
    PartiallyPaid,
    Paid,
    Cancelled,
}

impl DebtStatus {
    pub fn from_amounts(paid: Decimal, amount: Decimal) -> Self {
        if paid <= Decimal::ZERO {
            DebtStatus::Pending
        } else if paid < amount {
            DebtStatus::PartiallyPaid
        } else {
            DebtStatus::Paid
        }
    }
}

/// A tracked obligation with a payment history and derived payoff status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debt {
    pub id: Uuid,
    pub title: String,
    /// Original obligation, in the debt's own currency.
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub kind: DebtKind,
    pub interest_rate: Decimal,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub person_name: String,
    pub status: DebtStatus,
    /// Monotonically non-decreasing, never above `amount`.
    pub paid_amount: Decimal,
}

impl Debt {
    pub fn remaining(&self) -> Decimal {
        self.amount - self.paid_amount
    }

    /// Days until the due date, negative when overdue. Pure read-side
    /// derivation for an external notification collaborator.
    pub fn days_until_due(&self, today: NaiveDate) -> Option<i64> {
        self.due_date.map(|due| (due - today).num_days())
    }
}

/// Input for creating a debt.
#[derive(Debug, Clone)]
pub struct NewDebt {
    pub title: String,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub kind: DebtKind,
    pub interest_rate: Decimal,
    pub start_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub person_name: String,
}

/// Append-only log entry; a debt's `paid_amount` equals the sum of its
/// payments converted into the debt's currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtPayment {
    pub id: Uuid,
    pub debt_id: Uuid,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_id: Option<Uuid>,
}

/// Owns debts and their payment history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebtTracker {
    debts: Vec<Debt>,
    payments: Vec<DebtPayment>,
}

impl DebtTracker {
    pub fn add(&mut self, data: NewDebt) -> Result<Uuid> {
        if data.title.trim().is_empty() {
            return Err(DomainError::Validation("debt title is empty".into()));
        }
        if data.amount <= Decimal::ZERO {
            return Err(DomainError::Validation(
                "debt amount must be positive".into(),
            ));
        }
        if data.interest_rate < Decimal::ZERO {
            return Err(DomainError::Validation(
                "interest rate must be non-negative".into(),
            ));
        }
        let debt = Debt {
            id: Uuid::new_v4(),
            title: data.title.trim().to_string(),
            amount: data.amount,
            currency: data.currency,
            kind: data.kind,
            interest_rate: data.interest_rate,
            start_date: data.start_date,
            due_date: data.due_date,
            person_name: data.person_name,
            status: DebtStatus::Pending,
            paid_amount: Decimal::ZERO,
        };
        let id = debt.id;
        self.debts.push(debt);
        Ok(id)
    }

    pub fn get(&self, id: Uuid) -> Option<&Debt> {
        self.debts.iter().find(|debt| debt.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Debt> {
        self.debts.iter()
    }

    /// Removes the debt together with its payment log. `cancel` is the
    /// non-destructive alternative.
    pub fn remove(&mut self, id: Uuid) -> Result<()> {
        let before = self.debts.len();
        self.debts.retain(|debt| debt.id != id);
        if self.debts.len() == before {
            return Err(DomainError::DebtNotFound(id));
        }
        self.payments.retain(|payment| payment.debt_id != id);
        Ok(())
    }

    /// Marks the debt cancelled. Terminal: further payments are rejected.
    pub fn cancel(&mut self, id: Uuid) -> Result<()> {
        let debt = self
            .debts
            .iter_mut()
            .find(|debt| debt.id == id)
            .ok_or(DomainError::DebtNotFound(id))?;
        if debt.status == DebtStatus::Cancelled {
            return Err(DomainError::DebtCancelled(id));
        }
        debt.status = DebtStatus::Cancelled;
        Ok(())
    }

    /// Validates a payment without mutating: the debt must exist, accept
    /// payments, and the converted amount must fit the remainder.
    ///
    /// Overpayment policy: reject. A payment pushing `paid_amount` past
    /// `amount` fails; callers pass `remaining()` to settle in full.
    pub fn check_payment(&self, debt_id: Uuid, converted_amount: Decimal) -> Result<()> {
        let debt = self
            .get(debt_id)
            .ok_or(DomainError::DebtNotFound(debt_id))?;
        if debt.status == DebtStatus::Cancelled {
            return Err(DomainError::DebtCancelled(debt_id));
        }
        if converted_amount <= Decimal::ZERO {
            return Err(DomainError::Validation(
                "payment amount must be positive".into(),
            ));
        }
        if converted_amount > debt.remaining() {
            return Err(DomainError::InvariantViolation(format!(
                "payment of {} exceeds outstanding balance {}",
                converted_amount,
                debt.remaining()
            )));
        }
        Ok(())
    }

    /// Appends a payment and advances the payoff state in one step. Call
    /// [`DebtTracker::check_payment`] first; this re-checks and fails
    /// without mutating on violation.
    pub fn apply_payment(
        &mut self,
        payment: DebtPayment,
        converted_amount: Decimal,
    ) -> Result<Uuid> {
        self.check_payment(payment.debt_id, converted_amount)?;
        let debt = self
            .debts
            .iter_mut()
            .find(|debt| debt.id == payment.debt_id)
            .expect("checked above");
        debt.paid_amount += converted_amount;
        debt.status = DebtStatus::from_amounts(debt.paid_amount, debt.amount);
        let id = payment.id;
        self.payments.push(payment);
        Ok(id)
    }

    /// Debts the user owes. Cancelled debts are hidden unless requested.
    pub fn debts_i_owe(&self, include_cancelled: bool) -> Vec<&Debt> {
        self.partition(DebtDirection::Owed, include_cancelled)
    }

    /// Debts owed to the user. Cancelled debts are hidden unless requested.
    pub fn debts_owed_to_me(&self, include_cancelled: bool) -> Vec<&Debt> {
        self.partition(DebtDirection::Receivable, include_cancelled)
    }

    fn partition(&self, direction: DebtDirection, include_cancelled: bool) -> Vec<&Debt> {
        self.debts
            .iter()
            .filter(|debt| debt.kind.direction() == direction)
            .filter(|debt| include_cancelled || debt.status != DebtStatus::Cancelled)
            .collect()
    }

    pub fn payments_for(&self, debt_id: Uuid) -> Vec<&DebtPayment> {
        self.payments
            .iter()
            .filter(|payment| payment.debt_id == debt_id)
            .collect()
    }
}
