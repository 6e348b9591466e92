use std::result::Result as StdResult;

use thiserror::Error;
use uuid::Uuid;

/// Unified error type for the domain engine and its storage boundary.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Wallet not found: {0}")]
    WalletNotFound(Uuid),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),
    #[error("Budget entry not found: {0}")]
    BudgetEntryNotFound(Uuid),
    #[error("Debt not found: {0}")]
    DebtNotFound(Uuid),
    #[error("No exchange rate available for {from} -> {to}")]
    RateUnavailable { from: String, to: String },
    #[error("Debt is cancelled and no longer accepts payments: {0}")]
    DebtCancelled(Uuid),
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
    #[error("Persistence error: {0}")]
    Storage(String),
}

pub type Result<T> = StdResult<T, DomainError>;

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Storage(err.to_string())
    }
}
