//! Domain models and owning components: wallets, transactions, budget
//! entries, debts.

pub mod budget;
pub mod debt;
pub mod transaction;
pub mod wallet;

pub use budget::{BudgetEntry, BudgetEntryPatch, BudgetProjector, BudgetStatus, Frequency};
pub use debt::{Debt, DebtDirection, DebtKind, DebtPayment, DebtStatus, DebtTracker, NewDebt};
pub use transaction::{Category, Transaction, TransactionKind, TransactionUpdate};
pub use wallet::{Wallet, WalletLedger, WalletPatch, WalletSlice};
