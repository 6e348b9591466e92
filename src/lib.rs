#![doc(test(attr(deny(warnings))))]

//! Finance Core owns the financial state of a personal-finance tracker:
//! wallets, transactions, recurring budget entries, debts and their payment
//! history. It answers derived questions (converted balances, period-scoped
//! sums, budget deviation, payoff status) by recomputing from the single
//! owned snapshot, never from caches.

pub mod currency;
pub mod errors;
pub mod ledger;
pub mod period;
pub mod storage;
pub mod store;
pub mod time;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Finance Core tracing initialized.");
    });
}
