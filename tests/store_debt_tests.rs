use std::cell::Cell;
use std::rc::Rc;

use chrono::NaiveDate;
use finance_core::currency::{CurrencyCode, RateTable};
use finance_core::errors::DomainError;
use finance_core::ledger::{DebtKind, DebtStatus, NewDebt, TransactionKind};
use finance_core::store::{FinanceState, FinanceStore};
use finance_core::time::FixedClock;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn store_on(reference: NaiveDate) -> FinanceStore {
    FinanceStore::with_clock(
        FinanceState::new(),
        RateTable::new(),
        Box::new(FixedClock::on_date(reference)),
    )
}

fn usd_debt(kind: DebtKind, amount: Decimal) -> NewDebt {
    NewDebt {
        title: "Loan from Alex".into(),
        amount,
        currency: CurrencyCode::new("USD"),
        kind,
        interest_rate: Decimal::ZERO,
        start_date: date(2025, 1, 1),
        due_date: Some(date(2025, 9, 1)),
        person_name: "Alex".into(),
    }
}

#[test]
fn payments_accumulate_and_settle_the_debt() {
    let mut store = store_on(date(2025, 6, 20));
    let debt_id = store
        .add_debt(usd_debt(DebtKind::IOwe, dec!(500)))
        .expect("add debt");

    store
        .record_debt_payment(debt_id, dec!(200), CurrencyCode::new("USD"), date(2025, 2, 1), None)
        .expect("first payment");
    assert_eq!(
        store.debt_by_id(debt_id).unwrap().status,
        DebtStatus::PartiallyPaid
    );

    store
        .record_debt_payment(debt_id, dec!(300), CurrencyCode::new("USD"), date(2025, 3, 1), None)
        .expect("final payment");
    let debt = store.debt_by_id(debt_id).unwrap();
    assert_eq!(debt.paid_amount, dec!(500));
    assert_eq!(debt.status, DebtStatus::Paid);
    assert_eq!(store.payments_for_debt(debt_id).len(), 2);

    let err = store
        .record_debt_payment(debt_id, dec!(1), CurrencyCode::new("USD"), date(2025, 4, 1), None)
        .expect_err("overpayment is rejected");
    assert!(matches!(err, DomainError::InvariantViolation(_)));
    assert_eq!(store.debt_by_id(debt_id).unwrap().paid_amount, dec!(500));
}

#[test]
fn wallet_backed_payment_is_one_atomic_transition() {
    let mut store = store_on(date(2025, 6, 20));
    let wallet = store
        .add_wallet("Main", "USD", dec!(1000), "wallet", "#111111")
        .expect("wallet");
    let debt_id = store
        .add_debt(usd_debt(DebtKind::IOwe, dec!(500)))
        .expect("debt");

    let emits = Rc::new(Cell::new(0usize));
    let seen = Rc::clone(&emits);
    store.subscribe(move |_| seen.set(seen.get() + 1));

    store
        .record_debt_payment(
            debt_id,
            dec!(200),
            CurrencyCode::new("USD"),
            date(2025, 6, 20),
            Some(wallet),
        )
        .expect("payment");

    // Payment log, debt state and wallet effect under a single emit.
    assert_eq!(emits.get(), 1);
    assert_eq!(store.wallet_by_id(wallet).unwrap().balance, dec!(800));
    let mirrored = store.transactions_by_wallet(wallet);
    assert_eq!(mirrored.len(), 1);
    assert_eq!(mirrored[0].kind, TransactionKind::Expense);
    assert_eq!(mirrored[0].amount, dec!(200));
}

#[test]
fn receiving_a_receivable_payment_credits_the_wallet() {
    let mut store = store_on(date(2025, 6, 20));
    let wallet = store
        .add_wallet("Main", "USD", dec!(100), "wallet", "#111111")
        .expect("wallet");
    let debt_id = store
        .add_debt(usd_debt(DebtKind::OwedToMe, dec!(300)))
        .expect("receivable");

    store
        .record_debt_payment(
            debt_id,
            dec!(120),
            CurrencyCode::new("USD"),
            date(2025, 6, 20),
            Some(wallet),
        )
        .expect("receipt");

    assert_eq!(store.wallet_by_id(wallet).unwrap().balance, dec!(220));
    let mirrored = store.transactions_by_wallet(wallet);
    assert_eq!(mirrored[0].kind, TransactionKind::Income);
}

#[test]
fn payments_convert_into_the_debt_currency() {
    let mut store = store_on(date(2025, 6, 20));
    let debt_id = store
        .add_debt(usd_debt(DebtKind::IOwe, dec!(500)))
        .expect("usd debt");

    // EUR payment with no rate: rejected before any mutation.
    let err = store
        .record_debt_payment(debt_id, dec!(100), CurrencyCode::new("EUR"), date(2025, 6, 1), None)
        .expect_err("missing rate");
    assert!(matches!(err, DomainError::RateUnavailable { .. }));
    assert_eq!(store.debt_by_id(debt_id).unwrap().paid_amount, Decimal::ZERO);

    store.set_rate(
        &CurrencyCode::new("EUR"),
        &CurrencyCode::new("USD"),
        dec!(1.25),
    );
    store
        .record_debt_payment(debt_id, dec!(100), CurrencyCode::new("EUR"), date(2025, 6, 1), None)
        .expect("converted payment");
    assert_eq!(store.debt_by_id(debt_id).unwrap().paid_amount, dec!(125.00));
}

#[test]
fn cancelled_debts_reject_payments_and_hide_from_partitions() {
    let mut store = store_on(date(2025, 6, 20));
    let debt_id = store
        .add_debt(usd_debt(DebtKind::IOwe, dec!(500)))
        .expect("debt");
    store.cancel_debt(debt_id).expect("cancel");

    let err = store
        .record_debt_payment(debt_id, dec!(50), CurrencyCode::new("USD"), date(2025, 6, 1), None)
        .expect_err("cancelled");
    assert!(matches!(err, DomainError::DebtCancelled(_)));

    assert!(store.debts_i_owe(false).is_empty());
    assert_eq!(store.debts_i_owe(true).len(), 1);
}

#[test]
fn due_reminders_derive_from_the_clock() {
    let mut store = store_on(date(2025, 8, 22));
    let debt_id = store
        .add_debt(usd_debt(DebtKind::IOwe, dec!(500)))
        .expect("debt");
    assert_eq!(store.debt_due_in_days(debt_id).expect("due"), Some(10));

    let mut overdue_store = store_on(date(2025, 9, 3));
    let overdue_id = overdue_store
        .add_debt(usd_debt(DebtKind::IOwe, dec!(500)))
        .expect("debt");
    assert_eq!(
        overdue_store.debt_due_in_days(overdue_id).expect("due"),
        Some(-2)
    );
}

#[test]
fn deleting_a_debt_drops_its_payment_log() {
    let mut store = store_on(date(2025, 6, 20));
    let debt_id = store
        .add_debt(usd_debt(DebtKind::IOwe, dec!(500)))
        .expect("debt");
    store
        .record_debt_payment(debt_id, dec!(100), CurrencyCode::new("USD"), date(2025, 2, 1), None)
        .expect("payment");

    store.delete_debt(debt_id).expect("delete");
    assert!(store.debt_by_id(debt_id).is_none());
    assert!(store.payments_for_debt(debt_id).is_empty());
}
