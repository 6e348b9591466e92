use chrono::NaiveDate;
use finance_core::currency::{CurrencyCode, RateTable};
use finance_core::ledger::{
    BudgetEntry, Category, DebtKind, Frequency, NewDebt, Transaction, TransactionKind,
};
use finance_core::period::FilterPeriod;
use finance_core::storage::{JsonStorage, StorageBackend};
use finance_core::store::{FinanceState, FinanceStore};
use finance_core::time::FixedClock;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn rates() -> RateTable {
    let mut table = RateTable::new();
    table.set_rate(
        &CurrencyCode::new("EUR"),
        &CurrencyCode::new("USD"),
        dec!(1.25),
    );
    table
}

fn clock() -> Box<FixedClock> {
    Box::new(FixedClock::on_date(date(2025, 6, 20)))
}

fn populated_store() -> FinanceStore {
    let mut store = FinanceStore::with_clock(FinanceState::new(), rates(), clock());
    let wallet = store
        .add_wallet("Main", "USD", dec!(1000), "wallet", "#111111")
        .expect("wallet");
    store
        .add_wallet("Euros", "EUR", dec!(200), "bank", "#222222")
        .expect("eur wallet");

    let txn = Transaction::new(
        date(2025, 6, 10),
        "Supermarket",
        dec!(150),
        CurrencyCode::new("USD"),
        TransactionKind::Expense,
        Category::Groceries,
        wallet,
    );
    store.add_transaction(txn).expect("txn");

    let mut entry = BudgetEntry::new(
        "Groceries",
        dec!(400),
        CurrencyCode::new("USD"),
        TransactionKind::Expense,
        Category::Groceries,
        Frequency::Monthly { day_of_month: 15 },
        date(2025, 1, 1),
    );
    entry.limit = Some(dec!(500));
    store.add_budget_entry(entry).expect("entry");

    let debt = NewDebt {
        title: "Loan".into(),
        amount: dec!(500),
        currency: CurrencyCode::new("USD"),
        kind: DebtKind::IOwe,
        interest_rate: Decimal::ZERO,
        start_date: date(2025, 1, 1),
        due_date: Some(date(2025, 12, 1)),
        person_name: "Alex".into(),
    };
    let debt_id = store.add_debt(debt).expect("debt");
    store
        .record_debt_payment(debt_id, dec!(200), CurrencyCode::new("USD"), date(2025, 3, 1), None)
        .expect("payment");
    store
}

#[test]
fn reload_reconstructs_identical_derived_results() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonStorage::new(Some(dir.path().to_path_buf()), None).expect("storage");

    let store = populated_store();
    storage.save(store.state(), "household").expect("save");

    let reloaded_state = storage.load("household").expect("load");
    let reloaded = FinanceStore::with_clock(reloaded_state, rates(), clock());

    assert_eq!(
        store.wallet_balance_distribution(),
        reloaded.wallet_balance_distribution()
    );
    let entry_id = store.budget_entries().next().expect("entry").id;
    assert_eq!(
        store
            .actual_spending_for_budget(entry_id, FilterPeriod::Month)
            .expect("actual"),
        reloaded
            .actual_spending_for_budget(entry_id, FilterPeriod::Month)
            .expect("actual"),
    );
    let debt_id = store.debts_i_owe(false)[0].id;
    assert_eq!(
        reloaded.debt_by_id(debt_id).expect("debt").paid_amount,
        dec!(200)
    );
    assert_eq!(reloaded.payments_for_debt(debt_id).len(), 1);
    assert_eq!(
        store.settings().primary_display_currency,
        reloaded.settings().primary_display_currency
    );
}

#[test]
fn saving_over_an_existing_snapshot_backs_it_up_first() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonStorage::new(Some(dir.path().to_path_buf()), None).expect("storage");

    let mut store = populated_store();
    storage.save(store.state(), "household").expect("first save");
    assert!(storage.list_backups("household").expect("list").is_empty());

    store
        .add_wallet("Savings", "USD", dec!(50), "bank", "#333333")
        .expect("another wallet");
    storage.save(store.state(), "household").expect("second save");
    assert_eq!(storage.list_backups("household").expect("list").len(), 1);
}

#[test]
fn explicit_backup_and_restore_round_trip() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonStorage::new(Some(dir.path().to_path_buf()), None).expect("storage");

    let mut store = populated_store();
    let balance_before = store.wallet_balance_distribution();
    storage
        .backup(store.state(), "household", Some("before experiment"))
        .expect("backup");

    store
        .add_wallet("Scratch", "USD", dec!(1), "wallet", "#444444")
        .expect("scratch wallet");
    storage.save(store.state(), "household").expect("save");

    let backups = storage.list_backups("household").expect("list");
    let backup_name = backups
        .iter()
        .find(|name| name.contains("before-experiment"))
        .expect("named backup");
    let restored_state = storage.restore("household", backup_name).expect("restore");
    let restored = FinanceStore::with_clock(restored_state, rates(), clock());
    assert_eq!(restored.wallet_balance_distribution(), balance_before);
}

#[test]
fn missing_snapshot_is_a_storage_error() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonStorage::new(Some(dir.path().to_path_buf()), None).expect("storage");
    assert!(storage.load("nothing-here").is_err());
    assert!(storage.restore("nothing-here", "nope.json").is_err());
}
