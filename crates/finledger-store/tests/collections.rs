// Typed collection persistence over both store backends.

use std::sync::Arc;

use chrono::NaiveDate;
use finledger_core::{Expense, Income, Reminder};
use finledger_store::{Collection, CollectionStore, KeyValueStore, MemoryStore, SqliteStore};
use rusqlite::Connection;

fn expense(category: &str, amount: f64) -> Expense {
    Expense {
        category: category.to_string(),
        amount,
        date: NaiveDate::from_ymd_opt(2025, 3, 1),
    }
}

#[test]
fn collection_keys_are_stable() {
    assert_eq!(Collection::Expenses.key(), "expenses");
    assert_eq!(Collection::Income.key(), "income");
    assert_eq!(Collection::Reminders.key(), "reminders");
}

#[test]
fn empty_store_loads_empty_collections() {
    let store = CollectionStore::new(MemoryStore::new());
    for c in Collection::ALL {
        assert!(store.load::<serde_json::Value>(c).is_empty());
    }
}

#[test]
fn saved_records_come_back_in_order() {
    let store = CollectionStore::new(
        SqliteStore::new(Connection::open_in_memory().unwrap()).unwrap(),
    );
    let expenses = vec![expense("Food", 1500.0), expense("Transport", 300.5), expense("Food", 20.0)];
    store.save(Collection::Expenses, &expenses).unwrap();

    let loaded: Vec<Expense> = store.load(Collection::Expenses);
    assert_eq!(loaded, expenses);
}

#[test]
fn collections_do_not_bleed_into_each_other() {
    let store = CollectionStore::new(MemoryStore::new());
    store
        .save(
            Collection::Income,
            &[Income {
                source: "Salary".into(),
                amount: 250_000.0,
            }],
        )
        .unwrap();

    assert!(store.load::<Expense>(Collection::Expenses).is_empty());
    assert_eq!(store.load::<Income>(Collection::Income).len(), 1);
}

#[test]
fn corrupt_json_loads_as_empty() {
    let kv = Arc::new(MemoryStore::new());
    kv.set("reminders", "{not json").unwrap();

    let store = CollectionStore::new(Arc::clone(&kv));
    assert!(store.load::<Reminder>(Collection::Reminders).is_empty());
}

#[test]
fn null_value_loads_as_empty() {
    let kv = Arc::new(MemoryStore::new());
    kv.set("income", "null").unwrap();

    let store = CollectionStore::new(Arc::clone(&kv));
    assert!(store.load::<Income>(Collection::Income).is_empty());
}

#[test]
fn one_bad_record_does_not_empty_the_collection() {
    let kv = Arc::new(MemoryStore::new());
    kv.set(
        "expenses",
        r#"[
            {"category":"Food","amount":1500,"date":"2025-03-01"},
            {"category":"Rent","amount":90000},
            {"category":"Gift","amount":"lots","date":"2025-03-02"},
            "not a record",
            {"category":"Transport","amount":300,"date":"2025-03-03"}
        ]"#,
    )
    .unwrap();

    let store = CollectionStore::new(Arc::clone(&kv));
    let loaded: Vec<Expense> = store.load(Collection::Expenses);
    let categories: Vec<&str> = loaded.iter().map(|e| e.category.as_str()).collect();
    assert_eq!(categories, vec!["Food", "Rent", "Transport"]);
    assert_eq!(loaded[1].date, None);
}

#[test]
fn null_reminder_fields_keep_the_rest_of_the_collection() {
    let kv = Arc::new(MemoryStore::new());
    kv.set(
        "reminders",
        r#"[
            {"id":"1","text":"pay rent","datetime":"2099-01-01T09:00"},
            {"id":"2","text":"x","datetime":null},
            {"id":3,"text":"wrong id type","datetime":"2099-01-01T09:00"}
        ]"#,
    )
    .unwrap();

    let store = CollectionStore::new(Arc::clone(&kv));
    let reminders: Vec<Reminder> = store.load(Collection::Reminders);
    assert_eq!(reminders.len(), 2);
    assert_eq!(reminders[0].text, "pay rent");
    assert!(reminders[0].target_instant().is_some());
    assert_eq!(reminders[1].id.as_str(), "2");
    assert!(reminders[1].target_instant().is_none());
}

#[test]
fn reminder_records_written_by_older_builds_still_load() {
    let kv = Arc::new(MemoryStore::new());
    kv.set(
        "reminders",
        r#"[{"id":"17000000000004fzyo","text":"Pay rent","datetime":"2030-01-15T08:00"}]"#,
    )
    .unwrap();

    let store = CollectionStore::new(Arc::clone(&kv));
    let reminders: Vec<Reminder> = store.load(Collection::Reminders);
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0].id.as_str(), "17000000000004fzyo");
    assert!(reminders[0].target_instant().is_some());
}

#[test]
fn sqlite_file_persists_across_reopen() {
    let dir = std::env::temp_dir().join(format!("finledger-store-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("reopen.db");
    let _ = std::fs::remove_file(&path);

    {
        let store = CollectionStore::new(SqliteStore::open(&path).unwrap());
        store
            .save(Collection::Expenses, &[expense("Rent", 80_000.0)])
            .unwrap();
    }

    let store = CollectionStore::new(SqliteStore::open(&path).unwrap());
    let loaded: Vec<Expense> = store.load(Collection::Expenses);
    assert_eq!(loaded, vec![expense("Rent", 80_000.0)]);

    let _ = std::fs::remove_dir_all(&dir);
}
