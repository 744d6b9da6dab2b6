//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::io::Write;

use tally_core::models::{AlertState, NewCategory};
use tally_core::{Database, DateRange, Money, YearMonth};

use crate::cli::TxFilterArgs;
use crate::commands::{self, truncate, TxChanges, TxInput};

const OWNER: i64 = 1;

fn setup_test_db() -> Database {
    let db = Database::in_memory().unwrap();
    db.seed_default_categories().unwrap();
    db
}

fn tx_input(title: &str, amount: &str, date: &str, category: Option<i64>) -> TxInput {
    TxInput {
        title: title.to_string(),
        amount: amount.to_string(),
        kind: "expense".to_string(),
        date: Some(date.to_string()),
        category,
        description: None,
        notes: None,
        every: None,
    }
}

fn create_category(db: &Database, name: &str) -> i64 {
    db.create_category(
        OWNER,
        &NewCategory {
            name: name.to_string(),
            description: None,
            color: None,
            icon: None,
        },
    )
    .unwrap()
    .id
}

// ========== Core Tests ==========

#[test]
fn test_open_db_with_config_override() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(config, "[budgets]\ndefault_alert_threshold = 50").unwrap();

    let db = commands::open_db(&dir.path().join("tally.db"), Some(config.path())).unwrap();
    assert_eq!(db.config().budgets.default_alert_threshold, 50);
}

#[test]
fn test_cmd_init_seeds_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tally.db");

    commands::cmd_init(&path, None).unwrap();
    let db = commands::open_db(&path, None).unwrap();
    assert!(!db.list_categories(OWNER).unwrap().is_empty());

    // Second init is harmless
    assert!(commands::cmd_init(&path, None).is_ok());
}

#[test]
fn test_parse_helpers() {
    assert_eq!(commands::parse_money("12,5").unwrap(), "12.50".parse::<Money>().unwrap());
    assert!(commands::parse_money("abc").is_err());
    assert!(commands::parse_date("2024-02-30").is_err());
    assert_eq!(
        commands::parse_month(Some("2024-03")).unwrap(),
        "2024-03".parse::<YearMonth>().unwrap()
    );
    assert!(commands::parse_kind("refund").is_err());
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a very long category name", 10), "a very ...");
    // Multi-byte names are cut on character boundaries
    assert_eq!(truncate("Café & Bäckerei", 8), "Café ...");
}

// ========== Period Tests ==========

#[test]
fn test_resolve_period_custom_range() {
    let range = commands::resolve_period("this-month", Some("2024-01-01"), Some("2024-01-31"))
        .unwrap()
        .unwrap();
    assert_eq!(range.start.to_string(), "2024-01-01");
    assert_eq!(range.end.to_string(), "2024-01-31");
}

#[test]
fn test_resolve_period_named() {
    let today = commands::today();

    let this_month = commands::resolve_period("this-month", None, None).unwrap().unwrap();
    assert_eq!(this_month.start, YearMonth::of(today).first_day());
    assert_eq!(this_month.end, today);

    let last_month = commands::resolve_period("last-month", None, None).unwrap().unwrap();
    assert!(last_month.end < this_month.start);
    assert_eq!(YearMonth::of(last_month.start), YearMonth::of(last_month.end));

    assert!(commands::resolve_period("all", None, None).unwrap().is_none());
    assert!(commands::resolve_period("fortnight", None, None).is_err());
}

// ========== Category Command Tests ==========

#[test]
fn test_cmd_categories_add_and_edit() {
    let db = setup_test_db();
    commands::cmd_categories_add(&db, OWNER, "Pets", Some("#ff0000"), None, None).unwrap();

    let pets = db
        .list_categories(OWNER)
        .unwrap()
        .into_iter()
        .find(|c| c.name == "Pets")
        .unwrap();
    assert_eq!(pets.color, "#ff0000");

    commands::cmd_categories_edit(&db, OWNER, pets.id, Some("Animals"), None, None).unwrap();
    assert_eq!(db.get_category(OWNER, pets.id).unwrap().unwrap().name, "Animals");

    assert!(commands::cmd_categories_edit(&db, OWNER, pets.id, None, None, None).is_err());
    assert!(commands::cmd_categories_list(&db, OWNER).is_ok());
}

#[test]
fn test_cmd_categories_add_duplicate_fails() {
    let db = setup_test_db();
    let result = commands::cmd_categories_add(&db, OWNER, "groceries", None, None, None);
    assert!(result.is_err());
}

#[test]
fn test_cmd_categories_delete() {
    let db = setup_test_db();
    let id = create_category(&db, "Temp");
    commands::cmd_categories_delete(&db, OWNER, id).unwrap();
    assert!(db.get_category(OWNER, id).unwrap().is_none());
}

// ========== Transaction Command Tests ==========

#[test]
fn test_cmd_tx_add_and_list() {
    let db = setup_test_db();
    let food = create_category(&db, "Food");

    commands::cmd_tx_add(&db, OWNER, tx_input("Lunch", "12.50", "2024-03-10", Some(food))).unwrap();
    let mut salary = tx_input("Salary", "3000", "2024-03-01", None);
    salary.kind = "income".to_string();
    salary.every = Some("monthly".to_string());
    commands::cmd_tx_add(&db, OWNER, salary).unwrap();

    let all = db.list_transactions(OWNER, None).unwrap();
    assert_eq!(all.len(), 2);
    let salary = all.iter().find(|t| t.title == "Salary").unwrap();
    assert!(salary.is_income());
    assert!(salary.recurring);

    let filter = TxFilterArgs {
        search: Some("lunch".to_string()),
        ..TxFilterArgs::default_listing()
    };
    assert!(commands::cmd_tx_list(&db, OWNER, &filter).is_ok());
    assert!(commands::cmd_tx_list(&db, OWNER, &TxFilterArgs::default_listing()).is_ok());
}

#[test]
fn test_cmd_tx_add_rejects_bad_input() {
    let db = setup_test_db();
    assert!(commands::cmd_tx_add(&db, OWNER, tx_input("Bad", "-5", "2024-03-10", None)).is_err());
    assert!(commands::cmd_tx_add(&db, OWNER, tx_input("Bad", "5", "03/10/2024", None)).is_err());

    let mut bad_kind = tx_input("Bad", "5", "2024-03-10", None);
    bad_kind.kind = "transfer".to_string();
    assert!(commands::cmd_tx_add(&db, OWNER, bad_kind).is_err());

    assert!(db.list_transactions(OWNER, None).unwrap().is_empty());
}

#[test]
fn test_cmd_tx_edit_uncategorize() {
    let db = setup_test_db();
    let food = create_category(&db, "Food");
    commands::cmd_tx_add(&db, OWNER, tx_input("Lunch", "12.50", "2024-03-10", Some(food))).unwrap();
    let tx = db.list_transactions(OWNER, None).unwrap().remove(0);

    commands::cmd_tx_edit(
        &db,
        OWNER,
        tx.id,
        TxChanges {
            category: Some(None),
            amount: Some("15.00".to_string()),
            ..Default::default()
        },
    )
    .unwrap();

    let stored = db.get_transaction(OWNER, tx.id).unwrap().unwrap();
    assert_eq!(stored.category_id, None);
    assert!(stored.category.is_none());
    assert_eq!(stored.amount, "15.00".parse::<Money>().unwrap());
}

#[test]
fn test_cmd_tx_delete_other_owner_fails() {
    let db = setup_test_db();
    commands::cmd_tx_add(&db, OWNER, tx_input("Lunch", "12.50", "2024-03-10", None)).unwrap();
    let tx = db.list_transactions(OWNER, None).unwrap().remove(0);

    assert!(commands::cmd_tx_delete(&db, 2, tx.id).is_err());
    commands::cmd_tx_delete(&db, OWNER, tx.id).unwrap();
    assert!(db.list_transactions(OWNER, None).unwrap().is_empty());
}

// ========== Budget Command Tests ==========

#[test]
fn test_cmd_budgets_set_and_alert() {
    let db = setup_test_db();
    commands::cmd_budgets_set(&db, OWNER, "100", Some("2024-03"), None, Some(50)).unwrap();

    commands::cmd_tx_add(&db, OWNER, tx_input("Shoes", "60.00", "2024-03-12", None)).unwrap();

    let budget = db.list_budgets(OWNER, None).unwrap().remove(0);
    assert_eq!(budget.alert_state, AlertState::ThresholdReached);
    assert_eq!(db.list_budget_alerts(OWNER).unwrap().len(), 1);

    assert!(commands::cmd_budgets_list(&db, OWNER, None).is_ok());
    assert!(commands::cmd_budgets_alerts(&db, OWNER).is_ok());

    // Same scope twice is rejected
    assert!(commands::cmd_budgets_set(&db, OWNER, "200", Some("2024-03"), None, None).is_err());
}

#[test]
fn test_cmd_budgets_check_reconciles() {
    let db = setup_test_db();
    commands::cmd_budgets_set(&db, OWNER, "100", Some("2024-03"), None, None).unwrap();

    // Bypass the tracker, as an external import would
    db.conn()
        .unwrap()
        .execute(
            "INSERT INTO transactions (owner_id, title, amount_cents, kind, date) VALUES (?1, 'import', 9000, 'EXPENSE', '2024-03-03')",
            rusqlite::params![OWNER],
        )
        .unwrap();

    commands::cmd_budgets_check(&db, OWNER, Some("2024-03")).unwrap();

    let budget = db.list_budgets(OWNER, None).unwrap().remove(0);
    assert_eq!(budget.spent_amount, "90.00".parse::<Money>().unwrap());
    assert_eq!(budget.alert_state, AlertState::ThresholdReached);
}

#[test]
fn test_cmd_budgets_delete() {
    let db = setup_test_db();
    commands::cmd_budgets_set(&db, OWNER, "100", Some("2024-03"), None, None).unwrap();
    let id = db.list_budgets(OWNER, None).unwrap()[0].id;

    assert!(commands::cmd_budgets_delete(&db, 2, id).is_err());
    commands::cmd_budgets_delete(&db, OWNER, id).unwrap();
    assert!(db.list_budgets(OWNER, None).unwrap().is_empty());
}

// ========== Report Command Tests ==========

fn seed_march(db: &Database) {
    let food = create_category(db, "Food");
    for (day, amount) in [("2024-03-01", "10.00"), ("2024-03-05", "25.00"), ("2024-03-20", "40.00")] {
        commands::cmd_tx_add(db, OWNER, tx_input("Meal", amount, day, Some(food))).unwrap();
    }
    commands::cmd_budgets_set(db, OWNER, "500", Some("2024-03"), None, None).unwrap();
}

#[test]
fn test_cmd_reports_text_and_json() {
    let db = setup_test_db();
    seed_march(&db);
    let march = Some(DateRange::new(
        commands::parse_date("2024-03-01").unwrap(),
        commands::parse_date("2024-03-31").unwrap(),
    ));

    for json in [false, true] {
        assert!(commands::cmd_report_summary(&db, OWNER, None, json).is_ok());
        assert!(commands::cmd_report_monthly(&db, OWNER, Some("2024-03"), json).is_ok());
        assert!(commands::cmd_report_yearly(&db, OWNER, Some(2024), json).is_ok());
        assert!(commands::cmd_report_categories(&db, OWNER, march, json).is_ok());
        assert!(commands::cmd_report_trend(&db, OWNER, march, json).is_ok());
    }
}

#[test]
fn test_cmd_reports_on_empty_db() {
    let db = setup_test_db();
    assert!(commands::cmd_report_summary(&db, OWNER, None, false).is_ok());
    assert!(commands::cmd_report_monthly(&db, OWNER, Some("2024-03"), false).is_ok());
    assert!(commands::cmd_report_yearly(&db, OWNER, Some(2024), false).is_ok());
}

#[test]
fn test_cmd_trend_requires_bounded_period() {
    let db = setup_test_db();
    let result = commands::cmd_report_trend(&db, OWNER, None, false);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("bounded period"));
}
