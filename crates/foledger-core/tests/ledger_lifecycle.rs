//! End-to-end tests for the ledger lifecycle: seed, add, delete, bulk replace

use chrono::NaiveDate;
use foledger_core::{
    format_currency, Ledger, LedgerError, NewProject, PricePerMeter, ProjectStatus, ReplacementTable,
};
use pretty_assertions::assert_eq;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn seeded() -> Ledger {
    let mut ledger = Ledger::new();
    ledger.initialize();
    ledger
}

#[test]
fn seed_then_add_third_project() {
    let mut ledger = seeded();
    let today = date(2023, 10, 26);

    let snapshot = ledger.snapshot(PricePerMeter::DEFAULT, today);
    assert_eq!(snapshot.summary.total_revenue, 2_700_000.0);
    assert_eq!(format_currency(snapshot.summary.total_revenue), "2.700.000,00");
    // PROY-002 started "today", both started this month
    assert_eq!(snapshot.summary.today_revenue, 450_000.0);
    assert_eq!(snapshot.summary.month_revenue, 2_700_000.0);
    assert_eq!(snapshot.summary.annual_projection, 32_400_000.0);

    let added = ledger
        .add(NewProject::new("Troncal Norte", today, 500.0, 500.0))
        .unwrap();
    assert_eq!(added.id, "PROY-003");
    assert_eq!(ledger.len(), 3);

    let snapshot = ledger.snapshot(PricePerMeter::DEFAULT, today);
    assert_eq!(snapshot.rows[2].computed_status, ProjectStatus::Completed);
    assert_eq!(snapshot.summary.total_revenue, 3_075_000.0);
}

#[test]
fn every_valid_add_grows_by_one_with_expected_id() {
    let mut ledger = seeded();
    for (total, installed) in [(1.0, 0.0), (50.0, 50.0), (1200.0, 3.5), (9.0, 8.99)] {
        let old_len = ledger.len();
        let id = ledger
            .add(NewProject::new("p", date(2024, 1, 1), total, installed))
            .unwrap()
            .id
            .clone();
        assert_eq!(ledger.len(), old_len + 1);
        assert_eq!(id, format!("PROY-{:03}", old_len + 1));
    }
}

#[test]
fn rejected_add_leaves_ledger_untouched() {
    let mut ledger = seeded();
    let before = ledger.records().to_vec();

    let result = ledger.add(NewProject::new("Excedido", date(2024, 1, 1), 100.0, 100.5));
    assert!(matches!(result, Err(LedgerError::Validation(_))));
    assert_eq!(ledger.records(), before.as_slice());
}

#[test]
fn delete_then_read_no_longer_shows_id() {
    let mut ledger = seeded();
    assert_eq!(ledger.delete("PROY-002"), 1);
    assert_eq!(ledger.len(), 1);

    let snapshot = ledger.snapshot(PricePerMeter::DEFAULT, date(2024, 1, 1));
    assert!(snapshot.rows.iter().all(|r| r.record.id != "PROY-002"));
    assert_eq!(snapshot.summary.total_revenue, 2_250_000.0);
}

#[test]
fn bulk_replace_without_an_id_removes_it() {
    let mut ledger = seeded();
    let table: ReplacementTable = ledger
        .editor_table()
        .into_rows()
        .into_iter()
        .filter(|r| r.id != "PROY-001")
        .collect();

    ledger.bulk_replace(table);

    assert_eq!(ledger.ids(), vec!["PROY-002"]);
    let snapshot = ledger.snapshot(PricePerMeter::DEFAULT, date(2024, 1, 1));
    assert_eq!(snapshot.rows.len(), 1);
    assert_eq!(snapshot.summary.total_revenue, 450_000.0);
}

#[test]
fn edited_status_survives_while_computed_status_follows_progress() {
    let mut ledger = seeded();
    let json = r#"[
        {"id": "PROY-001", "name": "Instalación Centro A", "start_date": "2023-10-25",
         "total_meters": 3000, "installed_meters": 3000, "status": "Detenido"}
    ]"#;
    ledger.bulk_replace(ReplacementTable::from_json(json).unwrap());

    let snapshot = ledger.snapshot(PricePerMeter::DEFAULT, date(2024, 1, 1));
    assert_eq!(snapshot.rows[0].record.status, ProjectStatus::Stopped);
    assert_eq!(snapshot.rows[0].computed_status, ProjectStatus::Completed);
}

#[test]
fn price_change_only_affects_revenue() {
    let ledger = seeded();
    let cheap = ledger.snapshot(PricePerMeter::new(1.0).unwrap(), date(2024, 1, 1));
    let default = ledger.snapshot(PricePerMeter::DEFAULT, date(2024, 1, 1));

    assert_eq!(cheap.summary.total_revenue, 3600.0);
    assert_eq!(cheap.rows[1].progress_pct, default.rows[1].progress_pct);
    assert_eq!(cheap.summary.total_installed_meters, default.summary.total_installed_meters);
}
