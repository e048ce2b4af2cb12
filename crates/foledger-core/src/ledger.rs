//! Session-owned project ledger
//!
//! The ledger is an ordered table of [`ProjectRecord`]s owned by one
//! interactive session. It supports three mutations:
//!
//! - **Add**: validated insert with a ledger-assigned `PROY-NNN` id
//! - **Delete**: removes every record with a given id
//! - **Bulk replace**: swaps the whole table for an editor-produced one
//!
//! Bulk replace only checks the shape of the incoming rows. The
//! `installed <= total` rule applies to Add alone, so an edited table may hold
//! rows that Add would have rejected.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::metrics::{compute_derived, LedgerSnapshot};
use crate::{LedgerError, PricePerMeter, ProjectId, ProjectRecord};

/// Format a sequence number as a project id (`PROY-007`)
pub fn project_id(sequence: usize) -> ProjectId {
    format!("PROY-{sequence:03}")
}

/// Fields collected by the "new project" form
#[derive(Clone, Debug, PartialEq)]
pub struct NewProject {
    pub name: String,
    pub start_date: NaiveDate,
    pub total_meters: f64,
    pub installed_meters: f64,
}

impl NewProject {
    pub fn new(
        name: impl Into<String>,
        start_date: NaiveDate,
        total_meters: f64,
        installed_meters: f64,
    ) -> Self {
        Self {
            name: name.into(),
            start_date,
            total_meters,
            installed_meters,
        }
    }
}

/// A full replacement table as produced by the multi-row editor.
///
/// Rows keep whatever the editor sent: ids may be empty or repeated and meter
/// values are not checked against each other.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplacementTable {
    rows: Vec<ProjectRecord>,
}

impl ReplacementTable {
    pub fn new(rows: Vec<ProjectRecord>) -> Self {
        Self { rows }
    }

    /// Parse a JSON array of rows
    pub fn from_json(json: &str) -> Result<Self, LedgerError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the rows as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, LedgerError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn rows(&self) -> &[ProjectRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<ProjectRecord> {
        self.rows
    }
}

impl FromIterator<ProjectRecord> for ReplacementTable {
    fn from_iter<I: IntoIterator<Item = ProjectRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// The ordered project table of one session
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    records: Vec<ProjectRecord>,
    seeded: bool,
}

impl Ledger {
    /// Create an empty, not yet initialized ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the example records on first use.
    ///
    /// Returns `true` when the seeds were inserted. Later calls are no-ops,
    /// even if the ledger has been emptied since.
    pub fn initialize(&mut self) -> bool {
        if self.seeded {
            return false;
        }
        self.seeded = true;
        self.records.extend(seed_records());
        debug!(records = self.records.len(), "ledger initialized with seed records");
        true
    }

    pub fn records(&self) -> &[ProjectRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ids in ledger order, as offered by the delete selector
    pub fn ids(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.id.as_str()).collect()
    }

    /// Find a record by id
    pub fn get(&self, id: &str) -> Option<&ProjectRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Id the next Add will assign.
    ///
    /// Starts from `len + 1`; if a deletion left that id in use, the next free
    /// sequence number is taken instead.
    pub fn next_id(&self) -> ProjectId {
        let mut sequence = self.records.len() + 1;
        loop {
            let id = project_id(sequence);
            if !self.contains(&id) {
                return id;
            }
            sequence += 1;
        }
    }

    /// Append a new project.
    ///
    /// Fails without touching the ledger when more meters are installed than
    /// contracted. The stored status starts as the computed one.
    pub fn add(&mut self, project: NewProject) -> Result<&ProjectRecord, LedgerError> {
        if project.installed_meters > project.total_meters {
            warn!(
                installed = project.installed_meters,
                total = project.total_meters,
                "rejected project: installed meters exceed total"
            );
            return Err(LedgerError::Validation(
                "installed cannot exceed total".into(),
            ));
        }

        let record = ProjectRecord::new(self.next_id())
            .name(project.name)
            .starting(project.start_date)
            .total_meters(project.total_meters)
            .installed_meters(project.installed_meters);
        let status = record.computed_status();
        let record = record.with_status(status);

        debug!(id = %record.id, name = %record.name, "added project");
        let index = self.records.len();
        self.records.push(record);
        Ok(&self.records[index])
    }

    /// Remove every record with the given id, returning how many were removed
    pub fn delete(&mut self, id: &str) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        let removed = before - self.records.len();
        debug!(id, removed, "delete project");
        removed
    }

    /// Replace the whole table with the editor's rows, verbatim
    pub fn bulk_replace(&mut self, table: ReplacementTable) {
        let rows = table.into_rows();
        debug!(before = self.records.len(), after = rows.len(), "bulk replace");
        self.records = rows;
    }

    /// Current contents in the editor's table shape
    pub fn editor_table(&self) -> ReplacementTable {
        self.records.iter().cloned().collect()
    }

    /// Enriched view of the current contents
    pub fn snapshot(&self, price: PricePerMeter, today: NaiveDate) -> LedgerSnapshot {
        compute_derived(&self.records, price, today)
    }
}

fn seed_records() -> Vec<ProjectRecord> {
    let record = |id: &str, name: &str, (y, m, d): (i32, u32, u32), total: f64, installed: f64| {
        let record = ProjectRecord::new(id)
            .name(name)
            .starting(NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default())
            .total_meters(total)
            .installed_meters(installed);
        let status = record.computed_status();
        record.with_status(status)
    };

    vec![
        record("PROY-001", "Instalación Centro A", (2023, 10, 25), 3000.0, 3000.0),
        record("PROY-002", "Reparación Nodo B", (2023, 10, 26), 1200.0, 600.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProjectStatus;
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
    fn project_id_is_zero_padded() {
        assert_eq!(project_id(1), "PROY-001");
        assert_eq!(project_id(42), "PROY-042");
        assert_eq!(project_id(1234), "PROY-1234");
    }

    #[test]
    fn initialize_seeds_once() {
        let mut ledger = Ledger::new();
        assert!(ledger.is_empty());
        assert!(ledger.initialize());
        assert_eq!(ledger.ids(), vec!["PROY-001", "PROY-002"]);

        assert!(!ledger.initialize());
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn initialize_does_not_reseed_an_emptied_ledger() {
        let mut ledger = seeded();
        ledger.delete("PROY-001");
        ledger.delete("PROY-002");
        assert!(!ledger.initialize());
        assert!(ledger.is_empty());
    }

    #[test]
    fn seed_records_match_examples() {
        let ledger = seeded();
        let first = ledger.get("PROY-001").unwrap();
        assert_eq!(first.name, "Instalación Centro A");
        assert_eq!(first.start_day(), date(2023, 10, 25));
        assert_eq!(first.total_meters, 3000.0);
        assert_eq!(first.installed_meters, 3000.0);
        assert_eq!(first.status, ProjectStatus::Completed);

        let second = ledger.get("PROY-002").unwrap();
        assert_eq!(second.name, "Reparación Nodo B");
        assert_eq!(second.start_day(), date(2023, 10, 26));
        assert_eq!(second.status, ProjectStatus::InProgress);
    }

    #[test]
    fn add_assigns_sequential_id() {
        let mut ledger = seeded();
        let added = ledger
            .add(NewProject::new("Troncal Norte", date(2024, 1, 10), 500.0, 500.0))
            .unwrap();
        assert_eq!(added.id, "PROY-003");
        assert_eq!(added.status, ProjectStatus::Completed);
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.records().last().unwrap().name, "Troncal Norte");
    }

    #[test]
    fn add_rejects_installed_over_total() {
        let mut ledger = seeded();
        let err = ledger
            .add(NewProject::new("Bad", date(2024, 1, 10), 100.0, 101.0))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert_eq!(err.to_string(), "Validation error: installed cannot exceed total");
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.ids(), vec!["PROY-001", "PROY-002"]);
    }

    #[test]
    fn add_after_delete_never_duplicates_an_id() {
        let mut ledger = seeded();
        ledger.delete("PROY-001");
        // len + 1 would be PROY-002, which is still in use
        let added = ledger
            .add(NewProject::new("Nodo C", date(2024, 2, 1), 100.0, 0.0))
            .unwrap();
        assert_eq!(added.id, "PROY-003");
        assert_eq!(ledger.ids(), vec!["PROY-002", "PROY-003"]);
    }

    #[test]
    fn add_after_deleting_last_row_hands_out_its_id_again() {
        let mut ledger = seeded();
        ledger.delete("PROY-002");
        // Known limitation: only live ids are avoided
        assert!(!ledger.contains("PROY-002"));
        let added = ledger
            .add(NewProject::new("Nodo D", date(2024, 2, 1), 100.0, 0.0))
            .unwrap();
        assert_eq!(added.id, "PROY-002");
    }

    #[test]
    fn delete_existing_and_missing() {
        let mut ledger = seeded();
        assert_eq!(ledger.delete("PROY-999"), 0);
        assert_eq!(ledger.len(), 2);

        assert_eq!(ledger.delete("PROY-001"), 1);
        assert_eq!(ledger.ids(), vec!["PROY-002"]);
        assert!(!ledger.contains("PROY-001"));
    }

    #[test]
    fn delete_on_empty_ledger_is_noop() {
        let mut ledger = Ledger::new();
        assert_eq!(ledger.delete("PROY-001"), 0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn delete_removes_all_duplicates() {
        let mut ledger = Ledger::new();
        let dup = ProjectRecord::new("PROY-001").total_meters(1.0);
        ledger.bulk_replace(ReplacementTable::new(vec![dup.clone(), dup]));
        assert_eq!(ledger.delete("PROY-001"), 2);
        assert!(ledger.is_empty());
    }

    #[test]
    fn bulk_replace_is_verbatim_and_unvalidated() {
        let mut ledger = seeded();
        let mut rows = ledger.editor_table().into_rows();
        rows.remove(0);
        rows[0].installed_meters = 5000.0;
        rows[0].status = ProjectStatus::Stopped;
        rows.push(
            ProjectRecord::new("")
                .name("Fila nueva")
                .starting(date(2024, 3, 3))
                .total_meters(-10.0)
                .installed_meters(-5.0),
        );

        ledger.bulk_replace(ReplacementTable::new(rows.clone()));

        assert_eq!(ledger.records(), rows.as_slice());
        assert!(!ledger.contains("PROY-001"));
        assert_eq!(ledger.get("PROY-002").unwrap().installed_meters, 5000.0);
    }

    #[test]
    fn editor_table_round_trips_through_json() {
        let ledger = seeded();
        let json = ledger.editor_table().to_json().unwrap();
        let table = ReplacementTable::from_json(&json).unwrap();
        assert_eq!(table.rows(), ledger.records());
    }

    #[test]
    fn replacement_table_rejects_wrong_shape() {
        let err = ReplacementTable::from_json(r#"[{"name": "x"}]"#).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTable(_)));

        let err = ReplacementTable::from_json(
            r#"[{"name": "x", "start_date": "2024-01-01", "total_meters": "mucho", "installed_meters": 0}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTable(_)));
    }

    #[test]
    fn replacement_table_ignores_derived_columns() {
        let json = r#"[{
            "id": "PROY-001",
            "name": "Centro",
            "start_date": "2023-10-25T00:00:00",
            "total_meters": 3000,
            "installed_meters": 3000,
            "status": "Detenido",
            "progress_pct": 100.0,
            "revenue": 2250000.0
        }]"#;
        let table = ReplacementTable::from_json(json).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].status, ProjectStatus::Stopped);
    }
}
