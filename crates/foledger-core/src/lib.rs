//! # foledger-core
//!
//! Core domain model for the foledger fiber-optic installation tracker.
//!
//! This crate provides:
//! - Domain types: `ProjectRecord`, `ProjectStatus`, `PricePerMeter`
//! - The session-owned `Ledger` with its add / delete / bulk-replace lifecycle
//! - Derived metrics (`compute_derived`) producing a `LedgerSnapshot`
//! - Currency and meter formatting helpers
//! - The `Renderer` trait implemented by the export and chart backends
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use foledger_core::{Ledger, NewProject, PricePerMeter};
//!
//! let mut ledger = Ledger::new();
//! ledger.initialize();
//!
//! let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let added = ledger
//!     .add(NewProject::new("Troncal Norte", start, 500.0, 500.0))
//!     .unwrap();
//! assert_eq!(added.id, "PROY-003");
//!
//! let snapshot = ledger.snapshot(PricePerMeter::DEFAULT, start);
//! assert_eq!(snapshot.rows.len(), 3);
//! ```

pub mod format;
pub mod ledger;
pub mod metrics;

pub use format::{format_currency, format_meters};
pub use ledger::{project_id, Ledger, NewProject, ReplacementTable};
pub use metrics::{compute_derived, EnrichedRow, LedgerSnapshot, RevenueSummary, DISPLAY_COLUMNS};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Identifier of a project record (`PROY-NNN` when assigned by the ledger)
pub type ProjectId = String;

// ============================================================================
// Pricing
// ============================================================================

/// Revenue earned per installed meter of fiber
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PricePerMeter(f64);

impl PricePerMeter {
    /// Price used when nothing else is configured
    pub const DEFAULT: Self = Self(750.0);

    /// Create a price, rejecting negative and non-finite values
    pub fn new(value: f64) -> Result<Self, LedgerError> {
        if !value.is_finite() || value < 0.0 {
            return Err(LedgerError::InvalidPrice(value.to_string()));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for PricePerMeter {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromStr for PricePerMeter {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| LedgerError::InvalidPrice(s.to_string()))?;
        Self::new(value)
    }
}

impl std::fmt::Display for PricePerMeter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Project Status
// ============================================================================

/// Installation status of a project.
///
/// The serialized form uses the labels shown in the editor's status selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    #[serde(rename = "En Progreso", alias = "InProgress")]
    InProgress,
    #[serde(rename = "Completado", alias = "Completed")]
    Completed,
    #[serde(rename = "Detenido", alias = "Stopped")]
    Stopped,
}

impl ProjectStatus {
    /// Every selectable status, in selector order
    pub const ALL: [ProjectStatus; 3] = [
        ProjectStatus::InProgress,
        ProjectStatus::Completed,
        ProjectStatus::Stopped,
    ];

    /// Display label used in tables, exports and charts
    pub fn label(self) -> &'static str {
        match self {
            ProjectStatus::InProgress => "En Progreso",
            ProjectStatus::Completed => "Completado",
            ProjectStatus::Stopped => "Detenido",
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Project Record
// ============================================================================

/// One tracked fiber-optic installation project.
///
/// Only stored fields live here; progress, revenue and computed status are
/// derived on every read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Record identifier. Rows coming from an editor may leave it empty.
    #[serde(default)]
    pub id: ProjectId,
    /// Free-text project name
    pub name: String,
    /// Start of the installation work
    #[serde(with = "start_date_format")]
    pub start_date: NaiveDateTime,
    /// Contracted scope in meters
    pub total_meters: f64,
    /// Meters installed so far
    pub installed_meters: f64,
    /// User-editable status, independent of the computed one
    #[serde(default)]
    pub status: ProjectStatus,
}

impl ProjectRecord {
    /// Create an empty record with the given ID
    pub fn new(id: impl Into<ProjectId>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            start_date: NaiveDateTime::default(),
            total_meters: 0.0,
            installed_meters: 0.0,
            status: ProjectStatus::default(),
        }
    }

    /// Set the project name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the start date (midnight)
    pub fn starting(mut self, date: NaiveDate) -> Self {
        self.start_date = date.and_time(NaiveTime::default());
        self
    }

    /// Set the contracted meters
    pub fn total_meters(mut self, meters: f64) -> Self {
        self.total_meters = meters;
        self
    }

    /// Set the installed meters
    pub fn installed_meters(mut self, meters: f64) -> Self {
        self.installed_meters = meters;
        self
    }

    /// Set the stored status
    pub fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = status;
        self
    }

    /// Calendar day the project started on
    pub fn start_day(&self) -> NaiveDate {
        self.start_date.date()
    }

    /// Installed share of the contracted scope, in percent.
    ///
    /// A zero scope (reachable through unchecked edits) reports 0 instead of
    /// dividing by zero.
    pub fn progress_pct(&self) -> f64 {
        if self.total_meters == 0.0 {
            return 0.0;
        }
        self.installed_meters / self.total_meters * 100.0
    }

    /// Status derived from progress: complete at 100% or more
    pub fn computed_status(&self) -> ProjectStatus {
        if self.progress_pct() >= 100.0 {
            ProjectStatus::Completed
        } else {
            ProjectStatus::InProgress
        }
    }

    /// Revenue earned so far at the given price
    pub fn revenue(&self, price: PricePerMeter) -> f64 {
        self.installed_meters * price.value()
    }
}

/// Parse a start date written either as `YYYY-MM-DD` or as an ISO date-time
pub fn parse_start_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::default()))
        })
}

mod start_date_format {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_start_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid start date: {raw}")))
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Output rendering of a ledger snapshot
pub trait Renderer {
    type Output;

    /// Render the snapshot to the output format
    fn render(&self, snapshot: &LedgerSnapshot) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Ledger error
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid price per meter: {0} (must be a number >= 0)")]
    InvalidPrice(String),

    #[error("Invalid replacement table: {0}")]
    InvalidTable(#[from] serde_json::Error),
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn record_builder() {
        let record = ProjectRecord::new("PROY-010")
            .name("Anillo Sur")
            .starting(date(2024, 5, 2))
            .total_meters(800.0)
            .installed_meters(200.0)
            .with_status(ProjectStatus::Stopped);

        assert_eq!(record.id, "PROY-010");
        assert_eq!(record.name, "Anillo Sur");
        assert_eq!(record.start_day(), date(2024, 5, 2));
        assert_eq!(record.start_date.time(), NaiveTime::default());
        assert_eq!(record.status, ProjectStatus::Stopped);
    }

    #[test]
    fn progress_and_computed_status() {
        let half = ProjectRecord::new("a").total_meters(1200.0).installed_meters(600.0);
        assert_eq!(half.progress_pct(), 50.0);
        assert_eq!(half.computed_status(), ProjectStatus::InProgress);

        let done = ProjectRecord::new("b").total_meters(3000.0).installed_meters(3000.0);
        assert_eq!(done.progress_pct(), 100.0);
        assert_eq!(done.computed_status(), ProjectStatus::Completed);
    }

    #[test]
    fn over_installed_counts_as_completed() {
        let record = ProjectRecord::new("x").total_meters(100.0).installed_meters(150.0);
        assert_eq!(record.progress_pct(), 150.0);
        assert_eq!(record.computed_status(), ProjectStatus::Completed);
    }

    #[test]
    fn zero_scope_is_not_a_division_error() {
        let record = ProjectRecord::new("x").total_meters(0.0).installed_meters(40.0);
        assert_eq!(record.progress_pct(), 0.0);
        assert_eq!(record.computed_status(), ProjectStatus::InProgress);
    }

    #[test]
    fn stored_status_is_independent_of_progress() {
        let record = ProjectRecord::new("x")
            .total_meters(10.0)
            .installed_meters(10.0)
            .with_status(ProjectStatus::Stopped);
        assert_eq!(record.status, ProjectStatus::Stopped);
        assert_eq!(record.computed_status(), ProjectStatus::Completed);
    }

    #[test]
    fn revenue_uses_price() {
        let record = ProjectRecord::new("x").total_meters(1200.0).installed_meters(600.0);
        assert_eq!(record.revenue(PricePerMeter::DEFAULT), 450_000.0);
        assert_eq!(record.revenue(PricePerMeter::new(0.0).unwrap()), 0.0);
    }

    #[test]
    fn price_rejects_negative_and_nan() {
        assert!(PricePerMeter::new(-1.0).is_err());
        assert!(PricePerMeter::new(f64::NAN).is_err());
        assert!(PricePerMeter::new(f64::INFINITY).is_err());
        assert_eq!(PricePerMeter::new(0.0).unwrap().value(), 0.0);
    }

    #[test]
    fn price_from_str() {
        assert_eq!("812.5".parse::<PricePerMeter>().unwrap().value(), 812.5);
        assert!("abc".parse::<PricePerMeter>().is_err());
        assert!("-3".parse::<PricePerMeter>().is_err());
    }

    #[test]
    fn status_labels() {
        assert_eq!(ProjectStatus::InProgress.to_string(), "En Progreso");
        assert_eq!(ProjectStatus::Completed.to_string(), "Completado");
        assert_eq!(ProjectStatus::Stopped.to_string(), "Detenido");
    }

    #[test]
    fn parse_start_date_accepts_date_and_datetime() {
        let midnight = date(2023, 10, 25).and_time(NaiveTime::default());
        assert_eq!(parse_start_date("2023-10-25"), Some(midnight));
        assert_eq!(parse_start_date("2023-10-25T00:00:00"), Some(midnight));
        assert_eq!(parse_start_date("2023-10-25 00:00:00"), Some(midnight));
        assert_eq!(parse_start_date("25/10/2023"), None);
    }

    #[test]
    fn record_json_uses_status_labels() {
        let record = ProjectRecord::new("PROY-001")
            .name("Instalación Centro A")
            .starting(date(2023, 10, 25))
            .total_meters(3000.0)
            .installed_meters(3000.0)
            .with_status(ProjectStatus::Completed);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "Completado");
        assert_eq!(json["start_date"], "2023-10-25T00:00:00");

        let back: ProjectRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn editor_row_defaults_missing_id_and_status() {
        let json = r#"{"name": "Nuevo", "start_date": "2024-01-02", "total_meters": 10, "installed_meters": 0}"#;
        let record: ProjectRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "");
        assert_eq!(record.status, ProjectStatus::InProgress);
        assert_eq!(record.start_day(), date(2024, 1, 2));
    }
}
