//! Derived metrics over the ledger
//!
//! [`compute_derived`] is a pure function of the records, the configured price
//! and the reference date. It never mutates the ledger; each call produces a
//! fresh [`LedgerSnapshot`] that the renderers consume.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::{PricePerMeter, ProjectRecord, ProjectStatus};

/// Column headers of the exported table, in their fixed order
pub const DISPLAY_COLUMNS: [&str; 8] = [
    "ID",
    "Nombre",
    "Fecha Inicio",
    "Metros Totales",
    "Metros Instalados",
    "Progreso %",
    "Estado",
    "Ganancia",
];

/// A record together with its derived fields
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnrichedRow {
    #[serde(flatten)]
    pub record: ProjectRecord,
    pub progress_pct: f64,
    pub computed_status: ProjectStatus,
    pub revenue: f64,
}

impl EnrichedRow {
    pub fn from_record(record: &ProjectRecord, price: PricePerMeter) -> Self {
        Self {
            record: record.clone(),
            progress_pct: record.progress_pct(),
            computed_status: record.computed_status(),
            revenue: record.revenue(price),
        }
    }
}

/// Aggregates shown on the dashboard cards
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct RevenueSummary {
    /// Sum of installed meters over all rows
    pub total_installed_meters: f64,
    /// Revenue over all rows
    pub total_revenue: f64,
    /// Revenue of rows that started on the reference date
    pub today_revenue: f64,
    /// Revenue of rows that started in the reference month
    pub month_revenue: f64,
    /// `month_revenue * 12`
    pub annual_projection: f64,
}

/// Enriched rows plus aggregates, as of one reference date and price
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LedgerSnapshot {
    pub as_of: NaiveDate,
    pub price_per_meter: PricePerMeter,
    pub rows: Vec<EnrichedRow>,
    pub summary: RevenueSummary,
}

impl LedgerSnapshot {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Compute derived fields and aggregates for `records`
pub fn compute_derived(
    records: &[ProjectRecord],
    price: PricePerMeter,
    today: NaiveDate,
) -> LedgerSnapshot {
    let rows: Vec<EnrichedRow> = records
        .iter()
        .map(|r| EnrichedRow::from_record(r, price))
        .collect();

    let mut summary = RevenueSummary::default();
    for row in &rows {
        let day = row.record.start_day();
        summary.total_installed_meters += row.record.installed_meters;
        summary.total_revenue += row.revenue;
        if day == today {
            summary.today_revenue += row.revenue;
        }
        if day.year() == today.year() && day.month() == today.month() {
            summary.month_revenue += row.revenue;
        }
    }
    summary.annual_projection = summary.month_revenue * 12.0;

    LedgerSnapshot {
        as_of: today,
        price_per_meter: price,
        rows,
        summary,
    }
}
