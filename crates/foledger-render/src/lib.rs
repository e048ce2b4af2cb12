//! # foledger-render
//!
//! Rendering backends for foledger ledger snapshots.
//!
//! This crate provides:
//! - XLSX export of the project table (the spreadsheet download)
//! - SVG progress bar chart, coloured by computed status
//! - SVG revenue distribution donut chart
//! - Plain-text dashboard for terminal sessions
//!
//! Every backend implements [`Renderer`] and reads a [`LedgerSnapshot`]; none
//! of them can mutate the ledger.
//!
//! ## Example
//!
//! ```rust,ignore
//! use foledger_core::{Ledger, PricePerMeter, Renderer};
//! use foledger_render::{DashboardRenderer, ExcelExporter, ProgressChartRenderer};
//!
//! let snapshot = ledger.snapshot(PricePerMeter::DEFAULT, today);
//!
//! // Terminal dashboard
//! println!("{}", DashboardRenderer::new().render(&snapshot)?);
//!
//! // Spreadsheet download
//! let xlsx_bytes = ExcelExporter::new().render(&snapshot)?;
//! std::fs::write(export_file_name(today), xlsx_bytes)?;
//!
//! // Progress chart
//! let svg = ProgressChartRenderer::default().render(&snapshot)?;
//! ```

pub mod chart;
pub mod excel;

pub use chart::{ChartTheme, ProgressChartRenderer, RevenueChartRenderer};
pub use excel::{export_file_name, ExcelExporter};

use foledger_core::{
    format_currency, format_meters, LedgerSnapshot, RenderError, Renderer,
};

/// Terminal dashboard: metric cards followed by the project table
#[derive(Clone, Debug)]
pub struct DashboardRenderer {
    /// Title printed above the cards
    pub title: String,
    /// Maximum characters shown for a project name
    pub name_width: usize,
}

impl Default for DashboardRenderer {
    fn default() -> Self {
        Self {
            title: "DASHBOARD DE INSTALACIÓN FO".into(),
            name_width: 30,
        }
    }
}

impl DashboardRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the dashboard title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    fn render_cards(&self, snapshot: &LedgerSnapshot) -> String {
        let summary = &snapshot.summary;
        let cards = [
            ("TOTAL INSTALADO", format_meters(summary.total_installed_meters)),
            ("GANANCIA TOTAL", format_currency(summary.total_revenue)),
            ("GANANCIA HOY", format_currency(summary.today_revenue)),
            ("GANANCIA MES", format_currency(summary.month_revenue)),
            ("PROYECCIÓN ANUAL (EST)", format_currency(summary.annual_projection)),
        ];

        let mut out = String::new();
        for (label, value) in cards {
            out.push_str(&format!("  {label:<24}{value:>20}\n"));
        }
        out
    }

    fn render_table(&self, snapshot: &LedgerSnapshot) -> String {
        if snapshot.is_empty() {
            return "Sin proyectos registrados.\n".into();
        }

        let header = [
            "ID", "Proyecto", "Inicio", "Total (m)", "Hecho (m)", "Progreso %", "Estado", "Marcado",
            "Ganancia",
        ];
        let rows: Vec<[String; 9]> = snapshot
            .rows
            .iter()
            .map(|row| {
                [
                    row.record.id.clone(),
                    truncate(&row.record.name, self.name_width),
                    row.record.start_day().format("%Y-%m-%d").to_string(),
                    format!("{}", row.record.total_meters),
                    format!("{}", row.record.installed_meters),
                    format!("{:.1}", row.progress_pct),
                    row.computed_status.to_string(),
                    row.record.status.to_string(),
                    format_currency(row.revenue),
                ]
            })
            .collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        push_row(&mut out, header.iter().copied(), &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_row(&mut out, rule.iter().map(String::as_str), &widths);
        for row in &rows {
            push_row(&mut out, row.iter().map(String::as_str), &widths);
        }
        out
    }
}

impl Renderer for DashboardRenderer {
    type Output = String;

    fn render(&self, snapshot: &LedgerSnapshot) -> Result<String, RenderError> {
        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');
        out.push_str(&"=".repeat(self.title.chars().count()));
        out.push('\n');
        out.push_str(&format!(
            "Precio por metro: {} | Fecha: {}\n\n",
            format_currency(snapshot.price_per_meter.value()),
            snapshot.as_of.format("%Y-%m-%d")
        ));
        out.push_str(&self.render_cards(snapshot));
        out.push('\n');
        out.push_str(&self.render_table(snapshot));
        Ok(out)
    }
}

/// Left-align text cells and right-align numeric ones
fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths)
        .enumerate()
        .map(|(col, (cell, &width))| {
            if (3..=5).contains(&col) || col == 8 {
                format!("{cell:>width$}")
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

/// Truncate a string to a maximum number of characters with ellipsis
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
