//! XLSX export of the project table
//!
//! Produces a single `Proyectos` worksheet with the eight display columns in
//! their fixed order:
//!
//! ```text
//! | ID       | Nombre               | Fecha Inicio        | Metros Totales | Metros Instalados | Progreso % | Estado      | Ganancia     |
//! |----------|----------------------|---------------------|----------------|-------------------|------------|-------------|--------------|
//! | PROY-001 | Instalación Centro A | 2023-10-25 00:00:00 | 3000           | 3000              | 100.0      | Completado  | 2,250,000.00 |
//! ```
//!
//! `Estado` is the computed status. The result is returned as bytes so the
//! caller decides where the download goes.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use rust_xlsxwriter::{ExcelDateTime, Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use foledger_core::{LedgerSnapshot, RenderError, Renderer, DISPLAY_COLUMNS};

/// File name offered for the download, stamped with the given date
pub fn export_file_name(today: NaiveDate) -> String {
    format!("Proyectos_FO_{}.xlsx", today.format("%Y%m%d"))
}

/// Spreadsheet exporter for ledger snapshots
#[derive(Clone, Debug)]
pub struct ExcelExporter {
    /// Worksheet name
    pub sheet_name: String,
    /// Column widths for A..H
    pub column_widths: [f64; 8],
    /// Number format for the start date column
    pub date_format: String,
    /// Number format for the revenue column
    pub currency_format: String,
    /// Keep the header row visible while scrolling
    pub freeze_header: bool,
}

impl Default for ExcelExporter {
    fn default() -> Self {
        Self {
            sheet_name: "Proyectos".into(),
            column_widths: [12.0, 30.0, 15.0, 18.0, 18.0, 18.0, 18.0, 18.0],
            date_format: "yyyy-mm-dd hh:mm:ss".into(),
            currency_format: "#,##0.00".into(),
            freeze_header: true,
        }
    }
}

impl ExcelExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate workbook bytes for the snapshot
    pub fn render_to_bytes(&self, snapshot: &LedgerSnapshot) -> Result<Vec<u8>, RenderError> {
        let mut workbook = Workbook::new();
        let formats = self.create_formats();

        let sheet = workbook.add_worksheet();
        sheet
            .set_name(&self.sheet_name)
            .map_err(|e| RenderError::Format(e.to_string()))?;

        self.write_header(sheet, &formats)?;
        self.write_rows(sheet, snapshot, &formats)?;

        let buffer = workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))?;

        Ok(buffer)
    }

    fn create_formats(&self) -> ExportFormats {
        let header = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_background_color(0x0B1121)
            .set_font_color(0x00FF41)
            .set_border(FormatBorder::Thin);

        let text = Format::new().set_border(FormatBorder::Thin);

        let date = Format::new()
            .set_num_format(&self.date_format)
            .set_border(FormatBorder::Thin);

        let meters = Format::new().set_border(FormatBorder::Thin);

        let percent = Format::new()
            .set_num_format("0.0")
            .set_border(FormatBorder::Thin);

        let currency = Format::new()
            .set_num_format(&self.currency_format)
            .set_border(FormatBorder::Thin);

        ExportFormats {
            header,
            text,
            date,
            meters,
            percent,
            currency,
        }
    }

    fn write_header(&self, sheet: &mut Worksheet, formats: &ExportFormats) -> Result<(), RenderError> {
        for (col, header) in DISPLAY_COLUMNS.iter().enumerate() {
            sheet
                .write_with_format(0, col as u16, *header, &formats.header)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        for (col, width) in self.column_widths.iter().enumerate() {
            sheet.set_column_width(col as u16, *width).ok();
        }

        if self.freeze_header {
            sheet
                .set_freeze_panes(1, 0)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        Ok(())
    }

    fn write_rows(
        &self,
        sheet: &mut Worksheet,
        snapshot: &LedgerSnapshot,
        formats: &ExportFormats,
    ) -> Result<(), RenderError> {
        for (index, row) in snapshot.rows.iter().enumerate() {
            let r = index as u32 + 1;
            let record = &row.record;
            let start = excel_datetime(record.start_date)?;

            sheet
                .write_with_format(r, 0, record.id.as_str(), &formats.text)
                .and_then(|s| s.write_with_format(r, 1, record.name.as_str(), &formats.text))
                .and_then(|s| s.write_with_format(r, 2, &start, &formats.date))
                .and_then(|s| s.write_with_format(r, 3, record.total_meters, &formats.meters))
                .and_then(|s| s.write_with_format(r, 4, record.installed_meters, &formats.meters))
                .and_then(|s| s.write_with_format(r, 5, row.progress_pct, &formats.percent))
                .and_then(|s| s.write_with_format(r, 6, row.computed_status.label(), &formats.text))
                .and_then(|s| s.write_with_format(r, 7, row.revenue, &formats.currency))
                .map_err(|e| RenderError::Format(format!("row {}: {e}", record.id)))?;
        }
        Ok(())
    }
}

impl Renderer for ExcelExporter {
    type Output = Vec<u8>;

    /// An empty snapshot still yields a workbook with the header row
    fn render(&self, snapshot: &LedgerSnapshot) -> Result<Vec<u8>, RenderError> {
        self.render_to_bytes(snapshot)
    }
}

fn excel_datetime(value: NaiveDateTime) -> Result<ExcelDateTime, RenderError> {
    let invalid = |e: rust_xlsxwriter::XlsxError| {
        RenderError::InvalidData(format!("start date {value} cannot be exported: {e}"))
    };
    // Excel dates start in 1900
    if !(1900..=9999).contains(&value.year()) {
        return Err(RenderError::InvalidData(format!(
            "start date {value} is outside the range Excel supports"
        )));
    }
    let year = value.year() as u16;

    ExcelDateTime::from_ymd(year, value.month() as u8, value.day() as u8)
        .and_then(|d| d.and_hms(value.hour() as u16, value.minute() as u8, value.second()))
        .map_err(invalid)
}

struct ExportFormats {
    header: Format,
    text: Format,
    date: Format,
    meters: Format,
    percent: Format,
    currency: Format,
}
