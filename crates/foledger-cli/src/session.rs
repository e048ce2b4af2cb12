//! Interactive session
//!
//! A [`Session`] owns one ledger for as long as the user keeps working. Shell
//! lines are split with shell quoting rules and parsed by clap, so a line reads
//! like a small command invocation:
//!
//! ```text
//! foledger> add --name "Troncal Norte" --start 2024-03-01 --total 500 --installed 120
//! foledger> delete PROY-002
//! foledger> edit tabla.json
//! foledger> export
//! ```
//!
//! Every successful mutation re-renders the dashboard.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use foledger_core::{
    Ledger, LedgerSnapshot, NewProject, PricePerMeter, Renderer, ReplacementTable,
};
use foledger_render::{
    export_file_name, DashboardRenderer, ExcelExporter, ProgressChartRenderer, RevenueChartRenderer,
};
use tracing::info;

use crate::config::Settings;

/// Shown before every shell line
const PROMPT: &str = "foledger> ";

/// Which dashboard chart to draw
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ChartKind {
    /// Progress per project, coloured by status
    Progress,
    /// Revenue distribution donut
    Revenue,
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartKind::Progress => f.write_str("progress"),
            ChartKind::Revenue => f.write_str("revenue"),
        }
    }
}

/// One parsed shell line
#[derive(Parser, Debug)]
#[command(name = "foledger>", no_binary_name = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ShellCommand {
    /// Add a new project
    Add {
        /// Project name
        #[arg(long)]
        name: String,
        /// Start date (YYYY-MM-DD), today when omitted
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,
        /// Contracted meters (at least 1)
        #[arg(long, value_parser = parse_total_meters)]
        total: f64,
        /// Meters already installed
        #[arg(long, value_parser = parse_installed_meters, default_value_t = 0.0)]
        installed: f64,
    },
    /// Delete a project by ID
    Delete {
        /// Project ID, e.g. PROY-002
        id: String,
    },
    /// Replace the whole table with the rows of a JSON file
    Edit {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the table as JSON, ready for editing
    Table,
    /// Show the dashboard
    Show,
    /// List project IDs
    Ids,
    /// Change the price per meter
    Price {
        value: PricePerMeter,
    },
    /// Export the table to a spreadsheet
    Export {
        /// Output file, `Proyectos_FO_<date>.xlsx` in the export directory when omitted
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// Write a chart as SVG
    Chart {
        #[arg(value_enum)]
        kind: ChartKind,
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// End the session
    #[command(alias = "exit")]
    Quit,
}

/// What the shell should do after a command
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The ledger changed; print the message and the refreshed dashboard
    Refresh(String),
    /// Print the message
    Message(String),
    Quit,
}

/// One user's working session
#[derive(Debug)]
pub struct Session {
    ledger: Ledger,
    price: PricePerMeter,
    export_dir: PathBuf,
    today: NaiveDate,
}

impl Session {
    /// Open a session with a freshly seeded ledger
    pub fn start(settings: &Settings, today: NaiveDate) -> Result<Self> {
        let mut ledger = Ledger::new();
        ledger.initialize();
        let price = settings.price()?;
        info!(%price, %today, "session started");

        Ok(Self {
            ledger,
            price,
            export_dir: settings.export_dir.clone(),
            today,
        })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn price(&self) -> PricePerMeter {
        self.price
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.ledger.snapshot(self.price, self.today)
    }

    pub fn dashboard(&self) -> Result<String> {
        Ok(DashboardRenderer::new().render(&self.snapshot())?)
    }

    /// Current table as editor JSON
    pub fn table_json(&self) -> Result<String> {
        Ok(self.ledger.editor_table().to_json()?)
    }

    /// Bulk-replace the ledger with the rows of a JSON file
    pub fn load_table(&mut self, path: &Path) -> Result<usize> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read table {}", path.display()))?;
        let table = ReplacementTable::from_json(&json)
            .with_context(|| format!("failed to parse table {}", path.display()))?;
        let rows = table.len();
        self.ledger.bulk_replace(table);
        info!(path = %path.display(), rows, "replaced ledger table");
        Ok(rows)
    }

    /// Write the spreadsheet, returning where it went
    pub fn export(&self, output: Option<PathBuf>) -> Result<PathBuf> {
        let path = output.unwrap_or_else(|| self.export_dir.join(export_file_name(self.today)));
        let bytes = ExcelExporter::new().render(&self.snapshot())?;
        std::fs::write(&path, bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), rows = self.ledger.len(), "exported spreadsheet");
        Ok(path)
    }

    pub fn write_chart(&self, kind: ChartKind, output: &Path) -> Result<()> {
        let snapshot = self.snapshot();
        let svg = match kind {
            ChartKind::Progress => ProgressChartRenderer::new().render(&snapshot)?,
            ChartKind::Revenue => RevenueChartRenderer::new().render(&snapshot)?,
        };
        std::fs::write(output, svg)
            .with_context(|| format!("failed to write {}", output.display()))?;
        info!(path = %output.display(), %kind, "wrote chart");
        Ok(())
    }

    /// Run one command against the session
    pub fn execute(&mut self, command: ShellCommand) -> Result<Outcome> {
        let outcome = match command {
            ShellCommand::Add {
                name,
                start,
                total,
                installed,
            } => {
                let start = start.unwrap_or(self.today);
                let added = self
                    .ledger
                    .add(NewProject::new(name, start, total, installed))?;
                Outcome::Refresh(format!("Added {}", added.id))
            }
            ShellCommand::Delete { id } => {
                if self.ledger.is_empty() {
                    Outcome::Message("No projects to delete".into())
                } else if self.ledger.delete(&id) == 0 {
                    Outcome::Message(format!("No project with id {id}"))
                } else {
                    Outcome::Refresh(format!("Deleted {id}"))
                }
            }
            ShellCommand::Edit { file } => {
                let rows = self.load_table(&file)?;
                Outcome::Refresh(format!("Table replaced ({rows} rows)"))
            }
            ShellCommand::Table => Outcome::Message(self.table_json()?),
            ShellCommand::Show => Outcome::Message(self.dashboard()?),
            ShellCommand::Ids => {
                let ids = self.ledger.ids();
                if ids.is_empty() {
                    Outcome::Message("(no projects)".into())
                } else {
                    Outcome::Message(ids.join("\n"))
                }
            }
            ShellCommand::Price { value } => {
                self.price = value;
                info!(price = %value, "price per meter changed");
                Outcome::Refresh(format!("Price per meter set to {value}"))
            }
            ShellCommand::Export { file } => {
                let path = self.export(file)?;
                Outcome::Message(format!("Exported {}", path.display()))
            }
            ShellCommand::Chart { kind, file } => {
                self.write_chart(kind, &file)?;
                Outcome::Message(format!("Wrote {kind} chart to {}", file.display()))
            }
            ShellCommand::Quit => Outcome::Quit,
        };
        Ok(outcome)
    }

    /// Read commands from `input` until it ends or the user quits
    pub fn run_shell<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> Result<()> {
        writeln!(out, "{}", self.dashboard()?)?;
        writeln!(out, "Type `help` for commands, `quit` to leave.")?;

        let mut lines = input.lines();
        loop {
            write!(out, "{PROMPT}")?;
            out.flush()?;
            let Some(line) = lines.next() else {
                writeln!(out)?;
                break;
            };
            let line = line.context("failed to read command")?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let command = match parse_line(line) {
                Ok(command) => command,
                Err(message) => {
                    writeln!(out, "{}", message.trim_end())?;
                    continue;
                }
            };

            match self.execute(command) {
                Ok(Outcome::Quit) => break,
                Ok(Outcome::Refresh(message)) => {
                    writeln!(out, "{message}")?;
                    writeln!(out, "{}", self.dashboard()?)?;
                }
                Ok(Outcome::Message(message)) => writeln!(out, "{message}")?,
                Err(e) => writeln!(out, "error: {e:#}")?,
            }
            out.flush()?;
        }

        Ok(())
    }
}

/// Parse a shell line; the error is the text to show the user
pub fn parse_line(line: &str) -> std::result::Result<ShellCommand, String> {
    let words = shell_words::split(line).map_err(|e| format!("error: {e}"))?;
    ShellLine::try_parse_from(words)
        .map(|parsed| parsed.command)
        .map_err(|e| e.to_string())
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| format!("`{s}` is not a date (YYYY-MM-DD)"))
}

fn parse_meters(s: &str) -> std::result::Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if !value.is_finite() {
        return Err(format!("`{s}` is not a finite number"));
    }
    Ok(value)
}

fn parse_total_meters(s: &str) -> std::result::Result<f64, String> {
    let value = parse_meters(s)?;
    if value < 1.0 {
        return Err("total meters must be at least 1".into());
    }
    Ok(value)
}

fn parse_installed_meters(s: &str) -> std::result::Result<f64, String> {
    let value = parse_meters(s)?;
    if value < 0.0 {
        return Err("installed meters cannot be negative".into());
    }
    Ok(value)
}
