//! foledger CLI - Fiber-Optic Installation Project Ledger
//!
//! Interactive dashboard for tracking installation projects, plus one-shot
//! commands for reports, spreadsheet export and charts.

mod config;
mod session;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use foledger_core::PricePerMeter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Settings;
use crate::session::{ChartKind, Session};

#[derive(Parser)]
#[command(name = "foledger")]
#[command(author, version, about = "Fiber-optic installation project ledger", long_about = None)]
struct Cli {
    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Settings file (TOML)
    #[arg(long, value_name = "FILE", env = "FOLEDGER_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Revenue per installed meter (default 750)
    #[arg(long, env = "FOLEDGER_PRICE_PER_METER", global = true)]
    price: Option<PricePerMeter>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session (default)
    Shell,

    /// Print the dashboard
    Report {
        #[command(flatten)]
        source: TableSource,
    },

    /// Export the project table to a spreadsheet
    Export {
        #[command(flatten)]
        source: TableSource,

        /// Output file (Proyectos_FO_<date>.xlsx if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a dashboard chart as SVG
    Chart {
        #[arg(value_enum)]
        kind: ChartKind,

        #[command(flatten)]
        source: TableSource,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the project table as JSON for editing
    Table {
        #[command(flatten)]
        source: TableSource,
    },
}

#[derive(Args)]
struct TableSource {
    /// Replace the seeded table with the rows of a JSON file first
    #[arg(long, value_name = "FILE")]
    table: Option<PathBuf>,
}

impl TableSource {
    fn apply(&self, session: &mut Session) -> Result<()> {
        if let Some(path) = &self.table {
            session.load_table(path)?;
        }
        Ok(())
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::load(cli.config.as_deref())?.with_price(cli.price);
    let today = chrono::Local::now().date_naive();
    let mut session = Session::start(&settings, today)?;

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            session.run_shell(io::stdin().lock(), io::stdout().lock())?;
        }
        Commands::Report { source } => {
            source.apply(&mut session)?;
            print!("{}", session.dashboard()?);
        }
        Commands::Export { source, output } => {
            source.apply(&mut session)?;
            let path = session.export(output)?;
            println!("Exported {}", path.display());
        }
        Commands::Chart {
            kind,
            source,
            output,
        } => {
            source.apply(&mut session)?;
            session.write_chart(kind, &output)?;
            println!("Wrote {kind} chart to {}", output.display());
        }
        Commands::Table { source } => {
            source.apply(&mut session)?;
            println!("{}", session.table_json()?);
        }
    }

    Ok(())
}
