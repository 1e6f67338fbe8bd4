pub mod config;
pub mod dashboard;
pub mod export;
pub mod report;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::clean::clean;
use crate::error::Result;
use crate::filter::Selections;
use crate::ingest::Ingestor;
use crate::models::CleanedTable;
use crate::present::LayoutKind;
use crate::settings::{load_settings, resolve_file};

#[derive(Parser)]
#[command(
    name = "fuelboard",
    version,
    about = "Fuel-purchase reporting dashboard for fleet spreadsheets."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Month/company restriction shared by every reporting command.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Month bucket: MM/YYYY (default: All)
    #[arg(long)]
    pub month: Option<String>,
    /// Company short name (default: All)
    #[arg(long)]
    pub company: Option<String>,
}

impl FilterArgs {
    pub fn selections(&self) -> Selections {
        Selections::from_args(self.month.as_deref(), self.company.as_deref())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive dashboard.
    Dashboard {
        /// Spreadsheet (.xlsx, .xls, .ods or .csv); defaults to the configured file
        file: Option<String>,
        /// Dashboard arrangement
        #[arg(long, value_enum)]
        layout: Option<LayoutKind>,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Print the summary metrics and grouped totals.
    Summary {
        file: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Print the transaction detail table.
    Table {
        file: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
        /// Show at most this many rows
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List the values available for each filter.
    Filters { file: Option<String> },
    /// Write the formatted detail table to a CSV file.
    Export {
        file: Option<String>,
        /// Output CSV path
        #[arg(long, short)]
        output: String,
        #[command(flatten)]
        filters: FilterArgs,
        /// Write the cleaned dataset instead of the formatted table
        #[arg(long)]
        cleaned: bool,
    },
    /// Show or change saved settings.
    Config {
        /// Spreadsheet to open by default
        #[arg(long)]
        file: Option<String>,
        /// Default dashboard arrangement
        #[arg(long, value_enum)]
        layout: Option<LayoutKind>,
    },
    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Resolve the spreadsheet path, read it, and clean it.
pub(crate) fn load_table(
    ingestor: &mut Ingestor,
    file: Option<&str>,
) -> Result<(PathBuf, CleanedTable)> {
    let path = resolve_file(file, &load_settings())?;
    let raw = ingestor.load(&path)?;
    let table = clean(&raw)?;
    Ok((path, table))
}
