//! Export command - Write a Q-table to CSV

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use crate::{
    cli::commands::TableArgs,
    export::{QTableCsvExporter, StateFilter},
};

#[derive(Parser, Debug)]
#[command(about = "Export a Q-table to CSV")]
pub struct ExportArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Output file path
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    /// Which states to export
    #[arg(long, value_enum, default_value = "all")]
    pub filter: FilterArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FilterArg {
    /// Every state in the table
    All,
    /// States with at least one non-zero value
    Visited,
    /// Positional states only (no `none`)
    Tracked,
}

impl From<FilterArg> for StateFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => StateFilter::All,
            FilterArg::Visited => StateFilter::Visited,
            FilterArg::Tracked => StateFilter::Tracked,
        }
    }
}

pub fn execute(args: ExportArgs) -> Result<()> {
    let table = args.table.load()?;

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let count = QTableCsvExporter::export(&table, args.filter.into(), &args.output)
        .with_context(|| format!("Failed to export to {}", args.output.display()))?;

    println!(
        "✓ Exported {count} of {} states to: {}",
        table.len(),
        args.output.display()
    );
    Ok(())
}
