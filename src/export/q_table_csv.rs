//! CSV export for learned Q-tables

use std::{io::Write, path::Path};

use serde::Serialize;

use crate::{
    Result,
    q_learning::{QTable, q_table::greedy},
    types::{ActionValues, StateKey},
};

/// Which rows to write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateFilter {
    /// Every state in the table
    #[default]
    All,
    /// Only states with at least one non-zero value
    Visited,
    /// Only positional states (drops the `none` sentinel)
    Tracked,
}

impl StateFilter {
    fn keep(self, state: &StateKey, values: &ActionValues) -> bool {
        match self {
            StateFilter::All => true,
            StateFilter::Visited => values.iter().any(|v| *v != 0.0),
            StateFilter::Tracked => !state.is_none(),
        }
    }
}

/// A single row in the Q-table CSV export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QTableExportRecord {
    pub state: String,
    /// Empty for the `none` sentinel
    pub receptacle_bucket: Option<i64>,
    pub target_bucket: Option<i64>,
    pub move_left: f64,
    pub stay: f64,
    pub move_right: f64,
    pub best_action: String,
    pub best_value: f64,
}

impl QTableExportRecord {
    pub fn new(state: &StateKey, values: &ActionValues) -> Self {
        let buckets = state.buckets();
        let (best, best_value) = greedy(values);
        Self {
            state: state.to_string(),
            receptacle_bucket: buckets.map(|(r, _)| r),
            target_bucket: buckets.map(|(_, t)| t),
            move_left: values[0],
            stay: values[1],
            move_right: values[2],
            best_action: best.name().to_string(),
            best_value,
        }
    }
}

/// Exporter for Q-table CSV files
pub struct QTableCsvExporter;

impl QTableCsvExporter {
    /// Rows for `table` in key order
    pub fn records(table: &QTable, filter: StateFilter) -> Vec<QTableExportRecord> {
        table
            .iter()
            .filter(|(state, values)| filter.keep(state, values))
            .map(|(state, values)| QTableExportRecord::new(state, values))
            .collect()
    }

    /// Write the table as CSV to `writer`, returning the number of rows
    pub fn write<W: Write>(table: &QTable, filter: StateFilter, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        let mut count = 0;
        for record in Self::records(table, filter) {
            csv_writer.serialize(&record)?;
            count += 1;
        }
        csv_writer.flush()?;
        Ok(count)
    }

    /// Export to a file at `path`
    ///
    /// # Returns
    /// Number of states exported
    pub fn export(table: &QTable, filter: StateFilter, path: &Path) -> Result<usize> {
        let file = std::fs::File::create(path)?;
        Self::write(table, filter, std::io::BufWriter::new(file))
    }
}
