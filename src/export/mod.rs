//! Export functionality for analysis
//!
//! Currently supports CSV export of a learned Q-table, one row per state.

mod q_table_csv;

pub use q_table_csv::{QTableCsvExporter, QTableExportRecord, StateFilter};
