//! CLI subcommands

pub mod evaluate;
pub mod export;
pub mod inspect;
pub mod train;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::warn;

use crate::{
    adapters::file_repository,
    config::CatcherConfig,
    ports::QTableRepository,
    q_learning::{QTable, TableFormat},
};

/// Where the Q-table lives on disk
#[derive(Args, Debug, Clone)]
pub struct TableArgs {
    /// Q-table file
    #[arg(long, short = 't', default_value = "q_table.json")]
    pub table: PathBuf,

    /// Table encoding (json or msgpack); inferred from the extension when omitted
    #[arg(long, short = 'f')]
    pub format: Option<TableFormat>,
}

impl TableArgs {
    pub fn format(&self) -> TableFormat {
        self.format.unwrap_or_else(|| infer_format(&self.table))
    }

    pub fn repository(&self) -> Box<dyn QTableRepository> {
        file_repository(&self.table, self.format())
    }

    /// Load the table, treating a corrupt file as fatal
    pub fn load(&self) -> Result<QTable> {
        self.repository()
            .load()
            .with_context(|| format!("Failed to load Q-table from {}", self.table.display()))
    }
}

/// `.msgpack`/`.mpk` mean MessagePack, anything else JSON
pub fn infer_format(path: &Path) -> TableFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("msgpack") || ext.eq_ignore_ascii_case("mpk") => {
            TableFormat::MsgPack
        }
        _ => TableFormat::Json,
    }
}

/// Defaults, or the JSON file at `path` (validated)
pub fn load_config(path: Option<&Path>) -> Result<CatcherConfig> {
    match path {
        Some(path) => CatcherConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(CatcherConfig::default()),
    }
}

/// Load the starting table for a training run.
///
/// `fresh` ignores whatever is on disk. A corrupt table is fatal unless
/// `recover_corrupt` is set, in which case training starts from empty.
pub fn load_starting_table(
    repository: &dyn QTableRepository,
    fresh: bool,
    recover_corrupt: bool,
) -> Result<QTable> {
    if fresh {
        return Ok(QTable::new());
    }
    match repository.load() {
        Ok(table) => Ok(table),
        Err(err) if recover_corrupt && err.is_corrupt_state() => {
            warn!(
                location = %repository.location(),
                error = %err,
                "discarding corrupt Q-table and starting from empty"
            );
            Ok(QTable::new())
        }
        Err(err) => Err(err).with_context(|| {
            format!(
                "Failed to load Q-table from {} (use --recover-corrupt to start fresh)",
                repository.location()
            )
        }),
    }
}

/// Treat a trailing separator or missing file name as a directory and put
/// `default_name` inside it; otherwise force a `.json` extension.
pub(crate) fn sanitize_summary_path(raw: &Path, default_name: &str) -> PathBuf {
    let mut normalized = raw.to_path_buf();
    let raw_str = raw.as_os_str().to_string_lossy();

    if raw_str.ends_with(std::path::MAIN_SEPARATOR) || normalized.file_name().is_none() {
        normalized.push(default_name);
        return normalized;
    }

    match normalized.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => normalized,
        _ => {
            normalized.set_extension("json");
            normalized
        }
    }
}

/// Write `value` as pretty JSON, creating parent directories
pub(crate) fn write_summary<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryRepository;

    #[test]
    fn test_infer_format() {
        assert_eq!(infer_format(Path::new("q.json")), TableFormat::Json);
        assert_eq!(infer_format(Path::new("q.msgpack")), TableFormat::MsgPack);
        assert_eq!(infer_format(Path::new("q.MPK")), TableFormat::MsgPack);
        assert_eq!(infer_format(Path::new("q")), TableFormat::Json);
    }

    #[test]
    fn test_corrupt_table_is_fatal_without_recovery() {
        let repo = InMemoryRepository::with_bytes(b"{not json".to_vec());
        assert!(load_starting_table(&repo, false, false).is_err());
        assert!(load_starting_table(&repo, false, true).unwrap().is_empty());
        assert!(load_starting_table(&repo, true, false).unwrap().is_empty());
    }

    #[test]
    fn test_sanitize_summary_path() {
        assert_eq!(
            sanitize_summary_path(Path::new("out/run"), "summary.json"),
            PathBuf::from("out/run.json")
        );
        assert_eq!(
            sanitize_summary_path(Path::new("out/run.JSON"), "summary.json"),
            PathBuf::from("out/run.JSON")
        );
    }
}
