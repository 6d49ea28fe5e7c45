//! JSON implementation of the Q-table repository.
//!
//! The default store: pretty-printed, key-sorted JSON that can be read and
//! edited by hand.

use std::path::{Path, PathBuf};

use super::file_io::{read_table, write_table};
use crate::{
    Result,
    ports::QTableRepository,
    q_learning::{QTable, TableFormat},
};

/// JSON-file Q-table repository.
///
/// # Examples
///
/// ```no_run
/// use catcher::adapters::JsonFileRepository;
/// use catcher::ports::QTableRepository;
/// use catcher::q_learning::QTable;
///
/// let repo = JsonFileRepository::new("runs/qtable.json");
/// repo.save(&QTable::new())?;
/// let loaded = repo.load()?;
/// assert!(loaded.is_empty());
/// # Ok::<(), catcher::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl QTableRepository for JsonFileRepository {
    fn save(&self, table: &QTable) -> Result<()> {
        write_table(&self.path, TableFormat::Json, table)
    }

    fn load(&self) -> Result<QTable> {
        read_table(&self.path, TableFormat::Json)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::types::{Action, StateKey};

    #[test]
    fn test_json_roundtrip() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = JsonFileRepository::new(temp_dir.path().join("qtable.json"));

        let mut table = QTable::new();
        table.set(&StateKey::from_buckets(2, 3), Action::MoveRight, 0.123_456_789);
        table.set(&StateKey::from_buckets(-1, -6), Action::Stay, -4.5);

        repo.save(&table).expect("Failed to save");
        assert_eq!(repo.load().expect("Failed to load"), table);
    }

    #[test]
    fn test_missing_file_is_cold_start() {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(temp_dir.path().join("absent.json"));
        assert!(repo.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/qtable.json");
        let repo = JsonFileRepository::new(&path);

        repo.save(&QTable::new()).unwrap();
        assert!(path.exists());
        assert!(!path.with_file_name("qtable.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_fails_loudly() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("qtable.json");
        std::fs::write(&path, "{\"q_table\": {\"0,0\": [1.0]").unwrap();

        let err = JsonFileRepository::new(&path).load().unwrap_err();
        assert!(err.is_corrupt_state());
        assert!(err.to_string().contains("qtable.json"));
    }
}
