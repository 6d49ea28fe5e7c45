//! In-memory Q-table repository for testing.
//!
//! This adapter stores the encoded table in memory, so tests can exercise the
//! save-per-episode contract without any file system I/O.

use std::sync::{Arc, Mutex};

use crate::{
    Result,
    ports::QTableRepository,
    q_learning::{QTable, TableFormat},
};

#[derive(Debug, Default)]
struct Slot {
    bytes: Option<Vec<u8>>,
    saves: usize,
}

/// In-memory repository for testing.
///
/// Tables are stored in their JSON encoding so a save/load cycle goes through
/// the same decoder as the file adapter.
///
/// # Examples
///
/// ```
/// use catcher::adapters::InMemoryRepository;
/// use catcher::ports::QTableRepository;
/// use catcher::q_learning::QTable;
///
/// let repo = InMemoryRepository::new();
/// assert!(repo.load()?.is_empty());
///
/// repo.save(&QTable::new())?;
/// assert_eq!(repo.save_count(), 1);
/// # Ok::<(), catcher::Error>(())
/// ```
///
/// # Thread Safety
///
/// All clones share the same underlying slot.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    slot: Arc<Mutex<Slot>>,
}

impl InMemoryRepository {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-loaded with raw bytes (e.g. to simulate a
    /// corrupt store).
    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        let repo = Self::new();
        repo.slot.lock().unwrap().bytes = Some(bytes);
        repo
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.slot.lock().unwrap().saves
    }

    /// Whether anything has been stored.
    pub fn is_populated(&self) -> bool {
        self.slot.lock().unwrap().bytes.is_some()
    }

    /// Drop the stored table.
    pub fn clear(&self) {
        let mut slot = self.slot.lock().unwrap();
        slot.bytes = None;
        slot.saves = 0;
    }
}

impl QTableRepository for InMemoryRepository {
    fn save(&self, table: &QTable) -> Result<()> {
        let bytes = TableFormat::Json.encode(table)?;
        let mut slot = self.slot.lock().unwrap();
        slot.bytes = Some(bytes);
        slot.saves += 1;
        Ok(())
    }

    fn load(&self) -> Result<QTable> {
        let slot = self.slot.lock().unwrap();
        match &slot.bytes {
            Some(bytes) => TableFormat::Json.decode(bytes, &self.location()),
            None => Ok(QTable::new()),
        }
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
