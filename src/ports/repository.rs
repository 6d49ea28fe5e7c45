//! Repository port for Q-table persistence.
//!
//! This module defines the trait boundary between the learning core and the
//! storage used for the learned value table.

use crate::{Result, q_learning::QTable};

/// Port for persisting and loading a Q-table.
///
/// Each repository is bound to one backing store (a file, a memory slot) at
/// construction. The training loop calls [`save`](Self::save) once per
/// resolved episode.
///
/// # Examples
///
/// ```no_run
/// use catcher::adapters::JsonFileRepository;
/// use catcher::ports::QTableRepository;
///
/// let repo = JsonFileRepository::new("qtable.json");
/// let table = repo.load()?; // empty if the file does not exist yet
/// repo.save(&table)?;
/// # Ok::<(), catcher::Error>(())
/// ```
pub trait QTableRepository: Send {
    /// Save a table, replacing whatever was stored before.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written or serialization fails.
    fn save(&self, table: &QTable) -> Result<()>;

    /// Load the stored table.
    ///
    /// A store that does not exist yet yields an empty table.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::CorruptState`] if the stored data cannot be
    /// decoded, or an I/O error if it exists but cannot be read.
    fn load(&self) -> Result<QTable>;

    /// Human-readable description of the backing store.
    fn location(&self) -> String;
}
