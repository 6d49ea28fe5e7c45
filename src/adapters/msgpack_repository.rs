//! MessagePack implementation of the Q-table repository.
//!
//! This adapter implements the QTableRepository port using rmp_serde for
//! compact binary snapshots of large tables.

use std::path::{Path, PathBuf};

use super::file_io::{read_table, write_table};
use crate::{
    Result,
    ports::QTableRepository,
    q_learning::{QTable, TableFormat},
};

/// MessagePack-based Q-table repository.
#[derive(Debug, Clone)]
pub struct MsgPackRepository {
    path: PathBuf,
}

impl MsgPackRepository {
    /// Create a new MessagePack repository bound to `path`.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl QTableRepository for MsgPackRepository {
    fn save(&self, table: &QTable) -> Result<()> {
        write_table(&self.path, TableFormat::MsgPack, table)
    }

    fn load(&self) -> Result<QTable> {
        read_table(&self.path, TableFormat::MsgPack)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
