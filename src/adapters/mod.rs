//! Adapters implementing domain ports.
//!
//! This module contains the storage implementations of the Q-table
//! repository port. The built-in environment adapter lives in
//! [`crate::simulation`].

mod file_io;
pub mod in_memory_repository;
pub mod json_repository;
pub mod msgpack_repository;

use std::path::PathBuf;

pub use in_memory_repository::InMemoryRepository;
pub use json_repository::JsonFileRepository;
pub use msgpack_repository::MsgPackRepository;

use crate::{ports::QTableRepository, q_learning::TableFormat};

/// Build the file repository for `format`.
pub fn file_repository<P: Into<PathBuf>>(
    path: P,
    format: TableFormat,
) -> Box<dyn QTableRepository> {
    match format {
        TableFormat::Json => Box::new(JsonFileRepository::new(path)),
        TableFormat::MsgPack => Box::new(MsgPackRepository::new(path)),
    }
}
