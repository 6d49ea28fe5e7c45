//! Shared file handling for the file-backed repositories.

use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use tracing::warn;

use crate::{Result, error::Error, q_learning::QTable, q_learning::TableFormat};

/// Read a table from `path`, treating a missing file as a cold start.
pub(crate) fn read_table(path: &Path, format: TableFormat) -> Result<QTable> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(source) if source.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "Q-table file not found, starting with an empty table");
            return Ok(QTable::new());
        }
        Err(source) => {
            return Err(Error::Io {
                operation: format!("read Q-table {path:?}"),
                source,
            });
        }
    };
    format.decode(&bytes, &path.display().to_string())
}

/// Write a table to `path` via a sibling temporary file and a rename.
///
/// Missing parent directories are created.
pub(crate) fn write_table(path: &Path, format: TableFormat, table: &QTable) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| Error::Io {
            operation: format!("create directory {parent:?}"),
            source,
        })?;
    }

    let bytes = format.encode(table)?;
    let staging = staging_path(path);

    let mut file = fs::File::create(&staging).map_err(|source| Error::Io {
        operation: format!("create file {staging:?}"),
        source,
    })?;
    file.write_all(&bytes)
        .and_then(|()| file.sync_all())
        .map_err(|source| Error::Io {
            operation: format!("write file {staging:?}"),
            source,
        })?;
    drop(file);

    fs::rename(&staging, path).map_err(|source| Error::Io {
        operation: format!("replace {path:?}"),
        source,
    })
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
