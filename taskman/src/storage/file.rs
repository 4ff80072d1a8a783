//! Directory-backed storage: one file per key.
//!
//! Values are written to a sibling temp file, flushed to disk and renamed
//! into place, so a crash mid-write leaves either the old or the new value,
//! never a torn one.

use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::{Storage, StorageError};

/// Stores each key as a file under a root directory.
///
/// Keys become file names verbatim, so they must be plain identifiers
/// (the client only uses fixed ASCII keys).
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Creates storage rooted at `root`. The directory is created lazily on
    /// the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default location: `<data dir>/taskman`, falling back to the temp dir
    /// when the platform reports no data directory.
    #[must_use]
    pub fn default_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("taskman")
    }

    /// Root directory of this store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

fn map_write_error(err: std::io::Error) -> StorageError {
    if err.kind() == ErrorKind::StorageFull {
        StorageError::Unavailable(format!("disk full: {err}"))
    } else {
        StorageError::Io(err)
    }
}

/// Writes `value` to `path` and waits for the data to reach the disk.
fn write_synced(path: &Path, value: &str) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.root).map_err(map_write_error)?;
        let tmp = self.root.join(format!(".{key}.tmp"));
        write_synced(&tmp, value).map_err(map_write_error)?;
        std::fs::rename(&tmp, self.path_for(key)).map_err(map_write_error)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
