//! Snapshot storage backends.

use std::cell::RefCell;
use std::convert::Infallible;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::SnapshotStorage;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("snapshot I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Stores the snapshot as a single JSON file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SnapshotStorage for FileStorage {
    type Error = StorageError;

    fn read_snapshot(&self) -> Result<Option<String>, Self::Error> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_error(err)),
        }
    }

    /// Writes a sibling temp file, then renames it over the snapshot.
    fn write_snapshot(&self, contents: &str) -> Result<(), Self::Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, contents).map_err(|err| self.io_error(err))?;
        fs::rename(&staging, &self.path).map_err(|err| self.io_error(err))
    }
}

/// Keeps the snapshot in memory. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    contents: Rc<RefCell<Option<String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Rc::new(RefCell::new(Some(contents.into()))),
        }
    }

    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.contents.borrow().clone()
    }
}

impl SnapshotStorage for MemoryStorage {
    type Error = Infallible;

    fn read_snapshot(&self) -> Result<Option<String>, Self::Error> {
        Ok(self.contents())
    }

    fn write_snapshot(&self, contents: &str) -> Result<(), Self::Error> {
        *self.contents.borrow_mut() = Some(contents.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "rankline-storage-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn missing_file_reads_as_none() {
        let storage = FileStorage::new(temp_path("missing").join("state.json"));
        assert!(storage.read_snapshot().unwrap().is_none());
    }

    #[test]
    fn file_round_trip_creates_parent_dirs() {
        let dir = temp_path("roundtrip");
        let storage = FileStorage::new(dir.join("nested").join("state.json"));
        storage.write_snapshot("{\"a\":1}").unwrap();
        assert_eq!(storage.read_snapshot().unwrap().as_deref(), Some("{\"a\":1}"));
        storage.write_snapshot("{}").unwrap();
        assert_eq!(storage.read_snapshot().unwrap().as_deref(), Some("{}"));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn directory_in_place_of_file_is_an_error() {
        let dir = temp_path("dir-as-file");
        std::fs::create_dir_all(&dir).unwrap();
        let storage = FileStorage::new(&dir);
        assert!(matches!(storage.read_snapshot(), Err(StorageError::Io { .. })));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn memory_clones_share_contents() {
        let storage = MemoryStorage::default();
        let handle = storage.clone();
        storage.write_snapshot("saved").unwrap();
        assert_eq!(handle.contents().as_deref(), Some("saved"));
    }
}
