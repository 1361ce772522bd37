//! Persistent storage boundary
//!
//! The only state this core persists is the antenna-name blob. The store is
//! a trait so the firmware build can back it with NVS while tests and the
//! desktop monitor use a file.

use std::io;
use std::path::PathBuf;

/// Opaque save/load pair for the antenna-name blob
pub trait NameStore: Send + Sync {
    /// Persist the blob, replacing any previous one
    fn save(&self, blob: &[u8]) -> io::Result<()>;

    /// Load the blob; `None` when nothing has been saved yet
    fn load(&self) -> io::Result<Option<Vec<u8>>>;
}

/// File-backed name store
pub struct FileNameStore {
    path: PathBuf,
}

impl FileNameStore {
    /// Store the blob at the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl NameStore for FileNameStore {
    fn save(&self, blob: &[u8]) -> io::Result<()> {
        std::fs::write(&self.path, blob)
    }

    fn load(&self) -> io::Result<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "panel-names-{}.json",
            std::process::id()
        ));
        let store = FileNameStore::new(&path);

        assert_eq!(store.load().unwrap(), None);

        store.save(b"[\"a\",\"b\"]").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some(&b"[\"a\",\"b\"]"[..]));

        std::fs::remove_file(&path).ok();
    }
}
