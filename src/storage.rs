//! On-disk blob store for uploaded documents. Records reference files by the
//! stored name only; the name is generated here, so path traversal cannot be
//! expressed through the API.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

#[derive(Debug, derive_more::Display)]
pub enum StorageError {
    #[display(fmt = "invalid stored file name")]
    InvalidName,
    #[display(fmt = "file not found")]
    NotFound,
    #[display(fmt = "io error: {}", _0)]
    Io(io::Error),
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::NotFound {
            StorageError::NotFound
        } else {
            StorageError::Io(e)
        }
    }
}

#[derive(Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, stored_name: &str) -> Result<PathBuf, StorageError> {
        if stored_name.is_empty()
            || stored_name.contains('/')
            || stored_name.contains('\\')
            || stored_name.contains("..")
        {
            return Err(StorageError::InvalidName);
        }
        Ok(self.root.join(stored_name))
    }

    /// Writes the blob under a fresh uuid-based name, preserving the original
    /// extension when one is present, and returns the stored name.
    pub fn save(&self, original_name: &str, data: &[u8]) -> Result<String, StorageError> {
        fs::create_dir_all(&self.root)?;

        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| e.len() <= 16 && e.chars().all(|c| c.is_ascii_alphanumeric()));

        let stored_name = match ext {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_lowercase()),
            None => Uuid::new_v4().to_string(),
        };

        fs::write(self.path_for(&stored_name)?, data)?;
        Ok(stored_name)
    }

    pub fn read(&self, stored_name: &str) -> Result<Vec<u8>, StorageError> {
        Ok(fs::read(self.path_for(stored_name)?)?)
    }

    /// Removing an already-missing file is not an error; the record deletion
    /// that follows must still happen.
    pub fn remove(&self, stored_name: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(stored_name)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> DocumentStore {
        let dir = std::env::temp_dir().join(format!("oms-docs-{}", Uuid::new_v4()));
        DocumentStore::new(dir)
    }

    #[test]
    fn save_read_remove_roundtrip() {
        let store = store();
        let name = store.save("Policy.pdf", b"hello").unwrap();
        assert!(name.ends_with(".pdf"));
        assert_eq!(store.read(&name).unwrap(), b"hello");
        store.remove(&name).unwrap();
        assert!(matches!(store.read(&name), Err(StorageError::NotFound)));
        // second remove is a no-op
        store.remove(&name).unwrap();
    }

    #[test]
    fn traversal_names_rejected() {
        let store = store();
        assert!(matches!(
            store.read("../etc/passwd"),
            Err(StorageError::InvalidName)
        ));
        assert!(matches!(store.read(""), Err(StorageError::InvalidName)));
    }

    #[test]
    fn odd_extensions_are_dropped() {
        let store = store();
        let name = store.save("no-extension", b"x").unwrap();
        assert!(!name.contains('.'));
        let name = store.save("weird.ex!t", b"x").unwrap();
        assert!(!name.contains('.'));
    }
}
