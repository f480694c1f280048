//! File-backed storage: one JSON file holding the whole key-value map.
//!
//! The file is shared between processes, so every mutation takes an
//! exclusive lock, re-reads the current contents, applies the change and
//! rewrites the file in place. A missing or unreadable file reads as empty.

use std::collections::HashMap;
use std::fs;
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;

use fs4::FileExt;
use serde::{Deserialize, Serialize};

use super::{KeyValueStorage, StorageError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StorageFile {
    version: u8,
    entries: HashMap<String, String>,
}

impl StorageFile {
    fn empty() -> Self {
        Self {
            version: 1,
            entries: HashMap::new(),
        }
    }
}

/// Persistent storage backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Create a storage area backed by the given file.
    ///
    /// The file is created lazily on first write.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Create a storage area at the default location,
    /// `~/.willingtree/storage.json`.
    pub fn open_default() -> Self {
        let path = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".willingtree")
            .join("storage.json");
        Self { path }
    }

    fn read_file(&self) -> Result<StorageFile, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StorageFile::empty());
            }
            Err(e) => return Err(e.into()),
        };
        // An unparseable file is treated as empty rather than wedging every
        // caller behind a parse error.
        Ok(serde_json::from_str(&content).unwrap_or_else(|_| StorageFile::empty()))
    }

    /// Lock the file, apply `mutate` to the current map, and rewrite the
    /// file if `mutate` reports a change. Returns whatever `mutate` returns.
    fn with_entries_mut<T>(
        &self,
        mutate: impl FnOnce(&mut HashMap<String, String>) -> (T, bool),
    ) -> Result<T, StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        file.lock_exclusive()?;

        let result = (|| {
            let mut store = self.read_file()?;
            let (value, changed) = mutate(&mut store.entries);
            if changed {
                let json = serde_json::to_string_pretty(&store)?;
                file.set_len(0)?;
                file.seek(SeekFrom::Start(0))?;
                file.write_all(json.as_bytes())?;
                file.sync_all()?;
            }
            Ok(value)
        })();

        fs4::FileExt::unlock(&file)?;
        result
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_file()?.entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_entries_mut(|entries| {
            entries.insert(key.to_string(), value.to_string());
            ((), true)
        })
    }

    fn remove(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_entries_mut(|entries| {
            let prior = entries.remove(key);
            let changed = prior.is_some();
            (prior, changed)
        })
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.read_file()?.entries.keys().cloned().collect())
    }
}
