//! Key-value persistence slots.
//!
//! The task store only needs "read a named slot" and "overwrite a named slot".
//! `FileStorage` keeps one JSON file per slot in the data directory;
//! `MemoryStorage` keeps slots in a map and is what tests use.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A named-slot text store.
pub trait Storage {
    /// Read the slot, `None` if it has never been written.
    fn get(&self, key: &str) -> io::Result<Option<String>>;
    /// Replace the slot's contents.
    fn set(&mut self, key: &str, value: &str) -> io::Result<()>;
}

/// Slots as `<dir>/<key>.json` files.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir` for slot files, creating it if needed.
    pub fn open(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(FileStorage { dir: dir.to_path_buf() })
    }

    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.slot_path(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Atomic-ish write via temp file + rename.
    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        let path = self.slot_path(key);
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        f.write_all(value.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }
}

/// In-memory slots. Clones share the same map, so a test can keep a handle
/// and inspect what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(key: &str, value: &str) -> Self {
        let storage = Self::default();
        if let Ok(mut slots) = storage.slots.lock() {
            slots.insert(key.to_string(), value.to_string());
        }
        storage
    }

    /// A storage whose writes always fail, for exercising persist errors.
    pub fn read_only(self) -> Self {
        MemoryStorage { fail_writes: true, ..self }
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "storage lock poisoned"))?;
        Ok(slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "storage is read-only"));
        }
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "storage lock poisoned"))?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
