use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use tracing::{debug, warn};

use crate::error::CacheError;

/// Flat string key/value persistence, the server-side stand-in for browser
/// local storage. Calls never suspend.
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;

    /// The value must stay readable through `get_item` even when persisting fails.
    fn set_item(&self, key: &str, value: String) -> Result<(), CacheError>;

    fn remove_item(&self, key: &str) -> Result<(), CacheError>;
}

fn lock(items: &Mutex<HashMap<String, String>>) -> MutexGuard<'_, HashMap<String, String>> {
    items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        lock(&self.items).get(key).cloned()
    }

    fn set_item(&self, key: &str, value: String) -> Result<(), CacheError> {
        lock(&self.items).insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), CacheError> {
        lock(&self.items).remove(key);
        Ok(())
    }
}

/// All items live in one JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the storage file. An unreadable or corrupt file
    /// starts out empty rather than failing.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let items = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(items) => {
                    debug!(path = %path.display(), count = items.len(), "loaded storage file");
                    items
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "storage file is corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "storage file unreadable, starting empty");
                HashMap::new()
            }
        };

        Self {
            path,
            items: Mutex::new(items),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, items: &HashMap<String, String>) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let body = serde_json::to_string(items)?;
        fs::write(&self.path, body)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        lock(&self.items).get(key).cloned()
    }

    fn set_item(&self, key: &str, value: String) -> Result<(), CacheError> {
        let mut items = lock(&self.items);
        items.insert(key.to_string(), value);
        self.flush(&items)
    }

    fn remove_item(&self, key: &str) -> Result<(), CacheError> {
        let mut items = lock(&self.items);
        if items.remove(key).is_some() {
            self.flush(&items)?;
        }
        Ok(())
    }
}
