use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Minimal string key-value storage, in the shape of browser local storage.
///
/// Reads that fail look like a missing key. `clear` never fails.
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn clear(&self, key: &str);
}

/// In-process storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

/// One JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.key_path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        sherpa_store::write_atomic(&self.key_path(key), value.as_bytes())
    }

    fn clear(&self, key: &str) {
        if let Err(e) = sherpa_store::remove_if_exists(&self.key_path(key)) {
            tracing::debug!(error = %e, key, "cannot clear stored value");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &dyn KvStore) {
        assert_eq!(store.get("k"), None);
        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v2"));
        store.clear("k");
        assert_eq!(store.get("k"), None);
        store.clear("k");
    }

    #[test]
    fn memory_store_get_set_clear() {
        exercise(&MemoryStore::new());
    }

    #[test]
    fn file_store_get_set_clear() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path().join("prefs"));
        exercise(&store);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let tmp = tempfile::tempdir().unwrap();
        FileStore::new(tmp.path()).set("k", "kept").unwrap();
        assert_eq!(FileStore::new(tmp.path()).get("k").as_deref(), Some("kept"));
    }
}
