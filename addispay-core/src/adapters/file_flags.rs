//! JSON file flag store
//!
//! Flags live in `session.json` inside the app directory. Every write
//! rewrites the whole map while holding an exclusive lock on
//! `session.json.lock`, then renames a temp file over the original so a
//! crash never leaves a half-written file behind.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::domain::result::{Error, Result};
use crate::ports::FlagStore;

const FLAGS_FILENAME: &str = "session.json";

pub struct FileFlagStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileFlagStore {
    /// Open (or lazily create) the flag file in `app_dir`
    pub fn new(app_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(app_dir)?;
        let path = app_dir.join(FLAGS_FILENAME);
        let lock_path = app_dir.join(format!("{}.lock", FLAGS_FILENAME));
        Ok(Self { path, lock_path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        let tmp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(map)?;
        std::fs::write(&tmp_path, content)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Read-modify-write under the exclusive lock
    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let lock = self.lock()?;
        let result = self.read_map().and_then(|mut map| {
            f(&mut map);
            self.write_map(&map)
        });
        FileExt::unlock(&lock).map_err(|e| Error::storage(format!("unlock failed: {}", e)))?;
        result
    }

    fn lock(&self) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        FileExt::lock_exclusive(&file)
            .map_err(|e| Error::storage(format!("could not lock {}: {}", self.lock_path.display(), e)))?;
        Ok(file)
    }
}

impl FlagStore for FileFlagStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|map| {
            map.remove(key);
        })
    }

    fn clear(&self) -> Result<()> {
        self.update(|map| map.clear())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_flags_survive_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = FileFlagStore::new(dir.path()).unwrap();
            store.set("addispay_logged_in", "true").unwrap();
            store.set("kyc_status", "APPROVED").unwrap();
        }

        let store = FileFlagStore::new(dir.path()).unwrap();
        assert_eq!(store.get("addispay_logged_in").unwrap().as_deref(), Some("true"));
        assert_eq!(store.get("kyc_status").unwrap().as_deref(), Some("APPROVED"));
    }

    #[test]
    fn test_clear_removes_every_key() {
        let dir = tempdir().unwrap();
        let store = FileFlagStore::new(dir.path()).unwrap();
        store.set("addispay_logged_in", "true").unwrap();
        store.set("addispay_admin_logged_in", "true").unwrap();
        store.set("kyc_status", "PENDING").unwrap();

        store.clear().unwrap();

        for key in ["addispay_logged_in", "addispay_admin_logged_in", "kyc_status"] {
            assert!(store.get(key).unwrap().is_none());
        }
        assert!(store.path().exists());
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = FileFlagStore::new(&dir.path().join("nested")).unwrap();
        assert!(store.get("kyc_status").unwrap().is_none());
        store.remove("kyc_status").unwrap();
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(FLAGS_FILENAME), "{not json").unwrap();
        let store = FileFlagStore::new(dir.path()).unwrap();
        assert!(matches!(store.get("kyc_status"), Err(Error::Json(_))));
    }
}
