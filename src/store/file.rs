use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::ThreelegError;

use super::CredentialStore;

/// Default store location: `$THREELEG_STORE`, else `~/.threeleg/credentials.json`.
pub fn default_store_path() -> PathBuf {
    if let Ok(path) = std::env::var("THREELEG_STORE") {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".threeleg")
        .join("credentials.json")
}

/// JSON file holding a flat key/value map.
///
/// Every operation re-reads the file so that separate CLI invocations see
/// each other's writes. The file is created with owner-only permissions.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn open_default() -> Self {
        Self::new(default_store_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, ThreelegError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if data.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&data).map_err(|e| {
            ThreelegError::Store(format!(
                "Corrupt credential file {}: {e}",
                self.path.display()
            ))
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), ThreelegError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_string_pretty(entries)
            .map_err(|e| ThreelegError::Store(format!("Failed to serialize credentials: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, data)?;
        restrict_permissions(&tmp)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn locked<T>(
        &self,
        op: impl FnOnce(&Self) -> Result<T, ThreelegError>,
    ) -> Result<T, ThreelegError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| ThreelegError::Store("file store lock poisoned".to_string()))?;
        op(self)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), ThreelegError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), ThreelegError> {
    Ok(())
}

impl CredentialStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, ThreelegError> {
        self.locked(|store| Ok(store.read_entries()?.get(key).cloned()))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), ThreelegError> {
        self.locked(|store| {
            let mut entries = store.read_entries()?;
            entries.insert(key.to_string(), value.to_string());
            store.write_entries(&entries)
        })
    }

    fn remove(&self, key: &str) -> Result<(), ThreelegError> {
        self.locked(|store| {
            let mut entries = store.read_entries()?;
            if entries.remove(key).is_none() {
                return Ok(());
            }
            store.write_entries(&entries)
        })
    }
}
