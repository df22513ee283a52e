//! Persistent token storage
//!
//! Two independent string entries live behind [`TokenStore`]: the access
//! token and the refresh token. Nothing ties them together; either may be
//! present without the other, and the last writer wins.

use crate::{CoreError, CoreResult};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

/// The two fixed storage keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKey {
    Access,
    Refresh,
}

impl TokenKey {
    /// Name of the entry in persistent storage
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access_token",
            Self::Refresh => "refresh_token",
        }
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// String store holding the persisted tokens
///
/// Implementations do not swallow failures of the underlying medium; callers
/// decide how to tolerate them.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: TokenKey) -> CoreResult<Option<String>>;
    fn set(&self, key: TokenKey, value: &str) -> CoreResult<()>;
    fn remove(&self, key: TokenKey) -> CoreResult<()>;
}

/// Process-local token store
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: RwLock<BTreeMap<TokenKey, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: TokenKey) -> CoreResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| CoreError::storage_error("token map lock poisoned"))?;
        Ok(entries.get(&key).cloned())
    }

    fn set(&self, key: TokenKey, value: &str) -> CoreResult<()> {
        self.entries
            .write()
            .map_err(|_| CoreError::storage_error("token map lock poisoned"))?
            .insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: TokenKey) -> CoreResult<()> {
        self.entries
            .write()
            .map_err(|_| CoreError::storage_error("token map lock poisoned"))?
            .remove(&key);
        Ok(())
    }
}

/// Token store backed by a JSON object file
///
/// Every read goes to disk so separate processes observe each other's
/// writes. Writes replace the file through a sibling temporary file.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> CoreResult<BTreeMap<String, String>> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                CoreError::storage_error(format!(
                    "corrupt token file {}: {e}",
                    self.path.display()
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let mut options = OpenOptions::new();
        options.create(true).write(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&tmp_path)?;
        // `mode` only applies on creation; a stale temporary file keeps its own
        #[cfg(unix)]
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        file.write_all(&serde_json::to_vec_pretty(entries)?)?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&tmp_path, &self.path)?;
        debug!("Wrote token file {}", self.path.display());
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: TokenKey) -> CoreResult<Option<String>> {
        Ok(self.load()?.remove(key.as_str()))
    }

    fn set(&self, key: TokenKey, value: &str) -> CoreResult<()> {
        let mut entries = self.load()?;
        entries.insert(key.as_str().to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: TokenKey) -> CoreResult<()> {
        let mut entries = self.load()?;
        if entries.remove(key.as_str()).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::store::TokenStoreTestSuite;

    #[test]
    fn test_memory_store_contract() {
        TokenStoreTestSuite::new(MemoryTokenStore::new()).run_all_tests();
    }

    #[test]
    fn test_file_store_contract() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("tokens.json"));
        TokenStoreTestSuite::new(store).run_all_tests();
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tokens.json");

        FileTokenStore::new(&path)
            .set(TokenKey::Refresh, "refresh-1")
            .unwrap();

        let reopened = FileTokenStore::new(&path);
        assert_eq!(
            reopened.get(TokenKey::Refresh).unwrap().as_deref(),
            Some("refresh-1")
        );
        assert_eq!(reopened.get(TokenKey::Access).unwrap(), None);

        let on_disk: BTreeMap<String, String> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk.get("refresh_token").map(String::as_str), Some("refresh-1"));
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = FileTokenStore::new(&path);
        assert!(matches!(
            store.get(TokenKey::Access),
            Err(CoreError::Storage { .. })
        ));
        assert!(store.set(TokenKey::Access, "a").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("tokens.json"));
        store.set(TokenKey::Access, "a").unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_tightens_stale_temporary_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let stale = path.with_extension("json.tmp");
        std::fs::write(&stale, b"{}").unwrap();
        std::fs::set_permissions(&stale, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileTokenStore::new(&path);
        store.set(TokenKey::Refresh, "refresh-1").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!stale.exists());
        assert_eq!(
            store.get(TokenKey::Refresh).unwrap().as_deref(),
            Some("refresh-1")
        );
    }
}
