//! Client-local persisted state
//!
//! A small JSON key/value file stands in for browser local storage. It holds
//! the session credential and the transaction view toggle.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Storage key for the bearer credential
pub const CREDENTIAL_KEY: &str = "jwt";

/// Storage key for the "show all transactions" toggle
pub const SHOW_ALL_KEY: &str = "vint_show_all_transactions";

const STORE_FILE: &str = "local_storage.json";

/// JSON-file backed key/value store
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    /// Store living in `data_dir`
    pub fn open(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(STORE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut entries = self.load()?;
        match entries.remove(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let (mut entries, _) = self.load_for_write()?;
        entries.insert(key.to_string(), serde_json::to_value(value)?);
        self.save(&entries)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let (mut entries, reset) = self.load_for_write()?;
        if entries.remove(key).is_some() || reset {
            self.save(&entries)?;
        }
        Ok(())
    }

    /// Like `load`, but an unparseable file is replaced by an empty map.
    /// The flag is set when that happened, so the caller rewrites the file.
    fn load_for_write(&self) -> Result<(BTreeMap<String, Value>, bool)> {
        match self.load() {
            Ok(entries) => Ok((entries, false)),
            Err(Error::Json(e)) => {
                warn!(
                    "Local storage at {} is corrupt, starting fresh: {}",
                    self.path.display(),
                    e
                );
                Ok((BTreeMap::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    fn load(&self) -> Result<BTreeMap<String, Value>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Write via a temp file in the same directory, then rename over the old file
    fn save(&self, entries: &BTreeMap<String, Value>) -> Result<()> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| Error::InvalidData("Storage path has no parent".into()))?;
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(serde_json::to_string_pretty(entries)?.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        debug!("Saved local storage to {}", self.path.display());
        Ok(())
    }
}

/// Bearer credential issued by the backend
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(****)")
    }
}

/// Persisted session credential
#[derive(Debug, Clone)]
pub struct Session {
    store: LocalStore,
}

impl Session {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Stored credential, if logged in
    pub fn credential(&self) -> Result<Option<Credential>> {
        Ok(self
            .store
            .get::<String>(CREDENTIAL_KEY)?
            .filter(|token| !token.is_empty())
            .map(Credential::new))
    }

    /// Stored credential, or [`Error::LoginRequired`]
    pub fn require(&self) -> Result<Credential> {
        self.credential()?.ok_or(Error::LoginRequired)
    }

    pub fn store(&self, credential: &Credential) -> Result<()> {
        self.store.set(CREDENTIAL_KEY, &credential.token())
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(CREDENTIAL_KEY)
    }
}

/// Whether the transaction list shows deleted linked transactions too
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewState {
    pub show_all: bool,
}

impl ViewState {
    pub fn toggled(self) -> Self {
        Self {
            show_all: !self.show_all,
        }
    }
}

/// Where the reconciler keeps its view toggle
pub trait ViewStateStore: Send + Sync {
    fn load_view_state(&self) -> ViewState;
    fn save_view_state(&self, state: ViewState) -> Result<()>;
}

impl ViewStateStore for LocalStore {
    /// Unreadable storage falls back to the collapsed view
    fn load_view_state(&self) -> ViewState {
        match self.get::<bool>(SHOW_ALL_KEY) {
            Ok(show_all) => ViewState {
                show_all: show_all.unwrap_or(false),
            },
            Err(e) => {
                warn!("Failed to read view state, using default: {}", e);
                ViewState::default()
            }
        }
    }

    fn save_view_state(&self, state: ViewState) -> Result<()> {
        self.set(SHOW_ALL_KEY, &state.show_all)
    }
}

/// Non-persistent view state, for callers without a data directory
#[derive(Debug, Default)]
pub struct MemoryViewState {
    state: std::sync::Mutex<ViewState>,
}

impl ViewStateStore for MemoryViewState {
    fn load_view_state(&self) -> ViewState {
        self.state.lock().map(|s| *s).unwrap_or_default()
    }

    fn save_view_state(&self, state: ViewState) -> Result<()> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| Error::InvalidData("View state lock poisoned".into()))?;
        *guard = state;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path());
        (dir, store)
    }

    #[test]
    fn test_get_missing_file_is_none() {
        let (_dir, store) = temp_store();
        assert_eq!(store.get::<String>("anything").unwrap(), None);
    }

    #[test]
    fn test_set_get_remove() {
        let (_dir, store) = temp_store();
        store.set("a", &1).unwrap();
        store.set("b", &"two").unwrap();

        assert_eq!(store.get::<i32>("a").unwrap(), Some(1));
        assert_eq!(store.get::<String>("b").unwrap(), Some("two".to_string()));

        store.remove("a").unwrap();
        assert_eq!(store.get::<i32>("a").unwrap(), None);
        assert_eq!(store.get::<String>("b").unwrap(), Some("two".to_string()));
    }

    #[test]
    fn test_writes_recover_from_corrupt_file() {
        let (dir, store) = temp_store();
        fs::write(dir.path().join(STORE_FILE), "{not json").unwrap();
        assert!(store.get::<String>(CREDENTIAL_KEY).is_err());

        store.set("a", &1).unwrap();
        assert_eq!(store.get::<i32>("a").unwrap(), Some(1));
    }

    #[test]
    fn test_remove_rewrites_corrupt_file() {
        let (dir, store) = temp_store();
        fs::write(dir.path().join(STORE_FILE), "{not json").unwrap();

        store.remove(CREDENTIAL_KEY).unwrap();
        assert_eq!(store.get::<String>(CREDENTIAL_KEY).unwrap(), None);
    }

    #[test]
    fn test_creates_missing_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(&dir.path().join("nested").join("vint"));
        store.set("k", &true).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_session_round_trip() {
        let (_dir, store) = temp_store();
        let session = Session::new(store);

        assert!(session.credential().unwrap().is_none());
        assert!(matches!(session.require(), Err(Error::LoginRequired)));

        session.store(&Credential::new("abc")).unwrap();
        assert_eq!(session.require().unwrap().token(), "abc");

        session.clear().unwrap();
        assert!(session.credential().unwrap().is_none());
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let printed = format!("{:?}", Credential::new("secret-token"));
        assert!(!printed.contains("secret"));
    }

    #[test]
    fn test_view_state_defaults_to_collapsed() {
        let (_dir, store) = temp_store();
        assert_eq!(store.load_view_state(), ViewState { show_all: false });
    }

    #[test]
    fn test_view_state_persists() {
        let (dir, store) = temp_store();
        store.save_view_state(ViewState { show_all: true }).unwrap();

        let reopened = LocalStore::open(dir.path());
        assert!(reopened.load_view_state().show_all);
    }

    #[test]
    fn test_corrupt_view_state_falls_back() {
        let (_dir, store) = temp_store();
        store.set(SHOW_ALL_KEY, &"yes").unwrap();
        assert!(!store.load_view_state().show_all);
    }

    #[test]
    fn test_memory_view_state() {
        let state = MemoryViewState::default();
        assert!(!state.load_view_state().show_all);
        state.save_view_state(ViewState::default().toggled()).unwrap();
        assert!(state.load_view_state().show_all);
    }
}
