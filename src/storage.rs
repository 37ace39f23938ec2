//! Durable local storage for zenith
//!
//! A string-valued key-value store, mirroring the on-device storage the
//! application persists into. Two keys are used:
//!
//! ```text
//! todos        # JSON array of tasks, full snapshot rewritten on every change
//! user         # JSON object for the signed-in identity, absent when signed out
//! ```
//!
//! A `todos` value that fails to decode is moved to `todos-corrupt-<timestamp>`
//! on load and kept there.
//!
//! On disk ([`FileStore`]) each key is one file in the data directory:
//!
//! ```text
//! <data dir>/
//!   config.toml          # optional configuration
//!   todos.json
//!   user.json
//!   todos-corrupt-*.json # set-aside unreadable task lists
//!   *.json.lock          # fs2 lock files guarding writes
//!   zenith.lock          # held by a CLI command for its whole run
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};
use crate::session::Identity;
use crate::task::Task;

/// Key holding the serialized task list
pub const TODOS_KEY: &str = "todos";

/// Key holding the serialized identity
pub const USER_KEY: &str = "user";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "ZENITH_DIR";

/// Backend for string-valued storage
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!("invalid storage key '{key}'")))
    }
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    lock_timeout_ms: u64,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    /// Path of the file backing `key`
    pub fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        match fs::read_to_string(self.key_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::Io(err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        lock::write_atomic_locked(self.key_path(key), value.as_bytes(), self.lock_timeout_ms)
    }

    fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        lock::remove_locked(self.key_path(key), self.lock_timeout_ms)
    }
}

/// In-process store, used by tests and embedders without a filesystem
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| Error::StorageUnavailable("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.entries()?.remove(key);
        Ok(())
    }
}

/// Shared handle over a storage backend
///
/// Cheap to clone; the session and task stores hold clones of the same
/// handle so logout can clear the task list the task store writes.
#[derive(Debug, Clone)]
pub struct Storage {
    backend: Arc<dyn KeyValueStore>,
}

impl Storage {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// File-backed storage rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self::new(FileStore::new(dir))
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    // =========================================================================
    // Raw access
    // =========================================================================

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.backend.get(key)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.backend.set(key, value)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.backend.remove(key)
    }

    // =========================================================================
    // JSON helpers
    // =========================================================================

    /// Read and decode the JSON value under `key`, if present
    pub fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(raw) if !raw.trim().is_empty() => Ok(Some(serde_json::from_str(&raw)?)),
            _ => Ok(None),
        }
    }

    /// Encode `data` as compact JSON and overwrite `key`
    pub fn write_json<T: Serialize + ?Sized>(&self, key: &str, data: &T) -> Result<()> {
        let json = serde_json::to_string(data)?;
        self.set(key, &json)
    }

    // =========================================================================
    // Typed accessors
    // =========================================================================

    pub fn load_tasks(&self) -> Result<Option<Vec<Task>>> {
        self.read_json(TODOS_KEY)
    }

    pub fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        self.write_json(TODOS_KEY, tasks)
    }

    pub fn clear_tasks(&self) -> Result<()> {
        self.remove(TODOS_KEY)
    }

    pub fn load_identity(&self) -> Result<Option<Identity>> {
        self.read_json(USER_KEY)
    }

    pub fn save_identity(&self, identity: &Identity) -> Result<()> {
        self.write_json(USER_KEY, identity)
    }

    pub fn clear_identity(&self) -> Result<()> {
        self.remove(USER_KEY)
    }
}

/// Resolve the data directory: explicit path, then the platform data dir
///
/// `--dir` and `ZENITH_DIR` both arrive as `explicit` through clap.
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    directories::ProjectDirs::from("dev", "zenith", "zenith")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            Error::StorageUnavailable(format!(
                "no home directory found; pass --dir or set {DATA_DIR_ENV}"
            ))
        })
}
