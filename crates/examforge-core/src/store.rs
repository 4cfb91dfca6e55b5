//! Persistence collaborator.
//!
//! The engine only needs an opaque string key-value store. [`Storage`]
//! layers typed, versioned keys on top of any [`Store`] and treats
//! unreadable values as absent.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::attempt::Attempt;
use crate::error::StoreError;
use crate::profiler::WeaknessProfile;
use crate::settings::Settings;
use crate::statistics::HistoryEntry;

/// Namespace shared by every storage version.
pub const NAMESPACE: &str = "examforge:";

/// Prefix of the current storage layout.
pub const PREFIX: &str = "examforge:v2:";

/// Opaque key-value store.
pub trait Store {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// In-memory store, used by tests and one-shot CLI commands.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.values.keys().cloned().collect())
    }
}

/// One JSON file per key inside a directory.
///
/// `:` in keys becomes `__` in file names.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key.replace(':', "__")))
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::write(self.path_for(key), value).map_err(|source| StoreError::Io {
            key: key.to_string(),
            source,
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let io_err = |source| StoreError::Io {
            key: self.dir.display().to_string(),
            source,
        };
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.replace("__", ":"));
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Logical keys under [`PREFIX`].
pub mod keys {
    pub const SETTINGS: &str = "settings";
    pub const CURRENT_ATTEMPT: &str = "attempt:current";
    /// Most recently submitted attempt, kept for retakes.
    pub const LAST_ATTEMPT: &str = "attempt:last";
    pub const HISTORY: &str = "attempt:history";
    pub const WEAKNESS: &str = "weakness_profile";

    pub const ALL: [&str; 5] = [SETTINGS, CURRENT_ATTEMPT, LAST_ATTEMPT, HISTORY, WEAKNESS];
}

/// Typed access to settings, the current attempt, history and the
/// weakness profile.
#[derive(Debug)]
pub struct Storage<S> {
    store: S,
}

impl<S: Store> Storage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn full_key(name: &str) -> String {
        format!("{PREFIX}{name}")
    }

    /// Read and decode a value. Missing, unreadable and corrupt values are
    /// all reported as `None`.
    fn safe_parse<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let key = Self::full_key(name);
        let raw = match self.store.get(&key) {
            Ok(Some(raw)) if !raw.trim().is_empty() => raw,
            Ok(_) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read stored value");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "ignoring corrupt stored value");
                None
            }
        }
    }

    fn write<T: Serialize>(&mut self, name: &str, value: &T) -> Result<(), StoreError> {
        let key = Self::full_key(name);
        let json = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
            key: key.clone(),
            source,
        })?;
        self.store.set(&key, &json)
    }

    pub fn load_settings(&self) -> Option<Settings> {
        self.safe_parse(keys::SETTINGS)
    }

    pub fn save_settings(&mut self, settings: &Settings) -> Result<(), StoreError> {
        self.write(keys::SETTINGS, settings)
    }

    pub fn load_attempt(&self) -> Option<Attempt> {
        self.safe_parse(keys::CURRENT_ATTEMPT)
    }

    pub fn save_attempt(&mut self, attempt: &Attempt) -> Result<(), StoreError> {
        self.write(keys::CURRENT_ATTEMPT, attempt)
    }

    pub fn clear_attempt(&mut self) -> Result<(), StoreError> {
        self.store.remove(&Self::full_key(keys::CURRENT_ATTEMPT))
    }

    pub fn load_last_attempt(&self) -> Option<Attempt> {
        self.safe_parse(keys::LAST_ATTEMPT)
    }

    pub fn save_last_attempt(&mut self, attempt: &Attempt) -> Result<(), StoreError> {
        self.write(keys::LAST_ATTEMPT, attempt)
    }

    /// Most recent first; empty when absent or corrupt.
    pub fn load_history(&self) -> Vec<HistoryEntry> {
        self.safe_parse(keys::HISTORY).unwrap_or_default()
    }

    pub fn save_history(&mut self, history: &[HistoryEntry]) -> Result<(), StoreError> {
        self.write(keys::HISTORY, &history)
    }

    pub fn load_weakness(&self) -> Option<WeaknessProfile> {
        self.safe_parse(keys::WEAKNESS)
    }

    pub fn save_weakness(&mut self, profile: &WeaknessProfile) -> Result<(), StoreError> {
        self.write(keys::WEAKNESS, profile)
    }

    /// Remove every key of the current layout.
    pub fn clear_all(&mut self) -> Result<(), StoreError> {
        for name in keys::ALL {
            self.store.remove(&Self::full_key(name))?;
        }
        Ok(())
    }

    /// Drop everything in the namespace when any key predates the current
    /// layout. Returns the number of keys removed.
    pub fn migrate_if_needed(&mut self) -> Result<usize, StoreError> {
        let existing: Vec<String> = self
            .store
            .keys()?
            .into_iter()
            .filter(|k| k.starts_with(NAMESPACE))
            .collect();
        if !existing.iter().any(|k| !k.starts_with(PREFIX)) {
            return Ok(0);
        }
        for key in &existing {
            self.store.remove(key)?;
        }
        tracing::info!(removed = existing.len(), "cleared stored data from an older layout");
        Ok(existing.len())
    }
}
