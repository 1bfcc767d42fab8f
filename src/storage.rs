//! Persistent key-value storage for client state.
//!
//! The only value the client keeps is the session token, stored under
//! [`TOKEN_KEY`]. [`FileStore`] keeps all entries in a single TOML table.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::Result;
use tracing::{debug, warn};

/// Key the session token is stored under.
pub const TOKEN_KEY: &str = "token";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Store backed by a TOML file.
///
/// The file is read on every access so that several running clients see each
/// other's writes.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    /// Unreadable contents are replaced rather than blocking the write.
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_all().unwrap_or_else(|e| {
            warn!(path = ?self.path, "Replacing unreadable store: {e}");
            BTreeMap::new()
        });
        entries.insert(key.to_string(), value.to_string());

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let staging = self.path.with_extension("toml.tmp");
        fs::write(&staging, toml::to_string(&entries)?)?;
        fs::rename(&staging, &self.path)?;
        debug!(key, path = ?self.path, "Stored value");
        Ok(())
    }
}

#[cfg(test)]
pub use memory::MemoryStore;

#[cfg(test)]
mod memory {
    use std::collections::HashMap;
    use std::sync::{Mutex, PoisonError};

    use color_eyre::Result;

    use super::KeyValueStore;

    /// In-process store for tests.
    #[derive(Default)]
    pub struct MemoryStore {
        entries: Mutex<HashMap<String, String>>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl KeyValueStore for MemoryStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            Ok(entries.get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.insert(key.to_string(), value.to_string());
            Ok(())
        }
    }
}
