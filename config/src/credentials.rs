//! Credential Store: the single persisted API key.
//!
//! [`FileCredentialStore`] keeps a read-through cache over `credentials.toml`.
//! The cache is updated before persistence is attempted, so a key saved during a
//! session stays usable even when the write fails (read-only home, full disk).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use parley_types::Credential;
use thiserror::Error;

use crate::persist::write_private_file;

const SECTION: &str = "gemini";
const KEY: &str = "api_key";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential must not be blank")]
    Blank,
    #[error("failed to save credential to {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Persistent home of the API credential.
///
/// Storage failures are reported through `Err` and never panic; callers surface
/// them as a notice and keep going.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Option<Credential>;

    fn set(&self, value: &str) -> Result<(), CredentialError>;

    fn clear(&self) -> Result<(), CredentialError>;

    fn is_configured(&self) -> bool {
        self.get().is_some()
    }
}

#[derive(Debug)]
enum Cache {
    Unloaded,
    Loaded(Option<Credential>),
}

#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    cache: Mutex<Cache>,
}

impl FileCredentialStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(Cache::Unloaded),
        }
    }

    /// Store at `~/.parley/credentials.toml`.
    #[must_use]
    pub fn at_default_location() -> Self {
        Self::new(crate::credentials_path())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cache(&self) -> MutexGuard<'_, Cache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(&self) -> Option<Credential> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Failed to read credentials: {e}");
                return None;
            }
        };

        let doc = match content.parse::<toml_edit::DocumentMut>() {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Failed to parse credentials: {e}");
                return None;
            }
        };

        doc.get(SECTION)
            .and_then(|section| section.get(KEY))
            .and_then(|item| item.as_str())
            .and_then(Credential::new)
    }

    /// Existing document if it parses, otherwise a fresh one. Hand edits survive.
    fn existing_document(&self) -> toml_edit::DocumentMut {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return toml_edit::DocumentMut::new();
        };
        content.parse().unwrap_or_else(|e| {
            tracing::warn!(
                path = %self.path.display(),
                "Replacing unparseable credentials file: {e}"
            );
            toml_edit::DocumentMut::new()
        })
    }

    fn persist(&self, value: Option<&Credential>) -> Result<(), CredentialError> {
        let mut doc = self.existing_document();

        match value {
            Some(credential) => {
                if !doc.contains_key(SECTION) {
                    doc[SECTION] = toml_edit::Item::Table(toml_edit::Table::new());
                }
                doc[SECTION][KEY] = toml_edit::value(credential.expose());
            }
            None => {
                if !self.path.exists() {
                    return Ok(());
                }
                if let Some(section) = doc.get_mut(SECTION).and_then(|s| s.as_table_like_mut()) {
                    section.remove(KEY);
                }
            }
        }

        write_private_file(&self.path, doc.to_string().as_bytes()).map_err(|source| {
            tracing::warn!(path = %self.path.display(), %source, "Failed to persist credential");
            CredentialError::Persist {
                path: self.path.clone(),
                source,
            }
        })
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<Credential> {
        let mut cache = self.cache();
        if let Cache::Loaded(credential) = &*cache {
            return credential.clone();
        }
        let loaded = self.load();
        *cache = Cache::Loaded(loaded.clone());
        loaded
    }

    fn set(&self, value: &str) -> Result<(), CredentialError> {
        let credential = Credential::new(value).ok_or(CredentialError::Blank)?;
        *self.cache() = Cache::Loaded(Some(credential.clone()));
        self.persist(Some(&credential))?;
        tracing::info!("Credential saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        *self.cache() = Cache::Loaded(None);
        self.persist(None)?;
        tracing::info!("Credential cleared");
        Ok(())
    }
}

/// In-process store with no persistence.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    value: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_credential(value: &str) -> Self {
        Self {
            value: Mutex::new(Credential::new(value)),
        }
    }

    fn value(&self) -> MutexGuard<'_, Option<Credential>> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.value().clone()
    }

    fn set(&self, value: &str) -> Result<(), CredentialError> {
        let credential = Credential::new(value).ok_or(CredentialError::Blank)?;
        *self.value() = Some(credential);
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        *self.value() = None;
        Ok(())
    }
}
