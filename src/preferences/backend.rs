//! Storage backends for persisted preferences.
//!
//! A backend is a flat string key-value medium. Every call may fail; the
//! [`super::PreferenceStore`] above it decides how failures degrade.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Errors reported by a [`PreferenceBackend`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// The storage medium is switched off or cannot be reached.
    #[error("preference storage is unavailable: {reason}")]
    Unavailable {
        /// Why storage cannot be used.
        reason: String,
    },
    /// A key contained characters the backend cannot represent.
    #[error("invalid preference key '{key}'")]
    InvalidKey {
        /// The rejected key.
        key: String,
    },
    /// Reading or writing a value failed.
    #[error("failed to {action} preference '{key}': {source}")]
    Io {
        /// What was being attempted (`read`, `write`, `remove`).
        action: &'static str,
        /// The key involved.
        key: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Flat key-value storage for preference values.
pub trait PreferenceBackend: fmt::Debug + Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process backend. Values live for the lifetime of the value.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend pre-populated with `entries`.
    #[must_use]
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let values = entries
            .into_iter()
            .map(|(key, value)| (key.to_owned(), value.to_owned()))
            .collect();
        Self {
            values: Mutex::new(values),
        }
    }
}

impl PreferenceBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// Backend standing in for storage that the host has disabled.
///
/// Every operation fails with [`StorageError::Unavailable`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledBackend;

impl DisabledBackend {
    fn unavailable() -> StorageError {
        StorageError::Unavailable {
            reason: String::from("storage disabled"),
        }
    }
}

impl PreferenceBackend for DisabledBackend {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(Self::unavailable())
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(Self::unavailable())
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(Self::unavailable())
    }
}
