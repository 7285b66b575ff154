//! File-backed preference storage.
//!
//! Each key is one file inside a state directory opened through a
//! `cap-std` capability, so the backend can never touch paths outside it.
//! Writes go to a temporary sibling first and are then renamed into place.

use super::backend::{PreferenceBackend, StorageError};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use std::io;

/// Preference backend storing one file per key in a directory.
#[derive(Debug)]
pub struct FileBackend {
    dir: Dir,
    path: Utf8PathBuf,
}

impl FileBackend {
    /// Open (creating if needed) the state directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] when the directory cannot be
    /// created or opened.
    pub fn open(path: &Utf8Path) -> Result<Self, StorageError> {
        let unavailable = |err: io::Error| StorageError::Unavailable {
            reason: format!("cannot open state directory '{path}': {err}"),
        };
        std::fs::create_dir_all(path.as_std_path()).map_err(unavailable)?;
        let dir = Dir::open_ambient_dir(path, ambient_authority()).map_err(unavailable)?;
        Ok(Self {
            dir,
            path: path.to_owned(),
        })
    }

    /// Location of the state directory.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn file_name(key: &str) -> Result<String, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if valid {
            Ok(format!("{key}.pref"))
        } else {
            Err(StorageError::InvalidKey {
                key: key.to_owned(),
            })
        }
    }
}

impl PreferenceBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let name = Self::file_name(key)?;
        match self.dir.read_to_string(&name) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                action: "read",
                key: key.to_owned(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let name = Self::file_name(key)?;
        let staging = format!("{name}.tmp");
        let io_error = |source| StorageError::Io {
            action: "write",
            key: key.to_owned(),
            source,
        };
        self.dir.write(&staging, value).map_err(io_error)?;
        self.dir
            .rename(&staging, &self.dir, &name)
            .map_err(io_error)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let name = Self::file_name(key)?;
        match self.dir.remove_file(&name) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                action: "remove",
                key: key.to_owned(),
                source,
            }),
        }
    }
}
