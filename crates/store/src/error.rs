use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while opening or reading a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The file could not be opened (missing, permission denied, ...).
    #[error("cannot open store {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A writer currently holds the store's lock file.
    #[error("store {} is locked by a writer (lock file {} exists)", path.display(), lock.display())]
    Locked { path: PathBuf, lock: PathBuf },

    /// The file exists but is not a readable store.
    #[error("{} is not a valid store file: {reason}", path.display())]
    NotAStore { path: PathBuf, reason: String },

    /// The requested map is not listed in the store directory.
    #[error("map {0:?} not found")]
    MapNotFound(String),

    /// A record failed validation while iterating a map.
    #[error("corrupt store data: {0}")]
    Corrupt(String),

    /// An underlying I/O error after the store was opened.
    #[error("store i/o failed")]
    Io(#[from] io::Error),

    /// The writer was asked to produce an invalid store.
    #[error("invalid store contents: {0}")]
    Invalid(String),
}

impl StoreError {
    /// Returns `true` for the errors raised by `open`: missing file, lock
    /// held, or not a store.
    #[must_use]
    pub fn is_open_error(&self) -> bool {
        matches!(
            self,
            StoreError::Open { .. } | StoreError::Locked { .. } | StoreError::NotAStore { .. }
        )
    }
}
