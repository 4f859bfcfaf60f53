use std::io;

use thiserror::Error;

use crate::actions::MenuItem;

/// Failures reported by a [`Storage`](crate::storage::Storage) backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("file not found")]
    NotFound,
    #[error("file already exists")]
    AlreadyExists,
    #[error("permission denied")]
    PermissionDenied,
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound,
            io::ErrorKind::AlreadyExists => StorageError::AlreadyExists,
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied,
            _ => StorageError::Io(err.to_string()),
        }
    }
}

/// Errors from user-initiated file operations. These are the only failures
/// the browser surfaces; navigation problems degrade to empty listings.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("invalid name: {0:?}")]
    InvalidName(String),
    #[error("name is too long ({len} >= {max})")]
    NameTooLong { len: usize, max: usize },
    #[error("nothing selected")]
    NothingSelected,
    #[error("{0} is not supported here")]
    NotSupported(&'static str),
    #[error("{0} is not available here")]
    NotInMenu(MenuItem),
    #[error("launch failed: {0}")]
    Launch(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("malformed config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
