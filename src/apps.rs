//! Synthetic listings backed by installed sub-applications.
//!
//! Such entries live under `/app:<id>/...` and have no file of their own; their
//! presence and deletion are defined by the application's data files.

use crate::error::StorageError;
use crate::filter::{self, Category};
use crate::path::{self, APP_PREFIX};
use crate::storage::Storage;

const U2F_KEY_FILE: &str = "/ext/u2f/key.u2f";
const U2F_CNT_FILE: &str = "/ext/u2f/cnt.u2f";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SyntheticApp {
    U2f,
}

const APPS: &[SyntheticApp] = &[SyntheticApp::U2f];

impl SyntheticApp {
    pub fn from_id(id: &str) -> Option<Self> {
        APPS.iter().copied().find(|app| app.id() == id)
    }

    /// Resolve the app owning a `/app:<id>/...` path.
    pub fn from_path(path: &str) -> Option<Self> {
        filter::app_id(path).and_then(Self::from_id)
    }

    pub fn id(&self) -> &'static str {
        match self {
            SyntheticApp::U2f => "u2f",
        }
    }

    pub fn category(&self) -> Category {
        match self {
            SyntheticApp::U2f => Category::U2f,
        }
    }

    pub fn root_path(&self) -> String {
        format!("{}{}", APP_PREFIX, self.id())
    }

    /// Paths shown when the app's tab is open.
    pub fn entries(&self) -> Vec<String> {
        match self {
            SyntheticApp::U2f => vec![path::join_path(&self.root_path(), "U2F Token")],
        }
    }

    pub fn is_available(&self, storage: &dyn Storage) -> bool {
        match self {
            SyntheticApp::U2f => storage.exists(U2F_KEY_FILE) && storage.exists(U2F_CNT_FILE),
        }
    }

    /// Delete the data that makes the synthetic entry exist.
    pub fn delete(&self, storage: &dyn Storage) -> Result<(), StorageError> {
        match self {
            SyntheticApp::U2f => {
                for file in [U2F_KEY_FILE, U2F_CNT_FILE] {
                    match storage.remove(file) {
                        Ok(()) | Err(StorageError::NotFound) => {}
                        Err(e) => return Err(e),
                    }
                }
                Ok(())
            }
        }
    }
}

/// Availability check for any `/app:` path; unknown apps are unavailable.
pub fn is_available(storage: &dyn Storage, path: &str) -> bool {
    SyntheticApp::from_path(path)
        .map(|app| app.is_available(storage))
        .unwrap_or(false)
}
