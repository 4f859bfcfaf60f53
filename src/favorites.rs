//! Pinned entries, one virtual path per line.
//!
//! The list is never kept in memory beyond a single call. Every edit writes
//! the complete new list to a temp file and then moves it over the original
//! with [`Storage::replace`].

use std::io::{BufRead, Write};
use std::sync::Arc;

use crate::apps;
use crate::error::StorageError;
use crate::path;
use crate::storage::Storage;

pub const FAVORITES_PATH: &str = "/ext/favorites.txt";
pub const FAVORITES_TMP_PATH: &str = "/ext/favorites.tmp";

/// Result of reading the list with dead entries filtered out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoritesListing {
    pub entries: Vec<String>,
    /// Some lines pointed at missing files or unavailable apps.
    pub needs_rewrite: bool,
}

#[derive(Clone)]
pub struct FavoritesStore {
    storage: Arc<dyn Storage>,
}

impl FavoritesStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        FavoritesStore { storage }
    }

    /// Number of non-empty lines; 0 if the file does not exist.
    pub fn count(&self) -> usize {
        match self.read_lines() {
            Ok(lines) => lines.len(),
            Err(e) => {
                log::debug!("favorites: count failed: {}", e);
                0
            }
        }
    }

    pub fn read_all(&self) -> Result<FavoritesListing, StorageError> {
        let mut listing = FavoritesListing::default();
        for line in self.read_lines()? {
            if self.is_valid(&line) {
                listing.entries.push(line);
            } else {
                log::debug!("favorites: dropping dead entry {}", line);
                listing.needs_rewrite = true;
            }
        }
        Ok(listing)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.read_lines()
            .map(|lines| lines.iter().any(|l| l == path))
            .unwrap_or(false)
    }

    /// Append one line. Duplicates are kept.
    pub fn add(&self, path: &str) -> Result<(), StorageError> {
        let mut file = self.storage.append(FAVORITES_PATH)?;
        writeln!(file, "{}", path)?;
        file.flush()?;
        log::debug!("favorites: added {}", path);
        Ok(())
    }

    /// Remove every line equal to `path`.
    pub fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.rewrite(|line| (line != path).then(|| line.to_string()))
    }

    /// Remove `path` and anything pinned below it, after a delete on disk.
    pub fn delete_tree(&self, path: &str) -> Result<(), StorageError> {
        self.rewrite(|line| (!path::is_under(line, path)).then(|| line.to_string()))
    }

    /// Point entries at `src` (or below it) to `dst`.
    pub fn rename(&self, src: &str, dst: &str) -> Result<(), StorageError> {
        self.rewrite(|line| {
            if path::is_under(line, src) {
                Some(format!("{}{}", dst, &line[src.len()..]))
            } else {
                Some(line.to_string())
            }
        })
    }

    /// Rename helper for callers that know the directory and the old name.
    pub fn rename_in_favorites(
        &self,
        dir: &str,
        old_name: &str,
        new_path: &str,
    ) -> Result<(), StorageError> {
        self.rename(&path::join_path(dir, old_name), new_path)
    }

    pub fn rewrite_dropping_invalid(&self) -> Result<(), StorageError> {
        self.rewrite(|line| self.is_valid(line).then(|| line.to_string()))
    }

    /// Replace the whole list, e.g. after reordering.
    pub fn save(&self, paths: &[String]) -> Result<(), StorageError> {
        self.write_replacing(paths.iter().map(String::as_str))
    }

    fn is_valid(&self, line: &str) -> bool {
        if path::is_app_path(line) {
            apps::is_available(self.storage.as_ref(), line)
        } else {
            self.storage.exists(line)
        }
    }

    fn read_lines(&self) -> Result<Vec<String>, StorageError> {
        let reader = match self.storage.open_read(FAVORITES_PATH) {
            Ok(r) => r,
            Err(StorageError::NotFound) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut lines = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if !line.is_empty() {
                lines.push(line);
            }
        }
        Ok(lines)
    }

    /// Map every line through `f` (None drops it) and write the result back.
    /// A missing list stays missing.
    fn rewrite<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if !self.storage.exists(FAVORITES_PATH) {
            return Ok(());
        }
        let lines: Vec<String> = self.read_lines()?.iter().filter_map(|l| f(l)).collect();
        self.write_replacing(lines.iter().map(String::as_str))
    }

    fn write_replacing<'a>(&self, lines: impl Iterator<Item = &'a str>) -> Result<(), StorageError> {
        {
            let mut tmp = self.storage.create(FAVORITES_TMP_PATH)?;
            for line in lines {
                writeln!(tmp, "{}", line)?;
            }
            tmp.flush()?;
        }
        self.storage.replace(FAVORITES_TMP_PATH, FAVORITES_PATH)?;
        log::debug!("favorites: list rewritten");
        Ok(())
    }
}
