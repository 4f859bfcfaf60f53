//! Storage capability consumed by the browser.
//!
//! The browser never touches `std::fs` directly; everything goes through the
//! [`Storage`] trait so a device driver, the host filesystem or a test fixture
//! can sit underneath. [`LocalStorage`] mounts a host directory at `/ext`.

use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::StorageError;
use crate::path::{EXT_PATH, ROOT};

/// One raw entry produced while enumerating a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub name: String,
    pub is_dir: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub size: u64,
    pub is_dir: bool,
}

/// Streaming directory iterator. Entries are yielded in storage order, which
/// must stay stable while the directory is unchanged.
pub type DirEntries<'a> = Box<dyn Iterator<Item = RawEntry> + 'a>;

pub trait Storage: Send + Sync {
    fn read_dir(&self, path: &str) -> Result<DirEntries<'_>, StorageError>;

    fn stat(&self, path: &str) -> Result<FileInfo, StorageError>;

    fn exists(&self, path: &str) -> bool {
        self.stat(path).is_ok()
    }

    fn dir_exists(&self, path: &str) -> bool {
        self.stat(path).map(|i| i.is_dir).unwrap_or(false)
    }

    /// Remove a file or an empty directory.
    fn remove(&self, path: &str) -> Result<(), StorageError>;

    fn remove_recursive(&self, path: &str) -> Result<(), StorageError>;

    /// Rename/move. Fails with `AlreadyExists` if `dst` is taken.
    fn rename(&self, src: &str, dst: &str) -> Result<(), StorageError>;

    /// Move `src` over `dst`, replacing it.
    ///
    /// The default removes `dst` and then renames, so a crash between the two
    /// steps loses `dst`. Backends with an atomic rename-over should override.
    fn replace(&self, src: &str, dst: &str) -> Result<(), StorageError> {
        match self.remove(dst) {
            Ok(()) | Err(StorageError::NotFound) => {}
            Err(e) => return Err(e),
        }
        self.rename(src, dst)
    }

    fn mkdir(&self, path: &str) -> Result<(), StorageError>;

    /// Copy a file, or a directory tree recursively.
    fn copy(&self, src: &str, dst: &str) -> Result<(), StorageError>;

    fn open_read(&self, path: &str) -> Result<Box<dyn BufRead + '_>, StorageError>;

    /// Create or truncate a file for writing.
    fn create(&self, path: &str) -> Result<Box<dyn Write + '_>, StorageError>;

    /// Open a file for appending, creating it if needed.
    fn append(&self, path: &str) -> Result<Box<dyn Write + '_>, StorageError>;
}

/// Host-directory backend: `/ext/...` maps to `root/...`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalStorage { root: root.into() }
    }

    /// Map a virtual path onto the host. `/` itself has no host counterpart.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let rest = match path.strip_prefix(EXT_PATH) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => return Err(StorageError::NotFound),
        };
        let mut host = self.root.clone();
        for comp in Path::new(rest.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(part) => host.push(part),
                Component::CurDir => {}
                _ => return Err(StorageError::InvalidPath(path.to_string())),
            }
        }
        Ok(host)
    }
}

impl Storage for LocalStorage {
    fn read_dir(&self, path: &str) -> Result<DirEntries<'_>, StorageError> {
        if path == ROOT {
            // The virtual root only ever contains the mount point.
            let mounted = self.root.is_dir();
            let ext = RawEntry {
                name: EXT_PATH.trim_start_matches('/').to_string(),
                is_dir: true,
            };
            return Ok(Box::new(mounted.then_some(ext).into_iter()));
        }
        let host = self.resolve(path)?;
        let rd = fs::read_dir(host)?;
        Ok(Box::new(rd.filter_map(|e| e.ok()).map(|e| {
            let is_dir = match e.file_type() {
                Ok(ft) if ft.is_symlink() => e.path().is_dir(),
                Ok(ft) => ft.is_dir(),
                Err(_) => false,
            };
            RawEntry {
                name: e.file_name().to_string_lossy().into_owned(),
                is_dir,
            }
        })))
    }

    fn stat(&self, path: &str) -> Result<FileInfo, StorageError> {
        if path == ROOT {
            return Ok(FileInfo {
                size: 0,
                is_dir: true,
            });
        }
        let md = fs::metadata(self.resolve(path)?)?;
        Ok(FileInfo {
            size: if md.is_dir() { 0 } else { md.len() },
            is_dir: md.is_dir(),
        })
    }

    fn remove(&self, path: &str) -> Result<(), StorageError> {
        let host = self.resolve(path)?;
        if fs::metadata(&host)?.is_dir() {
            fs::remove_dir(host)?;
        } else {
            fs::remove_file(host)?;
        }
        Ok(())
    }

    fn remove_recursive(&self, path: &str) -> Result<(), StorageError> {
        let host = self.resolve(path)?;
        if fs::metadata(&host)?.is_dir() {
            fs::remove_dir_all(host)?;
        } else {
            fs::remove_file(host)?;
        }
        Ok(())
    }

    fn rename(&self, src: &str, dst: &str) -> Result<(), StorageError> {
        let from = self.resolve(src)?;
        let to = self.resolve(dst)?;
        if to.exists() {
            return Err(StorageError::AlreadyExists);
        }
        fs::rename(from, to)?;
        Ok(())
    }

    fn replace(&self, src: &str, dst: &str) -> Result<(), StorageError> {
        // rename(2) replaces the target atomically on the host.
        fs::rename(self.resolve(src)?, self.resolve(dst)?)?;
        Ok(())
    }

    fn mkdir(&self, path: &str) -> Result<(), StorageError> {
        fs::create_dir(self.resolve(path)?)?;
        Ok(())
    }

    fn copy(&self, src: &str, dst: &str) -> Result<(), StorageError> {
        let from = self.resolve(src)?;
        let to = self.resolve(dst)?;
        if to.exists() {
            return Err(StorageError::AlreadyExists);
        }
        if !fs::metadata(&from)?.is_dir() {
            fs::copy(&from, &to)?;
            return Ok(());
        }
        for entry in WalkDir::new(&from) {
            let entry = entry.map_err(|e| StorageError::Io(e.to_string()))?;
            let rel = entry
                .path()
                .strip_prefix(&from)
                .map_err(|e| StorageError::Io(e.to_string()))?;
            let target = to.join(rel);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&target)?;
            } else {
                fs::copy(entry.path(), &target)?;
            }
        }
        Ok(())
    }

    fn open_read(&self, path: &str) -> Result<Box<dyn BufRead + '_>, StorageError> {
        let file = fs::File::open(self.resolve(path)?)?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn create(&self, path: &str) -> Result<Box<dyn Write + '_>, StorageError> {
        let file = fs::File::create(self.resolve(path)?)?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn append(&self, path: &str) -> Result<Box<dyn Write + '_>, StorageError> {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.resolve(path)?)?;
        Ok(Box::new(BufWriter::new(file)))
    }
}
