//! Filesystem access behind a trait, so the handler never touches `std::fs`
//! directly.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// The filesystem queries the request handler needs.
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// True only for regular files; pipes, sockets and devices are not.
    fn is_file(&self, path: &Path) -> bool;

    /// Absolute form of `path` with every link resolved.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Names of the immediate children of a directory.
    fn list_children(&self, path: &Path) -> io::Result<Vec<String>>;

    fn last_modified(&self, path: &Path) -> io::Result<SystemTime>;

    fn read_all(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// `FileSystem` backed by the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }

    fn list_children(&self, path: &Path) -> io::Result<Vec<String>> {
        std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect()
    }

    fn last_modified(&self, path: &Path) -> io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }

    fn read_all(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}
