//! Maps a decoded request path onto the served root and classifies it.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::files::fs::FileSystem;
use crate::files::gzip;
use crate::http::mime;

/// What a request path points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEntry {
    Missing,
    /// Immediate child names, sorted.
    Directory(Vec<String>),
    File(FileEntry),
}

/// A regular file, already compressed and tagged for this request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub extension: String,
    pub last_modified: DateTime<Utc>,
    pub gzipped: Vec<u8>,
    pub etag: String,
}

/// Joins `request_path` onto `root`.
///
/// Empty and `.` segments are skipped and `..` removes the previous
/// segment. Returns `None` when `..` would climb out of `root`.
pub fn served_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in request_path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            s => segments.push(s),
        }
    }

    let mut path = root.to_path_buf();
    path.extend(segments);
    Some(path)
}

/// Resolves `request_path` against `root` through `fs`.
///
/// `root` must already be canonical. An entry whose resolved location lies
/// outside `root`, or that is neither a directory nor a regular file, is
/// `Missing`. Listing or reading failures on an entry that exists are
/// returned as errors; the caller abandons the connection.
pub fn resolve(fs: &dyn FileSystem, root: &Path, request_path: &str) -> io::Result<ResourceEntry> {
    let Some(target) = served_path(root, request_path) else {
        tracing::warn!(path = %request_path, "Request path escapes the served root");
        return Ok(ResourceEntry::Missing);
    };

    if !fs.exists(&target) {
        return Ok(ResourceEntry::Missing);
    }

    let real = fs.canonicalize(&target)?;
    if !real.starts_with(root) {
        tracing::warn!(path = %request_path, resolved = %real.display(), "Link points outside the served root");
        return Ok(ResourceEntry::Missing);
    }

    if fs.is_dir(&real) {
        let mut children = fs.list_children(&real)?;
        children.sort();
        return Ok(ResourceEntry::Directory(children));
    }

    if !fs.is_file(&real) {
        tracing::warn!(path = %request_path, "Not a regular file");
        return Ok(ResourceEntry::Missing);
    }

    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let last_modified = DateTime::<Utc>::from(fs.last_modified(&real)?);
    let gzipped = gzip::compress(&fs.read_all(&real)?)?;
    let etag = gzip::etag(&gzipped);

    Ok(ResourceEntry::File(FileEntry {
        extension: mime::extension(&name),
        name,
        last_modified,
        gzipped,
        etag,
    }))
}
