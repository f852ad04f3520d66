//! Static file serving
//!
//! This module resolves request paths under the served root and builds the
//! responses: directory listings, gzip-compressed files with ETags, and the
//! conditional-request outcomes.

pub mod conditional;
pub mod fs;
pub mod gzip;
pub mod handler;
pub mod resolver;

pub use fs::{FileSystem, LocalFileSystem};
pub use handler::StaticHandler;
pub use resolver::{FileEntry, ResourceEntry};
