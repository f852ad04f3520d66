use std::io::{self, Write};

use flate2::Compression;
use flate2::write::GzEncoder;
use md5::{Digest, Md5};

/// Gzips the whole buffer in memory.
pub fn compress(raw: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(raw.len() / 2), Compression::default());
    encoder.write_all(raw)?;
    encoder.finish()
}

/// Entity tag: lowercase hex MD5 of the gzip-compressed representation.
pub fn etag(gzipped: &[u8]) -> String {
    format!("{:x}", Md5::digest(gzipped))
}
