//! gzserve - Static content server
//!
//! Serves a directory over a one-request-per-connection HTTP/1.1 subset:
//! HTML directory listings, gzip-compressed files with MD5 ETags, and
//! `If-Match` / `If-None-Match` / `If-Modified-Since` handling.

pub mod config;
pub mod files;
pub mod http;
pub mod server;
