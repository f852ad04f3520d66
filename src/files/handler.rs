//! Turns a parsed request into a response for the served root.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use html_escape::{encode_single_quoted_attribute, encode_text};

use crate::files::conditional::{self, Outcome};
use crate::files::fs::FileSystem;
use crate::files::resolver::{self, FileEntry, ResourceEntry};
use crate::http::date::format_timestamp;
use crate::http::mime;
use crate::http::request::Request;
use crate::http::response::{Response, ResponseBuilder, StatusCode};

pub const NOT_FOUND_BODY: &str = "Requested URL does not exist";

/// Serves one directory tree. Cheap to clone and shared read-only between
/// connections.
#[derive(Clone)]
pub struct StaticHandler {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    server_name: String,
}

impl StaticHandler {
    /// Links under `root` are resolved once here; containment checks compare
    /// against the resolved form.
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>, server_name: impl Into<String>) -> Self {
        let root = root.into();
        let root = match fs.canonicalize(&root) {
            Ok(canonical) => canonical,
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "Cannot resolve served root");
                root
            }
        };

        Self {
            root,
            fs,
            server_name: server_name.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Handles `request` with the current time as `Date`.
    pub fn handle(&self, request: &Request) -> io::Result<Response> {
        self.handle_at(request, Utc::now())
    }

    /// Handles `request`, stamping `Date` headers with `now`.
    ///
    /// Blocking: touches the filesystem and compresses the whole file.
    pub fn handle_at(&self, request: &Request, now: DateTime<Utc>) -> io::Result<Response> {
        let entry = resolver::resolve(self.fs.as_ref(), &self.root, &request.path)?;
        let date = format_timestamp(&now);

        let response = match entry {
            ResourceEntry::Missing => {
                tracing::info!(path = %request.path, "Requested path was not found");
                self.not_found(&date)
            }
            ResourceEntry::Directory(children) => {
                tracing::info!(path = %request.path, entries = children.len(), "Serving directory");
                self.directory_listing(&request.path, &children, &date)
            }
            ResourceEntry::File(file) => {
                tracing::info!(path = %request.path, etag = %file.etag, "Serving file");
                self.file(request, file, &date)
            }
        };

        Ok(if request.method.sends_body() {
            response
        } else {
            response.without_body()
        })
    }

    fn not_found(&self, date: &str) -> Response {
        ResponseBuilder::new(StatusCode::NotFound)
            .header("Server", self.server_name.as_str())
            .header("Content-Type", "text/html; charset=iso-8859-1")
            .header("Date", date)
            .header("Content-Length", NOT_FOUND_BODY.len().to_string())
            .body(NOT_FOUND_BODY.as_bytes().to_vec())
            .build()
    }

    fn directory_listing(&self, request_path: &str, children: &[String], date: &str) -> Response {
        let body = render_listing(request_path, children).into_bytes();

        ResponseBuilder::new(StatusCode::Ok)
            .header("Server", self.server_name.as_str())
            .header("Content-Type", "text/html; charset=utf-8")
            .header("Date", date)
            .header("Content-Length", body.len().to_string())
            .body(body)
            .build()
    }

    fn file(&self, request: &Request, file: FileEntry, date: &str) -> Response {
        match conditional::evaluate(&file.etag, file.last_modified, request.conditional.as_ref()) {
            Outcome::PreconditionFailed => ResponseBuilder::new(StatusCode::PreconditionFailed)
                .header("Date", date)
                .header("Server", self.server_name.as_str())
                .header("Etag", file.etag)
                .build(),
            Outcome::NotModified => ResponseBuilder::new(StatusCode::NotModified)
                .header("Server", self.server_name.as_str())
                .header("Etag", file.etag)
                .headers(mime::mime_headers(&file.name, &file.extension))
                .build(),
            Outcome::Serve => ResponseBuilder::new(StatusCode::Ok)
                .header("Last-Modified", format_timestamp(&file.last_modified))
                .header("Content-Encoding", "gzip")
                .header("Content-Length", file.gzipped.len().to_string())
                .headers(mime::mime_headers(&file.name, &file.extension))
                .header("Date", date)
                .header("Etag", file.etag)
                .header("Server", self.server_name.as_str())
                .body(file.gzipped)
                .build(),
        }
    }
}

/// HTML listing: a parent link, then one link per child. Names are escaped
/// for the single-quoted `href` and for the link text.
pub fn render_listing(request_path: &str, children: &[String]) -> String {
    let prefix = if request_path.ends_with('/') {
        request_path.to_string()
    } else {
        format!("{request_path}/")
    };

    let mut body = String::from("<html><a href='..'>> ..</a><br>\n");
    for name in children {
        let href = encode_single_quoted_attribute(&format!("{prefix}{name}/")).into_owned();
        let text = encode_text(name);
        body.push_str(&format!("> <a href='{href}'><i>{text}</i></a><br>\n"));
    }
    body.push_str("</html>\n");
    body
}
