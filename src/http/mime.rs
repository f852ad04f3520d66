//! Content-Type guessing from file extensions.
//!
//! Categories are checked in a fixed order and the first hit wins, so `csv`
//! and `rtf`, listed under both text and application, come out as `text/*`.
//! Anything unknown is sent as an `application/octet-stream` attachment
//! (RFC 2046 fallback).

const CATEGORIES: &[(&str, &[&str])] = &[
    ("image", &["png", "jpg", "jpeg", "gif", "svg"]),
    ("text", &["txt", "html", "ics", "css", "csv", "rtf"]),
    ("application", &["pdf", "zip", "xml", "7z", "json", "csv", "rtf"]),
    ("video", &["mp4", "mpeg", "webm"]),
];

pub const FALLBACK_TYPE: &str = "application/octet-stream";

/// Lowercased text after the last `.`; the whole name when there is none.
pub fn extension(file_name: &str) -> String {
    file_name
        .rsplit('.')
        .next()
        .unwrap_or(file_name)
        .to_ascii_lowercase()
}

/// Looks up the content type for a known extension.
pub fn content_type(ext: &str) -> Option<String> {
    CATEGORIES
        .iter()
        .find(|(_, exts)| exts.contains(&ext))
        .map(|(category, _)| format!("{category}/{ext}"))
}

/// Headers for a file with extension `ext`: `Content-Type`, plus
/// `Content-Disposition` naming `file_name` when the type is unknown.
pub fn mime_headers(file_name: &str, ext: &str) -> Vec<(&'static str, String)> {
    match content_type(ext) {
        Some(ct) => vec![("Content-Type", ct)],
        None => vec![
            ("Content-Type", FALLBACK_TYPE.to_string()),
            (
                "Content-Disposition",
                format!("attachment; filename={file_name}"),
            ),
        ],
    }
}
