//! Conditional-request evaluation for files.
//!
//! Checked in a fixed priority order:
//!
//! 1. `If-Match` that matches nothing → 412
//! 2. `If-None-Match` equal to the etag, or an `If-Modified-Since`
//!    threshold strictly after the modification time → 304
//! 3. anything else → 200
//!
//! Missing paths (404) and directories (always 200) never reach this module.

use chrono::{DateTime, Utc};

use crate::http::request::Conditional;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Serve,
    NotModified,
    PreconditionFailed,
}

pub fn evaluate(
    etag: &str,
    last_modified: DateTime<Utc>,
    conditional: Option<&Conditional>,
) -> Outcome {
    match conditional {
        Some(Conditional::IfMatch(tags)) if !if_match_satisfied(etag, tags) => {
            Outcome::PreconditionFailed
        }
        Some(Conditional::IfNoneMatch(tag)) if tag == etag => Outcome::NotModified,
        Some(Conditional::IfModifiedSince(threshold)) if *threshold > last_modified => {
            Outcome::NotModified
        }
        _ => Outcome::Serve,
    }
}

/// `*` on its own matches any etag; otherwise the etag must be in the list.
fn if_match_satisfied(etag: &str, tags: &[String]) -> bool {
    match tags {
        [only] if only == "*" => true,
        _ => tags.iter().any(|t| t == etag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_only_counts_alone() {
        assert!(if_match_satisfied("abc", &["*".to_string()]));
        assert!(!if_match_satisfied("abc", &["*".to_string(), "x".to_string()]));
    }
}
