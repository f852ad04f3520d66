use percent_encoding::percent_decode_str;
use thiserror::Error;

use crate::http::date::parse_timestamp;
use crate::http::request::{Conditional, Method, Request};

/// Upper bound on the request line plus headers.
pub const MAX_HEAD_SIZE: usize = 16 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("request head is incomplete")]
    Incomplete,
    #[error("malformed request line")]
    MalformedRequestLine,
    #[error("malformed If-Modified-Since date: {0:?}")]
    MalformedDate(String),
    #[error("request target is not valid UTF-8 once decoded")]
    InvalidEncoding,
    #[error("request head exceeds {MAX_HEAD_SIZE} bytes")]
    HeadersTooLarge,
}

/// Parses one request head out of `buf`.
///
/// Returns the request and the number of bytes consumed, or
/// `ParseError::Incomplete` while the terminating empty line is still
/// missing.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let Some(head_end) = find_headers_end(buf) else {
        if buf.len() > MAX_HEAD_SIZE {
            return Err(ParseError::HeadersTooLarge);
        }
        return Err(ParseError::Incomplete);
    };
    if head_end > MAX_HEAD_SIZE {
        return Err(ParseError::HeadersTooLarge);
    }

    let request = parse_request_head(&buf[..head_end])?;
    Ok((request, head_end))
}

/// Parses a request line and its header lines.
///
/// Used directly when the peer half-closes before sending the empty line:
/// whatever arrived is treated as the complete head.
pub fn parse_request_head(head: &[u8]) -> Result<Request, ParseError> {
    let text = String::from_utf8_lossy(head);
    let mut lines = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line));

    // Request line
    let request_line = lines.next().ok_or(ParseError::MalformedRequestLine)?;
    let mut parts = request_line.split_whitespace();

    let method = parts
        .next()
        .and_then(Method::from_str)
        .ok_or(ParseError::MalformedRequestLine)?;
    let target = parts.next().ok_or(ParseError::MalformedRequestLine)?;
    let path = decode_target(target)?;

    // Headers: the last conditional header seen wins
    let mut conditional = None;

    for line in lines {
        if line.is_empty() {
            break;
        }

        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();

        if name.eq_ignore_ascii_case("If-None-Match") {
            conditional = Some(Conditional::IfNoneMatch(normalize_tag(value)));
        } else if name.eq_ignore_ascii_case("If-Match") {
            conditional = Some(Conditional::IfMatch(
                value.split(',').map(normalize_tag).collect(),
            ));
        } else if name.eq_ignore_ascii_case("If-Modified-Since") {
            conditional = Some(Conditional::IfModifiedSince(parse_timestamp(value)?));
        }
    }

    Ok(Request {
        method,
        path,
        conditional,
    })
}

/// Percent-decodes the request target, dropping any query or fragment.
fn decode_target(target: &str) -> Result<String, ParseError> {
    let raw_path = target
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    percent_decode_str(raw_path)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ParseError::InvalidEncoding)
}

/// Trims whitespace and optional surrounding double quotes from an entity tag.
fn normalize_tag(tag: &str) -> String {
    let tag = tag.trim();
    tag.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(tag)
        .to_string()
}

/// Offset just past the first empty line (`\n` or `\r\n`).
fn find_headers_end(buf: &[u8]) -> Option<usize> {
    let mut line_start = 0;
    for (i, &byte) in buf.iter().enumerate() {
        if byte == b'\n' {
            let line = &buf[line_start..i];
            if line.is_empty() || line == b"\r" {
                return Some(i + 1);
            }
            line_start = i + 1;
        }
    }
    None
}
