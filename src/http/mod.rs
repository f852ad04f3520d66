//! HTTP protocol implementation.
//!
//! A one-request-per-connection subset of HTTP/1.1.
//!
//! # Architecture
//!
//! - **`connection`**: Per-connection state machine: read, process, write, close
//! - **`parser`**: Parses the request line and conditional headers from a byte buffer
//! - **`request`**: Request representation (method, decoded path, conditional)
//! - **`date`**: The fixed timestamp layout used on the wire
//! - **`response`**: Response representation with builder pattern
//! - **`writer`**: Serializes and writes responses, tolerating peers that hang up
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for request line and headers
//!        └──────┬──────┘
//!               │ Request received (or rejected → 400)
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Resolve path, evaluate conditionals
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │
//!               └─ Closed (no keep-alive)
//! ```

pub mod connection;
pub mod date;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
