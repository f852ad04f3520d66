use std::io::ErrorKind;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";
const LINE_END: &str = "\n";

/// Serializes status line, headers, blank line and body.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line
    let status_line = format!(
        "{} {} {}{}",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase(),
        LINE_END
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in &resp.headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(LINE_END.as_bytes());
    }

    // Header/body separator
    buf.extend_from_slice(LINE_END.as_bytes());

    // Body
    if let Some(body) = &resp.body {
        buf.extend_from_slice(body);
    }

    buf
}

/// How a write attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Every byte reached the socket.
    Complete,
    /// The peer went away first; the remaining bytes were discarded.
    PeerClosed,
}

pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize_response(response),
            written: 0,
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Writes the serialized response.
    ///
    /// A peer that closed early is reported as `WriteOutcome::PeerClosed`
    /// rather than an error; any other I/O failure is returned.
    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<WriteOutcome>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = match stream.write(&self.buffer[self.written..]).await {
                Ok(n) => n,
                Err(e) if is_peer_gone(e.kind()) => return Ok(WriteOutcome::PeerClosed),
                Err(e) => return Err(e.into()),
            };

            if n == 0 {
                return Ok(WriteOutcome::PeerClosed);
            }

            self.written += n;
        }

        match stream.flush().await {
            Ok(()) => Ok(WriteOutcome::Complete),
            Err(e) if is_peer_gone(e.kind()) => Ok(WriteOutcome::PeerClosed),
            Err(e) => Err(e.into()),
        }
    }
}

pub fn is_peer_gone(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::BrokenPipe
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::WriteZero
            | ErrorKind::UnexpectedEof
    )
}
