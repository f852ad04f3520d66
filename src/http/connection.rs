use std::net::SocketAddr;

use anyhow::Context;
use chrono::Utc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::files::StaticHandler;
use crate::http::date::format_timestamp;
use crate::http::parser::{ParseError, parse_http_request, parse_request_head};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::{ResponseWriter, WriteOutcome, is_peer_gone};

pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: Vec<u8>,
    state: ConnectionState,
    handler: StaticHandler,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter),
    Closed,
}

/// Result of reading one request head.
#[derive(Debug)]
pub enum ReadOutcome {
    Request(Request),
    /// The head arrived but could not be parsed.
    Rejected(ParseError),
    /// The peer went away without sending anything usable.
    Closed,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr, handler: StaticHandler) -> Self {
        Self {
            stream,
            peer,
            buffer: Vec::with_capacity(4096),
            state: ConnectionState::Reading,
            handler,
        }
    }

    /// Serves exactly one request, then closes.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            self.state = match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => match self.read_request().await? {
                    ReadOutcome::Request(req) => {
                        tracing::info!(
                            peer = %self.peer,
                            method = req.method.as_str(),
                            path = %req.path,
                            "Received request"
                        );
                        ConnectionState::Processing(req)
                    }
                    ReadOutcome::Rejected(err) => {
                        tracing::warn!(peer = %self.peer, error = %err, "Rejecting malformed request");
                        let response = Response::bad_request(
                            self.handler.server_name(),
                            &format_timestamp(&Utc::now()),
                            &err.to_string(),
                        );
                        ConnectionState::Writing(ResponseWriter::new(&response))
                    }
                    ReadOutcome::Closed => ConnectionState::Closed,
                },

                ConnectionState::Processing(req) => match self.process(req).await? {
                    Some(response) => ConnectionState::Writing(ResponseWriter::new(&response)),
                    None => ConnectionState::Closed,
                },

                ConnectionState::Writing(mut writer) => {
                    match writer.write_to_stream(&mut self.stream).await? {
                        WriteOutcome::Complete => {
                            tracing::debug!(peer = %self.peer, bytes = writer.written(), "Response sent");
                        }
                        WriteOutcome::PeerClosed => {
                            tracing::debug!(
                                peer = %self.peer,
                                bytes = writer.written(),
                                "Client has dropped the connection"
                            );
                        }
                    }
                    // No keep-alive: one response per connection
                    let _ = self.stream.shutdown().await;
                    ConnectionState::Closed
                }

                ConnectionState::Closed => {
                    break;
                }
            };
        }

        Ok(())
    }

    pub async fn read_request(&mut self) -> anyhow::Result<ReadOutcome> {
        loop {
            // Try parsing whatever we already have
            match parse_http_request(&self.buffer) {
                Ok((request, consumed)) => {
                    self.buffer.drain(..consumed);
                    return Ok(ReadOutcome::Request(request));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data → fall through to read
                }

                Err(e) => return Ok(ReadOutcome::Rejected(e)),
            }

            // Read more data
            let mut temp = [0u8; 1024];
            let n = match self.stream.read(&mut temp).await {
                Ok(n) => n,
                Err(e) if is_peer_gone(e.kind()) => {
                    tracing::debug!(peer = %self.peer, error = %e, "Client has dropped the connection");
                    return Ok(ReadOutcome::Closed);
                }
                Err(e) => return Err(e).context("reading request"),
            };

            if n == 0 {
                // Half-closed without the empty line: take what arrived
                if self.buffer.iter().all(u8::is_ascii_whitespace) {
                    return Ok(ReadOutcome::Closed);
                }
                let head = std::mem::take(&mut self.buffer);
                return Ok(match parse_request_head(&head) {
                    Ok(request) => ReadOutcome::Request(request),
                    Err(e) => ReadOutcome::Rejected(e),
                });
            }

            self.buffer.extend_from_slice(&temp[..n]);
        }
    }

    /// Runs the blocking handler off the async workers.
    ///
    /// `None` means the file could not be read after it was classified; the
    /// connection is abandoned without a response.
    async fn process(&self, req: Request) -> anyhow::Result<Option<Response>> {
        let handler = self.handler.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let result = handler.handle(&req);
            (req, result)
        })
        .await
        .context("request handler task failed")?;

        match outcome {
            (req, Ok(response)) => {
                tracing::info!(
                    peer = %self.peer,
                    method = req.method.as_str(),
                    path = %req.path,
                    status = response.status.as_u16(),
                    "Responding"
                );
                Ok(Some(response))
            }
            (req, Err(e)) => {
                tracing::warn!(
                    peer = %self.peer,
                    path = %req.path,
                    error = %e,
                    "Failed to read resource, abandoning connection"
                );
                Ok(None)
            }
        }
    }
}
