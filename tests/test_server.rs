//! End-to-end tests over real sockets.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use common::{TempTree, gunzip, split_response};
use gzserve::config::Config;
use gzserve::files::LocalFileSystem;
use gzserve::server::{Server, ShutdownHandle};
use md5::{Digest, Md5};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

struct Running {
    addr: SocketAddr,
    shutdown: ShutdownHandle,
    task: JoinHandle<anyhow::Result<()>>,
    tree: TempTree,
}

async fn start() -> Running {
    let tree = TempTree::new("server");
    tree.file("hello.txt", b"hello over the wire\n");
    tree.file("Figure_3.png", &[0x89, b'P', b'N', b'G', 0, 1, 2, 3]);
    tree.dir("New folder");

    let mut cfg = Config::default();
    cfg.server.listen_addr = "127.0.0.1:0".to_string();
    cfg.static_files.root = tree.path().to_path_buf();

    let server = Server::bind(&cfg, Arc::new(LocalFileSystem)).await.unwrap();
    let addr = server.local_addr().unwrap();
    let shutdown = server.shutdown_handle();
    let task = tokio::spawn(server.run());

    Running {
        addr,
        shutdown,
        task,
        tree,
    }
}

async fn exchange(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();

    let mut buf = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut buf))
        .await
        .expect("server did not close the connection")
        .unwrap();
    buf
}

fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

#[tokio::test]
async fn test_get_file_over_tcp() {
    let server = start().await;
    let raw = exchange(server.addr, b"GET /hello.txt HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    let (status, headers, body) = split_response(&raw);

    assert_eq!(status, "HTTP/1.1 200 OK");
    assert_eq!(gunzip(&body), b"hello over the wire\n");
    assert_eq!(header(&headers, "Content-Type"), Some("text/txt"));
    assert_eq!(
        header(&headers, "Etag").map(str::to_string),
        Some(format!("{:x}", Md5::digest(&body)))
    );
    assert_eq!(header(&headers, "Server"), Some("gzserve"));
}

#[tokio::test]
async fn test_etag_round_trip_gives_304() {
    let server = start().await;
    let raw = exchange(server.addr, b"GET /Figure_3.png HTTP/1.1\r\n\r\n").await;
    let (_, headers, _) = split_response(&raw);
    let etag = header(&headers, "Etag").unwrap().to_string();
    assert_eq!(header(&headers, "Content-Type"), Some("image/png"));

    let request = format!("GET /Figure_3.png HTTP/1.1\r\nIf-None-Match: {etag}\r\n\r\n");
    let raw = exchange(server.addr, request.as_bytes()).await;
    let (status, headers, body) = split_response(&raw);

    assert_eq!(status, "HTTP/1.1 304 Not Modified");
    assert_eq!(header(&headers, "Etag"), Some(etag.as_str()));
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_last_modified_echo_is_not_a_304() {
    let server = start().await;
    let raw = exchange(server.addr, b"GET /hello.txt HTTP/1.1\r\n\r\n").await;
    let (_, headers, _) = split_response(&raw);
    let last_modified = header(&headers, "Last-Modified").unwrap().to_string();

    let request = format!("GET /hello.txt HTTP/1.1\r\nIf-Modified-Since: {last_modified}\r\n\r\n");
    let raw = exchange(server.addr, request.as_bytes()).await;
    let (status, _, _) = split_response(&raw);

    assert_eq!(status, "HTTP/1.1 200 OK");
}

#[tokio::test]
async fn test_if_match_mismatch_over_tcp() {
    let server = start().await;
    let raw = exchange(
        server.addr,
        b"GET /Figure_3.png HTTP/1.1\r\nIf-Match: b688530bd0dea0098d326ebbdefed013\r\n\r\n",
    )
    .await;
    let (status, _, body) = split_response(&raw);

    assert_eq!(status, "HTTP/1.1 412 Precondition Failed");
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_directory_with_encoded_space() {
    let server = start().await;
    let raw = exchange(server.addr, b"GET /New%20folder/ HTTP/1.1\r\n\r\n").await;
    let (status, _, body) = split_response(&raw);

    assert_eq!(status, "HTTP/1.1 200 OK");
    assert!(body.starts_with(b"<html><a href='..'>> ..</a><br>\n"));
}

#[tokio::test]
async fn test_head_has_no_body() {
    let server = start().await;
    let raw = exchange(server.addr, b"HEAD / HTTP/1.1\r\n\r\n").await;
    let (status, headers, body) = split_response(&raw);

    assert_eq!(status, "HTTP/1.1 200 OK");
    assert!(header(&headers, "Content-Length").is_some());
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_missing_path_over_tcp() {
    let server = start().await;
    let raw = exchange(server.addr, b"GET /thisdirectorydoesnotexist HTTP/1.1\r\n\r\n").await;
    let (status, _, body) = split_response(&raw);

    assert_eq!(status, "HTTP/1.1 404 Not Found");
    assert_eq!(body, b"Requested URL does not exist");
}

#[tokio::test]
async fn test_malformed_request_gets_400() {
    let server = start().await;

    let raw = exchange(server.addr, b"BREW /pot HTTP/1.1\r\n\r\n").await;
    let (status, _, _) = split_response(&raw);
    assert_eq!(status, "HTTP/1.1 400 Bad Request");

    let raw = exchange(
        server.addr,
        b"GET /hello.txt HTTP/1.1\r\nIf-Modified-Since: yesterday\r\n\r\n",
    )
    .await;
    let (status, _, body) = split_response(&raw);
    assert_eq!(status, "HTTP/1.1 400 Bad Request");
    assert!(String::from_utf8_lossy(&body).contains("If-Modified-Since"));
}

#[tokio::test]
async fn test_half_closed_request_is_still_served() {
    let server = start().await;
    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(b"GET /hello.txt HTTP/1.1\n").await.unwrap();
    stream.shutdown().await.unwrap();

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    let (status, _, _) = split_response(&buf);
    assert_eq!(status, "HTTP/1.1 200 OK");
}

#[tokio::test]
async fn test_silent_client_gets_nothing() {
    let server = start().await;
    let stream = TcpStream::connect(server.addr).await.unwrap();
    drop(stream);

    // The server keeps serving afterwards
    let raw = exchange(server.addr, b"GET /hello.txt HTTP/1.1\r\n\r\n").await;
    let (status, _, _) = split_response(&raw);
    assert_eq!(status, "HTTP/1.1 200 OK");
}

/// Bytes that gzip cannot shrink much.
fn noise(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x9e37_79b9;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

#[tokio::test]
async fn test_client_leaving_during_large_response() {
    let server = start().await;
    let content = noise(4 * 1024 * 1024);
    server.tree.file("big.bin", &content);

    for _ in 0..3 {
        let mut stream = TcpStream::connect(server.addr).await.unwrap();
        stream.write_all(b"GET /big.bin HTTP/1.1\r\n\r\n").await.unwrap();
        drop(stream);
    }

    let raw = exchange(server.addr, b"GET /hello.txt HTTP/1.1\r\n\r\n").await;
    let (status, _, _) = split_response(&raw);
    assert_eq!(status, "HTTP/1.1 200 OK");

    let raw = exchange(server.addr, b"GET /big.bin HTTP/1.1\r\n\r\n").await;
    let (status, _, body) = split_response(&raw);
    assert_eq!(status, "HTTP/1.1 200 OK");
    assert_eq!(gunzip(&body), content);
}

#[tokio::test]
async fn test_concurrent_connections() {
    let server = start().await;

    let clients: Vec<_> = (0..16)
        .map(|_| {
            let addr = server.addr;
            tokio::spawn(async move { exchange(addr, b"GET /hello.txt HTTP/1.1\r\n\r\n").await })
        })
        .collect();

    for client in clients {
        let raw = client.await.unwrap();
        let (status, _, _) = split_response(&raw);
        assert_eq!(status, "HTTP/1.1 200 OK");
    }
}

#[tokio::test]
async fn test_stop_ends_the_accept_loop() {
    let server = start().await;
    server.shutdown.stop();

    let result = tokio::time::timeout(Duration::from_secs(5), server.task)
        .await
        .expect("accept loop did not stop")
        .unwrap();
    assert!(result.is_ok());
}
