use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::{Semaphore, watch};
use tracing::info;

use crate::config::Config;
use crate::files::{FileSystem, StaticHandler};
use crate::http::connection::Connection;

/// Accepts connections and serves each on its own task.
pub struct Server {
    listener: TcpListener,
    handler: StaticHandler,
    limit: Arc<Semaphore>,
    shutdown: Arc<watch::Sender<bool>>,
}

/// Stops a running `Server` from accepting further connections.
///
/// Connections already accepted run to completion.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

impl Server {
    pub async fn bind(cfg: &Config, fs: Arc<dyn FileSystem>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(&cfg.server.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", cfg.server.listen_addr))?;

        let handler = StaticHandler::new(
            cfg.static_files.root.clone(),
            fs,
            cfg.server.server_name.clone(),
        );
        let (tx, _rx) = watch::channel(false);

        Ok(Self {
            listener,
            handler,
            limit: Arc::new(Semaphore::new(cfg.server.max_connections.max(1))),
            shutdown: Arc::new(tx),
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listener.local_addr().context("listener has no local address")
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: Arc::clone(&self.shutdown),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let mut stop = self.shutdown.subscribe();
        let addr = self.local_addr()?;
        info!(root = %self.handler.root().display(), %addr, "Serving directory");

        loop {
            // Wait for a free slot before accepting
            let permit = tokio::select! {
                permit = Arc::clone(&self.limit).acquire_owned() => {
                    permit.context("connection limiter closed")?
                }
                _ = stopped(&mut stop) => break,
            };

            let (socket, peer) = tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to accept connection");
                        continue;
                    }
                },
                _ = stopped(&mut stop) => break,
            };
            info!("Accepted connection from {}", peer);

            let handler = self.handler.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let mut conn = Connection::new(socket, peer, handler);
                if let Err(e) = conn.run().await {
                    tracing::error!("Connection error from {}: {:#}", peer, e);
                }
            });
        }

        info!("Received shutdown command, no longer accepting connections");
        Ok(())
    }
}

/// Resolves once a stop has been requested.
async fn stopped(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}
