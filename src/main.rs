use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use gzserve::config::Config;
use gzserve::files::LocalFileSystem;
use gzserve::server::Server;

/// Serve a directory over HTTP with gzip and ETags.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Directory to serve
    #[arg(env = "GZSERVE_ROOT")]
    root: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Interface to bind
    #[arg(long)]
    host: Option<String>,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// trace, debug, info, warn or error
    #[arg(long)]
    log_level: Option<String>,

    /// Maximum number of connections served at once
    #[arg(long)]
    max_connections: Option<usize>,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::load(),
        };

        if let Some(root) = self.root {
            cfg.static_files.root = root;
        }
        cfg.override_listen(self.host.as_deref(), self.port)?;
        if let Some(level) = self.log_level {
            cfg.logging.level = level;
        }
        if let Some(max) = self.max_connections {
            cfg.server.max_connections = max;
        }
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Cli::parse().into_config()?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(cfg.log_level()?)
        .init();

    let server = Server::bind(&cfg, Arc::new(LocalFileSystem)).await?;
    let shutdown = server.shutdown_handle();
    let mut serving = tokio::spawn(server.run());

    tokio::select! {
        res = &mut serving => {
            res??;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            shutdown.stop();
            serving.await??;
        }
    }

    Ok(())
}
