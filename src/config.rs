//! Server configuration.
//!
//! Values come from, in increasing precedence: built-in defaults, an
//! optional YAML file, `GZSERVE_*` environment variables, and finally the
//! command line (applied by `main`).
//!
//! ```yaml
//! server:
//!   listen_addr: "0.0.0.0:8080"
//!   max_connections: 256
//! static_files:
//!   root: /srv/www
//! logging:
//!   level: debug
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Connections handled at once; further clients wait in the accept queue.
    pub max_connections: usize,
    /// Value of the `Server` response header.
    pub server_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:1337".to_string(),
            max_connections: 1024,
            server_name: "gzserve".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub root: PathBuf,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `trace`, `debug`, `info`, `warn`, `error`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Defaults overlaid with environment variables.
    pub fn load() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("invalid YAML configuration")
    }

    /// Reads a YAML file, then applies environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut cfg = Self::from_yaml_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// Overrides fields from `GZSERVE_LISTEN`, `GZSERVE_ROOT` and `GZSERVE_LOG`.
    pub fn apply_env(&mut self) {
        if let Ok(addr) = std::env::var("GZSERVE_LISTEN") {
            self.server.listen_addr = addr;
        }
        if let Ok(root) = std::env::var("GZSERVE_ROOT") {
            self.static_files.root = PathBuf::from(root);
        }
        if let Ok(level) = std::env::var("GZSERVE_LOG") {
            self.logging.level = level;
        }
    }

    /// Replaces the host and/or port of `listen_addr`, keeping whichever half
    /// is not given.
    pub fn override_listen(&mut self, host: Option<&str>, port: Option<u16>) -> anyhow::Result<()> {
        if host.is_none() && port.is_none() {
            return Ok(());
        }

        let (current_host, current_port) = split_host_port(&self.server.listen_addr)?;
        let host = host.unwrap_or(current_host.as_str());
        let port = port.unwrap_or(current_port);

        self.server.listen_addr = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]:{port}")
        } else {
            format!("{host}:{port}")
        };
        Ok(())
    }

    pub fn log_level(&self) -> anyhow::Result<tracing::Level> {
        self.logging
            .level
            .parse()
            .map_err(|_| anyhow::anyhow!("unknown log level {:?}", self.logging.level))
    }
}

fn split_host_port(addr: &str) -> anyhow::Result<(String, u16)> {
    if let Ok(sock) = addr.parse::<SocketAddr>() {
        return Ok((sock.ip().to_string(), sock.port()));
    }

    // Host names such as `localhost:8080`
    let (host, port) = addr
        .rsplit_once(':')
        .with_context(|| format!("listen address {addr:?} has no port"))?;
    let port = port
        .parse()
        .with_context(|| format!("invalid port in listen address {addr:?}"))?;
    Ok((host.to_string(), port))
}
