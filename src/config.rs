//! Server configuration.
//!
//! Ports come from the two positional arguments. Everything else has a
//! default and may be overridden by an optional YAML file:
//!
//! ```yaml
//! server:
//!   backlog: 50
//!   read_timeout_ms: 5000
//!   concurrent: true
//! static_files:
//!   root: Webpage
//! datastore:
//!   host: 127.0.0.1
//!   timeout_ms: 2000
//! ```
//!
//! `CATALOG_ROOT` in the environment replaces the document root.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

pub const ROOT_ENV: &str = "CATALOG_ROOT";

/// Command line: `catalog-httpd <http-port> <db-port>`.
#[derive(Debug, Clone, Parser)]
#[command(name = "catalog-httpd", version)]
#[command(about = "HTTP/1.0 server for static files and datastore records")]
pub struct Cli {
    /// TCP port to accept HTTP connections on
    pub http_port: u16,

    /// UDP port of the companion datastore
    pub db_port: u16,

    /// Optional YAML configuration file
    #[arg(short, long, env = "CATALOG_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub backlog: u32,
    pub read_timeout_ms: u64,
    /// Serve each connection on its own task instead of one at a time.
    pub concurrent: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            backlog: 50,
            read_timeout_ms: 5000,
            concurrent: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticFilesConfig {
    pub root: PathBuf,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("Webpage"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatastoreConfig {
    pub host: IpAddr,
    pub timeout_ms: u64,
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            timeout_ms: 2000,
        }
    }
}

/// The YAML file layout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
    pub datastore: DatastoreConfig,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub db_port: u16,
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
    pub datastore: DatastoreConfig,
}

impl Config {
    /// Defaults for everything but the ports.
    pub fn new(http_port: u16, db_port: u16) -> Self {
        Self::from_file_config(http_port, db_port, FileConfig::default())
    }

    /// Builds the configuration from the command line, the optional YAML
    /// file and the environment, in that order of precedence (lowest first).
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut cfg = match &cli.config {
            Some(path) => Self::from_file(cli.http_port, cli.db_port, path)?,
            None => Self::new(cli.http_port, cli.db_port),
        };
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(http_port: u16, db_port: u16, path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(http_port, db_port, &text)
    }

    pub fn from_yaml_str(http_port: u16, db_port: u16, yaml: &str) -> Result<Self, ConfigError> {
        // an empty document deserializes as unit, not as a map
        let file: FileConfig = if yaml.trim().is_empty() {
            FileConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        let cfg = Self::from_file_config(http_port, db_port, file);
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file_config(http_port: u16, db_port: u16, file: FileConfig) -> Self {
        Self {
            http_port,
            db_port,
            server: file.server,
            static_files: file.static_files,
            datastore: file.datastore,
        }
    }

    /// Replaces the document root with `CATALOG_ROOT` when it is set.
    pub fn apply_env(&mut self) {
        if let Some(root) = std::env::var_os(ROOT_ENV).filter(|v| !v.is_empty()) {
            self.static_files.root = PathBuf::from(root);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid("server.read_timeout_ms must be positive".into()));
        }
        if self.datastore.timeout_ms == 0 {
            return Err(ConfigError::Invalid("datastore.timeout_ms must be positive".into()));
        }
        if self.server.backlog == 0 {
            return Err(ConfigError::Invalid("server.backlog must be positive".into()));
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.server.read_timeout_ms)
    }

    pub fn datastore_timeout(&self) -> Duration {
        Duration::from_millis(self.datastore.timeout_ms)
    }

    pub fn datastore_addr(&self) -> SocketAddr {
        SocketAddr::new(self.datastore.host, self.db_port)
    }
}
