//! Accept loop and per-connection shared state.

pub mod access;
pub mod listener;

use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;
use crate::datastore::DatastoreClient;

/// Read-only state shared by every connection.
#[derive(Debug, Clone)]
pub struct ServerContext {
    /// Directory static URIs are resolved under
    pub doc_root: PathBuf,
    /// Client for `?key=` record lookups
    pub datastore: DatastoreClient,
    /// Deadline for each read on a client socket
    pub read_timeout: Duration,
}

impl ServerContext {
    pub fn new(doc_root: PathBuf, datastore: DatastoreClient, read_timeout: Duration) -> Self {
        Self {
            doc_root,
            datastore,
            read_timeout,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            cfg.static_files.root.clone(),
            DatastoreClient::new(cfg.datastore_addr(), cfg.datastore_timeout()),
            cfg.read_timeout(),
        )
    }
}
