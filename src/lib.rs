//! catalog-httpd - HTTP/1.0 origin server
//!
//! Serves static files from a document root, and records from a companion
//! UDP datastore when the request carries a `?key=` query parameter.

pub mod config;
pub mod datastore;
pub mod files;
pub mod http;
pub mod server;
