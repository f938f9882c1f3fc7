//! Companion datastore access
//!
//! Records are opaque byte blobs held by a separate process and fetched over
//! a small UDP protocol. Every record is served as `image/jpeg`.

pub mod client;

pub use client::{DatastoreClient, FetchError, Record};
