//! Static files served from the document root.

pub mod resolver;

pub use resolver::{ResolveError, StaticFile};
