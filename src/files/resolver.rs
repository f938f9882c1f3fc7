//! Static file resolution under the document root.
//!
//! The root and the URI path are joined by plain concatenation, so the URI
//! must already have passed the traversal guard in [`crate::http::uri`].

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::{self, File};

use crate::http::mime;

/// Longest resolved path accepted, in bytes.
pub const MAX_PATH_LEN: usize = 4096;

pub const INDEX_FILE: &str = "index.html";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("resolved path exceeds {} bytes", MAX_PATH_LEN)]
    PathTooLong,
    #[error("{} is not a regular file", .0.display())]
    NotAFile(PathBuf),
    #[error("cannot open {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },
}

/// A file opened for streaming.
#[derive(Debug)]
pub struct StaticFile {
    pub file: File,
    pub len: u64,
    pub content_type: &'static str,
}

/// Maps `uri_path` (no query string) to a path under `root`.
///
/// A directory gets `index.html` appended, with a `/` inserted first if
/// needed. A URI ending in `/` that does not name a directory also gets
/// `index.html` appended.
pub async fn resolve(root: &Path, uri_path: &str) -> Result<PathBuf, ResolveError> {
    let mut path = OsString::from(root.as_os_str());
    path.push(uri_path);
    check_len(&path)?;

    let is_dir = fs::metadata(&path)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false);

    if is_dir {
        if path.as_encoded_bytes().last() != Some(&b'/') {
            path.push("/");
        }
        path.push(INDEX_FILE);
    } else if uri_path.ends_with('/') {
        path.push(INDEX_FILE);
    }

    check_len(&path)?;
    Ok(PathBuf::from(path))
}

/// Opens a resolved path, requiring a regular file.
pub async fn open(path: PathBuf) -> Result<StaticFile, ResolveError> {
    let file = match File::open(&path).await {
        Ok(file) => file,
        Err(source) => return Err(ResolveError::Open { path, source }),
    };
    let meta = match file.metadata().await {
        Ok(meta) => meta,
        Err(source) => return Err(ResolveError::Open { path, source }),
    };
    if !meta.is_file() {
        return Err(ResolveError::NotAFile(path));
    }

    Ok(StaticFile {
        content_type: mime::guess(&path),
        len: meta.len(),
        file,
    })
}

fn check_len(path: &OsString) -> Result<(), ResolveError> {
    if path.len() >= MAX_PATH_LEN {
        return Err(ResolveError::PathTooLong);
    }
    Ok(())
}
