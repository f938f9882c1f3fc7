//! MIME type detection based on file extensions.

use std::path::Path;

pub const TEXT_HTML: &str = "text/html";
pub const IMAGE_JPEG: &str = "image/jpeg";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Picks a content type from the suffix after the last `.` in `path`.
///
/// Matching is case-sensitive. Anything unrecognised, including a path with
/// no dot at all, is served as `application/octet-stream`.
///
/// # Example
///
/// ```
/// # use catalog_httpd::http::mime;
/// assert_eq!(mime::guess("Webpage/index.html"), "text/html");
/// assert_eq!(mime::guess("Webpage/photo.JPG"), "application/octet-stream");
/// ```
pub fn guess(path: impl AsRef<Path>) -> &'static str {
    let path = path.as_ref().to_string_lossy();
    let Some(dot) = path.rfind('.') else {
        return OCTET_STREAM;
    };

    match &path[dot..] {
        ".html" | ".htm" => TEXT_HTML,
        ".css" => "text/css",
        ".js" => "application/javascript",
        ".png" => "image/png",
        ".jpg" | ".jpeg" => IMAGE_JPEG,
        ".gif" => "image/gif",
        ".txt" => "text/plain",
        _ => OCTET_STREAM,
    }
}
